//! Building blocks the team coordinator is assembled from.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ stage ──▶ postprocess ──▶ (next stage)
//! (path)    (pdfium)    (LLM)     (tidy text)
//!                         ▲
//!                      search
//!                  (DuckDuckGo)
//! ```
//!
//! 1. [`input`] validates CV paths and enumerates a CV directory.
//! 2. [`extract`] turns a PDF into plain text inside `spawn_blocking`;
//!    pdfium is not async-safe.
//! 3. [`stage`] makes one model call per agent.
//! 4. [`search`] feeds web results to agents carrying the search tool.
//! 5. [`postprocess`] applies deterministic formatting cleanup to model output.

pub mod extract;
pub mod input;
pub mod postprocess;
pub mod search;
pub mod stage;
