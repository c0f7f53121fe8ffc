//! # edgequake-crew
//!
//! Chain role-prompted LLM agents into fixed, sequential teams.
//!
//! Two teams ship with the crate:
//!
//! * **HR Recruitment Team**: screens CVs (PDF) against a job description:
//!   `CVParser → JobMatcher → ReportWriter`.
//! * **StockMarketAnalysisTeam**: turns a prompt into an investment
//!   research report: `NewsFetcher → AnalysisAgent → ReportWriter →
//!   DataVisualizer`. NewsFetcher grounds itself with a web search.
//!
//! ## Pipeline Overview
//!
//! ```text
//! CV.pdf
//!  │
//!  ├─ 1. Extract  pdfium text layer → plain text (spawn_blocking)
//!  ├─ 2. Stage 1  document + job + instructions → model → text
//!  ├─ 3. Stage k  stage k-1 output + job + instructions → model → text
//!  └─ 4. Print    final stage output (markdown)
//! ```
//!
//! Stages run strictly in order; the first failing stage ends the run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_crew::{screen_cv, CrewConfig, DEFAULT_JOB_DESCRIPTION};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = CrewConfig::builder().instructions("Be concise").build()?;
//!     let report = screen_cv("cv.pdf", DEFAULT_JOB_DESCRIPTION, &config).await?;
//!     println!("{}", report.output.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Custom teams
//!
//! ```rust,no_run
//! use edgequake_crew::{build_runner, Agent, CrewConfig, Team, TeamInput};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let team = Team::builder("Editors")
//!     .member(Agent::new("Drafter", "Write a first draft.", "Keep it short."))
//!     .member(Agent::new("Critic", "Tighten the draft.", "Remove filler."))
//!     .build()?;
//! let config = CrewConfig::default();
//! let runner = build_runner(&config)?;
//! let out = team.run(&runner, &TeamInput::new("A haiku about Rust"), None).await?;
//! println!("{}", out.text);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `crew` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod agent;
pub mod config;
pub mod crew;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod provider;
pub mod team;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use agent::{Agent, AgentTool};
pub use config::{CrewConfig, CrewConfigBuilder, DEFAULT_MODEL};
pub use crew::{
    build_runner, extract, report, report_with, screen_cv, screen_cv_with, screen_directory,
    screen_directory_with, screen_document_with,
};
pub use error::CrewError;
pub use output::{CandidateReport, RunStats, StageResult, TeamOutput};
pub use pipeline::extract::{extract_text, Document};
pub use pipeline::input::{list_pdfs, resolve_pdf};
pub use pipeline::search::{DuckDuckGoSearch, SearchResult, SearchTool};
pub use pipeline::stage::{LlmStageRunner, StageOutput, StageRequest, StageRunner};
pub use progress::{NoopProgressCallback, ProgressCallback, TeamProgressCallback};
pub use prompts::{
    DEFAULT_CV_DIR, DEFAULT_JOB_DESCRIPTION, DEFAULT_REPORT_PROMPT, DEFAULT_SCREEN_INSTRUCTIONS,
};
pub use team::{hr_recruitment_team, stock_analysis_team, Team, TeamBuilder, TeamInput};
