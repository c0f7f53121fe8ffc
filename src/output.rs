//! Result types returned by team runs.
//!
//! All of them serialise to JSON for `crew --json`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What one stage produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    /// 1-based position in the team.
    pub index: usize,
    pub agent: String,
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}

/// Totals over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub stages: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_duration_ms: u64,
}

/// Output of a complete team run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamOutput {
    pub team: String,
    /// The last stage's text: what gets printed.
    pub text: String,
    /// Every stage in execution order.
    pub stages: Vec<StageResult>,
    pub stats: RunStats,
}

impl TeamOutput {
    pub fn final_stage(&self) -> Option<&StageResult> {
        self.stages.last()
    }
}

/// One screened CV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateReport {
    pub file_name: String,
    pub path: PathBuf,
    /// Character count of the extracted CV text.
    pub cv_chars: usize,
    pub pages: usize,
    pub output: TeamOutput,
}
