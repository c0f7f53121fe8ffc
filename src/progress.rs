//! Progress-callback trait for per-stage team events.
//!
//! Inject an [`Arc<dyn TeamProgressCallback>`] via
//! [`crate::config::CrewConfigBuilder::progress_callback`] to be told when
//! each stage starts, finishes, or fails. The `crew` binary uses it to drive
//! a terminal spinner and, with `--show-stages`, to print every intermediate
//! output.
//!
//! # Example
//!
//! ```rust
//! use edgequake_crew::{CrewConfig, TeamProgressCallback};
//! use std::sync::Arc;
//!
//! struct StageLogger;
//!
//! impl TeamProgressCallback for StageLogger {
//!     fn on_stage_complete(&self, index: usize, total: usize, agent: &str, output: &str) {
//!         eprintln!("[{index}/{total}] {agent}: {} chars", output.len());
//!     }
//! }
//!
//! let config = CrewConfig::builder()
//!     .progress_callback(Arc::new(StageLogger) as Arc<dyn TeamProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by [`crate::team::Team::run`] as it walks through its stages.
///
/// Stage indices are 1-based. All methods have no-op defaults.
pub trait TeamProgressCallback: Send + Sync {
    /// Called once before the first stage.
    fn on_run_start(&self, team: &str, total_stages: usize) {
        let _ = (team, total_stages);
    }

    /// Called just before the stage's request is sent.
    fn on_stage_start(&self, index: usize, total_stages: usize, agent: &str) {
        let _ = (index, total_stages, agent);
    }

    /// Called with each text fragment as the stage's model answer streams in.
    ///
    /// Fragments are raw model text; the tidied output arrives with
    /// [`on_stage_complete`](Self::on_stage_complete). A provider that cannot
    /// stream delivers its whole answer as a single fragment.
    fn on_stage_delta(&self, index: usize, total_stages: usize, agent: &str, delta: &str) {
        let _ = (index, total_stages, agent, delta);
    }

    /// Called with the stage's output once it is available.
    fn on_stage_complete(&self, index: usize, total_stages: usize, agent: &str, output: &str) {
        let _ = (index, total_stages, agent, output);
    }

    /// Called when a stage fails. No further stage events follow.
    fn on_stage_error(&self, index: usize, total_stages: usize, agent: &str, error: &str) {
        let _ = (index, total_stages, agent, error);
    }

    /// Called once after the run ends, successfully or not.
    ///
    /// `completed` is the number of stages that produced output.
    fn on_run_complete(&self, total_stages: usize, completed: usize) {
        let _ = (total_stages, completed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl TeamProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::CrewConfig`].
pub type ProgressCallback = Arc<dyn TeamProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl TeamProgressCallback for Recorder {
        fn on_run_start(&self, team: &str, total: usize) {
            self.events.lock().unwrap().push(format!("start {team} {total}"));
        }
        fn on_stage_start(&self, index: usize, _total: usize, agent: &str) {
            self.events.lock().unwrap().push(format!("begin {index} {agent}"));
        }
        fn on_stage_error(&self, index: usize, _total: usize, _agent: &str, error: &str) {
            self.events.lock().unwrap().push(format!("error {index} {error}"));
        }
        fn on_run_complete(&self, total: usize, completed: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {completed}/{total}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start("team", 3);
        cb.on_stage_start(1, 3, "CVParser");
        cb.on_stage_delta(1, 3, "CVParser", "{");
        cb.on_stage_complete(1, 3, "CVParser", "{}");
        cb.on_stage_error(2, 3, "JobMatcher", "boom");
        cb.on_run_complete(3, 1);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let rec = Recorder::default();
        rec.on_run_start("HR", 3);
        rec.on_stage_start(1, 3, "CVParser");
        rec.on_stage_complete(1, 3, "CVParser", "ignored by recorder");
        rec.on_stage_error(2, 3, "JobMatcher", "timeout");
        rec.on_run_complete(3, 1);

        let events = rec.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec!["start HR 3", "begin 1 CVParser", "error 2 timeout", "done 1/3"]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_run_start("t", 4);
        cb.on_stage_complete(4, 4, "DataVisualizer", "chart");
    }
}
