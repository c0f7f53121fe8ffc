//! Integration tests for the sequential team coordinator.
//!
//! Every test here drives teams through stub [`StageRunner`]s, so no LLM
//! provider, network or pdfium library is needed.
//!
//! Run with:
//!   cargo test --test team

use async_trait::async_trait;
use edgequake_crew::{
    hr_recruitment_team, report_with, screen_document_with, stock_analysis_team, Agent, AgentTool,
    CrewConfig, CrewError, Document, ProgressCallback, StageOutput, StageRequest, StageRunner,
    Team, TeamInput, TeamProgressCallback,
};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Answers "stage{n}" for the n-th call and records every request.
/// Fails the call numbered `fail_at`, if any.
#[derive(Default)]
struct CountingRunner {
    calls: Mutex<Vec<(String, StageRequest)>>,
    fail_at: Option<usize>,
}

impl CountingRunner {
    fn failing_at(n: usize) -> Self {
        Self {
            fail_at: Some(n),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<(String, StageRequest)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StageRunner for CountingRunner {
    async fn generate(
        &self,
        agent: &Agent,
        request: &StageRequest,
    ) -> Result<StageOutput, CrewError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((agent.name.clone(), request.clone()));
            calls.len()
        };
        if self.fail_at == Some(n) {
            return Err(CrewError::LlmApiError {
                message: "upstream 500".to_string(),
            });
        }
        Ok(StageOutput {
            text: format!("stage{n}"),
            input_tokens: 10,
            output_tokens: 5,
        })
    }
}

/// Streams its answers word by word; answers "stage{n}" like
/// [`CountingRunner`] otherwise.
#[derive(Default)]
struct WordStreamingRunner {
    inner: CountingRunner,
    streamed_agents: Mutex<Vec<String>>,
}

#[async_trait]
impl StageRunner for WordStreamingRunner {
    async fn generate(
        &self,
        agent: &Agent,
        request: &StageRequest,
    ) -> Result<StageOutput, CrewError> {
        self.inner.generate(agent, request).await
    }

    async fn generate_streaming(
        &self,
        agent: &Agent,
        request: &StageRequest,
        on_delta: &(dyn for<'d> Fn(&'d str) + Send + Sync),
    ) -> Result<StageOutput, CrewError> {
        self.streamed_agents
            .lock()
            .unwrap()
            .push(agent.name.clone());
        let mut output = self.inner.generate(agent, request).await?;
        for word in ["## Final ", "report ", "for ", output.text.as_str()] {
            on_delta(word);
        }
        output.text = format!("## Final report for {}", output.text);
        Ok(output)
    }
}

/// Records every progress event as a short string.
#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl RecordingProgress {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl TeamProgressCallback for RecordingProgress {
    fn on_run_start(&self, team: &str, total_stages: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("start {team} {total_stages}"));
    }
    fn on_stage_start(&self, index: usize, _total: usize, agent: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("stage {index} {agent}"));
    }
    fn on_stage_delta(&self, index: usize, _total: usize, _agent: &str, delta: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("delta {index} {delta}"));
    }
    fn on_stage_complete(&self, index: usize, _total: usize, _agent: &str, output: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {index} {output}"));
    }
    fn on_stage_error(&self, index: usize, _total: usize, _agent: &str, _error: &str) {
        self.events.lock().unwrap().push(format!("error {index}"));
    }
    fn on_run_complete(&self, total_stages: usize, completed: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("complete {completed}/{total_stages}"));
    }
}

fn four_stage_team() -> Team {
    Team::builder("Relay")
        .workflow("Pass the baton.")
        .member(Agent::new("A", "first", "go"))
        .member(Agent::new("B", "second", "go"))
        .member(Agent::new("C", "third", "go"))
        .member(Agent::new("D", "fourth", "go"))
        .build()
        .unwrap()
}

// ── Coordinator ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn four_stages_chain_in_order() {
    let runner = CountingRunner::default();
    let input = TeamInput::new("relay task");

    let out = four_stage_team().run(&runner, &input, None).await.unwrap();

    assert_eq!(out.text, "stage4");
    assert_eq!(out.team, "Relay");

    let calls = runner.calls();
    let agents: Vec<&str> = calls.iter().map(|(a, _)| a.as_str()).collect();
    assert_eq!(agents, ["A", "B", "C", "D"]);

    // No document: the first stage gets no prior input.
    assert_eq!(calls[0].1.prior, None);
    for k in 1..4 {
        assert_eq!(calls[k].1.prior.as_deref(), Some(format!("stage{k}").as_str()));
    }
    assert!(calls.iter().all(|(_, r)| r.task == "relay task"));
}

#[tokio::test]
async fn failing_stage_stops_the_chain() {
    let runner = CountingRunner::failing_at(2);
    let input = TeamInput::new("relay task");

    let err = four_stage_team()
        .run(&runner, &input, None)
        .await
        .unwrap_err();

    match err {
        CrewError::StageFailed { index, agent, source } => {
            assert_eq!(index, 2);
            assert_eq!(agent, "B");
            assert!(matches!(*source, CrewError::LlmApiError { .. }));
        }
        other => panic!("expected StageFailed, got {other:?}"),
    }
    // Stages 3 and 4 were never invoked.
    assert_eq!(runner.calls().len(), 2);
}

#[tokio::test]
async fn stats_sum_stage_tokens() {
    let runner = CountingRunner::default();
    let out = four_stage_team()
        .run(&runner, &TeamInput::new("t"), None)
        .await
        .unwrap();

    assert_eq!(out.stats.stages, 4);
    assert_eq!(out.stats.total_input_tokens, 40);
    assert_eq!(out.stats.total_output_tokens, 20);
    let indexes: Vec<usize> = out.stages.iter().map(|s| s.index).collect();
    assert_eq!(indexes, [1, 2, 3, 4]);
    assert_eq!(out.final_stage().map(|s| s.agent.as_str()), Some("D"));
}

#[tokio::test]
async fn instructions_reach_every_stage() {
    let runner = CountingRunner::default();
    let input = TeamInput::new("t").with_instructions(Some("Be concise".to_string()));

    four_stage_team().run(&runner, &input, None).await.unwrap();

    assert!(runner
        .calls()
        .iter()
        .all(|(_, r)| r.instructions.as_deref() == Some("Be concise")));
}

#[tokio::test]
async fn workflow_brief_names_each_phase() {
    let runner = CountingRunner::default();
    four_stage_team()
        .run(&runner, &TeamInput::new("t"), None)
        .await
        .unwrap();

    let calls = runner.calls();
    let third = calls[2].1.workflow.as_deref().unwrap();
    assert!(third.starts_with("Pass the baton."));
    assert!(third.contains("phase 3 of 4"));
    assert!(third.contains("as C"));
}

// ── Progress events ──────────────────────────────────────────────────────────

#[tokio::test]
async fn progress_events_follow_stage_order() {
    let runner = CountingRunner::default();
    let recorder = Arc::new(RecordingProgress::default());
    let cb: ProgressCallback = recorder.clone();

    four_stage_team()
        .run(&runner, &TeamInput::new("t"), Some(&cb))
        .await
        .unwrap();

    assert_eq!(
        recorder.events(),
        [
            "start Relay 4",
            "stage 1 A",
            "done 1 stage1",
            "stage 2 B",
            "done 2 stage2",
            "stage 3 C",
            "done 3 stage3",
            "stage 4 D",
            "delta 4 stage4",
            "done 4 stage4",
            "complete 4/4",
        ]
    );
}

#[tokio::test]
async fn only_final_stage_streams() {
    let runner = WordStreamingRunner::default();
    let recorder = Arc::new(RecordingProgress::default());
    let cb: ProgressCallback = recorder.clone();

    let out = four_stage_team()
        .run(&runner, &TeamInput::new("t"), Some(&cb))
        .await
        .unwrap();

    assert_eq!(*runner.streamed_agents.lock().unwrap(), ["D"]);

    let deltas: Vec<String> = recorder
        .events()
        .into_iter()
        .filter_map(|e| e.strip_prefix("delta 4 ").map(str::to_string))
        .collect();
    assert_eq!(deltas, ["## Final ", "report ", "for ", "stage4"]);
    assert_eq!(deltas.concat(), out.text);
    assert!(!recorder.events().iter().any(|e| e.starts_with("delta 1")
        || e.starts_with("delta 2")
        || e.starts_with("delta 3")));
}

#[tokio::test]
async fn no_streaming_without_progress() {
    let runner = WordStreamingRunner::default();

    let out = four_stage_team()
        .run(&runner, &TeamInput::new("t"), None)
        .await
        .unwrap();

    assert!(runner.streamed_agents.lock().unwrap().is_empty());
    assert_eq!(out.text, "stage4");
}

#[tokio::test]
async fn progress_reports_failure_and_partial_completion() {
    let runner = CountingRunner::failing_at(3);
    let recorder = Arc::new(RecordingProgress::default());
    let cb: ProgressCallback = recorder.clone();

    let result = four_stage_team()
        .run(&runner, &TeamInput::new("t"), Some(&cb))
        .await;
    assert!(result.is_err());

    let events = recorder.events();
    assert_eq!(events[events.len() - 2], "error 3");
    assert_eq!(events[events.len() - 1], "complete 2/4");
    assert!(!events.iter().any(|e| e.starts_with("stage 4")));
}

// ── Entry points ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn screening_feeds_cv_text_to_parser() {
    let runner = CountingRunner::default();
    let config = CrewConfig::builder()
        .instructions("Be concise")
        .build()
        .unwrap();
    let cv = Document::from_text("cvs/jane.pdf", "Jane Doe\nBachelor's degree in CS");

    let report = screen_document_with(&runner, cv, "Fullstack Developer", &config)
        .await
        .unwrap();

    assert_eq!(report.file_name, "jane.pdf");
    assert_eq!(report.output.text, "stage3");
    assert_eq!(report.output.team, hr_recruitment_team().name());

    let calls = runner.calls();
    let agents: Vec<&str> = calls.iter().map(|(a, _)| a.as_str()).collect();
    assert_eq!(agents, ["CVParser", "JobMatcher", "ReportWriter"]);

    let first = &calls[0].1;
    assert!(first
        .prior
        .as_deref()
        .unwrap()
        .contains("Bachelor's degree in CS"));
    assert_eq!(first.task, "Fullstack Developer");
    assert_eq!(calls[1].1.prior.as_deref(), Some("stage1"));
}

#[tokio::test]
async fn empty_cv_still_runs_all_stages() {
    let runner = CountingRunner::default();
    let config = CrewConfig::default();
    let cv = Document::from_text("blank.pdf", "");

    let report = screen_document_with(&runner, cv, "job", &config)
        .await
        .unwrap();

    assert_eq!(report.cv_chars, 0);
    assert_eq!(runner.calls().len(), 3);
    assert_eq!(runner.calls()[0].1.prior.as_deref(), Some(""));
}

#[tokio::test]
async fn report_runs_four_analysis_stages() {
    let runner = CountingRunner::default();
    let config = CrewConfig::default();

    let out = report_with(&runner, "Apple stock news", &config)
        .await
        .unwrap();

    assert_eq!(out.text, "stage4");
    assert_eq!(out.team, stock_analysis_team().name());
    let calls = runner.calls();
    let agents: Vec<&str> = calls.iter().map(|(a, _)| a.as_str()).collect();
    assert_eq!(
        agents,
        ["NewsFetcher", "AnalysisAgent", "ReportWriter", "DataVisualizer"]
    );
    assert_eq!(calls[0].1.prior, None);
    assert_eq!(calls[0].1.task, "Apple stock news");
}

#[tokio::test]
async fn report_failure_names_failing_agent() {
    let runner = CountingRunner::failing_at(1);
    let config = CrewConfig::default();

    let err = report_with(&runner, "Apple", &config).await.unwrap_err();

    assert!(err.to_string().contains("NewsFetcher"));
    assert_eq!(runner.calls().len(), 1);
}

// ── Presets ──────────────────────────────────────────────────────────────────

#[test]
fn news_fetcher_carries_web_search() {
    let team = stock_analysis_team();
    assert!(team.uses_web_search());
    assert!(team.members()[0].has_tool(AgentTool::WebSearch));
    assert!(!hr_recruitment_team().uses_web_search());
}
