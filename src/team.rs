//! Teams: a fixed, ordered list of agents run one after another.
//!
//! ```text
//! document ──▶ agent₁ ──▶ agent₂ ──▶ … ──▶ agentₙ ──▶ final text
//! ```
//!
//! Stage 1 receives the extracted document (or nothing, for a bare prompt);
//! every later stage receives exactly the previous stage's output. The first
//! failure stops the run and no later stage is called.

use crate::agent::{Agent, AgentTool};
use crate::error::CrewError;
use crate::output::{RunStats, StageResult, TeamOutput};
use crate::pipeline::extract::Document;
use crate::pipeline::stage::{StageRequest, StageRunner};
use crate::progress::ProgressCallback;
use crate::prompts;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A named pipeline definition. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct Team {
    name: String,
    workflow: String,
    members: Vec<Agent>,
}

/// What a team run works on.
#[derive(Debug, Clone, Default)]
pub struct TeamInput {
    /// Job description or user prompt shared by every stage.
    pub task: String,
    /// Document handed to the first stage.
    pub document: Option<Document>,
    /// Free-text instruction attached to every stage.
    pub instructions: Option<String>,
}

impl TeamInput {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            ..Default::default()
        }
    }

    pub fn with_document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_instructions(mut self, instructions: Option<String>) -> Self {
        self.instructions = instructions;
        self
    }
}

impl Team {
    pub fn builder(name: impl Into<String>) -> TeamBuilder {
        TeamBuilder {
            name: name.into(),
            workflow: String::new(),
            members: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn workflow(&self) -> &str {
        &self.workflow
    }

    pub fn members(&self) -> &[Agent] {
        &self.members
    }

    /// Whether any member needs a web-search backend.
    pub fn uses_web_search(&self) -> bool {
        self.members.iter().any(|a| a.has_tool(AgentTool::WebSearch))
    }

    /// Run every member in order, feeding each one the previous output.
    ///
    /// With a progress callback, the final stage's answer is streamed to
    /// [`TeamProgressCallback::on_stage_delta`](crate::progress::TeamProgressCallback::on_stage_delta).
    ///
    /// # Errors
    /// [`CrewError::StageFailed`] wrapping the first stage error. Stages
    /// after the failing one are never invoked.
    pub async fn run(
        &self,
        runner: &dyn StageRunner,
        input: &TeamInput,
        progress: Option<&ProgressCallback>,
    ) -> Result<TeamOutput, CrewError> {
        let run_start = Instant::now();
        let total = self.members.len();
        info!("{}: starting run with {} stages", self.name, total);

        if let Some(cb) = progress {
            cb.on_run_start(&self.name, total);
        }

        let mut prior: Option<String> = input.document.as_ref().map(|d| d.text().to_string());
        let mut stages: Vec<StageResult> = Vec::with_capacity(total);

        for (i, agent) in self.members.iter().enumerate() {
            let index = i + 1;
            let request = StageRequest {
                task: input.task.clone(),
                prior: prior.take(),
                instructions: input.instructions.clone(),
                workflow: Some(self.phase_brief(index)),
            };

            if let Some(cb) = progress {
                cb.on_stage_start(index, total, &agent.name);
            }
            debug!("{}: stage {}/{} ({})", self.name, index, total, agent.name);

            let stage_start = Instant::now();
            let result = match progress {
                // The final answer is what gets printed, so it is streamed
                // to the callback as it arrives.
                Some(cb) if index == total => {
                    let on_delta = |delta: &str| cb.on_stage_delta(index, total, &agent.name, delta);
                    runner.generate_streaming(agent, &request, &on_delta).await
                }
                _ => runner.generate(agent, &request).await,
            };
            let output = match result {
                Ok(output) => output,
                Err(e) => {
                    warn!("{}: stage {} ({}) failed: {}", self.name, index, agent.name, e);
                    if let Some(cb) = progress {
                        cb.on_stage_error(index, total, &agent.name, &e.to_string());
                        cb.on_run_complete(total, stages.len());
                    }
                    return Err(e.in_stage(index, agent.name.clone()));
                }
            };

            if let Some(cb) = progress {
                cb.on_stage_complete(index, total, &agent.name, &output.text);
            }

            prior = Some(output.text.clone());
            stages.push(StageResult {
                index,
                agent: agent.name.clone(),
                text: output.text,
                input_tokens: output.input_tokens,
                output_tokens: output.output_tokens,
                duration_ms: stage_start.elapsed().as_millis() as u64,
            });
        }

        let stats = RunStats {
            stages: stages.len(),
            total_input_tokens: stages.iter().map(|s| s.input_tokens as u64).sum(),
            total_output_tokens: stages.iter().map(|s| s.output_tokens as u64).sum(),
            total_duration_ms: run_start.elapsed().as_millis() as u64,
        };
        info!(
            "{}: run complete, {} stages, {}ms",
            self.name, stats.stages, stats.total_duration_ms
        );

        if let Some(cb) = progress {
            cb.on_run_complete(total, stages.len());
        }

        // `build` guarantees at least one member, so `prior` holds the last output.
        let text = prior.unwrap_or_default();

        Ok(TeamOutput {
            team: self.name.clone(),
            text,
            stages,
            stats,
        })
    }

    /// Team workflow plus a line locating stage `index` in it.
    fn phase_brief(&self, index: usize) -> String {
        let agent = &self.members[index - 1].name;
        let current = format!(
            "You are handling phase {index} of {} in the {} workflow, as {agent}.",
            self.members.len(),
            self.name
        );
        if self.workflow.is_empty() {
            current
        } else {
            format!("{}\n\n{}", self.workflow, current)
        }
    }
}

/// Builder for [`Team`].
#[derive(Debug)]
pub struct TeamBuilder {
    name: String,
    workflow: String,
    members: Vec<Agent>,
}

impl TeamBuilder {
    pub fn workflow(mut self, text: impl Into<String>) -> Self {
        self.workflow = text.into();
        self
    }

    pub fn member(mut self, agent: Agent) -> Self {
        self.members.push(agent);
        self
    }

    /// Build the team. A team must have at least one member.
    pub fn build(self) -> Result<Team, CrewError> {
        if self.members.is_empty() {
            return Err(CrewError::InvalidConfig(format!(
                "team '{}' has no members",
                self.name
            )));
        }
        Ok(Team {
            name: self.name,
            workflow: self.workflow,
            members: self.members,
        })
    }
}

// ── Preset teams ─────────────────────────────────────────────────────────

/// CVParser → JobMatcher → ReportWriter.
pub fn hr_recruitment_team() -> Team {
    Team {
        name: prompts::HR_TEAM_NAME.to_string(),
        workflow: prompts::HR_TEAM_WORKFLOW.to_string(),
        members: vec![
            Agent::new("CVParser", prompts::CV_PARSER_ROLE, prompts::CV_PARSER_INSTRUCTIONS)
                .with_tool(AgentTool::Reasoning),
            Agent::new(
                "JobMatcher",
                prompts::JOB_MATCHER_ROLE,
                prompts::JOB_MATCHER_INSTRUCTIONS,
            )
            .with_tool(AgentTool::Reasoning),
            Agent::new(
                "ReportWriter",
                prompts::HR_REPORT_WRITER_ROLE,
                prompts::HR_REPORT_WRITER_INSTRUCTIONS,
            ),
        ],
    }
}

/// NewsFetcher → AnalysisAgent → ReportWriter → DataVisualizer.
pub fn stock_analysis_team() -> Team {
    Team {
        name: prompts::STOCK_TEAM_NAME.to_string(),
        workflow: prompts::STOCK_TEAM_WORKFLOW.to_string(),
        members: vec![
            Agent::new(
                "NewsFetcher",
                prompts::NEWS_FETCHER_ROLE,
                prompts::NEWS_FETCHER_INSTRUCTIONS,
            )
            .with_tool(AgentTool::WebSearch),
            Agent::new("AnalysisAgent", prompts::ANALYSIS_ROLE, prompts::ANALYSIS_INSTRUCTIONS)
                .with_tool(AgentTool::Reasoning),
            Agent::new(
                "ReportWriter",
                prompts::STOCK_REPORT_WRITER_ROLE,
                prompts::STOCK_REPORT_WRITER_INSTRUCTIONS,
            ),
            Agent::new(
                "DataVisualizer",
                prompts::VISUALIZER_ROLE,
                prompts::VISUALIZER_INSTRUCTIONS,
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::StageOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes "<agent>(<prior>)" so the chain is visible in the output.
    #[derive(Default)]
    struct EchoRunner {
        seen: Mutex<Vec<StageRequest>>,
    }

    #[async_trait]
    impl StageRunner for EchoRunner {
        async fn generate(
            &self,
            agent: &Agent,
            request: &StageRequest,
        ) -> Result<StageOutput, CrewError> {
            self.seen.lock().unwrap().push(request.clone());
            let prior = request.prior.clone().unwrap_or_default();
            Ok(StageOutput::text(format!("{}({})", agent.name, prior)))
        }
    }

    fn two_member_team() -> Team {
        Team::builder("Pair")
            .workflow("Phase 1 then phase 2")
            .member(Agent::new("A", "first", "go"))
            .member(Agent::new("B", "second", "go"))
            .build()
            .unwrap()
    }

    #[test]
    fn empty_team_is_rejected() {
        let err = Team::builder("Nobody").build().unwrap_err();
        assert!(err.to_string().contains("Nobody"));
    }

    #[test]
    fn chain_feeds_document_then_outputs() {
        let team = two_member_team();
        let runner = EchoRunner::default();
        let input = TeamInput::new("job")
            .with_document(Document::from_text("cv.pdf", "cv text"))
            .with_instructions(Some("Be concise".into()));

        let out = tokio_test::block_on(team.run(&runner, &input, None)).unwrap();
        assert_eq!(out.text, "B(A(cv text))");
        assert_eq!(out.stats.stages, 2);

        let seen = runner.seen.lock().unwrap();
        assert_eq!(seen[0].prior.as_deref(), Some("cv text"));
        assert_eq!(seen[1].prior.as_deref(), Some("A(cv text)"));
        assert!(seen.iter().all(|r| r.task == "job"));
        assert!(seen.iter().all(|r| r.instructions.as_deref() == Some("Be concise")));
    }

    #[test]
    fn prompt_only_first_stage_has_no_prior() {
        let team = two_member_team();
        let runner = EchoRunner::default();
        let out = tokio_test::block_on(team.run(&runner, &TeamInput::new("prompt"), None)).unwrap();
        assert_eq!(out.text, "B(A())");
        assert!(runner.seen.lock().unwrap()[0].prior.is_none());
    }

    #[test]
    fn phase_brief_locates_stage() {
        let team = two_member_team();
        let brief = team.phase_brief(2);
        assert!(brief.starts_with("Phase 1 then phase 2"));
        assert!(brief.contains("phase 2 of 2 in the Pair workflow, as B"));
    }

    #[test]
    fn hr_team_shape() {
        let team = hr_recruitment_team();
        let names: Vec<&str> = team.members().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["CVParser", "JobMatcher", "ReportWriter"]);
        assert!(!team.uses_web_search());
        assert!(team.members()[0].has_tool(AgentTool::Reasoning));
        assert!(team.members().iter().all(|a| a.markdown));
    }

    #[test]
    fn stock_team_shape() {
        let team = stock_analysis_team();
        let names: Vec<&str> = team.members().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["NewsFetcher", "AnalysisAgent", "ReportWriter", "DataVisualizer"]
        );
        assert!(team.uses_web_search());
        assert!(team.workflow().contains("Phase 4 - Visualization"));
    }
}
