//! Stage execution: turn one agent + one request into one model answer.
//!
//! The coordinator only knows the [`StageRunner`] trait. [`LlmStageRunner`]
//! is the production implementation; tests substitute stubs that record the
//! requests they receive.
//!
//! ## Message layout
//!
//! 1. **System message**: [`crate::prompts::agent_system_prompt`] gives the
//!    name, role and instructions plus the reasoning and markdown directives.
//! 2. **User message**: [`StageRequest::render`], with web-search results
//!    appended when the agent carries the search tool.
//!
//! ## Web search
//!
//! A search-enabled agent first gets one tool-calling round in which the
//! model picks up to [`MAX_SEARCH_QUERIES`] queries for the `web_search`
//! tool. Providers without function calling, or a model that calls no tool,
//! fall back to searching the task text.
//!
//! ## Streaming
//!
//! [`StageRunner::generate_streaming`] hands answer fragments to a sink as
//! they arrive. [`LlmStageRunner`] uses the provider's streaming call when
//! streaming is enabled and supported, and a plain chat call otherwise.
//!
//! No call is retried and the answer is not validated. A failing call fails
//! the stage.

use crate::agent::{Agent, AgentTool};
use crate::config::CrewConfig;
use crate::error::CrewError;
use crate::pipeline::postprocess::tidy_output;
use crate::pipeline::search::{format_results, SearchResult, SearchTool};
use crate::prompts::{agent_system_prompt, SEARCH_PLANNING_DIRECTIVE};
use async_trait::async_trait;
use edgequake_llm::{
    ChatMessage, CompletionOptions, LLMProvider, LlmError, ToolCall, ToolChoice, ToolDefinition,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Name of the search tool offered to search-enabled agents.
pub const SEARCH_TOOL_NAME: &str = "web_search";

/// Most queries a model may run for one stage.
pub const MAX_SEARCH_QUERIES: usize = 3;

/// Everything one stage is asked to work on.
///
/// Built fresh by the coordinator for each stage and dropped right after.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRequest {
    /// The job description or user prompt the whole team works on.
    pub task: String,
    /// Previous stage's output, or the extracted document for the first stage.
    pub prior: Option<String>,
    /// Free-text instruction for this run, e.g. "Be concise".
    pub instructions: Option<String>,
    /// The team's workflow brief, locating this stage among its phases.
    pub workflow: Option<String>,
}

impl StageRequest {
    /// Render the request as the user message text.
    pub fn render(&self) -> String {
        let mut out = format!("<task>\n{}\n</task>", self.task.trim());
        if let Some(ref workflow) = self.workflow {
            out.push_str(&format!("\n\n<workflow>\n{}\n</workflow>", workflow.trim()));
        }
        if let Some(ref prior) = self.prior {
            out.push_str(&format!("\n\n<input>\n{}\n</input>", prior.trim()));
        }
        if let Some(ref instructions) = self.instructions {
            out.push_str(&format!(
                "\n\n<additional_instructions>\n{}\n</additional_instructions>",
                instructions.trim()
            ));
        }
        out
    }
}

/// The text a stage produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutput {
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl StageOutput {
    /// Output with no token accounting, e.g. from a stub runner.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Produces a stage's output for an agent and a request.
#[async_trait]
pub trait StageRunner: Send + Sync {
    async fn generate(&self, agent: &Agent, request: &StageRequest)
        -> Result<StageOutput, CrewError>;

    /// Like [`generate`](Self::generate), handing each fragment of the answer
    /// to `on_delta` as it arrives.
    ///
    /// The default delivers the whole answer as one fragment.
    async fn generate_streaming(
        &self,
        agent: &Agent,
        request: &StageRequest,
        on_delta: &(dyn for<'d> Fn(&'d str) + Send + Sync),
    ) -> Result<StageOutput, CrewError> {
        let output = self.generate(agent, request).await?;
        on_delta(&output.text);
        Ok(output)
    }
}

/// [`StageRunner`] backed by an `edgequake-llm` provider.
pub struct LlmStageRunner {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    timeout: Option<Duration>,
    stream: bool,
    search: Option<Arc<dyn SearchTool>>,
}

impl LlmStageRunner {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &CrewConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
            timeout: config.api_timeout_secs.map(Duration::from_secs),
            stream: config.stream,
            search: None,
        }
    }

    /// Attach the backend used by agents carrying [`AgentTool::WebSearch`].
    pub fn with_search(mut self, search: Arc<dyn SearchTool>) -> Self {
        self.search = Some(search);
        self
    }

    /// System and user message for one stage, running the web search first
    /// when the agent asks for it.
    async fn messages(
        &self,
        agent: &Agent,
        request: &StageRequest,
    ) -> Result<Vec<ChatMessage>, CrewError> {
        let system = agent_system_prompt(agent);
        let mut user = request.render();

        if agent.has_tool(AgentTool::WebSearch) {
            match self.search {
                Some(ref search) => {
                    let queries = self.plan_queries(&system, request).await?;
                    let results = run_searches(search.as_ref(), &queries).await?;
                    user.push_str(&search_section(&results));
                }
                None => debug!("{}: web search requested but no backend attached", agent.name),
            }
        }

        Ok(vec![ChatMessage::system(system), ChatMessage::user(user)])
    }

    /// Let the model choose its search queries through the `web_search`
    /// tool. Falls back to the task text.
    async fn plan_queries(
        &self,
        system: &str,
        request: &StageRequest,
    ) -> Result<Vec<String>, CrewError> {
        let fallback = vec![request.task.trim().to_string()];
        if !self.provider.supports_function_calling() {
            return Ok(fallback);
        }

        let messages = vec![
            ChatMessage::system(system),
            ChatMessage::user(format!(
                "{}\n\n{}",
                request.render(),
                SEARCH_PLANNING_DIRECTIVE
            )),
        ];
        let tools = [search_tool_definition()];
        let call = self.provider.chat_with_tools(
            &messages,
            &tools,
            Some(ToolChoice::required()),
            Some(&self.options),
        );
        let response = with_timeout(self.timeout, call).await?.map_err(llm_error)?;

        let queries = queries_from_tool_calls(&response.tool_calls);
        if queries.is_empty() {
            debug!("Model chose no search query; searching the task text");
            return Ok(fallback);
        }
        info!("Model chose {} search queries: {:?}", queries.len(), queries);
        Ok(queries)
    }
}

#[async_trait]
impl StageRunner for LlmStageRunner {
    async fn generate(
        &self,
        agent: &Agent,
        request: &StageRequest,
    ) -> Result<StageOutput, CrewError> {
        let messages = self.messages(agent, request).await?;

        let call = self.provider.chat(&messages, Some(&self.options));
        let response = with_timeout(self.timeout, call).await?.map_err(llm_error)?;

        info!(
            "{}: {} input tokens, {} output tokens",
            agent.name, response.prompt_tokens, response.completion_tokens
        );

        Ok(StageOutput {
            text: tidy_output(&response.content),
            input_tokens: response.prompt_tokens,
            output_tokens: response.completion_tokens,
        })
    }

    async fn generate_streaming(
        &self,
        agent: &Agent,
        request: &StageRequest,
        on_delta: &(dyn for<'d> Fn(&'d str) + Send + Sync),
    ) -> Result<StageOutput, CrewError> {
        if !self.stream || !self.provider.supports_streaming() {
            let output = self.generate(agent, request).await?;
            on_delta(&output.text);
            return Ok(output);
        }

        let messages = self.messages(agent, request).await?;
        let prompt = single_prompt(&messages);

        let streamed = async {
            let mut stream = self.provider.stream(&prompt).await.map_err(llm_error)?;
            let mut raw = String::new();
            while let Some(fragment) = stream.next().await {
                let fragment = fragment.map_err(llm_error)?;
                if !fragment.is_empty() {
                    on_delta(&fragment);
                    raw.push_str(&fragment);
                }
            }
            Ok::<_, CrewError>(raw)
        };
        let raw = with_timeout(self.timeout, streamed).await??;

        info!("{}: streamed {} chars", agent.name, raw.len());
        Ok(StageOutput::text(tidy_output(&raw)))
    }
}

/// Run every query in order and merge the hits, dropping repeated URLs.
async fn run_searches(
    search: &dyn SearchTool,
    queries: &[String],
) -> Result<Vec<SearchResult>, CrewError> {
    let mut merged: Vec<SearchResult> = Vec::new();
    for query in queries {
        for hit in search.search(query).await? {
            if !merged.iter().any(|seen| seen.url == hit.url) {
                merged.push(hit);
            }
        }
    }
    Ok(merged)
}

fn search_section(results: &[SearchResult]) -> String {
    format!(
        "\n\n<web_search_results>\n{}\n</web_search_results>",
        format_results(results)
    )
}

fn search_tool_definition() -> ToolDefinition {
    ToolDefinition::function(
        SEARCH_TOOL_NAME,
        "Search the web for recent news and articles. Returns titles, snippets and URLs.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "A short search query, e.g. \"Apple AAPL stock news this week\""
                }
            },
            "required": ["query"],
            "additionalProperties": false
        }),
    )
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
}

/// Distinct, non-empty `web_search` queries, at most [`MAX_SEARCH_QUERIES`].
fn queries_from_tool_calls(calls: &[ToolCall]) -> Vec<String> {
    let mut queries: Vec<String> = Vec::new();
    for call in calls.iter().filter(|c| c.name() == SEARCH_TOOL_NAME) {
        match call.parse_arguments::<SearchArgs>() {
            Ok(args) => {
                let query = args.query.trim().to_string();
                if !query.is_empty() && !queries.contains(&query) {
                    queries.push(query);
                }
            }
            Err(e) => warn!("Ignoring malformed {} call: {}", SEARCH_TOOL_NAME, e),
        }
        if queries.len() == MAX_SEARCH_QUERIES {
            break;
        }
    }
    queries
}

/// The provider's streaming call takes one prompt: system text first, then
/// the user message.
fn single_prompt(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

async fn with_timeout<F: Future>(
    limit: Option<Duration>,
    fut: F,
) -> Result<F::Output, CrewError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| CrewError::ApiTimeout {
                secs: limit.as_secs(),
            }),
        None => Ok(fut.await),
    }
}

fn llm_error(e: LlmError) -> CrewError {
    CrewError::LlmApiError {
        message: e.to_string(),
    }
}

/// Build `CompletionOptions` from the crew config.
fn build_options(config: &CrewConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
