//! Agents: a named role/instruction pairing forwarded to the model.

use serde::{Deserialize, Serialize};

/// Capabilities an agent can carry into its stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentTool {
    /// Ask the model to reason step by step before answering.
    Reasoning,
    /// Run a web search on the task and attach the results to the request.
    WebSearch,
}

/// One member of a team.
///
/// Built once at start-up and never mutated while a team runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    pub role: String,
    pub instructions: String,
    pub tools: Vec<AgentTool>,
    /// Ask for markdown-formatted output. Default: true.
    pub markdown: bool,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            instructions: instructions.into(),
            tools: Vec::new(),
            markdown: true,
        }
    }

    pub fn with_tool(mut self, tool: AgentTool) -> Self {
        if !self.tools.contains(&tool) {
            self.tools.push(tool);
        }
        self
    }

    pub fn markdown(mut self, v: bool) -> Self {
        self.markdown = v;
        self
    }

    pub fn has_tool(&self, tool: AgentTool) -> bool {
        self.tools.contains(&tool)
    }
}
