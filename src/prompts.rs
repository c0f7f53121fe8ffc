//! Role prompts, team workflows and default inputs for the preset teams.
//!
//! Every piece of natural-language text sent to the model lives here, so a
//! prompt change is a one-file diff and tests can inspect the exact strings
//! without a provider.

use crate::agent::{Agent, AgentTool};

// ── HR recruitment team ──────────────────────────────────────────────────

pub const CV_PARSER_ROLE: &str = "Extract skills, experiences, education, and other relevant information from CVs in PDF/text/JSON format.";

pub const CV_PARSER_INSTRUCTIONS: &str = "\
From the candidate CV, extract:
- Skills and competencies
- Work experience (roles and duration)
- Education history
- Certifications or achievements
Output a structured JSON summarizing the candidate profile.";

pub const JOB_MATCHER_ROLE: &str =
    "Compare candidate profile with job description and calculate a matching score.";

pub const JOB_MATCHER_INSTRUCTIONS: &str = "\
Using the candidate profile and the job description, analyze:
- Skill fit (technical and soft skills)
- Experience relevance
- Education requirements
- Certifications or achievements
Provide a matching score (1-10) with rationale for each component.";

pub const HR_REPORT_WRITER_ROLE: &str = "Write a recruiter-friendly summary report highlighting candidate fit for the job. Display the report in a table format.";

pub const HR_REPORT_WRITER_INSTRUCTIONS: &str = "\
Create a professional report including:
1. Summary: Overall fit and key highlights
2. Strengths: Skills and experiences matching the job
3. Weaknesses: Gaps or missing competencies
4. Recommendations: Suitability, potential training, or interview focus
Format clearly with headers and bullet points.";

pub const HR_TEAM_NAME: &str = "HR Recruitment Team";

pub const HR_TEAM_WORKFLOW: &str = "\
Execute a coordinated workflow for candidate evaluation:

Phase 1 - CV Parsing:
- CVParser extracts candidate data into a structured profile

Phase 2 - Job Matching:
- JobMatcher compares profile with job description
- Calculate matching score and rationale

Phase 3 - Reporting:
- ReportWriter generates a clear recruiter report
- Highlight strengths, weaknesses, and recommendations

Ensure smooth information flow between agents. Use tables to display the report.";

/// Job description used by `crew screen` when `--job` is not given.
pub const DEFAULT_JOB_DESCRIPTION: &str = "\
Position: Fullstack Developer
Requirements:
- Strong Python and React skills
- Experience with SQL databases
- Bachelor's degree in Computer Science or related";

/// Free-text instruction attached to every CV screening request by default.
pub const DEFAULT_SCREEN_INSTRUCTIONS: &str = "Be concise";

/// Directory scanned by `crew screen` when no directory is given.
pub const DEFAULT_CV_DIR: &str = "AGNO_TEAMS_BAH_IBRAHIM";

// ── Stock market analysis team ───────────────────────────────────────────

pub const NEWS_FETCHER_ROLE: &str =
    "Fetch recent news articles about major tech stocks (AAPL, MSFT, GOOGL, AMZN, TSLA).";

pub const NEWS_FETCHER_INSTRUCTIONS: &str = "\
Retrieve recent stock news from reliable sources (last 7 days) focusing on:
- Earnings reports
- Product announcements
- Executive changes
- Regulatory developments
Include publication dates, sources, and key details.";

pub const ANALYSIS_ROLE: &str =
    "Analyze news articles to extract market sentiment, fundamental insights, and technical cues.";

pub const ANALYSIS_INSTRUCTIONS: &str = "\
Analyze news for:
1. Market sentiment (bullish vs bearish, confidence indicators)
2. Fundamental analysis (financial performance, growth prospects, competitive positioning)
3. Technical insights (price movements, trading volume patterns, support/resistance)
Provide quantitative sentiment scores (1-10) where possible.";

pub const STOCK_REPORT_WRITER_ROLE: &str =
    "Write detailed stock market analysis reports based on collected and analyzed news.";

pub const STOCK_REPORT_WRITER_INSTRUCTIONS: &str = "\
Create a professional investment research report including:
1. Executive Summary: Key highlights, market sentiment, top recommendations
2. Market News Digest: Major developments by company, earnings, product updates
3. Sentiment Analysis: Market mood, bullish vs bearish factors, risk assessment
4. Strategic Insights: Investment implications, sector trends, timing considerations
5. Action Items: Watch list recommendations, key dates, risk management
Format with headers, bullet points, tables, and include disclaimer about investment risks.";

pub const VISUALIZER_ROLE: &str =
    "Generate visualizations for sentiment, trends, and key metrics from the analyzed news.";

pub const VISUALIZER_INSTRUCTIONS: &str = "\
From the analyzed news and sentiment scores, create:
- Charts showing bullish vs bearish sentiment over time
- Trend graphs of stock-specific news impact
- Tables or visuals summarizing key metrics (earnings, product launches, executive changes)
Format visuals clearly and make them easy to interpret for investors in the terminal.";

pub const STOCK_TEAM_NAME: &str = "StockMarketAnalysisTeam";

pub const STOCK_TEAM_WORKFLOW: &str = "\
Execute a coordinated stock market analysis workflow:

Phase 1 - Data Collection:
- NewsFetcher gathers recent news for major stocks
- Ensure data quality and credibility

Phase 2 - Analysis:
- AnalysisAgent processes news for sentiment, fundamentals, and technical insights
- Quantify sentiment where possible

Phase 3 - Reporting:
- ReportWriter synthesizes findings into actionable report
- Include clear investment thesis, recommendations, and risk disclaimers

Phase 4 - Visualization:
- DataVisualizer generates charts, graphs, and tables for key insights
- Ensure visuals are clear, informative, and easy to interpret

Collaborate effectively; ensure smooth information flow between all phases.";

/// Prompt used by `crew report` when none is given on the command line.
pub const DEFAULT_REPORT_PROMPT: &str =
    "Prepare me a report on the latest Apple product announcements with visualizations.";

// ── Shared directives ────────────────────────────────────────────────────

/// Appended to the system prompt of agents carrying [`AgentTool::Reasoning`].
pub const REASONING_DIRECTIVE: &str = "\
Before answering, reason through the problem step by step: restate what is \
being asked, list the evidence available in the input, weigh it, and only \
then write your answer. Do not include the reasoning notes in the final \
answer unless asked to.";

/// Appended to the system prompt of agents with `markdown = true`.
pub const MARKDOWN_DIRECTIVE: &str = "Use markdown to format your answers.";

/// Appended to the request in the query-planning round of a search agent.
pub const SEARCH_PLANNING_DIRECTIVE: &str = "\
Before answering, call the web_search tool with up to three short queries \
that will surface the most recent news relevant to the task. Prefer \
company names and ticker symbols over full sentences.";

/// Build the system message for one agent.
pub fn agent_system_prompt(agent: &Agent) -> String {
    let mut prompt = format!(
        "You are {}.\nYour role: {}\n\n<instructions>\n{}\n</instructions>",
        agent.name, agent.role, agent.instructions
    );
    if agent.has_tool(AgentTool::Reasoning) {
        prompt.push_str("\n\n");
        prompt.push_str(REASONING_DIRECTIVE);
    }
    if agent.markdown {
        prompt.push_str("\n\n");
        prompt.push_str(MARKDOWN_DIRECTIVE);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_contains_role_and_instructions() {
        let agent = Agent::new("CVParser", CV_PARSER_ROLE, CV_PARSER_INSTRUCTIONS);
        let prompt = agent_system_prompt(&agent);
        assert!(prompt.starts_with("You are CVParser."));
        assert!(prompt.contains(CV_PARSER_ROLE));
        assert!(prompt.contains("Output a structured JSON"));
        assert!(prompt.ends_with(MARKDOWN_DIRECTIVE));
        assert!(!prompt.contains(REASONING_DIRECTIVE));
    }

    #[test]
    fn reasoning_directive_only_with_tool() {
        let agent = Agent::new("JobMatcher", JOB_MATCHER_ROLE, JOB_MATCHER_INSTRUCTIONS)
            .with_tool(AgentTool::Reasoning)
            .markdown(false);
        let prompt = agent_system_prompt(&agent);
        assert!(prompt.contains(REASONING_DIRECTIVE));
        assert!(!prompt.contains(MARKDOWN_DIRECTIVE));
    }

    #[test]
    fn default_job_mentions_degree() {
        assert!(DEFAULT_JOB_DESCRIPTION.contains("Bachelor's degree"));
    }
}
