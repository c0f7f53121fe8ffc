//! Top-level entry points: CV screening, stock reports, plain extraction.
//!
//! Each `*_with` variant takes the [`StageRunner`] explicitly; the plain
//! variants build an [`LlmStageRunner`] from the config (provider resolution
//! + DuckDuckGo search) and delegate.

use crate::config::CrewConfig;
use crate::error::CrewError;
use crate::output::{CandidateReport, TeamOutput};
use crate::pipeline::extract::{extract_text, Document};
use crate::pipeline::input;
use crate::pipeline::search::DuckDuckGoSearch;
use crate::pipeline::stage::{LlmStageRunner, StageRunner};
use crate::provider::resolve_provider;
use crate::team::{hr_recruitment_team, stock_analysis_team, TeamInput};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Build the production stage runner for `config`.
pub fn build_runner(config: &CrewConfig) -> Result<LlmStageRunner, CrewError> {
    let provider = resolve_provider(config)?;
    let search = DuckDuckGoSearch::new(config.search_max_results, config.search_timeout_secs)?;
    Ok(LlmStageRunner::new(provider, config).with_search(Arc::new(search)))
}

/// Extract a PDF's text without running any stage.
///
/// Does not require an LLM provider or API key.
pub async fn extract(path: impl AsRef<Path>, config: &CrewConfig) -> Result<Document, CrewError> {
    extract_text(path, config.password.as_deref()).await
}

/// Screen one CV against `job` with the HR recruitment team.
pub async fn screen_cv(
    path: impl AsRef<Path>,
    job: &str,
    config: &CrewConfig,
) -> Result<CandidateReport, CrewError> {
    let runner = build_runner(config)?;
    screen_cv_with(&runner, path, job, config).await
}

/// [`screen_cv`] with an explicit runner.
pub async fn screen_cv_with(
    runner: &dyn StageRunner,
    path: impl AsRef<Path>,
    job: &str,
    config: &CrewConfig,
) -> Result<CandidateReport, CrewError> {
    let document = extract_text(path, config.password.as_deref()).await?;
    screen_document_with(runner, document, job, config).await
}

/// Run the HR team on an already extracted CV.
pub async fn screen_document_with(
    runner: &dyn StageRunner,
    document: Document,
    job: &str,
    config: &CrewConfig,
) -> Result<CandidateReport, CrewError> {
    info!("Screening {}", document.file_name());
    let file_name = document.file_name();
    let path = document.source().to_path_buf();
    let cv_chars = document.text().chars().count();
    let pages = document.page_count();

    let input = TeamInput::new(job)
        .with_document(document)
        .with_instructions(config.instructions.clone());
    let output = hr_recruitment_team()
        .run(runner, &input, config.progress_callback.as_ref())
        .await?;

    Ok(CandidateReport {
        file_name,
        path,
        cv_chars,
        pages,
        output,
    })
}

/// Screen every PDF in `dir`, in file-name order.
///
/// Stops at the first CV that fails; earlier reports are discarded with it.
pub async fn screen_directory(
    dir: impl AsRef<Path>,
    job: &str,
    config: &CrewConfig,
) -> Result<Vec<CandidateReport>, CrewError> {
    let runner = build_runner(config)?;
    screen_directory_with(&runner, dir, job, config).await
}

/// [`screen_directory`] with an explicit runner.
pub async fn screen_directory_with(
    runner: &dyn StageRunner,
    dir: impl AsRef<Path>,
    job: &str,
    config: &CrewConfig,
) -> Result<Vec<CandidateReport>, CrewError> {
    let pdfs = input::list_pdfs(dir)?;
    info!("Screening {} CVs", pdfs.len());

    let mut reports = Vec::with_capacity(pdfs.len());
    for path in &pdfs {
        reports.push(screen_cv_with(runner, path, job, config).await?);
    }
    Ok(reports)
}

/// Produce a stock market report for `prompt` with the analysis team.
pub async fn report(prompt: &str, config: &CrewConfig) -> Result<TeamOutput, CrewError> {
    let runner = build_runner(config)?;
    report_with(&runner, prompt, config).await
}

/// [`report`] with an explicit runner.
pub async fn report_with(
    runner: &dyn StageRunner,
    prompt: &str,
    config: &CrewConfig,
) -> Result<TeamOutput, CrewError> {
    let input = TeamInput::new(prompt).with_instructions(config.instructions.clone());
    stock_analysis_team()
        .run(runner, &input, config.progress_callback.as_ref())
        .await
}
