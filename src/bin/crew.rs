//! CLI binary for edgequake-crew.
//!
//! A thin shim over the library crate that maps CLI flags to `CrewConfig`,
//! runs a preset team and prints the final report.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_crew::{
    build_runner, extract, list_pdfs, report_with, resolve_pdf, screen_cv_with, CrewConfig,
    ProgressCallback, TeamProgressCallback, DEFAULT_CV_DIR, DEFAULT_JOB_DESCRIPTION,
    DEFAULT_REPORT_PROMPT, DEFAULT_SCREEN_INSTRUCTIONS,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner naming the running stage, plus a ✓/✗ line per finished stage.
///
/// The final stage's answer is streamed to stdout as it arrives; the spinner
/// is cleared before the first fragment is printed. With `show_stages`,
/// every intermediate output is printed to stderr.
struct CliProgressCallback {
    spinner: bool,
    status: bool,
    show_stages: bool,
    stream: bool,
    bar: Mutex<Option<ProgressBar>>,
    stage_start: Mutex<Option<Instant>>,
    /// The current run's final answer has been written to stdout.
    streamed: AtomicBool,
    ends_with_newline: AtomicBool,
}

impl CliProgressCallback {
    fn new(spinner: bool, status: bool, show_stages: bool, stream: bool) -> Arc<Self> {
        Arc::new(Self {
            spinner,
            status,
            show_stages,
            stream,
            bar: Mutex::new(None),
            stage_start: Mutex::new(None),
            streamed: AtomicBool::new(false),
            ends_with_newline: AtomicBool::new(true),
        })
    }

    fn new_spinner(team: &str) -> ProgressBar {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix(team.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    }

    /// Whether the last run's final answer already reached stdout.
    fn took_stream(&self) -> bool {
        self.streamed.load(Ordering::SeqCst)
    }

    fn clear_bar(&self) {
        if let Ok(mut bar) = self.bar.lock() {
            if let Some(bar) = bar.take() {
                bar.finish_and_clear();
            }
        }
    }

    fn println(&self, line: String) {
        match self.bar.lock().ok().as_deref().and_then(Option::as_ref) {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    fn elapsed_secs(&self) -> f64 {
        self.stage_start
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl TeamProgressCallback for CliProgressCallback {
    fn on_run_start(&self, team: &str, total_stages: usize) {
        self.streamed.store(false, Ordering::SeqCst);
        self.ends_with_newline.store(true, Ordering::SeqCst);
        if self.spinner {
            if let Ok(mut bar) = self.bar.lock() {
                if let Some(old) = bar.replace(Self::new_spinner(team)) {
                    old.finish_and_clear();
                }
            }
        }
        if self.status {
            self.println(format!(
                "{} {}",
                cyan("◆"),
                bold(&format!("{team}: {total_stages} stages"))
            ));
        }
    }

    fn on_stage_start(&self, index: usize, total_stages: usize, agent: &str) {
        if let Ok(mut t) = self.stage_start.lock() {
            *t = Some(Instant::now());
        }
        if let Ok(bar) = self.bar.lock() {
            if let Some(ref bar) = *bar {
                bar.set_message(format!("[{index}/{total_stages}] {agent}…"));
            }
        }
    }

    fn on_stage_delta(&self, index: usize, total_stages: usize, _agent: &str, delta: &str) {
        if !self.stream || index != total_stages || delta.is_empty() {
            return;
        }
        if !self.streamed.swap(true, Ordering::SeqCst) {
            self.clear_bar();
        }
        let mut out = io::stdout().lock();
        // A closed stdout surfaces again when the report is written.
        out.write_all(delta.as_bytes()).ok();
        out.flush().ok();
        self.ends_with_newline
            .store(delta.ends_with('\n'), Ordering::SeqCst);
    }

    fn on_stage_complete(&self, index: usize, total_stages: usize, agent: &str, output: &str) {
        let final_streamed = index == total_stages && self.took_stream();
        if final_streamed && !self.ends_with_newline.load(Ordering::SeqCst) {
            io::stdout().lock().write_all(b"\n").ok();
        }
        let secs = self.elapsed_secs();
        if self.status {
            self.println(format!(
                "  {} [{index}/{total_stages}] {:<16} {}  {}",
                green("✓"),
                agent,
                dim(&format!("{:>6} chars", output.len())),
                dim(&format!("{secs:.1}s")),
            ));
        }
        if self.show_stages && !final_streamed {
            self.println(format!("{}\n{}\n", dim(&format!("── {agent} ──")), output));
        }
    }

    fn on_stage_error(&self, index: usize, total_stages: usize, agent: &str, error: &str) {
        let secs = self.elapsed_secs();
        if !self.status {
            return;
        }
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.println(format!(
            "  {} [{index}/{total_stages}] {:<16} {}  {}",
            red("✗"),
            agent,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
    }

    fn on_run_complete(&self, _total_stages: usize, _completed: usize) {
        self.clear_bar();
    }
}

impl Drop for CliProgressCallback {
    fn drop(&mut self) {
        self.clear_bar();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Screen every CV in the default directory against the built-in job
  crew screen

  # Screen a directory against your own job description
  crew screen ./cvs --job job.txt

  # Stock market report (built-in Apple prompt)
  crew report

  # Report on your own prompt, printing every stage as it finishes
  crew report "Summarise this week's NVIDIA news" --show-stages

  # Just extract a CV's text (no API key needed)
  crew extract cvs/jane_doe.pdf

  # JSON output with per-stage results and token counts
  crew --json screen ./cvs > reports.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium (skips auto-download)
  RUST_LOG                Log filter (overrides -v / -q)
"#;

/// Run sequential LLM agent teams: CV screening and stock-news reports.
#[derive(Parser, Debug)]
#[command(
    name = "crew",
    version,
    about = "Run sequential LLM agent teams: CV screening and stock-news reports",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    llm: LlmArgs,

    /// Output structured JSON instead of Markdown.
    #[arg(long, global = true, env = "CREW_JSON")]
    json: bool,

    /// Print every intermediate stage output to stderr.
    #[arg(long, global = true, env = "CREW_SHOW_STAGES")]
    show_stages: bool,

    /// Print the final report only once it is complete instead of streaming it.
    #[arg(long, global = true, env = "CREW_NO_STREAM")]
    no_stream: bool,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "CREW_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "CREW_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the final report.
    #[arg(short, long, global = true, env = "CREW_QUIET")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct LlmArgs {
    /// LLM model ID (default: gpt-4o-mini).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "CREW_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Max output tokens per stage.
    #[arg(long, global = true, env = "CREW_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Per-stage LLM call timeout in seconds (0 = none).
    #[arg(long, global = true, env = "CREW_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Web-search results given to search-enabled agents.
    #[arg(long, global = true, env = "CREW_SEARCH_RESULTS", default_value_t = 5)]
    search_results: usize,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Screen every PDF CV in a directory with the HR recruitment team.
    Screen {
        /// Directory containing the CVs.
        #[arg(default_value = DEFAULT_CV_DIR)]
        dir: PathBuf,

        /// Text file with the job description (default: Fullstack Developer).
        #[arg(long, env = "CREW_JOB")]
        job: Option<PathBuf>,

        /// Free-text instruction attached to every stage.
        #[arg(long, env = "CREW_INSTRUCTIONS", default_value = DEFAULT_SCREEN_INSTRUCTIONS)]
        instructions: String,

        /// PDF user password for encrypted CVs.
        #[arg(long, env = "CREW_PASSWORD")]
        password: Option<String>,
    },

    /// Produce a stock market report with the analysis team.
    Report {
        /// What the report should cover.
        #[arg(default_value = DEFAULT_REPORT_PROMPT)]
        prompt: String,

        /// Free-text instruction attached to every stage.
        #[arg(long, env = "CREW_INSTRUCTIONS")]
        instructions: Option<String>,
    },

    /// Print the extracted text of a PDF (no API key needed).
    Extract {
        /// PDF file.
        file: PathBuf,

        /// PDF user password.
        #[arg(long, env = "CREW_PASSWORD")]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; library INFO logs
    // would tear through it, so they are hidden while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Extract {
            ref file,
            ref password,
        } => run_extract(&cli, file, password.clone()).await,
        Command::Screen {
            ref dir,
            ref job,
            ref instructions,
            ref password,
        } => {
            let job = match job {
                Some(path) => tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read job description from {:?}", path))?,
                None => DEFAULT_JOB_DESCRIPTION.to_string(),
            };
            run_screen(&cli, dir, job.trim(), instructions, password.clone(), show_progress).await
        }
        Command::Report {
            ref prompt,
            ref instructions,
        } => run_report(&cli, prompt, instructions.clone(), show_progress).await,
    }
}

/// Download and cache libpdfium before the first extraction, with a byte
/// progress bar when not quiet.
fn ensure_pdf_engine(quiet: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }
    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;
    dl_bar.finish_and_clear();
    Ok(())
}

async fn run_extract(cli: &Cli, file: &PathBuf, password: Option<String>) -> Result<()> {
    let mut builder = CrewConfig::builder();
    if let Some(pwd) = password {
        builder = builder.password(pwd);
    }
    let config = builder.build().context("Invalid configuration")?;

    // Bad paths fail here, before any download.
    resolve_pdf(file).with_context(|| format!("Failed to extract {}", file.display()))?;
    ensure_pdf_engine(cli.quiet)?;

    let doc = extract(file, &config)
        .await
        .with_context(|| format!("Failed to extract {}", file.display()))?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&doc).context("Failed to serialise document")?
        );
    } else {
        write_stdout(doc.text())?;
        if !cli.quiet {
            eprintln!(
                "{}",
                dim(&format!("{} pages, {} chars", doc.page_count(), doc.text().len()))
            );
        }
    }
    Ok(())
}

async fn run_screen(
    cli: &Cli,
    dir: &PathBuf,
    job: &str,
    instructions: &str,
    password: Option<String>,
    show_progress: bool,
) -> Result<()> {
    let pdfs = list_pdfs(dir).with_context(|| format!("Failed to list CVs in {}", dir.display()))?;
    if pdfs.is_empty() {
        eprintln!("No PDF files found in {}", dir.display());
        return Ok(());
    }
    ensure_pdf_engine(cli.quiet)?;

    let progress = progress_callback(cli, show_progress);
    let mut config = build_config(cli, Some(instructions.to_string()), progress.clone())?;
    config.password = password;

    let runner = build_runner(&config).context("Failed to initialise LLM provider")?;
    let mut reports = Vec::with_capacity(pdfs.len());

    for path in &pdfs {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if !cli.json {
            println!("\n--- Processing {name} ---\n");
        }

        let report = screen_cv_with(&runner, path, job, &config)
            .await
            .with_context(|| format!("Screening failed for {name}"))?;

        if cli.json {
            reports.push(report);
        } else {
            print_final(progress.as_deref(), &report.output.text)?;
            print_stats(cli, &report.output.stats);
        }
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).context("Failed to serialise reports")?
        );
    }
    Ok(())
}

async fn run_report(
    cli: &Cli,
    prompt: &str,
    instructions: Option<String>,
    show_progress: bool,
) -> Result<()> {
    let progress = progress_callback(cli, show_progress);
    let config = build_config(cli, instructions, progress.clone())?;
    let runner = build_runner(&config).context("Failed to initialise LLM provider")?;

    let output = report_with(&runner, prompt, &config)
        .await
        .context("Report generation failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else {
        print_final(progress.as_deref(), &output.text)?;
        print_stats(cli, &output.stats);
    }
    Ok(())
}

/// Print a team's final answer unless it was already streamed to stdout.
fn print_final(progress: Option<&CliProgressCallback>, text: &str) -> Result<()> {
    match progress {
        Some(cb) if cb.took_stream() => Ok(()),
        _ => write_stdout(text),
    }
}

/// Map global CLI args to `CrewConfig`.
fn build_config(
    cli: &Cli,
    instructions: Option<String>,
    progress: Option<Arc<CliProgressCallback>>,
) -> Result<CrewConfig> {
    let mut builder = CrewConfig::builder()
        .stream(!cli.no_stream)
        .temperature(cli.llm.temperature)
        .max_tokens(cli.llm.max_tokens)
        .api_timeout_secs(cli.llm.api_timeout)
        .search_max_results(cli.llm.search_results);

    if let Some(ref model) = cli.llm.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.llm.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(text) = instructions.filter(|t| !t.trim().is_empty()) {
        builder = builder.instructions(text);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb as ProgressCallback);
    }

    builder.build().context("Invalid configuration")
}

/// The terminal callback for a Markdown run; JSON output gets none.
fn progress_callback(cli: &Cli, show_progress: bool) -> Option<Arc<CliProgressCallback>> {
    (!cli.json).then(|| {
        CliProgressCallback::new(show_progress, !cli.quiet, cli.show_stages, !cli.no_stream)
    })
}

fn print_stats(cli: &Cli, stats: &edgequake_crew::RunStats) {
    if cli.quiet {
        return;
    }
    eprintln!(
        "\n   {} stages  /  {} tokens in  /  {} tokens out  /  {}ms total",
        stats.stages,
        dim(&stats.total_input_tokens.to_string()),
        dim(&stats.total_output_tokens.to_string()),
        stats.total_duration_ms,
    );
}

fn write_stdout(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    handle.flush().context("Failed to flush stdout")
}
