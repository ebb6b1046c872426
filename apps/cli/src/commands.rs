//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::Section;
use color_eyre::eyre::{Report, Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use clausemap_core::{
    BatchReport, DocumentOutcome, Pipeline, ProgressReporter, extract_document,
    process_documents, summarize_framework,
};
use clausemap_shared::{
    AppConfig, ClausemapError, Obligation, RunConfig, init_config, load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Clausemap: map policy obligations into a compliance framework.
#[derive(Parser)]
#[command(
    name = "clausemap",
    version,
    about = "Extract obligations from policy documents and map them into a compliance framework.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Process documents and merge their obligations into a framework.
    Run {
        /// Documents to process, in order (.txt, .md; others need a registered reader).
        /// With none, the framework is only re-summarized.
        documents: Vec<PathBuf>,

        /// Framework workbook (JSON) to merge into.
        #[arg(short, long)]
        framework: PathBuf,

        /// Where to write the updated framework (defaults to --framework).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Skip generating concise observations.
        #[arg(long)]
        no_summarize: bool,

        /// Re-process documents already merged into this framework.
        #[arg(long)]
        force: bool,

        /// Also write every extracted obligation to this JSON file.
        #[arg(long)]
        obligations_out: Option<PathBuf>,
    },

    /// Extract obligations from one document and print them.
    Extract {
        /// Document to read.
        document: PathBuf,

        /// Print JSON instead of a numbered list.
        #[arg(long)]
        json: bool,
    },

    /// Recompute concise observations for an existing framework.
    Summarize {
        /// Framework workbook (JSON).
        #[arg(short, long)]
        framework: PathBuf,

        /// Where to write the result (defaults to --framework).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "clausemap=info",
        1 => "clausemap=debug",
        _ => "clausemap=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            documents,
            framework,
            out,
            no_summarize,
            force,
            obligations_out,
        } => {
            cmd_run(
                documents,
                framework,
                out,
                no_summarize,
                force,
                obligations_out.as_deref(),
            )
            .await
        }
        Command::Extract { document, json } => cmd_extract(&document, json),
        Command::Summarize { framework, out } => cmd_summarize(framework, out),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(
    documents: Vec<PathBuf>,
    framework: PathBuf,
    out: Option<PathBuf>,
    no_summarize: bool,
    force: bool,
    obligations_out: Option<&Path>,
) -> Result<()> {
    let config = load_config()?;
    let pipeline = Pipeline::from_config(&config)?;

    let mut run = RunConfig::new(&config, framework, out);
    run.force = force;
    if no_summarize {
        run.summarize = false;
    }

    info!(
        documents = documents.len(),
        framework = %run.framework_path.display(),
        output = %run.output_path.display(),
        "processing documents"
    );

    let reporter = CliProgress::new();
    let report = process_documents(&pipeline, &run, &documents, &reporter)
        .await
        .map_err(with_retry_hint)?;

    if let Some(path) = obligations_out {
        write_obligations(path, &report)?;
    }
    print_report(&report);
    Ok(())
}

fn cmd_extract(document: &Path, json: bool) -> Result<()> {
    let config = load_config()?;
    let pipeline = Pipeline::from_config(&config)?;
    let (document, obligations) = extract_document(&pipeline, document)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&obligations)?);
        return Ok(());
    }

    println!(
        "Read {} ({} characters)",
        document.path.display(),
        document.text.chars().count()
    );
    for warning in &document.warnings {
        println!("  warning: {warning}");
    }
    if obligations.is_empty() {
        println!("No relevant obligations found.");
        return Ok(());
    }

    println!("Found {} relevant clauses:", obligations.len());
    println!();
    for (i, o) in obligations.iter().enumerate() {
        println!("{:>3}. [{}] {}", i + 1, o.domain, o.text);
        println!("     {} via \"{}\"", o.category, o.matched_keyword);
    }
    Ok(())
}

fn cmd_summarize(framework: PathBuf, out: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;
    let pipeline = Pipeline::from_config(&config)?;
    let output = out.unwrap_or_else(|| framework.clone());

    let report =
        summarize_framework(&pipeline, &framework, &output).map_err(with_retry_hint)?;

    println!();
    println!("  Concise observations generated!");
    println!("  Rows:       {}", report.rows);
    println!("  Summarized: {}", report.rows_summarized);
    if !report.initialized_columns.is_empty() {
        println!("  Added:      {}", report.initialized_columns.join(", "));
    }
    println!("  Path:       {}", report.output_path.display());
    println!();
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

fn print_report(report: &BatchReport) {
    println!();
    println!("  {}", capitalize(report.status().message()));
    println!("  Processed:   {}", report.processed());
    println!("  Skipped:     {}", report.skipped());
    println!("  Failed:      {}", report.failed());
    println!("  Obligations: {}", report.obligations_found());
    println!("  Rows filled: {}", report.rows_updated);
    if let Some(summarized) = report.rows_summarized {
        println!("  Summarized:  {summarized}");
    }
    println!("  Documents merged into this framework so far: {}", report.total_processed);
    println!("  Path:        {}", report.output_path.display());
    println!("  Time:        {:.1}s", report.elapsed.as_secs_f64());

    if !report.initialized_columns.is_empty() {
        println!(
            "  Note: framework lacked {}; created empty",
            report.initialized_columns.join(", ")
        );
    }
    for doc in &report.documents {
        if let DocumentOutcome::Failed { error } = &doc.outcome {
            println!("  Failed: {}: {error}", doc.path.display());
        }
        for warning in &doc.warnings {
            println!("  Warning: {}: {warning}", doc.path.display());
        }
    }
    println!();
}

fn write_obligations(path: &Path, report: &BatchReport) -> Result<()> {
    let documents: Vec<serde_json::Value> = report
        .documents
        .iter()
        .filter(|d| matches!(d.outcome, DocumentOutcome::Processed { .. }))
        .map(|d| {
            let obligations: &[Obligation] = d.obligations();
            serde_json::json!({
                "document": d.path.display().to_string(),
                "obligations": obligations,
            })
        })
        .collect();

    let json = serde_json::to_string_pretty(&documents)?;
    std::fs::write(path, json)
        .wrap_err_with(|| format!("failed to write obligations to {}", path.display()))?;
    info!(path = %path.display(), "obligations written");
    Ok(())
}

/// Errors the operator can clear without changing inputs get a retry hint.
fn with_retry_hint(err: ClausemapError) -> Report {
    if err.is_recoverable() {
        Report::new(err).suggestion("resolve the condition above, then run the same command again")
    } else {
        Report::new(err)
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_read(&self, path: &Path, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Reading [{current}/{total}] {}", path.display()));
    }

    fn done(&self, _report: &BatchReport) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        // Clears the spinner when a run aborts early.
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_requires_framework() {
        assert!(Cli::try_parse_from(["clausemap", "run", "a.txt"]).is_err());

        let cli = Cli::try_parse_from([
            "clausemap",
            "run",
            "a.txt",
            "b.md",
            "--framework",
            "f.json",
            "--no-summarize",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Run {
                documents,
                no_summarize,
                out,
                ..
            } => {
                assert_eq!(documents, vec![PathBuf::from("a.txt"), PathBuf::from("b.md")]);
                assert!(no_summarize);
                assert!(out.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn run_accepts_no_documents() {
        let cli = Cli::try_parse_from(["clausemap", "run", "--framework", "f.json"]).unwrap();
        match cli.command {
            Command::Run { documents, .. } => assert!(documents.is_empty()),
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn retry_hint_only_for_recoverable_errors() {
        // Sections attach only through the color-eyre handler.
        let _ = color_eyre::install();
        let missing = with_retry_hint(ClausemapError::StorageNotFound("f.json".into()));
        assert!(format!("{missing:?}").contains("run the same command again"));

        let fatal = with_retry_hint(ClausemapError::parse("bad json"));
        assert!(!format!("{fatal:?}").contains("run the same command again"));
    }

    #[test]
    fn log_format_is_global() {
        let cli = Cli::try_parse_from(["clausemap", "config", "show", "--log-format", "json"])
            .unwrap();
        assert!(matches!(cli.log_format, LogFormat::Json));
    }

    #[test]
    fn capitalize_first_letter() {
        assert_eq!(capitalize("no new documents"), "No new documents");
        assert_eq!(capitalize(""), "");
    }
}
