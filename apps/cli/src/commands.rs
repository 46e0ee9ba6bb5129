//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use tracing::info;

use sheetsum_core::pipeline::{RunConfig, run_pipeline};
use sheetsum_fetcher::ContentFetcher;
use sheetsum_shared::{AppConfig, init_config, load_config, validate_sheet};
use sheetsum_sheets::SheetsClient;
use sheetsum_summarizer::InferenceSummarizer;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// sheetsum — enrich a spreadsheet of URLs with summaries and categories.
#[derive(Parser)]
#[command(
    name = "sheetsum",
    version,
    about = "Summarize and categorize the URLs listed in a spreadsheet, incrementally.",
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
    /// Run one enrichment pass over the configured sheet.
    Run,

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
        0 => "sheetsum=info",
        1 => "sheetsum=debug",
        _ => "sheetsum=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
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
        Command::Run => cmd_run().await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run() -> Result<()> {
    let config = load_config()?;
    validate_sheet(&config)?;

    info!(
        spreadsheet = %config.sheet.spreadsheet_id,
        read_range = %config.sheet.read_range,
        "starting enrichment run"
    );

    // Collaborators are built per run and dropped when it ends.
    let store = SheetsClient::connect(&config.auth).await?;
    let fetcher = ContentFetcher::new()?;
    let summarizer = InferenceSummarizer::new(&config.summarizer)?;

    let run_config = RunConfig {
        spreadsheet_id: config.sheet.spreadsheet_id.clone(),
        read_range: config.sheet.read_range.clone(),
        write_range: config.sheet.write_range.clone(),
    };

    let report = run_pipeline(&run_config, &store, &fetcher, &summarizer).await?;

    println!();
    println!("  Enrichment run complete!");
    println!("  URLs found:   {}", report.urls_found);
    println!("  Summarized:   {}", report.processed);
    println!("  Skipped:      {} (already summarized)", report.skipped_existing);
    println!("  Failed:       {}", report.failed);
    println!("  Rows written: {}", report.rows_written);
    println!("  Time:         {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
