#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the apprehension dashboard.
//!
//! ```text
//! aprehensys summary [--municipality X] [--commune Y] [--leader Z] [--json]
//! aprehensys insights [--municipality X] [--max-records 50] [--language español]
//! aprehensys sources
//! aprehensys serve
//! ```
//!
//! `--config <file>` and `--url <url>` override the source definition for
//! every subcommand. Running with no subcommand enters interactive mode.

mod interactive;
mod report;

use std::path::PathBuf;

use aprehensys_ai::InsightOptions;
use aprehensys_analytics_models::{FilterSelection, MapDefaults};
use aprehensys_apprehension_models::Apprehension;
use aprehensys_source::source_def::SourceDefinition;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "aprehensys",
    about = "Summaries, AI insights, and an API server for apprehension records"
)]
struct Cli {
    /// Source definition TOML file (overrides `APREHENSYS_SOURCE_CONFIG`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// CSV export URL (overrides `APREHENSYS_CSV_URL`)
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Filter flags shared by the data subcommands. Omitted flags and `all`
/// match every record.
#[derive(Args)]
struct SelectionArgs {
    /// Municipality to filter by
    #[arg(long)]
    municipality: Option<String>,
    /// Commune to filter by
    #[arg(long)]
    commune: Option<String>,
    /// Operation leader to filter by
    #[arg(long)]
    leader: Option<String>,
}

impl From<&SelectionArgs> for FilterSelection {
    fn from(args: &SelectionArgs) -> Self {
        Self::from_params(
            args.municipality.as_deref(),
            args.commune.as_deref(),
            args.leader.as_deref(),
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print statistics, histograms, and map points for a selection
    Summary {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Print the full dashboard as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate narrative insights for a selection
    Insights {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Maximum number of records sent to the model
        #[arg(long, default_value_t = aprehensys_ai::insights::DEFAULT_MAX_RECORDS)]
        max_records: usize,
        /// Language the insights are written in
        #[arg(long, default_value = aprehensys_ai::insights::DEFAULT_LANGUAGE)]
        language: String,
    },
    /// Print the resolved source definition
    Sources,
    /// Start the API server
    Serve,
}

/// Downloads and normalizes the source, returning the admitted records.
async fn load_records(
    definition: &SourceDefinition,
) -> Result<Vec<Apprehension>, Box<dyn std::error::Error>> {
    let normalized = aprehensys_source::load(definition).await?;
    if !normalized.rejections.is_empty() {
        println!(
            "Loaded {} records ({} rows rejected)",
            normalized.records.len(),
            normalized.rejections.len()
        );
    }
    Ok(normalized.records)
}

/// Prints the summary report (or JSON) for `selection`.
fn print_summary(
    records: &[Apprehension],
    selection: &FilterSelection,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let dashboard =
        aprehensys_analytics::build_dashboard(records, selection, &MapDefaults::default());
    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
    } else {
        print!("{}", report::format_dashboard(&dashboard));
    }
    Ok(())
}

/// Generates and prints insights for `selection`.
async fn print_insights(
    records: &[Apprehension],
    selection: &FilterSelection,
    options: &InsightOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let filtered = aprehensys_analytics::filter(records, selection);
    if filtered.is_empty() {
        eprintln!("No hay datos para analizar. Aplique filtros diferentes.");
        return Ok(());
    }

    let provider = aprehensys_ai::providers::create_provider_from_env()?;
    println!(
        "Analyzing {} of {} records...\n",
        filtered.len().min(options.max_records),
        filtered.len()
    );
    let insights = aprehensys_ai::generate_insights(provider.as_ref(), &filtered, options).await?;
    println!("{insights}");
    Ok(())
}

/// Runs the API server on its own actix system.
async fn serve(definition: SourceDefinition) -> Result<(), Box<dyn std::error::Error>> {
    // The server uses actix-web's runtime, so it runs in a blocking task to
    // avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(aprehensys_server::run_server(definition))
    })
    .await??;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let definition =
        aprehensys_source::registry::resolve_source(cli.config.as_deref(), cli.url.as_deref())?;
    log::debug!("Resolved source '{}' ({})", definition.id, definition.name);

    let Some(command) = cli.command else {
        return interactive::run(definition).await;
    };

    match command {
        Commands::Summary { selection, json } => {
            let records = load_records(&definition).await?;
            print_summary(&records, &FilterSelection::from(&selection), json)?;
        }
        Commands::Insights {
            selection,
            max_records,
            language,
        } => {
            let records = load_records(&definition).await?;
            let options = InsightOptions {
                max_records,
                language,
            };
            print_insights(&records, &FilterSelection::from(&selection), &options).await?;
        }
        Commands::Sources => {
            print!("{}", toml::to_string_pretty(&definition)?);
        }
        Commands::Serve => serve(definition).await?,
    }

    Ok(())
}
