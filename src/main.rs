use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use chem_disclosure::app::ports::RecordSourcePort;
use chem_disclosure::app::{validate_source, ClassifyUseCase};
use chem_disclosure::constants::CONFIG_ENV_VAR;
use chem_disclosure::infra::{FileOutputAdapter, FlatRecordSource, JoinedRecordSource, ReferenceFiles};
use chem_disclosure::observability::init_logging;
use chem_disclosure::Config;

#[derive(Parser)]
#[command(name = "chem_disclosure")]
#[command(about = "Data-quality classification and mass inference for chemical disclosure records")]
#[command(version = "0.1.0")]
struct Cli {
    /// Directory for the rolling JSON log file
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RecordArgs {
    /// Flat JSON-lines file, one ingredient record per line
    #[arg(long, conflicts_with_all = ["events", "ingredients"])]
    records: Option<PathBuf>,
    /// JSON-lines event table (used with --ingredients)
    #[arg(long, requires = "ingredients")]
    events: Option<PathBuf>,
    /// JSON-lines ingredient table keyed by event_id
    #[arg(long, requires = "events")]
    ingredients: Option<PathBuf>,
}

impl RecordArgs {
    fn source(&self) -> Result<Arc<dyn RecordSourcePort>> {
        match (&self.records, &self.events, &self.ingredients) {
            (Some(records), _, _) => Ok(Arc::new(FlatRecordSource::new(records))),
            (None, Some(events), Some(ingredients)) => {
                Ok(Arc::new(JoinedRecordSource::new(events, ingredients)))
            }
            _ => bail!("Provide either --records or both --events and --ingredients"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a batch of records and infer ingredient masses
    Run {
        #[command(flatten)]
        input: RecordArgs,
        /// Reference vocabulary JSON (cas -> synonyms)
        #[arg(long)]
        vocabulary: PathBuf,
        /// Proprietary/hiding label table JSON
        #[arg(long)]
        labels: PathBuf,
        /// TOML configuration; falls back to $CHEM_DISCLOSURE_CONFIG, then defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Classified records, JSON lines
        #[arg(long)]
        output: PathBuf,
        /// Usable records only, JSON lines
        #[arg(long)]
        usable_output: Option<PathBuf>,
        /// Run summary JSON
        #[arg(long)]
        summary: Option<PathBuf>,
        /// Unresolved CAS work list JSON
        #[arg(long)]
        curation: Option<PathBuf>,
    },
    /// Load records and check event-level consistency without classifying
    Validate {
        #[command(flatten)]
        input: RecordArgs,
    },
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let path = path.or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Config::load(&path).with_context(|| format!("Invalid configuration in {}", path.display()))
        }
        None => {
            info!("No configuration file given, using defaults");
            Ok(Config::default())
        }
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let _guard = init_logging(&cli.log_dir);

    match cli.command {
        Commands::Run {
            input,
            vocabulary,
            labels,
            config,
            output,
            usable_output,
            summary,
            curation,
        } => {
            println!("🧪 Running classification pipeline...");
            let config = load_config(config)?;
            let adapter = FileOutputAdapter::new(&output)
                .with_usable(usable_output)
                .with_summary(summary)
                .with_curation(curation);
            let use_case = ClassifyUseCase::new(
                input.source()?,
                Arc::new(ReferenceFiles::new(vocabulary, labels)),
                Arc::new(adapter),
                config,
            );

            match use_case.run() {
                Ok(outcome) => {
                    println!("\n📊 Classification Results:");
                    println!("   Records: {}", outcome.summary.total_records);
                    println!("   Events: {}", outcome.summary.total_events);
                    println!("   Usable records: {}", outcome.summary.usable_records);
                    println!("   Events with inferred mass: {}", outcome.summary.in_tolerance_events);
                    println!("   Unresolved CAS values: {}", outcome.unresolved_cas);
                    println!("   Output file: {}", output.display());
                    println!("✅ Classification completed successfully");
                }
                Err(e) => {
                    error!("Classification failed: {:#}", e);
                    println!("❌ Classification failed: {:#}", e);
                    return Err(e);
                }
            }
        }
        Commands::Validate { input } => {
            println!("🔍 Validating input records...");
            let source = input.source()?;
            let outcome = validate_source(source.as_ref())?;
            println!("   Records: {}", outcome.records);
            println!("   Events: {}", outcome.events);
            println!("   Records without record_id: {}", outcome.placeholder_records);
            println!("✅ Event-level fields are consistent");
        }
    }
    Ok(())
}
