use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cinetrack_importer::config::Config;
use cinetrack_importer::importer::report::ImportReport;
use cinetrack_importer::importer::Importer;
use cinetrack_importer::logging;
use cinetrack_importer::storage::InMemoryStore;

#[derive(Parser)]
#[command(name = "cinetrack-importer")]
#[command(about = "CineTrack bulk catalog CSV importer")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a full-database CSV (one 'type' discriminator column per row)
    Import {
        /// Path to the CSV source; a header row is required
        file: PathBuf,
        /// Print per-row failure diagnostics after the summary
        #[arg(long)]
        diagnostics: bool,
        /// Emit the report as JSON instead of the text summary
        #[arg(long)]
        json: bool,
    },
}

fn print_report(report: &ImportReport, diagnostics: bool) {
    println!("\n📊 Import results:");
    println!("   Inserted: {}", report.inserted);
    println!("   Skipped:  {}", report.skipped);
    println!("   Failed:   {}", report.failed);

    if diagnostics && !report.diagnostics.is_empty() {
        println!("\n⚠️  Failures:");
        for diagnostic in &report.diagnostics {
            println!(
                "   - row {} [{}]: {}",
                diagnostic.row_number, diagnostic.type_tag, diagnostic.message
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    logging::init_logging(&config.logging.dir);

    let cli = Cli::parse();

    match cli.command {
        Commands::Import { file, diagnostics, json } => {
            let store = Arc::new(InMemoryStore::new());
            let importer = Importer::new(store)
                .with_timeout(Duration::from_secs(config.import.timeout_seconds));

            let report = importer.import_file(&file).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report, diagnostics);
            }

            std::process::exit(report.exit_code());
        }
    }
}
