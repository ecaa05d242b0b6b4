//! Import the student roster from a `roll,name` file.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use valentine::bootstrapper::init_tracing;
use valentine::config::{database::DatabaseConfig, logging::LoggingConfig};
use valentine::db;
use valentine::services::roster::{Roster, RosterImporter};

#[derive(Parser)]
#[command(name = "valentine-seed")]
#[command(about = "Upsert students by roll number from a roll,name file")]
struct Args {
    /// Roster file, one `roll,name` per line
    #[arg(long, default_value = "student-list.csv")]
    file: PathBuf,

    /// Report what would change without writing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    dotenvy::dotenv().ok();
    init_tracing(&LoggingConfig::from_env());

    let text = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Cannot read roster {}", args.file.display()))?;
    let roster = Roster::parse(&text);
    for line in &roster.malformed_lines {
        tracing::warn!(line, "Skipping malformed roster line");
    }
    if roster.entries.is_empty() {
        println!("No students found in {}.", args.file.display());
        return Ok(());
    }

    let database = DatabaseConfig::from_env().context("Invalid database configuration")?;
    let conn = db::connect(&database)
        .await
        .context("Database unavailable")?;
    let importer = RosterImporter::new(conn);

    let summary = if args.dry_run {
        importer.plan(&roster).await?
    } else {
        importer.import(&roster).await?
    };

    println!("{}", summary);
    Ok(())
}
