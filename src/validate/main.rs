//! Offline zone file check.
//!
//! Loads a zone records export the same way the server does and reports
//! every record that would be rejected or warned about.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use zonal::error::Severity;
use zonal::store::{JsonFileSource, ZoneSnapshot, ZoneSource};
use zonal::ZoneKind;

#[derive(Parser, Debug)]
#[command(name = "validate")]
#[command(about = "Validate a zone records JSON file")]
struct Args {
    /// Zone records JSON file
    #[arg(short, long)]
    file: PathBuf,

    /// Only check zones of this owner
    #[arg(long)]
    owner: Option<String>,

    /// Treat configuration warnings as failures
    #[arg(long)]
    strict: bool,

    /// Print diagnostics as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Validating {}", args.file.display());

    let source = JsonFileSource::new(&args.file);
    let records = source.fetch(args.owner.as_deref(), None)?;
    let total = records.len();
    let snapshot = ZoneSnapshot::build(records);

    for kind in ZoneKind::all() {
        let count = snapshot.filtered(None, Some(*kind)).len();
        info!("  {}: {} zones", kind, count);
    }

    let diagnostics = snapshot.diagnostics();
    if args.json {
        println!("{}", serde_json::to_string_pretty(diagnostics)?);
    } else {
        for diag in diagnostics {
            let label = match diag.severity {
                Severity::Rejected => "REJECTED",
                Severity::Warning => "WARNING ",
            };
            println!("{} {:<24} {}", label, diag.zone_id, diag.message);
        }
    }

    let rejected = diagnostics.iter().filter(|d| d.is_rejection()).count();
    let warnings = diagnostics.len() - rejected;
    info!(
        "{} records, {} usable, {} rejected, {} warnings",
        total,
        snapshot.len(),
        rejected,
        warnings
    );

    if rejected > 0 {
        anyhow::bail!("{} zone records failed validation", rejected);
    }
    if args.strict && warnings > 0 {
        anyhow::bail!("{} configuration warnings (strict mode)", warnings);
    }

    Ok(())
}
