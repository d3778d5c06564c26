//! rostersync CLI - Preview and apply employee CSV imports
//!
//! # Main Commands
//!
//! ```bash
//! rostersync serve                   # Start HTTP server (port 3000)
//! rostersync preview roster.csv     # Preview an import against an empty roster
//! rostersync apply roster.csv       # Preview + apply, print resulting roster
//! rostersync validate roster.csv    # Rule-chain verdicts only, no roster
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! rostersync parse roster.csv       # Just parse CSV to draft JSON
//! ```

use clap::{Parser, Subcommand};
use rostersync::{
    apply, parse_csv_file_auto, preview_bytes, unrecognized_columns, validate_rows, RosterStore,
    RowStatus,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rostersync")]
#[command(about = "Bulk employee roster import and synchronization", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output the raw drafts as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Preview an import: parse, validate and classify every row
    Preview {
        /// Input CSV file
        input: PathBuf,

        /// Treat rows without a team as valid and auto-create later
        #[arg(long)]
        auto_create_team: bool,

        /// Output file for the preview rows (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the validation rule chain and report per-row verdicts
    Validate {
        /// Input CSV file
        input: PathBuf,

        /// Treat rows without a team as valid and auto-create later
        #[arg(long)]
        auto_create_team: bool,

        /// Output file for the verdicts (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Preview and apply against a fresh roster, printing the result
    Apply {
        /// Input CSV file
        input: PathBuf,

        /// Treat rows without a team as valid and auto-create later
        #[arg(long)]
        auto_create_team: bool,

        /// Output file for the resulting roster (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: ROSTERSYNC_PORT env var, then 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

/// Port resolution order: CLI flag, then ROSTERSYNC_PORT, then 3000.
fn resolve_port(cli_port: Option<u16>) -> u16 {
    cli_port
        .or_else(|| {
            std::env::var("ROSTERSYNC_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
        })
        .unwrap_or(3000)
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Validate {
            input,
            auto_create_team,
            output,
        } => cmd_validate(&input, auto_create_team, output.as_deref()),

        Commands::Preview {
            input,
            auto_create_team,
            output,
        } => cmd_preview(&input, auto_create_team, output.as_deref()),

        Commands::Apply {
            input,
            auto_create_team,
            output,
        } => cmd_apply(&input, auto_create_team, output.as_deref()),

        Commands::Serve { port } => cmd_serve(resolve_port(port)).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_csv_file_auto(input)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.headers.join(", "));
    let ignored = unrecognized_columns(&result.headers);
    if !ignored.is_empty() {
        eprintln!("⚠️  Ignored columns: {}", ignored.join(", "));
    }
    eprintln!("✅ Parsed {} rows", result.rows.len());

    let drafts: Vec<_> = result.rows.iter().map(|r| &r.draft).collect();
    let json = serde_json::to_string_pretty(&drafts)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_validate(
    input: &Path,
    auto_create_team: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Validating: {}", input.display());

    let result = parse_csv_file_auto(input)?;
    let verdicts = validate_rows(&result.rows, auto_create_team);

    let invalid = verdicts.iter().filter(|v| !v.valid).count();
    eprintln!("\n📊 {} rows checked, {} invalid", verdicts.len(), invalid);
    for verdict in verdicts.iter().filter(|v| !v.valid).take(10) {
        eprintln!(
            "   ❌ Row {}: {}",
            verdict.row_index,
            verdict.error.as_deref().unwrap_or("unknown")
        );
    }

    let json = serde_json::to_string_pretty(&verdicts)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_preview(
    input: &Path,
    auto_create_team: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Previewing: {}", input.display());

    let bytes = fs::read(input)?;
    let store = RosterStore::new();
    let preview = preview_bytes(&bytes, &store, auto_create_team)?;

    let stats = preview.stats();
    eprintln!("\n📊 Preview: {} new, {} updates, {} errors", stats.new, stats.updated, stats.errors);
    for row in preview.rows.iter().filter(|r| r.status == RowStatus::Error).take(10) {
        eprintln!(
            "   ❌ Row {}: {}",
            row.row_index,
            row.error_message.as_deref().unwrap_or("unknown")
        );
    }

    let json = serde_json::to_string_pretty(&preview.rows)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_apply(
    input: &Path,
    auto_create_team: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Importing: {}", input.display());

    let bytes = fs::read(input)?;
    let store = RosterStore::new();
    let preview = preview_bytes(&bytes, &store, auto_create_team)?;
    let outcome = apply(&preview, &store)?;

    eprintln!(
        "\n✅ Applied: {} created, {} updated, {} skipped",
        outcome.created, outcome.updated, outcome.skipped
    );

    let roster = store.read();
    let json = serde_json::to_string_pretty(roster.as_ref())?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    rostersync::server::start_server(port).await
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_resolution_order() {
        // Flag > env var > built-in default, checked in one test because
        // the variable is process-wide.
        std::env::remove_var("ROSTERSYNC_PORT");
        assert_eq!(resolve_port(Some(8080)), 8080);
        assert_eq!(resolve_port(None), 3000);

        std::env::set_var("ROSTERSYNC_PORT", "4100");
        assert_eq!(resolve_port(None), 4100);
        assert_eq!(resolve_port(Some(8080)), 8080);

        std::env::set_var("ROSTERSYNC_PORT", "not-a-port");
        assert_eq!(resolve_port(None), 3000);
        std::env::remove_var("ROSTERSYNC_PORT");
    }
}
