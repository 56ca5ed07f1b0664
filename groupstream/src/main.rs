//! Groupstream CLI - Export sorted join rows as nested NDJSON
//!
//! # Commands
//!
//! ```bash
//! groupstream export rows.csv -o out.ndjson     # Reservations with nested lines
//! groupstream nest rows.csv --key order_id \
//!     --child-id item_id --children item_qty    # Any layout, schema-less
//! groupstream detect rows.csv                   # Show delimiter and columns
//! ```
//!
//! Options not given on the command line come from `GROUPSTREAM_*`
//! environment variables, read from `.env` when present.

use clap::{Parser, Subcommand};
use groupstream::config::parse_delimiter;
use groupstream::source::format_delimiter;
use groupstream::{
    export_reservations_file, nest_file, CsvSource, ExportOptions, ExportStats, NestSpec, Record,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "groupstream")]
#[command(about = "Stream sorted join rows into nested NDJSON records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export reservations (rows sorted by reservation_id) with their lines
    Export {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// CSV delimiter, `\t` for tab (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<String>,

        /// Rows the reader may run ahead of the pipeline
        #[arg(long)]
        channel_capacity: Option<usize>,

        /// Don't log progress to stderr
        #[arg(short, long)]
        quiet: bool,
    },

    /// Nest any CSV layout (rows sorted by the key column)
    Nest {
        /// Input CSV file
        input: PathBuf,

        /// Grouping key column
        #[arg(short, long)]
        key: String,

        /// Column identifying a child row
        #[arg(long)]
        child_id: String,

        /// Other child columns, comma separated
        #[arg(long, value_delimiter = ',')]
        children: Vec<String>,

        /// Name of the child array in the output
        #[arg(long, default_value = groupstream::transform::DEFAULT_CHILDREN_FIELD)]
        into: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// CSV delimiter, `\t` for tab (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<String>,

        /// Don't log progress to stderr
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show the detected delimiter and the header of a CSV file
    Detect {
        /// Input CSV file
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Export {
            input,
            output,
            delimiter,
            channel_capacity,
            quiet,
        } => {
            cmd_export(
                &input,
                output.as_deref(),
                delimiter.as_deref(),
                channel_capacity,
                quiet,
            )
            .await
        }

        Commands::Nest {
            input,
            key,
            child_id,
            children,
            into,
            output,
            delimiter,
            quiet,
        } => {
            let spec = NestSpec::new(key, child_id, children).with_children_field(into);
            cmd_nest(&input, output.as_deref(), &spec, delimiter.as_deref(), quiet)
        }

        Commands::Detect { input } => cmd_detect(&input),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Environment options with command-line overrides applied.
fn options(
    delimiter: Option<&str>,
    quiet: bool,
) -> Result<ExportOptions, Box<dyn std::error::Error>> {
    let mut options = ExportOptions::from_env();

    if let Some(raw) = delimiter {
        let d = parse_delimiter(raw).ok_or_else(|| format!("Invalid delimiter: {:?}", raw))?;
        options.delimiter = Some(d);
    }
    options.quiet |= quiet;

    Ok(options)
}

async fn cmd_export(
    input: &Path,
    output: Option<&Path>,
    delimiter: Option<&str>,
    channel_capacity: Option<usize>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = options(delimiter, quiet)?;
    if let Some(n) = channel_capacity {
        options.channel_capacity = n.max(1);
    }

    let stats = export_reservations_file(input, output, &options).await?;
    print_summary(&stats, output, options.quiet)
}

fn cmd_nest(
    input: &Path,
    output: Option<&Path>,
    spec: &NestSpec,
    delimiter: Option<&str>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = options(delimiter, quiet)?;

    let stats = nest_file(input, output, spec, &options)?;
    print_summary(&stats, output, options.quiet)
}

fn cmd_detect(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = CsvSource::<Record>::open_records(input, None)?;
    let headers: Vec<&str> = source.headers().collect();

    println!("Delimiter: '{}'", format_delimiter(source.delimiter()));
    println!("Columns ({}): {}", headers.len(), headers.join(", "));
    Ok(())
}

fn print_summary(
    stats: &ExportStats,
    output: Option<&Path>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if quiet {
        return Ok(());
    }
    if let Some(path) = output {
        eprintln!("💾 Output written to: {}", path.display());
    }
    eprintln!("{}", serde_json::to_string(stats)?);
    Ok(())
}
