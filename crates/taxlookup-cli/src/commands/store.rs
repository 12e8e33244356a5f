//! Store command - read the local record store.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use taxlookup_core::{CompanyStore, JsonFileStore};

use super::config::load_config;
use super::lookup::{OutputFormat, csv_header, csv_row, format_record};

/// Arguments for the store command.
#[derive(Args)]
pub struct StoreArgs {
    /// Store file to read instead of the configured one
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: StoreCommand,
}

#[derive(Subcommand)]
enum StoreCommand {
    /// List every stored record
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: OutputFormat,
    },

    /// Show the record stored under a tax code
    Get {
        /// Tax code
        tax_code: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
}

pub fn run(args: StoreArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let Some(path) = args.store.or(config.store.path) else {
        anyhow::bail!("No store configured: pass --store or set store.path in the config");
    };

    let store = JsonFileStore::open(&path)?;

    match args.command {
        StoreCommand::List { format } => list(&store, format),
        StoreCommand::Get { tax_code, format } => {
            let tax_code = tax_code.trim();
            let Some(record) = store.get(tax_code) else {
                anyhow::bail!("No record for {} in {}", tax_code, path.display());
            };
            println!("{}", format_record(&record, format)?);
            Ok(())
        }
    }
}

fn list(store: &JsonFileStore, format: OutputFormat) -> anyhow::Result<()> {
    let records = store.all();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            wtr.write_record(csv_header())?;
            for record in &records {
                wtr.write_record(csv_row(record))?;
            }
            wtr.flush()?;
        }
        OutputFormat::Text => {
            for record in &records {
                println!("{}", format_record(record, format)?);
            }
        }
    }

    eprintln!(
        "{} {} records in {}",
        style("ℹ").blue(),
        records.len(),
        store.path().display()
    );

    Ok(())
}
