//! Lookup command - resolve a single company by tax code or name.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use taxlookup_core::{CompanyRecord, Field, FieldId, LookupResult, RecordSource};

use super::config::load_config;
use super::{FetchArgs, open_resolver, remember, validate_query};

/// Arguments for the lookup command.
#[derive(Args)]
pub struct LookupArgs {
    /// Tax code or company name
    #[arg(required = true)]
    query: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show where the record came from and how long it took
    #[arg(long)]
    show_source: bool,

    #[command(flatten)]
    fetch: FetchArgs,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: LookupArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.fetch.apply(&mut config);

    let query = validate_query(&args.query)?;
    if args.fetch.save && config.store.path.is_none() {
        anyhow::bail!("--save needs a store: pass --store or set store.path in the config");
    }

    let mut resolver = open_resolver(&config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Looking up {query}..."));
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = resolver.resolve(query).await;
    pb.finish_and_clear();
    let result = result?;

    if args.fetch.save && remember(&mut resolver, &result) {
        if let Some(store) = resolver.store() {
            store.save()?;
            eprintln!(
                "{} Saved to {} ({} records)",
                style("✓").green(),
                store.path().display(),
                store.len()
            );
        }
    }

    let output = format_record(&result.record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_source {
        print_source(&result);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn print_source(result: &LookupResult) {
    let source = match result.source {
        RecordSource::Registry => "registry",
        RecordSource::Store => "local store",
    };
    eprintln!();
    eprintln!("{} Source: {}", style("ℹ").blue(), source);
    eprintln!(
        "{} Fields found: {}/{}",
        style("ℹ").blue(),
        result.record.present_fields().len(),
        FieldId::ALL.len()
    );
    eprintln!(
        "{} Processing time: {}ms",
        style("ℹ").blue(),
        result.processing_time_ms
    );
}

pub fn format_record(record: &CompanyRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(record),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

/// CSV header: one column per field.
pub fn csv_header() -> Vec<&'static str> {
    FieldId::ALL.iter().map(|id| id.name()).collect()
}

/// CSV row matching [`csv_header`]. Absent fields become empty cells.
pub fn csv_row(record: &CompanyRecord) -> Vec<&str> {
    FieldId::ALL
        .iter()
        .map(|id| record.get(*id).display_or_empty())
        .collect()
}

fn format_csv(record: &CompanyRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(csv_header())?;
    wtr.write_record(csv_row(record))?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(record: &CompanyRecord) -> String {
    let mut output = String::new();

    for id in FieldId::ALL {
        let value = match record.get(id) {
            Field::Present(value) if value.is_empty() => "\"\"".to_string(),
            Field::Present(value) => value.clone(),
            Field::Absent => "-".to_string(),
        };
        output.push_str(&format!("{:<20} {}\n", id.name(), value));
    }

    output
}
