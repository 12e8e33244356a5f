//! Batch lookup command for many queries.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error};

use taxlookup_core::{CompanyRecord, RecordSource};

use super::config::load_config;
use super::lookup::{OutputFormat, csv_header, csv_row, format_record};
use super::{FetchArgs, open_resolver, remember, validate_query};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// File with one tax code or company name per line
    #[arg(required = true)]
    input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each query
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    fetch: FetchArgs,
}

/// Result of looking up a single query.
struct QueryResult {
    query: String,
    record: Option<CompanyRecord>,
    source: Option<RecordSource>,
    error: Option<String>,
    processing_time_ms: u64,
}

/// Read queries from a list file, skipping blank lines and `#` comments.
fn read_queries(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.fetch.apply(&mut config);

    if args.fetch.save && config.store.path.is_none() {
        anyhow::bail!("--save needs a store: pass --store or set store.path in the config");
    }

    let queries = read_queries(&args.input)?;
    if queries.is_empty() {
        anyhow::bail!("No queries found in {}", args.input.display());
    }

    eprintln!(
        "{} Found {} queries to look up",
        style("ℹ").blue(),
        queries.len()
    );

    // Create output directory if specified
    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let mut resolver = open_resolver(&config)?;
    let mut store_changed = false;

    let pb = ProgressBar::new(queries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} queries")?
            .progress_chars("=>-"),
    );

    // Sequential on purpose: one request at a time against the registry.
    let mut results = Vec::with_capacity(queries.len());
    for (index, query) in queries.into_iter().enumerate() {
        let query_start = Instant::now();

        let outcome = match validate_query(&query) {
            Ok(valid) => resolver.resolve(valid).await.map_err(anyhow::Error::from),
            Err(e) => Err(e),
        };

        let processing_time_ms = query_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                if args.fetch.save {
                    store_changed |= remember(&mut resolver, &result);
                }

                if let Some(ref output_dir) = args.output_dir {
                    let output_path = output_dir.join(format!(
                        "{:04}_{}.{}",
                        index + 1,
                        file_stem(&query),
                        args.format.extension()
                    ));
                    fs::write(&output_path, format_record(&result.record, args.format)?)?;
                    debug!("Wrote {}", output_path.display());
                }

                results.push(QueryResult {
                    query,
                    record: Some(result.record),
                    source: Some(result.source),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                error!("Lookup of {:?} failed: {}", query, e);

                if !args.continue_on_error {
                    pb.abandon();
                    return Err(e.context(format!("lookup of {query:?} failed")));
                }

                results.push(QueryResult {
                    query,
                    record: None,
                    source: None,
                    error: Some(e.to_string()),
                    processing_time_ms,
                });
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();

    if store_changed {
        if let Some(store) = resolver.store() {
            store.save()?;
            eprintln!(
                "{} Saved store {} ({} records)",
                style("✓").green(),
                store.path().display(),
                store.len()
            );
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));
        write_summary(&results, &summary_path)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let success = results.iter().filter(|r| r.record.is_some()).count();
    let from_store = results
        .iter()
        .filter(|r| r.source == Some(RecordSource::Store))
        .count();
    let failed = results.len() - success;

    eprintln!();
    eprintln!(
        "{} Looked up {} queries in {:.1}s",
        style("✓").green(),
        results.len(),
        start.elapsed().as_secs_f64()
    );
    eprintln!("  {} found ({} from local store)", success, from_store);
    if failed > 0 {
        eprintln!("  {} {}", style(failed).red(), style("failed").red());
        for result in results.iter().filter(|r| r.error.is_some()) {
            eprintln!(
                "    {} {}: {}",
                style("✗").red(),
                result.query,
                result.error.as_deref().unwrap_or_default()
            );
        }
    }

    Ok(())
}

/// File-name-safe form of a query.
fn file_stem(query: &str) -> String {
    let stem: String = query
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .take(60)
        .collect();
    if stem.is_empty() { "query".to_string() } else { stem }
}

fn write_summary(results: &[QueryResult], path: &Path) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["query", "status", "source", "time_ms"];
    header.extend(csv_header());
    wtr.write_record(&header)?;

    for result in results {
        let time = result.processing_time_ms.to_string();
        let source = match result.source {
            Some(RecordSource::Registry) => "registry",
            Some(RecordSource::Store) => "store",
            None => "",
        };

        let mut row = vec![
            result.query.as_str(),
            if result.record.is_some() { "ok" } else { "error" },
            source,
            time.as_str(),
        ];
        match &result.record {
            Some(record) => row.extend(csv_row(record)),
            None => row.extend(csv_header().iter().map(|_| "")),
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
