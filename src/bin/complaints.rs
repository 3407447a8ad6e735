use anyhow::Result;
use clap::Parser;
use std::{collections::BTreeMap, path::PathBuf};
use tabscraper::{
    export::write_table,
    logging,
    summary::{describe, numeric_columns, resample_by_period, value_counts, Period},
    Extraction, Extractor, FetcherConfig, Pipeline, Policy, Table,
};
use tracing::{info, warn};

const COMPLAINTS_URL: &str =
    "https://www.consumerfinance.gov/data-research/consumer-complaints/search/api/v1/";

/// Consumer complaints search API → table, counts and monthly totals.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    #[arg(long, default_value = COMPLAINTS_URL)]
    url: String,

    /// Number of complaints to request.
    #[arg(long, default_value_t = 10)]
    size: u32,

    #[arg(long, value_enum, default_value_t = Policy::Lenient)]
    policy: Policy,

    /// Also write the table here (.csv, .json or .parquet).
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    logging::init("info");
    let args = Args::parse();

    let mut params = BTreeMap::new();
    params.insert("size".to_string(), args.size.to_string());

    let source = Extractor::Json {
        hits_path: vec!["hits".into(), "hits".into()],
        nested_key: Some("_source".into()),
    };
    let Extraction { table, report } =
        Pipeline::new(FetcherConfig::default(), args.policy)?.run(&args.url, &params, &source)?;
    info!(%report, "fetched complaints");

    println!("First few rows:");
    println!("{}\n", table.head(5));

    println!("Descriptive statistics:");
    for (name, d) in describe(&table, &numeric_columns(&table))? {
        println!("{:<24} {}", name, serde_json::to_string(&d)?);
    }

    for column in ["product", "company_response"] {
        print_counts(&table, column);
    }

    println!("\nComplaints per month:");
    match resample_by_period(&table, "date_received", Period::Month) {
        Ok(months) => {
            for (start, n) in months {
                println!("{}  {}", start.format("%Y-%m"), n);
            }
        }
        Err(e) => warn!(error = %e, "no monthly totals"),
    }

    if let Some(path) = &args.out {
        write_table(&table, path, None)?;
        info!(path = %path.display(), rows = table.len(), "wrote complaints");
    }
    Ok(())
}

fn print_counts(table: &Table, column: &str) {
    match value_counts(table, column) {
        Ok(counts) => {
            println!("\nCount by {}:", column);
            for (value, n) in counts {
                println!("{:>5}  {}", n, value);
            }
        }
        Err(e) => warn!(error = %e, "no counts for `{}`", column),
    }
}
