use anyhow::Result;
use clap::Parser;
use std::{collections::BTreeMap, path::PathBuf};
use tabscraper::{
    export::write_table,
    logging,
    summary::{describe, numeric_columns},
    Extraction, Extractor, FetcherConfig, Pipeline, Policy,
};
use tracing::info;

const COMPANIES_URL: &str =
    "https://en.wikipedia.org/wiki/List_of_largest_companies_in_the_United_States_by_revenue";

/// Wikipedia's largest-companies table → table.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    #[arg(long, default_value = COMPANIES_URL)]
    url: String,

    /// CSS selector of the table to read.
    #[arg(long, default_value = "table.wikitable")]
    selector: String,

    #[arg(long, value_enum, default_value_t = Policy::Lenient)]
    policy: Policy,

    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    logging::init("info");
    let args = Args::parse();

    let source = Extractor::Html {
        selector: args.selector.clone(),
    };
    let Extraction { table, report } = Pipeline::new(FetcherConfig::default(), args.policy)?
        .run(&args.url, &BTreeMap::new(), &source)?;
    if !report.is_clean() {
        info!(%report, "ragged rows were adjusted");
    }

    println!("{}\n", table.head(5));
    for (name, d) in describe(&table, &numeric_columns(&table))? {
        println!("{:<28} {}", name, serde_json::to_string(&d)?);
    }

    if let Some(path) = &args.out {
        write_table(&table, path, None)?;
        info!(path = %path.display(), rows = table.len(), "wrote companies");
    }
    Ok(())
}
