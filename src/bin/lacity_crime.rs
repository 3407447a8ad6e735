use anyhow::Result;
use clap::Parser;
use std::{collections::BTreeMap, path::PathBuf, time::Duration};
use tabscraper::{
    export::write_table, logging, Extraction, Extractor, FetcherConfig, Pipeline, Policy,
};
use tracing::info;

const CRIME_URL: &str = "https://data.lacity.org/api/views/2nrs-mtv8/rows.xml";

/// LA City crime data XML export → table.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    #[arg(long, default_value = CRIME_URL)]
    url: String,

    /// Repeating element that holds one record.
    #[arg(long, default_value = "row")]
    tag: String,

    /// The full export is large; allow longer than the default.
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    logging::init("info");
    let args = Args::parse();

    let mut params = BTreeMap::new();
    params.insert("accessType".to_string(), "DOWNLOAD".to_string());

    let config = FetcherConfig::default().with_timeout(Duration::from_secs(args.timeout_secs));
    let source = Extractor::Xml {
        tag: args.tag.clone(),
    };
    let Extraction { table, .. } =
        Pipeline::new(config, Policy::Lenient)?.run(&args.url, &params, &source)?;

    println!("{}", table.head(5));

    if let Some(path) = &args.out {
        write_table(&table, path, None)?;
        info!(path = %path.display(), rows = table.len(), "wrote crime rows");
    }
    Ok(())
}
