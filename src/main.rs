use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tabscraper::{
    config::{Job, JobsFile},
    export::write_table,
    logging, Extraction, Pipeline, Policy,
};
use tracing::{error, info};

/// Run the fetch → extract → normalize jobs listed in a YAML file.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Job file to read.
    #[arg(short, long, default_value = "jobs.yaml", env = "TABSCRAPER_JOBS")]
    config: PathBuf,

    /// Run only this job (repeatable). All jobs run when omitted.
    #[arg(short, long)]
    job: Vec<String>,

    /// Override every job's record policy.
    #[arg(long, value_enum)]
    policy: Option<Policy>,

    /// Rows of each table to print.
    #[arg(long, default_value_t = 5)]
    rows: usize,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    logging::init("info");
    let args = Args::parse();
    info!(config = %args.config.display(), "startup");

    // ─── 2) load and select jobs ─────────────────────────────────────
    let file = JobsFile::load(&args.config)?;
    let jobs: Vec<&Job> = if args.job.is_empty() {
        file.jobs.iter().collect()
    } else {
        args.job
            .iter()
            .map(|name| {
                file.job(name)
                    .with_context(|| format!("no job named `{}` in {:?}", name, args.config))
            })
            .collect::<Result<_>>()?
    };
    if jobs.is_empty() {
        info!("no jobs; exit");
        return Ok(());
    }

    // ─── 3) run each job; one failure does not stop the rest ─────────
    let mut failed = 0usize;
    for job in jobs {
        if let Err(e) = run_job(job, args.policy, args.rows) {
            failed += 1;
            error!(job = %job.name, "job failed: {:#}", e);
        }
    }

    // ─── 4) summary ──────────────────────────────────────────────────
    if failed > 0 {
        bail!("{} job(s) failed", failed);
    }
    info!("all jobs done");
    Ok(())
}

fn run_job(job: &Job, policy: Option<Policy>, rows: usize) -> Result<()> {
    let policy = policy.or(job.policy).unwrap_or_default();
    let pipeline = Pipeline::new(job.fetcher_config(), policy)?;
    let Extraction { table, report } = pipeline.run(&job.url, &job.query()?, &job.source)?;

    println!("== {} ==", job.name);
    println!("{}", table.head(rows));
    if !report.is_clean() {
        println!("tolerated: {}", report);
    }

    if let Some(out) = &job.output {
        write_table(&table, &out.path, out.format)
            .with_context(|| format!("writing {:?}", out.path))?;
        info!(job = %job.name, path = %out.path.display(), rows = table.len(), "wrote table");
    }
    Ok(())
}
