// src/config.rs
//
// YAML job files for the `tabscraper` runner:
//
//   jobs:
//     - name: complaints
//       url: https://www.consumerfinance.gov/data-research/consumer-complaints/search/api/v1/
//       params: { size: 10 }
//       source: { kind: json, hits_path: [hits, hits], nested_key: _source }
//       output: { path: out/complaints.csv }

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_yaml::Value as Yaml;
use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::export::ExportFormat;
use crate::extract::{Extractor, Policy};
use crate::fetch::{FetcherConfig, DEFAULT_TIMEOUT};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobsFile {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Job {
    pub name: String,
    pub url: String,
    /// Scalars only; numbers and booleans are sent in their YAML spelling.
    #[serde(default)]
    pub params: BTreeMap<String, Yaml>,
    #[serde(default)]
    pub policy: Option<Policy>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    pub source: Extractor,
    #[serde(default)]
    pub output: Option<Output>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Output {
    pub path: PathBuf,
    #[serde(default)]
    pub format: Option<ExportFormat>,
}

impl JobsFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        Self::parse(&text).with_context(|| format!("parsing {:?}", path))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let file: JobsFile = serde_yaml::from_str(text)?;
        let mut names = HashSet::new();
        for job in &file.jobs {
            if !names.insert(job.name.as_str()) {
                bail!("duplicate job name `{}`", job.name);
            }
            job.query()?;
        }
        Ok(file)
    }

    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.name == name)
    }
}

impl Job {
    /// Query parameters as the flat string map the fetcher takes.
    pub fn query(&self) -> Result<BTreeMap<String, String>> {
        self.params
            .iter()
            .map(|(k, v)| {
                let s = match v {
                    Yaml::String(s) => s.clone(),
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    other => bail!(
                        "job `{}`: parameter `{}` must be a scalar, got {:?}",
                        self.name,
                        k,
                        other
                    ),
                };
                Ok((k.clone(), s))
            })
            .collect()
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig::default().with_timeout(
            self.timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
        )
    }
}
