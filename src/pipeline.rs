// src/pipeline.rs

use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

use crate::error::PipelineError;
use crate::extract::{Extraction, Extractor, Policy};
use crate::fetch::{Fetcher, FetcherConfig};

/// fetch → extract → normalize, once per call.
///
/// Holds no state between runs beyond the HTTP client; every run owns its
/// payload and the Table it returns.
#[derive(Debug, Clone)]
pub struct Pipeline {
    fetcher: Fetcher,
    policy: Policy,
}

impl Pipeline {
    pub fn new(config: FetcherConfig, policy: Policy) -> Result<Self, PipelineError> {
        Ok(Self {
            fetcher: Fetcher::new(config)?,
            policy,
        })
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    #[instrument(level = "info", skip(self, params, extractor), fields(format = %extractor.format(), policy = ?self.policy))]
    pub fn run(
        &self,
        endpoint: &str,
        params: &BTreeMap<String, String>,
        extractor: &Extractor,
    ) -> Result<Extraction, PipelineError> {
        let result = self
            .fetcher
            .fetch(endpoint, params)
            .and_then(|payload| extractor.extract(&payload, self.policy));

        match &result {
            Ok(out) => {
                info!(rows = out.table.len(), columns = out.table.width(), report = %out.report, "pipeline finished");
                if !out.report.is_clean() {
                    warn!(report = %out.report, "records were skipped, padded or truncated");
                }
            }
            Err(e) => warn!(stage = %e.stage(), error = %e, "pipeline aborted"),
        }
        result
    }
}
