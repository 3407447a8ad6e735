// src/fetch/mod.rs

mod payload;

pub use payload::RawPayload;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::PipelineError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = concat!("tabscraper/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Whole-request timeout. Always finite.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetcherConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Issues one blocking GET per call. No retries, no caching.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(PipelineError::Client)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// GET `endpoint` with `query` appended, returning the full body.
    ///
    /// Fails with `Transport` on connection errors and timeouts and with
    /// `HttpStatus` on any 4xx/5xx response.
    #[instrument(level = "info", skip(self, query), fields(endpoint = %endpoint))]
    pub fn fetch(
        &self,
        endpoint: &str,
        query: &BTreeMap<String, String>,
    ) -> Result<RawPayload, PipelineError> {
        let url = build_url(endpoint, query)?;
        debug!(%url, timeout = ?self.config.timeout, "GET");

        let resp = self
            .client
            .get(url.clone())
            .send()
            .map_err(|source| PipelineError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        let final_url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if status.is_client_error() || status.is_server_error() {
            let body = match resp.text() {
                Ok(body) => body,
                Err(e) => {
                    warn!(url = %final_url, error = %e, "could not read error body");
                    format!("<body unreadable: {}>", e)
                }
            };
            warn!(status = status.as_u16(), url = %final_url, "non-success status");
            return Err(PipelineError::HttpStatus {
                url: final_url,
                status: status.as_u16(),
                body,
            });
        }

        let body = resp
            .bytes()
            .map_err(|source| PipelineError::Transport {
                url: final_url.clone(),
                source,
            })?
            .to_vec();

        info!(
            status = status.as_u16(),
            bytes = body.len(),
            content_type = content_type.as_deref().unwrap_or("-"),
            "fetched"
        );

        Ok(RawPayload {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

/// Parse `endpoint` as an absolute http(s) URL and append `query`, encoded.
pub fn build_url(endpoint: &str, query: &BTreeMap<String, String>) -> Result<Url, PipelineError> {
    let invalid = |reason: String| PipelineError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let mut url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// The blocking client must live and die off the async runtime.
    async fn fetch_blocking(
        config: FetcherConfig,
        url: String,
        query: BTreeMap<String, String>,
    ) -> Result<Result<RawPayload, PipelineError>> {
        Ok(tokio::task::spawn_blocking(move || {
            let fetcher = Fetcher::new(config)?;
            fetcher.fetch(&url, &query)
        })
        .await?)
    }

    #[test]
    fn build_url_encodes_and_appends() -> Result<()> {
        let url = build_url(
            "https://example.org/api/v1/?format=json",
            &params(&[("size", "10"), ("search_term", "late fee & more")]),
        )?;
        assert_eq!(
            url.as_str(),
            "https://example.org/api/v1/?format=json&search_term=late+fee+%26+more&size=10"
        );
        Ok(())
    }

    #[test]
    fn rejects_relative_and_non_http_endpoints() {
        for bad in ["/relative/path", "not a url", "ftp://example.org/file"] {
            let err = build_url(bad, &BTreeMap::new()).unwrap_err();
            assert!(
                matches!(err, PipelineError::InvalidEndpoint { .. }),
                "{bad}: {err}"
            );
            assert_eq!(err.stage(), crate::error::Stage::Fetch);
        }
    }

    #[test]
    fn default_timeout_is_finite() {
        let cfg = FetcherConfig::default();
        assert_eq!(cfg.timeout, DEFAULT_TIMEOUT);
        assert!(cfg.timeout > Duration::ZERO);
    }

    #[tokio::test]
    async fn returns_body_and_content_type() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/api/v1/"))
            .and(query_param("size", "10"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"hits":{"hits":[]}}"#, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let payload = fetch_blocking(
            FetcherConfig::default(),
            format!("{}/search/api/v1/", server.uri()),
            params(&[("size", "10")]),
        )
        .await??;

        assert_eq!(payload.status, 200);
        assert_eq!(payload.body, br#"{"hits":{"hits":[]}}"#.to_vec());
        assert_eq!(payload.declares("json"), Some(true));
        assert!(payload.url.contains("size=10"));
        Ok(())
    }

    #[tokio::test]
    async fn http_error_carries_status_and_body() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream busy"))
            .mount(&server)
            .await;

        let err = fetch_blocking(FetcherConfig::default(), server.uri(), BTreeMap::new())
            .await?
            .unwrap_err();

        match &err {
            PipelineError::HttpStatus { status, body, .. } => {
                assert_eq!(*status, 503);
                assert_eq!(body, "upstream busy");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("fetch: HTTP 503"));
        Ok(())
    }

    #[tokio::test]
    async fn not_found_is_an_http_error() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetch_blocking(FetcherConfig::default(), server.uri(), BTreeMap::new())
            .await?
            .unwrap_err();
        assert!(matches!(err, PipelineError::HttpStatus { status: 404, .. }));
        Ok(())
    }

    #[tokio::test]
    async fn slow_server_times_out() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let cfg = FetcherConfig::default().with_timeout(Duration::from_millis(200));
        let err = fetch_blocking(cfg, server.uri(), BTreeMap::new())
            .await?
            .unwrap_err();
        match err {
            PipelineError::Transport { source, .. } => assert!(source.is_timeout()),
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[test]
    fn unreadable_error_body_keeps_the_reason() -> Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let server = std::thread::spawn(move || -> std::io::Result<()> {
            let (mut sock, _) = listener.accept()?;
            let mut req = [0u8; 1024];
            let _ = sock.read(&mut req)?;
            // promises 100 bytes, sends 5, hangs up
            sock.write_all(
                b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\nConnection: close\r\n\r\nshort",
            )?;
            Ok(())
        });

        let fetcher = Fetcher::new(FetcherConfig::default())?;
        let err = fetcher
            .fetch(&format!("http://127.0.0.1:{}/", port), &BTreeMap::new())
            .unwrap_err();
        let _ = server.join();

        match err {
            PipelineError::HttpStatus { status, body, .. } => {
                assert_eq!(status, 500);
                assert!(body.starts_with("<body unreadable:"), "{body}");
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[test]
    fn refused_connection_is_a_transport_error() -> Result<()> {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0")?;
            listener.local_addr()?.port()
        };
        let fetcher = Fetcher::new(FetcherConfig::default())?;
        let err = fetcher
            .fetch(&format!("http://127.0.0.1:{}/", port), &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Transport { .. }));
        assert_eq!(err.stage(), crate::error::Stage::Fetch);
        Ok(())
    }
}
