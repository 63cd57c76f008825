//! Client for the Copernicus Climate Data Store retrieve API.
//!
//! A retrieval is a job: submit the request, poll until the job settles,
//! resolve the result asset and stream it to disk.
//!
//! ```text
//! POST {url}/retrieve/v1/processes/{dataset}/execution   {"inputs": ...}
//! GET  {url}/retrieve/v1/jobs/{id}                       until "successful"
//! GET  {url}/retrieve/v1/jobs/{id}/results               asset.value.href
//! GET  {href}                                            NetCDF body
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use crate::config::ArchiveConfig;
use crate::request::RetrievalRequest;

pub const DEFAULT_CDS_URL: &str = "https://cds.climate.copernicus.eu/api";

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("CDS credentials not found: {0}")]
    Credentials(String),

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Quota exceeded: {0}")]
    Quota(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Job {job_id} {status}: {message}")]
    JobFailed {
        job_id: String,
        status: String,
        message: String,
    },

    #[error("Unexpected response: {0}")]
    Protocol(String),

    #[error("Download size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything that can turn a retrieval request into a bundle file.
#[async_trait]
pub trait ArchiveClient: Send + Sync {
    /// Retrieve `request` from `dataset` into `target`, returning its size.
    async fn retrieve(
        &self,
        dataset: &str,
        request: &RetrievalRequest,
        target: &Path,
    ) -> Result<u64, ArchiveError>;
}

/// API endpoint and personal access token.
#[derive(Clone, PartialEq, Eq)]
pub struct CdsCredentials {
    pub url: String,
    pub key: String,
}

impl std::fmt::Debug for CdsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdsCredentials")
            .field("url", &self.url)
            .field("key", &"***")
            .finish()
    }
}

impl CdsCredentials {
    /// `CDSAPI_URL`/`CDSAPI_KEY`, else the file named by `CDSAPI_RC`,
    /// else `~/.cdsapirc`.
    pub fn discover() -> Result<Self, ArchiveError> {
        Self::resolve(|name| std::env::var(name).ok())
    }

    fn resolve(env: impl Fn(&str) -> Option<String>) -> Result<Self, ArchiveError> {
        if let Some(key) = env("CDSAPI_KEY").filter(|k| !k.is_empty()) {
            let url = env("CDSAPI_URL")
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_CDS_URL.to_string());
            return Ok(Self { url, key });
        }

        let rc = env("CDSAPI_RC")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(shellexpand::tilde("~/.cdsapirc").as_ref()));

        match std::fs::read_to_string(&rc) {
            Ok(content) => Self::parse_rc(&content).ok_or_else(|| {
                ArchiveError::Credentials(format!("{} has no `key:` entry", rc.display()))
            }),
            Err(e) => Err(ArchiveError::Credentials(format!(
                "set CDSAPI_KEY or create {} ({})",
                rc.display(),
                e
            ))),
        }
    }

    /// Parse `key: value` lines of a `.cdsapirc` file.
    pub fn parse_rc(content: &str) -> Option<Self> {
        let mut url = None;
        let mut key = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            match name.trim() {
                "url" => url = Some(value.trim().to_string()),
                "key" => key = Some(value.trim().to_string()),
                _ => {}
            }
        }

        Some(Self {
            url: url.unwrap_or_else(|| DEFAULT_CDS_URL.to_string()),
            key: key.filter(|k| !k.is_empty())?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    #[serde(rename = "jobID")]
    job_id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct JobResults {
    asset: ResultAsset,
}

#[derive(Debug, Deserialize)]
struct ResultAsset {
    value: AssetValue,
}

#[derive(Debug, Deserialize)]
struct AssetValue {
    href: String,
    #[serde(rename = "file:size")]
    size: Option<u64>,
}

/// RFC 7807 style error body returned by the API.
#[derive(Debug, Default, Deserialize)]
struct ProblemDetails {
    title: Option<String>,
    detail: Option<String>,
}

/// HTTP implementation of [`ArchiveClient`].
pub struct CdsClient {
    client: Client,
    base: String,
    key: String,
    poll_interval: Duration,
}

impl CdsClient {
    pub fn new(credentials: CdsCredentials, settings: &ArchiveConfig) -> Result<Self, ArchiveError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base: credentials.url.trim_end_matches('/').to_string(),
            key: credentials.key,
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
        })
    }

    /// Override the poll interval (tests use milliseconds).
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    async fn submit(
        &self,
        dataset: &str,
        request: &RetrievalRequest,
    ) -> Result<JobStatus, ArchiveError> {
        let url = format!("{}/retrieve/v1/processes/{}/execution", self.base, dataset);
        let response = self
            .client
            .post(&url)
            .header("PRIVATE-TOKEN", &self.key)
            .json(&json!({ "inputs": request }))
            .send()
            .await?;

        let job: JobStatus = check(response).await?.json().await?;
        info!(job_id = %job.job_id, status = %job.status, "Request submitted");
        Ok(job)
    }

    /// Poll until the job is successful or has settled on a failure.
    async fn wait(&self, mut job: JobStatus) -> Result<(), ArchiveError> {
        let url = format!("{}/retrieve/v1/jobs/{}", self.base, job.job_id);
        let mut last_status = job.status.clone();

        loop {
            let status = job.status.clone();
            match status.as_str() {
                "successful" => return Ok(()),
                "failed" | "rejected" | "dismissed" | "deleted" => {
                    let message = self.failure_message(&job.job_id).await;
                    return Err(ArchiveError::JobFailed {
                        job_id: job.job_id,
                        status: job.status,
                        message,
                    });
                }
                pending => {
                    if pending != last_status {
                        info!(job_id = %job.job_id, status = pending, "Job status changed");
                        last_status = pending.to_string();
                    } else {
                        debug!(job_id = %job.job_id, status = pending, "Job pending");
                    }
                }
            }

            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .client
                .get(&url)
                .header("PRIVATE-TOKEN", &self.key)
                .send()
                .await?;
            job = check(response).await?.json().await?;
        }
    }

    /// Best-effort error text for a failed job.
    async fn failure_message(&self, job_id: &str) -> String {
        let url = format!("{}/retrieve/v1/jobs/{}/results", self.base, job_id);
        let body = match self
            .client
            .get(&url)
            .header("PRIVATE-TOKEN", &self.key)
            .send()
            .await
        {
            Ok(response) => response.text().await.unwrap_or_default(),
            Err(_) => String::new(),
        };
        problem_message(&body).unwrap_or_else(|| "no details provided".to_string())
    }

    async fn results(&self, job_id: &str) -> Result<AssetValue, ArchiveError> {
        let url = format!("{}/retrieve/v1/jobs/{}/results", self.base, job_id);
        let response = self
            .client
            .get(&url)
            .header("PRIVATE-TOKEN", &self.key)
            .send()
            .await?;

        let results: JobResults = check(response).await?.json().await?;
        Ok(results.asset.value)
    }

    async fn download(&self, asset: &AssetValue, target: &Path) -> Result<u64, ArchiveError> {
        let base = Url::parse(&format!("{}/", self.base))
            .map_err(|e| ArchiveError::Protocol(format!("invalid API url {}: {}", self.base, e)))?;
        let href = base
            .join(&asset.href)
            .map_err(|e| ArchiveError::Protocol(format!("invalid asset href {}: {}", asset.href, e)))?;

        debug!(href = %href, size = ?asset.size, "Downloading result");
        let response = self.client.get(href).send().await?;
        let response = check(response).await?;

        let written = write_stream(response.bytes_stream(), target).await?;
        if let Some(expected) = asset.size {
            if written != expected {
                return Err(ArchiveError::SizeMismatch {
                    expected,
                    actual: written,
                });
            }
        }
        Ok(written)
    }
}

#[async_trait]
impl ArchiveClient for CdsClient {
    #[instrument(skip(self, request, target), fields(year = %request.year, month = %request.month))]
    async fn retrieve(
        &self,
        dataset: &str,
        request: &RetrievalRequest,
        target: &Path,
    ) -> Result<u64, ArchiveError> {
        let job = self.submit(dataset, request).await?;
        let job_id = job.job_id.clone();
        self.wait(job).await?;

        let asset = self.results(&job_id).await?;
        let bytes = self.download(&asset, target).await?;

        info!(job_id = %job_id, path = %target.display(), bytes, "Download completed");
        Ok(bytes)
    }
}

/// Map non-success statuses onto [`ArchiveError`].
async fn check(response: Response) -> Result<Response, ArchiveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = problem_message(&body).unwrap_or_else(|| status.to_string());

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ArchiveError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => ArchiveError::Quota(message),
        _ => ArchiveError::Rejected {
            status: status.as_u16(),
            message,
        },
    })
}

fn problem_message(body: &str) -> Option<String> {
    let problem: ProblemDetails = serde_json::from_str(body).ok()?;
    match (problem.title, problem.detail) {
        (Some(title), Some(detail)) => Some(format!("{}: {}", title, detail)),
        (title, detail) => detail.or(title),
    }
}

/// Stream a response body to `path`, returning the bytes written.
async fn write_stream<S>(stream: S, path: &Path) -> Result<u64, ArchiveError>
where
    S: Stream<Item = reqwest::Result<Bytes>>,
{
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;

    futures::pin_mut!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_rc() {
        let rc = "url: https://cds.climate.copernicus.eu/api\nkey: abcd-1234\n";
        let creds = CdsCredentials::parse_rc(rc).unwrap();
        assert_eq!(creds.url, "https://cds.climate.copernicus.eu/api");
        assert_eq!(creds.key, "abcd-1234");
    }

    #[test]
    fn test_parse_rc_without_key() {
        assert!(CdsCredentials::parse_rc("url: https://example.com\n").is_none());
        assert!(CdsCredentials::parse_rc("key:\n").is_none());
    }

    #[test]
    fn test_parse_rc_defaults_url() {
        let creds = CdsCredentials::parse_rc("# personal token\nkey: k\nverify: 0\n").unwrap();
        assert_eq!(creds.url, DEFAULT_CDS_URL);
    }

    #[test]
    fn test_env_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let rc = dir.path().join("cdsapirc");
        std::fs::write(&rc, "url: https://rc.example\nkey: from-rc\n").unwrap();

        let mut env = HashMap::new();
        env.insert("CDSAPI_KEY", "from-env".to_string());
        env.insert("CDSAPI_RC", rc.display().to_string());
        let creds = CdsCredentials::resolve(|name| env.get(name).cloned()).unwrap();
        assert_eq!(creds.key, "from-env");
        assert_eq!(creds.url, DEFAULT_CDS_URL);

        env.remove("CDSAPI_KEY");
        let creds = CdsCredentials::resolve(|name| env.get(name).cloned()).unwrap();
        assert_eq!(creds.key, "from-rc");
        assert_eq!(creds.url, "https://rc.example");
    }

    #[test]
    fn test_missing_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let rc = dir.path().join("absent");
        let err = CdsCredentials::resolve(|name| {
            (name == "CDSAPI_RC").then(|| rc.display().to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ArchiveError::Credentials(_)), "{err}");
    }

    #[test]
    fn test_debug_hides_key() {
        let creds = CdsCredentials {
            url: DEFAULT_CDS_URL.to_string(),
            key: "secret".to_string(),
        };
        assert!(!format!("{creds:?}").contains("secret"));
    }

    #[test]
    fn test_problem_message() {
        assert_eq!(
            problem_message(r#"{"title":"Job failed","detail":"too many fields"}"#).as_deref(),
            Some("Job failed: too many fields")
        );
        assert_eq!(
            problem_message(r#"{"detail":"invalid token"}"#).as_deref(),
            Some("invalid token")
        );
        assert_eq!(problem_message("<html>"), None);
    }

    #[test]
    fn test_write_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.nc");
        let chunks: Vec<reqwest::Result<Bytes>> =
            vec![Ok(Bytes::from_static(b"CDF")), Ok(Bytes::from_static(b"\x01rest"))];

        let written =
            tokio_test::block_on(write_stream(futures::stream::iter(chunks), &path)).unwrap();

        assert_eq!(written, 8);
        assert_eq!(std::fs::read(&path).unwrap(), b"CDF\x01rest");
    }
}
