//! Object storage access.
//!
//! The pipeline only needs three operations, so storage is modeled as the
//! narrow `ObjectStore` trait. `GcsClient` talks to the Google Cloud Storage
//! JSON API; tests substitute an in-memory store.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};

use crate::defaults::StorageConfig;
use crate::error::{Error, Result, StorageRequestFailedDetails};
use crate::utils::command::{self, ProcessRunner};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub trait ObjectStore {
    /// Download an object's contents.
    fn read(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Whether an object exists.
    fn exists(&self, bucket: &str, key: &str) -> Result<bool>;

    /// Upload a local file, overwriting any existing object.
    fn upload(&self, bucket: &str, key: &str, local_path: &Path) -> Result<()>;
}

/// Render a `gs://` URI for logs and output.
pub fn to_gcs_uri(bucket: &str, key: &str) -> String {
    format!("gs://{}/{}", bucket, key)
}

/// Google Cloud Storage client over the JSON API.
pub struct GcsClient {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

impl GcsClient {
    /// Build a client from config, resolving an access token once.
    pub fn new(config: &StorageConfig, runner: &dyn ProcessRunner) -> Result<Self> {
        let token = resolve_access_token(&config.access_token_env, runner);
        if token.is_none() {
            tracing::warn!("no storage access token found, sending anonymous requests");
        }
        Self::with_token(config, token)
    }

    pub fn with_token(config: &StorageConfig, token: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            Error::config_invalid_value(
                "storage.endpoint",
                Some(config.endpoint.clone()),
                e.to_string(),
            )
        })?;

        let client = Client::builder()
            .user_agent(format!("chart-release/{}", VERSION))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::internal_io(e.to_string(), Some("create HTTP client".to_string())))?;

        Ok(Self {
            client,
            endpoint,
            token,
        })
    }

    fn authorize(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl ObjectStore for GcsClient {
    fn read(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let url = media_url(&self.endpoint, bucket, key)?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .map_err(|e| transport_error("GET", bucket, key, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::storage_object_not_found(bucket, key));
        }
        let response = require_success(response, "GET", bucket, key)?;

        let bytes = response
            .bytes()
            .map_err(|e| transport_error("GET", bucket, key, e))?;
        Ok(bytes.to_vec())
    }

    fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let url = object_url(&self.endpoint, bucket, key)?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .map_err(|e| transport_error("GET", bucket, key, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        require_success(response, "GET", bucket, key)?;
        Ok(true)
    }

    fn upload(&self, bucket: &str, key: &str, local_path: &Path) -> Result<()> {
        let body = std::fs::read(local_path).map_err(|e| {
            Error::internal_io(
                e.to_string(),
                Some(format!("read {}", local_path.display())),
            )
        })?;

        let url = upload_url(&self.endpoint, bucket, key)?;
        let response = self
            .authorize(self.client.post(url))
            .header(reqwest::header::CONTENT_TYPE, content_type_for(key))
            .body(body)
            .send()
            .map_err(|e| transport_error("POST", bucket, key, e))?;

        require_success(response, "POST", bucket, key)?;
        Ok(())
    }
}

/// Metadata URL: `{endpoint}/storage/v1/b/{bucket}/o/{key}`.
///
/// The object name is a single path segment, so `/` in keys is percent-encoded.
pub fn object_url(endpoint: &Url, bucket: &str, key: &str) -> Result<Url> {
    let mut url = endpoint.clone();
    url.path_segments_mut()
        .map_err(|_| {
            Error::config_invalid_value(
                "storage.endpoint",
                Some(endpoint.to_string()),
                "endpoint cannot be a base URL",
            )
        })?
        .pop_if_empty()
        .extend(["storage", "v1", "b", bucket, "o", key]);
    Ok(url)
}

/// Download URL: the metadata URL with `alt=media`.
pub fn media_url(endpoint: &Url, bucket: &str, key: &str) -> Result<Url> {
    let mut url = object_url(endpoint, bucket, key)?;
    url.query_pairs_mut().append_pair("alt", "media");
    Ok(url)
}

/// Simple upload URL: `{endpoint}/upload/storage/v1/b/{bucket}/o?uploadType=media&name={key}`.
pub fn upload_url(endpoint: &Url, bucket: &str, key: &str) -> Result<Url> {
    let mut url = endpoint.clone();
    url.path_segments_mut()
        .map_err(|_| {
            Error::config_invalid_value(
                "storage.endpoint",
                Some(endpoint.to_string()),
                "endpoint cannot be a base URL",
            )
        })?
        .pop_if_empty()
        .extend(["upload", "storage", "v1", "b", bucket, "o"]);
    url.query_pairs_mut()
        .append_pair("uploadType", "media")
        .append_pair("name", key);
    Ok(url)
}

fn content_type_for(key: &str) -> &'static str {
    if key.ends_with(".tgz") || key.ends_with(".tar.gz") {
        "application/gzip"
    } else if key.ends_with(".json") {
        "application/json"
    } else {
        "application/octet-stream"
    }
}

/// Resolve a bearer token: the configured env var first, then gcloud.
fn resolve_access_token(env_var: &str, runner: &dyn ProcessRunner) -> Option<String> {
    if let Ok(token) = std::env::var(env_var) {
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Some(token);
        }
    }

    let cwd = std::env::temp_dir();
    match runner.run(
        "gcloud",
        &command::args(["auth", "print-access-token"]),
        &cwd,
    ) {
        Ok(output) if !output.stdout_trimmed().is_empty() => {
            Some(output.stdout_trimmed().to_string())
        }
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(error = %err, "gcloud access token lookup failed");
            None
        }
    }
}

fn require_success(response: Response, method: &str, bucket: &str, key: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(Error::storage_request_failed(StorageRequestFailedDetails {
        method: method.to_string(),
        bucket: bucket.to_string(),
        object: key.to_string(),
        status: Some(status.as_u16()),
        error: body,
    }))
}

fn transport_error(method: &str, bucket: &str, key: &str, err: reqwest::Error) -> Error {
    Error::storage_request_failed(StorageRequestFailedDetails {
        method: method.to_string(),
        bucket: bucket.to_string(),
        object: key.to_string(),
        status: err.status().map(|s| s.as_u16()),
        error: err.to_string(),
    })
    .with_hint("Check network access and storage credentials, then rerun the release")
}
