use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::paths;

/// Root configuration structure for chart-release.json.
///
/// Every field has a built-in default, so a partial file only overrides the
/// keys it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
    /// Bucket holding the postsubmit job results.
    #[serde(default = "default_results_bucket")]
    pub results_bucket: String,

    /// Postsubmit job whose `latest_green.json` marks the release candidate.
    #[serde(default = "default_job_name")]
    pub job_name: String,

    /// Bucket the chart archive is published to.
    #[serde(default = "default_releases_bucket")]
    pub releases_bucket: String,

    #[serde(default = "default_repo_owner")]
    pub repo_owner: String,

    #[serde(default = "default_repo_name")]
    pub repo_name: String,

    /// Clone URLs are `<repo_url_base>/<owner>/<name>.git`.
    #[serde(default = "default_repo_url_base")]
    pub repo_url_base: String,

    /// Chart directory name at the repository root; also the archive prefix.
    #[serde(default = "default_chart_name")]
    pub chart_name: String,

    /// Build-and-push script, relative to the repository root.
    #[serde(default = "default_build_script")]
    pub build_script: String,

    /// Build info file written by the build script, relative to the repository root.
    #[serde(default = "default_build_info_file")]
    pub build_info_file: String,

    #[serde(default = "default_helm_binary")]
    pub helm_binary: String,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            results_bucket: default_results_bucket(),
            job_name: default_job_name(),
            releases_bucket: default_releases_bucket(),
            repo_owner: default_repo_owner(),
            repo_name: default_repo_name(),
            repo_url_base: default_repo_url_base(),
            chart_name: default_chart_name(),
            build_script: default_build_script(),
            build_info_file: default_build_info_file(),
            helm_binary: default_helm_binary(),
            storage: StorageConfig::default(),
        }
    }
}

/// Object storage connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_endpoint")]
    pub endpoint: String,

    /// Environment variable holding an OAuth access token.
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_storage_endpoint(),
            access_token_env: default_access_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_results_bucket() -> String {
    "mlkube-testing-results".to_string()
}

fn default_job_name() -> String {
    "mlkube-build-postsubmit".to_string()
}

fn default_releases_bucket() -> String {
    "tf-on-k8s-dogfood-releases".to_string()
}

fn default_repo_owner() -> String {
    "tensorflow".to_string()
}

fn default_repo_name() -> String {
    "k8s".to_string()
}

fn default_repo_url_base() -> String {
    "https://github.com".to_string()
}

fn default_chart_name() -> String {
    "tf-job-operator-chart".to_string()
}

fn default_build_script() -> String {
    "images/tf_operator/build_and_push.py".to_string()
}

fn default_build_info_file() -> String {
    "build_info.yaml".to_string()
}

fn default_helm_binary() -> String {
    "helm".to_string()
}

fn default_storage_endpoint() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_access_token_env() -> String {
    "GOOGLE_OAUTH_ACCESS_TOKEN".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load the release config.
///
/// An explicit path must exist and parse. Without one, the default
/// chart-release.json is used when present, and built-in defaults otherwise.
pub fn load_config(path_override: Option<&str>) -> Result<ReleaseConfig> {
    match path_override {
        Some(raw) => {
            let path = PathBuf::from(shellexpand::tilde(raw).into_owned());
            load_config_from_file(&path)
        }
        None => {
            let path = match paths::config_json() {
                Ok(path) => Some(path),
                Err(err) => {
                    tracing::debug!(error = %err, "no default config location");
                    None
                }
            };
            Ok(load_default_config(path.as_deref()))
        }
    }
}

/// Load the default config file, falling back to built-in defaults when the
/// location is unknown, the file is absent, or it cannot be loaded.
fn load_default_config(path: Option<&Path>) -> ReleaseConfig {
    let Some(path) = path.filter(|p| p.exists()) else {
        return ReleaseConfig::default();
    };

    match load_config_from_file(path) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                code = err.code.as_str(),
                "ignoring unusable config file, using built-in defaults"
            );
            ReleaseConfig::default()
        }
    }
}

/// Load config from a specific file.
pub fn load_config_from_file(path: &Path) -> Result<ReleaseConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    let config: ReleaseConfig = serde_json::from_str(&content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &ReleaseConfig) -> Result<()> {
    let required = [
        ("results_bucket", &config.results_bucket),
        ("job_name", &config.job_name),
        ("releases_bucket", &config.releases_bucket),
        ("repo_owner", &config.repo_owner),
        ("repo_name", &config.repo_name),
        ("chart_name", &config.chart_name),
        ("build_script", &config.build_script),
        ("build_info_file", &config.build_info_file),
        ("helm_binary", &config.helm_binary),
    ];

    for (key, value) in required {
        if value.trim().is_empty() {
            return Err(Error::config_invalid_value(
                key,
                Some(value.clone()),
                "must not be empty",
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tempfile::TempDir;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chart-release.json");
        fs::write(
            &path,
            r#"{"releases_bucket": "my-releases", "storage": {"timeout_secs": 30}}"#,
        )
        .unwrap();

        let config = load_config(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.releases_bucket, "my-releases");
        assert_eq!(config.storage.timeout_secs, 30);
        assert_eq!(config.storage.endpoint, "https://storage.googleapis.com");
        assert_eq!(config.chart_name, "tf-job-operator-chart");
        assert_eq!(config.job_name, "mlkube-build-postsubmit");
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let err = load_config(Some("/nonexistent/chart-release.json")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalIoError);
    }

    #[test]
    fn invalid_json_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chart-release.json");
        fs::write(&path, "{not json").unwrap();

        let err = load_config_from_file(&path).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidJson);
    }

    #[test]
    fn empty_value_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chart-release.json");
        fs::write(&path, r#"{"chart_name": ""}"#).unwrap();

        let err = load_config_from_file(&path).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidValue);
        assert_eq!(err.details["key"], "chart_name");
    }

    #[test]
    fn builtin_defaults_match_release_layout() {
        let config = ReleaseConfig::default();
        assert_eq!(config.results_bucket, "mlkube-testing-results");
        assert_eq!(config.releases_bucket, "tf-on-k8s-dogfood-releases");
        assert_eq!(config.build_script, "images/tf_operator/build_and_push.py");
        assert_eq!(config.helm_binary, "helm");
    }

    #[test]
    fn unknown_default_location_uses_builtin_defaults() {
        let config = load_default_config(None);
        assert_eq!(config.chart_name, "tf-job-operator-chart");
    }

    #[test]
    fn absent_default_file_uses_builtin_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_default_config(Some(&dir.path().join("chart-release.json")));
        assert_eq!(config.releases_bucket, "tf-on-k8s-dogfood-releases");
    }

    #[test]
    fn invalid_default_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chart-release.json");
        fs::write(&path, "{not json").unwrap();

        let config = load_default_config(Some(&path));
        assert_eq!(config.releases_bucket, "tf-on-k8s-dogfood-releases");
        assert_eq!(config.job_name, "mlkube-build-postsubmit");
    }

    #[test]
    fn valid_default_file_is_used() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chart-release.json");
        fs::write(&path, r#"{"releases_bucket": "from-file"}"#).unwrap();

        let config = load_default_config(Some(&path));
        assert_eq!(config.releases_bucket, "from-file");
    }
}
