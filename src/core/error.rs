use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationInvalidArgument,
    ValidationInvalidJson,

    BuildNotGreen,
    BuildInvalidOutput,

    ChartMissingKey,
    ChartInvalid,

    PackageArchiveCount,

    GitCommandFailed,
    ProcessFailed,

    StorageRequestFailed,
    StorageObjectNotFound,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",
            ErrorCode::ValidationInvalidJson => "validation.invalid_json",

            ErrorCode::BuildNotGreen => "build.not_green",
            ErrorCode::BuildInvalidOutput => "build.invalid_output",

            ErrorCode::ChartMissingKey => "chart.missing_key",
            ErrorCode::ChartInvalid => "chart.invalid",

            ErrorCode::PackageArchiveCount => "package.archive_count",

            ErrorCode::GitCommandFailed => "git.command_failed",
            ErrorCode::ProcessFailed => "process.failed",

            ErrorCode::StorageRequestFailed => "storage.request_failed",
            ErrorCode::StorageObjectNotFound => "storage.object_not_found",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildNotGreenDetails {
    pub bucket: String,
    pub object: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveCountDetails {
    pub pattern: String,
    pub matches: Vec<String>,
}

/// Captured result of an external command that exited unsuccessfully.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessFailedDetails {
    pub program: String,
    pub args: Vec<String>,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageRequestFailedDetails {
    pub method: String,
    pub bucket: String,
    pub object: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
    ) -> Self {
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
            id,
        });

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    pub fn validation_invalid_json(err: serde_json::Error, context: Option<String>) -> Self {
        let details = serde_json::json!({
            "error": err.to_string(),
            "context": context,
        });

        Self::new(ErrorCode::ValidationInvalidJson, "Invalid JSON", details)
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let details = to_details(ConfigInvalidJsonDetails {
            path: path.into(),
            error: err.to_string(),
        });

        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            details,
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = to_details(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.into(),
        });

        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            details,
        )
    }

    /// The latest results record exists but does not report a passing build.
    pub fn build_not_green(
        bucket: impl Into<String>,
        object: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        let details = to_details(BuildNotGreenDetails {
            bucket: bucket.into(),
            object: object.into(),
            status: status.into(),
        });

        Self::new(
            ErrorCode::BuildNotGreen,
            "Latest results aren't green",
            details,
        )
        .with_hint("Wait for the postsubmit job to pass, then rerun the release")
    }

    pub fn build_invalid_output(path: impl Into<String>, problem: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::BuildInvalidOutput,
            "Build step produced unusable build info",
            serde_json::json!({ "path": path.into(), "problem": problem.into() }),
        )
    }

    pub fn chart_missing_key(key: impl Into<String>, path: impl Into<String>) -> Self {
        let details = to_details(MissingKeyDetails {
            key: key.into(),
            path: Some(path.into()),
        });

        Self::new(
            ErrorCode::ChartMissingKey,
            "Chart metadata is missing a required key",
            details,
        )
    }

    pub fn chart_invalid(path: impl Into<String>, problem: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ChartInvalid,
            "Chart metadata is not a YAML mapping",
            serde_json::json!({ "path": path.into(), "problem": problem.into() }),
        )
    }

    pub fn archive_count(pattern: impl Into<String>, matches: Vec<String>) -> Self {
        let message = format!("Expected 1 chart archive to match but found {}", matches.len());
        let details = to_details(ArchiveCountDetails {
            pattern: pattern.into(),
            matches,
        });

        Self::new(ErrorCode::PackageArchiveCount, message, details)
    }

    pub fn git_command_failed(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::GitCommandFailed,
            message,
            Value::Object(serde_json::Map::new()),
        )
    }

    pub fn process_failed(details: ProcessFailedDetails) -> Self {
        let message = format!(
            "{} exited with code {}",
            details.program, details.exit_code
        );
        Self::new(ErrorCode::ProcessFailed, message, to_details(details))
    }

    pub fn storage_request_failed(details: StorageRequestFailedDetails) -> Self {
        let message = match details.status {
            Some(status) => format!("Storage request failed: HTTP {}", status),
            None => format!("Storage request failed: {}", details.error),
        };
        Self::new(ErrorCode::StorageRequestFailed, message, to_details(details))
    }

    pub fn storage_object_not_found(bucket: impl Into<String>, object: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::StorageObjectNotFound,
            "Storage object not found",
            serde_json::json!({ "bucket": bucket.into(), "object": object.into() }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalIoErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalJsonErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}
