//! CLI response formatting and output.
//!
//! Provides JSON envelope, printing, and exit code mapping.

use chart_release::error::Hint;
use chart_release::{Error, ErrorCode, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CliResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CliError>,
}

#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<Hint>>,
}

impl<T: Serialize> CliResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            Error::internal_json(e.to_string(), Some("serialize response".to_string()))
        })
    }
}

impl CliResponse<()> {
    pub fn from_error(err: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(CliError {
                code: err.code.as_str().to_string(),
                message: err.message.clone(),
                details: err.details.clone(),
                hints: if err.hints.is_empty() {
                    None
                } else {
                    Some(err.hints.clone())
                },
            }),
        }
    }
}

fn print_response<T: Serialize>(response: &CliResponse<T>) -> Result<()> {
    use std::io::{self, Write};

    let payload = response.to_json()?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", payload) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(Error::internal_io(
            e.to_string(),
            Some("write stdout".to_string()),
        ));
    }
    Ok(())
}

/// Print the envelope for `result` and return the process exit code.
pub fn print_result<T: Serialize>(result: Result<T>) -> i32 {
    let (printed, exit_code) = match result {
        Ok(data) => (print_response(&CliResponse::success(data)), 0),
        Err(err) => {
            tracing::error!(code = err.code.as_str(), "{}", err.message);
            (
                print_response(&CliResponse::<()>::from_error(&err)),
                exit_code_for_error(err.code),
            )
        }
    };

    match printed {
        Ok(()) => exit_code,
        Err(err) => {
            eprintln!("{}", err);
            1
        }
    }
}

pub fn exit_code_for_error(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::ConfigInvalidJson
        | ErrorCode::ConfigInvalidValue
        | ErrorCode::ValidationInvalidArgument
        | ErrorCode::ValidationInvalidJson
        | ErrorCode::BuildNotGreen
        | ErrorCode::BuildInvalidOutput
        | ErrorCode::ChartMissingKey
        | ErrorCode::ChartInvalid
        | ErrorCode::PackageArchiveCount => 2,

        ErrorCode::GitCommandFailed
        | ErrorCode::ProcessFailed
        | ErrorCode::StorageRequestFailed
        | ErrorCode::StorageObjectNotFound => 20,

        ErrorCode::InternalIoError
        | ErrorCode::InternalJsonError
        | ErrorCode::InternalUnexpected => 1,
    }
}
