use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Base chart-release config directory (~/.config/chart-release/ on all platforms)
pub fn chart_release() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected(
                "APPDATA environment variable not set on Windows".to_string(),
            )
        })?;
        Ok(PathBuf::from(appdata).join("chart-release"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected(
                "HOME environment variable not set on Unix-like system".to_string(),
            )
        })?;
        Ok(PathBuf::from(home).join(".config").join("chart-release"))
    }
}

/// Global chart-release.json config file path
pub fn config_json() -> Result<PathBuf> {
    Ok(chart_release()?.join("chart-release.json"))
}
