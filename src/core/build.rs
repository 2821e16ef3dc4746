//! Build-and-push step invocation.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::command::ProcessRunner;

/// Build info written by the build-and-push script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildInfoRecord {
    /// Pushed image reference, `name:tag`.
    pub image: String,
}

impl BuildInfoRecord {
    pub fn version(&self) -> &str {
        release_version(&self.image)
    }
}

/// The release version is the image tag: everything after the last `:`.
pub fn release_version(image: &str) -> &str {
    image.rsplit(':').next().unwrap_or(image)
}

/// Run the build script and load the build info it writes.
pub fn run_build(
    runner: &dyn ProcessRunner,
    script: &Path,
    output: &Path,
    cwd: &Path,
) -> Result<BuildInfoRecord> {
    let program = script.to_string_lossy().to_string();
    let args = vec![format!("--output={}", output.display())];

    log_status!("build", "Running {} {}", program, args[0]);
    let result = runner.run(&program, &args, cwd)?;
    if !result.stderr.trim().is_empty() {
        tracing::debug!(stderr = %result.stderr.trim(), "build script stderr");
    }

    read_build_info(output)
}

/// Load a build info YAML file.
pub fn read_build_info(path: &Path) -> Result<BuildInfoRecord> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::build_invalid_output(path.display().to_string(), format!("read failed: {}", e))
    })?;

    serde_yml::from_str(&content).map_err(|e| {
        Error::build_invalid_output(path.display().to_string(), format!("parse failed: {}", e))
    })
}
