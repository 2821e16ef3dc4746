use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::utils::artifact;
use crate::utils::command::{self, ProcessRunner};

/// Glob for archives `helm package` writes for `chart_name`.
pub fn archive_pattern(work_dir: &Path, chart_name: &str) -> String {
    let dir = glob::Pattern::escape(&work_dir.to_string_lossy());
    Path::new(&dir)
        .join(format!("{}-*.tgz", glob::Pattern::escape(chart_name)))
        .to_string_lossy()
        .to_string()
}

/// Package `<work_dir>/<chart_name>` and return the single archive produced.
pub fn package_chart(
    runner: &dyn ProcessRunner,
    helm_binary: &str,
    work_dir: &Path,
    chart_name: &str,
) -> Result<PathBuf> {
    let chart_arg = format!("./{}", chart_name);
    log_status!("package", "Running {} package {}", helm_binary, chart_arg);

    runner.run(
        helm_binary,
        &command::args(["package".to_string(), chart_arg]),
        work_dir,
    )?;

    find_chart_archive(work_dir, chart_name)
}

/// Find the one chart archive in `work_dir`; none or several is an error.
pub fn find_chart_archive(work_dir: &Path, chart_name: &str) -> Result<PathBuf> {
    artifact::resolve_single_match(&archive_pattern(work_dir, chart_name))
}
