use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::command::{self, ProcessRunner};

/// Clone URL for a repository hosted under `url_base`.
pub fn repo_url(url_base: &str, owner: &str, name: &str) -> String {
    format!("{}/{}/{}.git", url_base.trim_end_matches('/'), owner, name)
}

/// Clone a repository and check out `revision`.
///
/// An empty revision keeps the default branch tip. Returns the commit that
/// ends up checked out.
pub fn clone_repo(
    runner: &dyn ProcessRunner,
    dest: &Path,
    url: &str,
    revision: &str,
) -> Result<String> {
    let dest_str = dest.to_string_lossy().to_string();
    let parent = dest.parent().unwrap_or(dest);

    log_status!("fetch", "Cloning {} into {}", url, dest_str);
    git(runner, parent, &["clone", url, &dest_str], "git clone")?;

    if !revision.is_empty() {
        log_status!("fetch", "Checking out {}", revision);
        git(runner, dest, &["checkout", revision], "git checkout")?;
    }

    let resolved = git(runner, dest, &["rev-parse", "HEAD"], "git rev-parse")?;
    if resolved.is_empty() {
        return Err(Error::git_command_failed(
            "git rev-parse HEAD returned no commit",
        ));
    }

    Ok(resolved)
}

fn git(runner: &dyn ProcessRunner, cwd: &Path, args: &[&str], context: &str) -> Result<String> {
    let output = runner
        .run("git", &command::args(args.iter().copied()), cwd)
        .map_err(|e| {
            let detail = command::error_text(
                e.details["stdout"].as_str().unwrap_or_default(),
                e.details["stderr"].as_str().unwrap_or_default(),
            );
            let detail = if detail.is_empty() {
                e.to_string()
            } else {
                detail
            };
            Error::git_command_failed(format!("{} failed: {}", context, detail))
        })?;

    Ok(output.stdout_trimmed().to_string())
}
