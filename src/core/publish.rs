use serde::Serialize;
use std::path::Path;

use crate::error::{Error, Result};
use crate::storage::{to_gcs_uri, ObjectStore};

const LATEST_PREFIX: &str = "latest";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishAction {
    Uploaded,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub key: String,
    pub uri: String,
    pub action: PublishAction,
}

/// Destination keys: the versioned release path, then the `latest` alias.
pub fn publish_targets(archive: &Path, version: &str, chart_name: &str) -> Result<Vec<String>> {
    let basename = archive
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| {
            Error::validation_invalid_argument(
                "archive",
                "Archive path has no file name",
                Some(archive.display().to_string()),
            )
        })?;

    Ok(vec![
        format!("{}/{}", version, basename),
        format!("{}/{}-latest.tgz", LATEST_PREFIX, chart_name),
    ])
}

/// Upload `archive` to every target.
///
/// An existing key is skipped with a warning so a published release is never
/// replaced. Any key starting with `latest` is always overwritten, including a
/// versioned key whose version itself starts with `latest`.
/// Targets are independent: a failure leaves earlier uploads in place.
pub fn publish(
    store: &dyn ObjectStore,
    bucket: &str,
    archive: &Path,
    version: &str,
    chart_name: &str,
) -> Result<Vec<PublishOutcome>> {
    let targets = publish_targets(archive, version, chart_name)?;
    let mut outcomes = Vec::with_capacity(targets.len());

    for key in targets {
        let uri = to_gcs_uri(bucket, &key);

        if !key.starts_with(LATEST_PREFIX) && store.exists(bucket, &key)? {
            tracing::warn!(uri = %uri, "{} already exists", uri);
            outcomes.push(PublishOutcome {
                key,
                uri,
                action: PublishAction::Skipped,
            });
            continue;
        }

        log_status!("publish", "Uploading {} to {}", archive.display(), uri);
        store.upload(bucket, &key, archive)?;
        outcomes.push(PublishOutcome {
            key,
            uri,
            action: PublishAction::Uploaded,
        });
    }

    Ok(outcomes)
}
