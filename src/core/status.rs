//! Latest green build lookup.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::{to_gcs_uri, ObjectStore};

const LATEST_GREEN_OBJECT: &str = "latest_green.json";
const PASSING: &str = "passing";

/// Status record published by the postsubmit job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildStatusRecord {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub sha: String,
}

impl BuildStatusRecord {
    pub fn is_passing(&self) -> bool {
        self.status.eq_ignore_ascii_case(PASSING)
    }
}

pub fn latest_green_key(job_name: &str) -> String {
    format!("{}/{}", job_name, LATEST_GREEN_OBJECT)
}

/// Return the source revision of the latest green build.
///
/// The returned sha may be empty; source fetch then uses the default branch tip.
pub fn latest_green_sha(store: &dyn ObjectStore, bucket: &str, job_name: &str) -> Result<String> {
    let key = latest_green_key(job_name);
    log_status!("status", "Reading {}", to_gcs_uri(bucket, &key));

    let contents = store.read(bucket, &key)?;
    let record: BuildStatusRecord = serde_json::from_slice(&contents)
        .map_err(|e| Error::validation_invalid_json(e, Some(format!("parse {}", key))))?;

    if !record.is_passing() {
        return Err(Error::build_not_green(bucket, key, record.status));
    }

    Ok(record.sha)
}
