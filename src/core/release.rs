//! Release pipeline: green build -> clone -> build -> patch -> package -> publish.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::build;
use crate::defaults::ReleaseConfig;
use crate::error::{Error, Result};
use crate::git;
use crate::manifest;
use crate::package;
use crate::publish::{self, PublishOutcome};
use crate::status;
use crate::storage::ObjectStore;
use crate::utils::command::ProcessRunner;

const SCRATCH_PREFIX: &str = "tmpTfJobSrc";

/// Everything a release run needs, resolved from config and CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseOptions {
    pub results_bucket: String,
    pub job_name: String,
    pub releases_bucket: String,
    pub repo_url: String,
    pub chart_name: String,
    pub build_script: String,
    pub build_info_file: String,
    pub helm_binary: String,
}

impl ReleaseOptions {
    pub fn from_config(config: &ReleaseConfig, releases_bucket: Option<String>) -> Self {
        Self {
            results_bucket: config.results_bucket.clone(),
            job_name: config.job_name.clone(),
            releases_bucket: releases_bucket.unwrap_or_else(|| config.releases_bucket.clone()),
            repo_url: git::repo_url(&config.repo_url_base, &config.repo_owner, &config.repo_name),
            chart_name: config.chart_name.clone(),
            build_script: config.build_script.clone(),
            build_info_file: config.build_info_file.clone(),
            helm_binary: config.helm_binary.clone(),
        }
    }
}

/// Summary of a completed release.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseRun {
    pub started_at: String,
    pub revision: String,
    pub image: String,
    pub version: String,
    pub archive: String,
    pub values_lines_replaced: usize,
    pub published: Vec<PublishOutcome>,
}

/// Run the whole release. Any failure aborts; the scratch checkout is removed
/// either way.
pub fn run(
    options: &ReleaseOptions,
    store: &dyn ObjectStore,
    runner: &dyn ProcessRunner,
) -> Result<ReleaseRun> {
    let started_at = chrono::Utc::now().to_rfc3339();

    let sha = status::latest_green_sha(store, &options.results_bucket, &options.job_name)?;

    let scratch = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir()
        .map_err(|e| Error::internal_io(e.to_string(), Some("create scratch dir".to_string())))?;
    let src_dir = scratch.path().to_path_buf();
    tracing::info!(src_dir = %src_dir.display(), "created scratch directory");

    let revision = git::clone_repo(runner, &src_dir, &options.repo_url, &sha)?;

    let build_info_path = src_dir.join(&options.build_info_file);
    let script = src_dir.join(&options.build_script);
    let build_info = build::run_build(runner, &script, &build_info_path, &src_dir)?;
    let version = build_info.version().to_string();
    log_status!("build", "Built image {} (version {})", build_info.image, version);

    let chart_dir: PathBuf = src_dir.join(&options.chart_name);
    let values_file = chart_dir.join("values.yaml");
    let values_lines_replaced = manifest::update_values(&values_file, &build_info.image)?;
    if values_lines_replaced == 0 {
        tracing::warn!(
            path = %values_file.display(),
            "no `image:` line found; chart keeps its previous image"
        );
    }
    manifest::update_chart(&chart_dir.join("Chart.yaml"), &version)?;

    let archive = package::package_chart(
        runner,
        &options.helm_binary,
        &src_dir,
        &options.chart_name,
    )?;

    let published = publish::publish(
        store,
        &options.releases_bucket,
        &archive,
        &version,
        &options.chart_name,
    )?;

    Ok(ReleaseRun {
        started_at,
        revision,
        image: build_info.image,
        version,
        archive: archive
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        values_lines_replaced,
        published,
    })
}
