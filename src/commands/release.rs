use clap::Args;

use chart_release::defaults;
use chart_release::release::{self, ReleaseOptions, ReleaseRun};
use chart_release::storage::GcsClient;
use chart_release::utils::command::SystemRunner;

use super::CmdResult;

#[derive(Args, Debug)]
pub struct ReleaseArgs {
    /// The bucket to publish releases to
    #[arg(long = "releases_bucket", visible_alias = "releases-bucket", value_name = "BUCKET")]
    pub releases_bucket: Option<String>,

    /// Path to a chart-release.json config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,
}

pub fn run(args: ReleaseArgs) -> CmdResult<ReleaseRun> {
    let config = defaults::load_config(args.config.as_deref())?;
    let options = ReleaseOptions::from_config(&config, args.releases_bucket);

    let runner = SystemRunner;
    let store = GcsClient::new(&config.storage, &runner)?;

    release::run(&options, &store, &runner)
}
