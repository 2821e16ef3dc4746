use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::release::{self, ReleaseArgs};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Long flags that take a value.
const VALUE_FLAGS: [&str; 3] = ["--releases_bucket", "--releases-bucket", "--config"];
const BARE_FLAGS: [&str; 4] = ["--help", "-h", "--version", "-V"];

#[derive(Parser, Debug)]
#[command(name = "chart-release")]
#[command(version = VERSION)]
#[command(about = "Release artifacts for TfJob: package the last green build as a Helm chart")]
#[command(after_help = "Unrecognized arguments are accepted and ignored.")]
struct Cli {
    #[command(flatten)]
    release: ReleaseArgs,
}

/// Split argv into arguments clap knows and arguments to ignore.
///
/// The first element (program name) is always kept.
fn split_known_args<I>(raw: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = String>,
{
    let mut iter = raw.into_iter();
    let mut known: Vec<String> = iter.next().into_iter().collect();
    let mut ignored = Vec::new();

    while let Some(arg) = iter.next() {
        if arg == "--" {
            ignored.extend(iter.by_ref());
            break;
        }

        let flag = arg.split_once('=').map(|(name, _)| name).unwrap_or(&arg);
        if VALUE_FLAGS.contains(&flag) {
            let inline_value = arg.contains('=');
            known.push(arg);
            if !inline_value {
                if let Some(value) = iter.next() {
                    known.push(value);
                }
            }
        } else if BARE_FLAGS.contains(&arg.as_str()) {
            known.push(arg);
        } else {
            ignored.push(arg);
        }
    }

    (known, ignored)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> std::process::ExitCode {
    init_logging();

    let (known, ignored) = split_known_args(std::env::args());
    if !ignored.is_empty() {
        tracing::info!(?ignored, "ignoring unrecognized arguments");
    }
    let cli = Cli::parse_from(known);

    let exit_code = output::print_result(release::run(cli.release));
    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
