/// Macro for prefixed status logging.
///
/// Usage:
/// ```ignore
/// log_status!("fetch", "Cloning {} into {}", url, dir);
/// log_status!("publish", "Uploading {} to {}", archive, uri);
/// ```
#[macro_export]
macro_rules! log_status {
    ($prefix:expr, $($arg:tt)*) => {
        ::tracing::info!(step = $prefix, "{}", format_args!($($arg)*))
    };
}

pub mod core;
pub mod utils;

// Re-export everything from core for ergonomic library use
// Users can write `chart_release::release` instead of `chart_release::core::release`
pub use core::*;
pub use utils::*;
