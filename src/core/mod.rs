// Public modules
pub mod build;
pub mod defaults;
pub mod error;
pub mod git;
pub mod manifest;
pub mod package;
pub mod publish;
pub mod release;
pub mod status;
pub mod storage;

// Internal modules - not part of public API
pub(crate) mod paths;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
