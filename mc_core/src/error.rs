//! Top-level error type for the `mc_core` binary (SPEC_FULL.md §7.1).
//!
//! Unifies HAL startup failures and configuration-validation failures for
//! the binary's top-level `Result`, following the layered error-enum
//! convention the workspace uses elsewhere (`HalError` wrapped rather than
//! stringly-typed).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum McError {
    #[error("hal error: {0}")]
    Hal(#[from] mc_hal::error::HalError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<toml::de::Error>,
    },
}
