//! HAL-level errors: startup/init/communication failures, distinct from the
//! runtime `StatusCode`/`AlarmCode` taxonomy in `mc_common::error`
//! (SPEC_FULL.md §7.1: "a HAL that fails to initialize is a startup-time
//! error, not a line-dispatch error").

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum HalError {
    #[error("driver initialization failed: {0}")]
    InitFailed(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("hardware communication error: {0}")]
    CommunicationError(String),

    #[error("requested driver not found: {0}")]
    DriverNotFound(String),
}
