//! Status and alarm taxonomy surfaced on the line-dispatch path
//! (SPEC_FULL.md §7).

use thiserror::Error;

/// Errors returned from line dispatch. Every line emits exactly one of
/// these via the reports HAL (SPEC_FULL.md §8 invariant).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatusCode {
    #[error("ok")]
    Ok,
    #[error("line overflow")]
    Overflow,
    #[error("g-code rejected: system is locked")]
    SystemGClock,
    #[error("jog target exceeds soft travel limits")]
    TravelExceeded,
    #[error("limit switch engaged")]
    LimitsEngaged,
    #[error("homing cycle did not complete")]
    Unhandled,
    #[error("probe already triggered before cycle start")]
    ProbeFailInitial,
    #[error("probe failed to trigger within travel")]
    ProbeFailContact,
    /// Passthrough for any code returned by the out-of-scope G-code parser.
    #[error("g-code parser error: {0}")]
    PlannerRejected(String),
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::Ok
    }
}

/// Alarm kinds surfaced through `exec_alarm` (SPEC_FULL.md §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AlarmCode {
    #[error("hard limit switch triggered")]
    HardLimit,
    #[error("soft limit exceeded")]
    SoftLimit,
    #[error("emergency stop asserted")]
    EStop,
    #[error("cycle aborted, position may be lost")]
    AbortCycle,
    #[error("homing cycle required before operation")]
    HomingRequired,
    #[error("homing cycle failed: reset received mid-cycle")]
    HomingFailReset,
    #[error("limit switch still engaged after homing")]
    LimitsEngaged,
    #[error("probe already triggered before cycle start")]
    ProbeFailInitial,
    #[error("probe failed to trigger within travel")]
    ProbeFailContact,
}
