//! Hardware abstraction, planner, and stepper collaborator traits
//! (SPEC_FULL.md §6). Every method mirrors a `hal.*` / `plan_*` / `st_*`
//! call the source treats as an external capability; this core only
//! consumes them, never implements the hardware side.
//!
//! Grounded on `HalDriver`'s shape (one trait per lifecycle-scoped
//! capability, `Send + Sync`, default no-op hooks where the source marks a
//! callback optional).

use mc_common::consts::N_AXIS;
use mc_common::plan::{CoolantState, PlanLineData, SpindleState};

use crate::error::HalError;
use crate::types::{ControlState, LimitsMask};

/// Non-blocking byte stream from the input transport.
pub trait StreamHal: Send {
    /// Returns the next byte, or [`crate::types::SERIAL_NO_DATA`] if none is
    /// available yet.
    fn read(&mut self) -> i16;

    /// Suspend or resume stream reads (used around reset/stop handling).
    /// Returns whether reads were previously suspended.
    fn suspend_read(&mut self, suspend: bool) -> bool;

    /// Discard any buffered-but-unread input.
    fn cancel_read_buffer(&mut self);
}

pub trait LimitsHal: Send {
    /// Enable/disable the hard-limit and homing input change interrupts.
    fn enable(&mut self, hard: bool, homing: bool);
    fn get_state(&self) -> LimitsMask;
}

pub trait ProbeHal: Send {
    fn configure_invert_mask(&mut self, invert: bool);
    fn get_state(&self) -> bool;
}

pub trait SpindleHal: Send {
    fn set_state(&mut self, state: SpindleState, rpm: f64);
}

pub trait CoolantHal: Send {
    fn set_state(&mut self, state: CoolantState);
}

pub trait ControlHal: Send {
    fn get_state(&self) -> ControlState;
}

/// Blocking delay used by the dwell cycle (SPEC_FULL.md §4.5 "Dwell").
/// Split into small ticks so the caller can interleave realtime
/// checkpoints between them rather than blocking the whole duration.
pub trait DwellHal: Send {
    /// Blocks for up to `ms` milliseconds in one tick.
    fn delay_tick(&mut self, ms: u32);
}

/// Reporting sink. The core only triggers reports via these calls; it does
/// not format or render them (SPEC_FULL.md §1 Non-goals).
pub trait ReportsHal: Send {
    fn status_message(&mut self, code: mc_common::error::StatusCode);
    fn feedback_message(&mut self, alarm: mc_common::error::AlarmCode);
    fn show_message(&mut self, message: &str);
    fn report_realtime_status(&mut self);
    fn report_gcode_modes(&mut self);
    fn report_pid_log(&mut self);
    fn report_probe_parameters(&mut self);
    fn report_alarm_message(&mut self, alarm: mc_common::error::AlarmCode);
    fn report_echo_line_received(&mut self, line: &str);
}

/// Optional driver hooks (SPEC_FULL.md §6 "Optional hooks"). Default to
/// no-ops, matching `HalDriver`'s default-implemented extension points.
pub trait DriverHooks: Send {
    fn driver_reset(&mut self) {}
    fn execute_realtime(&mut self, _state: mc_common::state::MachineState) {}
    fn driver_rt_command_execute(&mut self, _cmd: u8) {}
}

/// Aggregates every HAL capability a driver backend must provide. A
/// concrete driver (simulation, serial+EtherCAT, ...) implements all of
/// these; the core holds it as `&mut dyn Hal`.
pub trait Hal: StreamHal + LimitsHal + ProbeHal + SpindleHal + CoolantHal + ControlHal + DwellHal + ReportsHal + DriverHooks {
    fn name(&self) -> &'static str;
    fn init(&mut self) -> Result<(), HalError>;
    fn shutdown(&mut self) -> Result<(), HalError>;
}

/// The velocity/acceleration look-ahead planner (out of scope; SPEC_FULL.md
/// §6 "Planner interface consumed").
pub trait Planner: Send {
    /// Enqueue a segment. Returns `false` if the planner rejected it (e.g.
    /// zero-length / coincident with current position) — SPEC_FULL.md §9
    /// Open Question 3 resolution.
    fn buffer_line(&mut self, target: &[f64; N_AXIS], data: &PlanLineData) -> bool;
    fn check_full_buffer(&self) -> bool;
    fn has_current_block(&self) -> bool;
    fn reset(&mut self);
    fn sync_position(&mut self, position: &[f64; N_AXIS]);
    fn feed_override(&mut self, feed_pct: u8, rapid_pct: u8);
}

/// The step-pulse generator (out of scope; SPEC_FULL.md §6 "Stepper
/// interface consumed").
pub trait Stepper: Send {
    fn prep_buffer(&mut self);
    fn wake_up(&mut self);
    fn go_idle(&mut self);
    fn reset(&mut self);
    fn parking_setup_buffer(&mut self);
}
