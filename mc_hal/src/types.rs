//! Plain data types exchanged across the HAL boundary (SPEC_FULL.md §6).

use mc_common::consts::N_AXIS;
use mc_common::plan::{CoolantState, SpindleState};

/// Sentinel returned by [`crate::traits::StreamHal::read`] when no byte is
/// available (SPEC_FULL.md §6: "returns sentinel `SERIAL_NO_DATA` if empty").
pub const SERIAL_NO_DATA: i16 = -1;

bitflags::bitflags! {
    /// Which axes currently report an engaged limit switch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LimitsMask: u32 {
        const X = 1 << 0;
        const Y = 1 << 1;
        const Z = 1 << 2;
        const A = 1 << 3;
        const B = 1 << 4;
        const C = 1 << 5;
    }
}

/// Control-pin sampling snapshot (SPEC_FULL.md §6 "Control inputs").
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlState {
    pub reset: bool,
    pub e_stop: bool,
    pub safety_door_ajar: bool,
    pub cycle_start: bool,
    pub feed_hold: bool,
}

/// One segment handed to the (out-of-scope) planner by the motion gateway.
#[derive(Debug, Clone, Copy)]
pub struct PlannerSegment {
    pub target: [f64; N_AXIS],
    pub data: mc_common::plan::PlanLineData,
}

pub use mc_common::plan::SpindleDirection;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportedSpindle {
    pub state: Option<SpindleState>,
    pub rpm: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportedCoolant {
    pub state: Option<CoolantState>,
}
