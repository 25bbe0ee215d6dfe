//! Dwell: synchronizes the planner buffer, then blocks for a commanded
//! duration in small ticks, cooperatively checkpointing between each one
//! (SPEC_FULL.md §4.5 "Dwell").
//!
//! Grounded on `motion_control.c::mc_dwell`.

use mc_common::state::MachineState;
use mc_hal::traits::{DwellHal, Hal, Planner, Stepper};

use crate::realtime::execute_realtime_checkpoint;
use crate::sys::SystemState;

/// Ticks no coarser than this so a feed hold or reset is noticed promptly.
const TICK_MS: u32 = 50;

/// Runs a dwell of `seconds`. `truncatable` marks a dwell a feed hold may
/// cut short (e.g. the tool-change pause) rather than one that must run to
/// completion (e.g. `G4`). Returns `false` if aborted mid-wait.
pub fn dwell(
    sys: &mut SystemState,
    hal: &mut dyn Hal,
    planner: &mut dyn Planner,
    stepper: &mut dyn Stepper,
    settings: &mc_common::config::Settings,
    seconds: f64,
    truncatable: bool,
) -> bool {
    planner.sync_position(&sys.position);

    let mut remaining_ms = (seconds * 1000.0).round().max(0.0) as u32;
    while remaining_ms > 0 {
        if !execute_realtime_checkpoint(sys, hal, planner, stepper, settings) {
            return false;
        }
        if truncatable && sys.state() == MachineState::Hold {
            break;
        }
        let tick = remaining_ms.min(TICK_MS);
        hal.delay_tick(tick);
        remaining_ms -= tick;
    }

    !sys.is_aborted()
}
