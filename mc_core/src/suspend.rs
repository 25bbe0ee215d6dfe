//! Suspend loop, entered whenever `sys.suspend` is non-empty: feed hold,
//! safety-door, and sleep all route through here (SPEC_FULL.md §4.9).
//!
//! Grounded on `protocol.c::protocol_exec_rt_suspend`.

use mc_hal::traits::{ControlHal, Hal, Planner, Stepper};

use crate::realtime::execute_realtime_checkpoint;
use crate::state_machine::StateEvent;
use crate::sys::{SuspendFlags, SystemState};

/// Runs the suspend-state manager until `sys.suspend` clears or the
/// realtime executor reports an abort.
pub fn run(
    sys: &mut SystemState,
    hal: &mut dyn Hal,
    planner: &mut dyn Planner,
    stepper: &mut dyn Stepper,
    settings: &mc_common::config::Settings,
) -> bool {
    while !sys.suspend.is_empty() {
        if !execute_realtime_checkpoint(sys, hal, planner, stepper, settings) {
            return false;
        }

        if sys.suspend.contains(SuspendFlags::SAFETY_DOOR) && !ControlHal::get_state(hal).safety_door_ajar {
            sys.suspend.remove(SuspendFlags::SAFETY_DOOR);
            sys.apply_event(StateEvent::SafetyDoorClosed);
            sys.apply_event(StateEvent::CycleStart);
        }

        if sys.suspend.contains(SuspendFlags::JOG_CANCEL) {
            sys.suspend.remove(SuspendFlags::JOG_CANCEL);
        }

        if sys.is_aborted() {
            return false;
        }
    }
    true
}
