//! `mc_reset`: the idempotent emergency unwind, callable from any context
//! holding `&mut SystemState` (SPEC_FULL.md §4.5 "Reset"; §5 notes this is
//! safe without additional locking because the runtime is single-threaded
//! cooperative).
//!
//! Grounded on `motion_control.c::mc_reset`.

use mc_common::error::AlarmCode;
use mc_common::plan::{CoolantState, SpindleState};
use mc_common::state::MachineState;
use mc_hal::traits::{ControlHal, CoolantHal, DriverHooks, Hal, Planner, SpindleHal, Stepper};

use crate::sys::SystemState;

/// Runs `mc_reset`. Idempotent: calling this repeatedly (e.g. once from an
/// ISR and again from the main loop observing `RESET`) is harmless.
pub fn reset(sys: &mut SystemState, hal: &mut dyn Hal, planner: &mut dyn Planner, stepper: &mut dyn Stepper) {
    if sys.state().is_motion_state() {
        let alarm = if sys.state() == MachineState::Homing {
            AlarmCode::HomingFailReset
        } else {
            AlarmCode::AbortCycle
        };
        sys.raise_alarm(alarm);
    }

    SpindleHal::set_state(hal, SpindleState::default(), 0.0);
    sys.coolant = CoolantState::default();
    CoolantHal::set_state(hal, sys.coolant);

    hal.driver_reset();
    stepper.go_idle();
    planner.reset();
    planner.sync_position(&sys.position);

    if ControlHal::get_state(hal).e_stop {
        sys.raise_alarm(AlarmCode::EStop);
    }
}
