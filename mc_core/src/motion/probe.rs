//! Probe cycle (SPEC_FULL.md §4.5 "Probe").
//!
//! Grounded on `motion_control.c::mc_probe_cycle`.

use mc_common::consts::N_AXIS;
use mc_common::error::AlarmCode;
use mc_common::plan::PlanLineData;
use mc_common::state::MachineState;
use mc_hal::traits::{Hal, Planner, ProbeHal, Stepper};

use crate::motion::gateway::MotionGateway;
use crate::realtime::execute_realtime_checkpoint;
use crate::state_machine::StateEvent;
use crate::sys::{ProbeState, SystemState};

/// Outcome of a probe cycle (SPEC_FULL.md §4.5: "Returns one of {CheckMode,
/// Abort, FailInit, Found, FailEnd}").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    CheckMode,
    Abort,
    FailInit,
    Found,
    FailEnd,
}

#[allow(clippy::too_many_arguments)]
pub fn probe(
    gateway: &mut MotionGateway,
    sys: &mut SystemState,
    hal: &mut dyn Hal,
    planner: &mut dyn Planner,
    stepper: &mut dyn Stepper,
    settings: &mc_common::config::Settings,
    target: &[f64; N_AXIS],
    invert: bool,
    no_error_on_fail: bool,
    pl_data: &PlanLineData,
) -> ProbeOutcome {
    planner.sync_position(&sys.position);

    if sys.state() == MachineState::CheckMode {
        return ProbeOutcome::CheckMode;
    }
    if sys.is_aborted() {
        return ProbeOutcome::Abort;
    }

    ProbeHal::configure_invert_mask(hal, invert);
    if ProbeHal::get_state(hal) {
        sys.raise_alarm(AlarmCode::ProbeFailInitial);
        return ProbeOutcome::FailInit;
    }

    if !gateway.line(sys, hal, planner, stepper, settings, target, pl_data) {
        reset_probe(sys, hal, planner, stepper);
        return ProbeOutcome::Abort;
    }

    sys.probe_state = ProbeState::Active;
    sys.apply_event(StateEvent::CycleStart);

    let outcome = loop {
        if !execute_realtime_checkpoint(sys, hal, planner, stepper, settings) {
            break ProbeOutcome::Abort;
        }
        if ProbeHal::get_state(hal) {
            sys.probe_state = ProbeState::Triggered;
            sys.probe_position = sys.position;
            sys.flags.probe_succeeded = true;
            sys.apply_event(StateEvent::MotionCancel);
            break ProbeOutcome::Found;
        }
        if sys.state() == MachineState::Idle {
            if no_error_on_fail {
                sys.probe_position = sys.position;
                break ProbeOutcome::FailEnd;
            }
            sys.raise_alarm(AlarmCode::ProbeFailContact);
            break ProbeOutcome::FailEnd;
        }
    };

    reset_probe(sys, hal, planner, stepper);
    outcome
}

fn reset_probe(sys: &mut SystemState, hal: &mut dyn Hal, planner: &mut dyn Planner, stepper: &mut dyn Stepper) {
    ProbeHal::configure_invert_mask(hal, false);
    sys.probe_state = ProbeState::Off;
    stepper.reset();
    planner.reset();
    planner.sync_position(&sys.position);
}
