//! Jog motion: soft-limit clamped/rejected single moves outside the normal
//! G-code motion stream (SPEC_FULL.md §4.5 "Jog").
//!
//! Grounded on `motion_control.c::mc_jog_execute` / `nuts_bolts.c` clamp
//! helper.

use mc_common::consts::N_AXIS;
use mc_common::plan::{PlanCondition, PlanLineData};
use mc_common::state::MachineState;
use mc_hal::traits::{Hal, Planner, Stepper};

use crate::motion::gateway::MotionGateway;
use crate::state_machine::StateEvent;
use crate::sys::SystemState;

/// Outcome of a jog request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JogOutcome {
    Started,
    Rejected,
}

#[allow(clippy::too_many_arguments)]
pub fn jog(
    gateway: &mut MotionGateway,
    sys: &mut SystemState,
    hal: &mut dyn Hal,
    planner: &mut dyn Planner,
    stepper: &mut dyn Stepper,
    settings: &mc_common::config::Settings,
    target: &[f64; N_AXIS],
    feed_rate: f64,
) -> JogOutcome {
    let mut clamped = *target;
    if settings.limits.jog_soft_limited {
        for axis in 0..N_AXIS {
            if clamped[axis] < settings.limits.min_travel[axis] {
                clamped[axis] = settings.limits.min_travel[axis];
            } else if clamped[axis] > settings.limits.max_travel[axis] {
                clamped[axis] = settings.limits.max_travel[axis];
            }
        }
    } else if settings.limits.soft_enabled
        && (0..N_AXIS).any(|axis| clamped[axis] < settings.limits.min_travel[axis] || clamped[axis] > settings.limits.max_travel[axis])
    {
        return JogOutcome::Rejected;
    }

    let data = PlanLineData {
        feed_rate,
        condition: PlanCondition::JOG_MOTION | PlanCondition::NO_FEED_OVERRIDE,
        ..PlanLineData::default()
    };

    if !gateway.line(sys, hal, planner, stepper, settings, &clamped, &data) {
        return JogOutcome::Rejected;
    }

    if matches!(sys.state(), MachineState::Idle | MachineState::ToolChange) {
        sys.apply_event(StateEvent::JogStarted);
        stepper.wake_up();
    }

    JogOutcome::Started
}
