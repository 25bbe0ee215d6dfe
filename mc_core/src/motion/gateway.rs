//! The motion gateway: the single entry point every motion primitive
//! (linear, arc, canned drill, threading, jog, probe, parking) passes
//! through before reaching the planner (SPEC_FULL.md §4.1).
//!
//! Grounded on `motion_control.c`'s `mc_line` and its file-static backlash
//! tracking variables, promoted here into an owned `BacklashState`
//! (SPEC_FULL.md §9 Design Notes: "Implemented as: a `BacklashState`
//! struct owned by the `MotionGateway`, not `SystemState`").

use mc_common::config::Settings;
use mc_common::consts::N_AXIS;
use mc_common::error::AlarmCode;
use mc_common::plan::{PlanCondition, PlanLineData};
use mc_common::state::MachineState;
use mc_hal::traits::{Hal, Planner, SpindleHal, Stepper};

use crate::realtime::{auto_cycle_start, execute_realtime_checkpoint};
use crate::sys::SystemState;

/// Per-axis last-commanded target and direction, used to detect reversals
/// that require a backlash take-up move (SPEC_FULL.md §4.1 step 4).
#[derive(Debug, Clone, Copy)]
struct BacklashState {
    previous_target: [f64; N_AXIS],
    negative: [bool; N_AXIS],
}

impl Default for BacklashState {
    fn default() -> Self {
        Self {
            previous_target: [0.0; N_AXIS],
            negative: [false; N_AXIS],
        }
    }
}

pub struct MotionGateway {
    backlash: BacklashState,
}

impl Default for MotionGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionGateway {
    pub fn new() -> Self {
        Self {
            backlash: BacklashState::default(),
        }
    }

    /// Resync the gateway's backlash-tracking reference point, e.g. after
    /// `mc_reset` or homing (SPEC_FULL.md §8 invariant: "parser/planner
    /// positions equal `sys.position`").
    pub fn sync_position(&mut self, position: &[f64; N_AXIS]) {
        self.backlash.previous_target = *position;
    }

    /// Enqueue one linear motion to `target` in absolute machine
    /// coordinates (SPEC_FULL.md §4.1 "Operation `line`").
    #[allow(clippy::too_many_arguments)]
    pub fn line(
        &mut self,
        sys: &mut SystemState,
        hal: &mut dyn Hal,
        planner: &mut dyn Planner,
        stepper: &mut dyn Stepper,
        settings: &Settings,
        target: &[f64; N_AXIS],
        pl_data: &PlanLineData,
    ) -> bool {
        let jog = pl_data.condition.contains(PlanCondition::JOG_MOTION);
        if !jog && settings.limits.soft_enabled && exceeds_travel(target, settings) {
            sys.raise_alarm(AlarmCode::SoftLimit);
            return false;
        }

        if sys.state() == MachineState::CheckMode {
            return true;
        }

        if !execute_realtime_checkpoint(sys, hal, planner, stepper, settings) {
            return false;
        }

        let (adjusted, backlash_needed) = self.take_up_backlash(target, settings);
        if backlash_needed {
            if !wait_for_buffer_space(sys, hal, planner, stepper, settings) {
                return false;
            }
            let backlash_data = PlanLineData {
                condition: pl_data.condition | PlanCondition::BACKLASH_MOTION | PlanCondition::RAPID_MOTION,
                ..*pl_data
            };
            planner.buffer_line(&adjusted, &backlash_data);
        }

        if !wait_for_buffer_space(sys, hal, planner, stepper, settings) {
            return false;
        }

        let accepted = planner.buffer_line(target, pl_data);
        self.backlash.previous_target = *target;

        if !accepted && settings.flags.laser_mode {
            use mc_common::plan::SpindleDirection;
            if pl_data.spindle.on && pl_data.spindle.direction != SpindleDirection::Ccw {
                SpindleHal::set_state(hal, pl_data.spindle, pl_data.spindle_rpm);
            }
        }

        !sys.is_aborted()
    }

    fn take_up_backlash(&mut self, target: &[f64; N_AXIS], settings: &Settings) -> ([f64; N_AXIS], bool) {
        let mut adjusted = self.backlash.previous_target;
        let mut needed = false;
        for axis in 0..N_AXIS {
            let prev = self.backlash.previous_target[axis];
            if target[axis] > prev {
                if self.backlash.negative[axis] && settings.backlash_enabled(axis) {
                    adjusted[axis] = prev + settings.backlash[axis];
                    needed = true;
                }
                self.backlash.negative[axis] = false;
            } else if target[axis] < prev {
                if !self.backlash.negative[axis] && settings.backlash_enabled(axis) {
                    adjusted[axis] = prev - settings.backlash[axis];
                    needed = true;
                }
                self.backlash.negative[axis] = true;
            }
        }
        (adjusted, needed)
    }
}

fn exceeds_travel(target: &[f64; N_AXIS], settings: &Settings) -> bool {
    (0..N_AXIS).any(|axis| target[axis] < settings.limits.min_travel[axis] || target[axis] > settings.limits.max_travel[axis])
}

/// Spin while the planner buffer is full, keeping the stepper fed and the
/// realtime executor ticking (SPEC_FULL.md §4.1 step 5).
pub(crate) fn wait_for_buffer_space(
    sys: &mut SystemState,
    hal: &mut dyn Hal,
    planner: &mut dyn Planner,
    stepper: &mut dyn Stepper,
    settings: &Settings,
) -> bool {
    while planner.check_full_buffer() {
        auto_cycle_start(sys);
        if !execute_realtime_checkpoint(sys, hal, planner, stepper, settings) {
            return false;
        }
    }
    true
}
