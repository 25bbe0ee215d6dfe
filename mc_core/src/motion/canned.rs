//! Canned drill cycle: peck-drilling variants expanded into a sequence of
//! rapid and feed segments (SPEC_FULL.md §4.3).
//!
//! Grounded on `motion_control.c::mc_canned_drill` (`G73`/`G81`/`G82`/`G83`
//! family).

use mc_common::consts::N_AXIS;
use mc_common::plan::{CannedCycleState, DrillMotion, PlanCondition, PlanLineData, RetractMode, SpindleState};
use mc_hal::traits::{Hal, Planner, SpindleHal, Stepper};

use crate::motion::dwell::dwell;
use crate::motion::gateway::MotionGateway;
use crate::sys::SystemState;

/// Runs one canned cycle starting from `position`, which is updated in
/// place to the machine's position after the cycle (whether it completed
/// or aborted partway through).
#[allow(clippy::too_many_arguments)]
pub fn canned_drill(
    gateway: &mut MotionGateway,
    sys: &mut SystemState,
    hal: &mut dyn Hal,
    planner: &mut dyn Planner,
    stepper: &mut dyn Stepper,
    settings: &mc_common::config::Settings,
    position: &mut [f64; N_AXIS],
    state: &mut CannedCycleState,
    motion: DrillMotion,
    repeats: u32,
    incremental: bool,
    per_repeat_delta: [f64; N_AXIS],
    linear_axis: usize,
    spindle: SpindleState,
    spindle_rpm: f64,
    pl_data: &PlanLineData,
) -> bool {
    let rapid_data = PlanLineData {
        condition: pl_data.condition | PlanCondition::RAPID_MOTION,
        ..*pl_data
    };

    macro_rules! go {
        ($target:expr, $data:expr) => {{
            if !gateway.line(sys, hal, planner, stepper, settings, &$target, $data) {
                return false;
            }
            *position = $target;
        }};
    }

    // Step 1: clear up to the retract plane first, if currently below it.
    if position[linear_axis] < state.retract_position {
        let mut up = *position;
        up[linear_axis] = state.retract_position;
        go!(up, &rapid_data);
    }

    // Step 2: rapid to the hole's X/Y, at the higher of the previous
    // retract plane and this cycle's retract plane.
    let mut target = state.xyz;
    target[linear_axis] = state.prev_position.max(state.retract_position);
    go!(target, &rapid_data);

    // Step 3: settle down to R if the approach left us above it.
    if position[linear_axis] > state.retract_position {
        let mut down = *position;
        down[linear_axis] = state.retract_position;
        go!(down, &rapid_data);
    }

    // Step 4.
    if state.retract_mode == RetractMode::RPos {
        state.prev_position = state.retract_position;
    }

    let bottom = state.xyz[linear_axis];

    for repeat in 0..repeats {
        let mut peck_bottom = state.retract_position;
        loop {
            peck_bottom = (peck_bottom - state.delta).max(bottom);
            let mut drill_to = *position;
            drill_to[linear_axis] = peck_bottom;
            go!(drill_to, pl_data);
            if peck_bottom <= bottom {
                break;
            }
            if matches!(motion, DrillMotion::DrillChipBreak) {
                let mut retract = *position;
                retract[linear_axis] = (peck_bottom + settings.g73_retract).min(state.retract_position);
                go!(retract, &rapid_data);
            }
        }

        if matches!(motion, DrillMotion::BoringDwell) && state.dwell > 0.0 {
            sys.position = *position;
            if !dwell(sys, hal, planner, stepper, settings, state.dwell, true) {
                return false;
            }
        }

        if state.spindle_off {
            SpindleHal::set_state(hal, SpindleState::default(), 0.0);
        }

        let mut retract_target = *position;
        retract_target[linear_axis] = state.retract_position;
        let retract_data = if state.rapid_retract { &rapid_data } else { pl_data };
        go!(retract_target, retract_data);

        if state.spindle_off {
            SpindleHal::set_state(hal, spindle, spindle_rpm);
        }

        if incremental && repeat + 1 < repeats {
            for axis in 0..N_AXIS {
                state.xyz[axis] += per_repeat_delta[axis];
            }
        }
    }

    // Step 7.
    if state.retract_mode == RetractMode::Previous && position[linear_axis] < state.prev_position {
        let mut up = *position;
        up[linear_axis] = state.prev_position;
        go!(up, &rapid_data);
    }

    !sys.is_aborted()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_common::config::Settings;
    use mc_hal::sim::{SimPlanner, SimStepper, SimulationHal};

    #[test]
    fn single_peck_drill_reaches_bottom() {
        let settings = Settings::default();
        let mut sys = SystemState::new(&settings);
        let mut hal = SimulationHal::new();
        let mut planner = SimPlanner::new();
        let mut stepper = SimStepper::new();
        let mut gateway = MotionGateway::new();
        let mut position = [0.0; N_AXIS];
        let mut state = CannedCycleState {
            retract_position: 5.0,
            prev_position: 5.0,
            xyz: [0.0, 0.0, -10.0, 0.0, 0.0, 0.0],
            delta: 20.0,
            ..CannedCycleState::default()
        };
        let data = PlanLineData::default();

        let ok = canned_drill(
            &mut gateway,
            &mut sys,
            &mut hal,
            &mut planner,
            &mut stepper,
            &settings,
            &mut position,
            &mut state,
            DrillMotion::Drill,
            1,
            false,
            [0.0; N_AXIS],
            2,
            SpindleState::default(),
            0.0,
            &data,
        );
        assert!(ok);
        assert_eq!(position[2], state.retract_position);
    }

    #[test]
    fn chip_break_retracts_between_pecks() {
        let mut settings = Settings::default();
        settings.g73_retract = 1.0;
        let mut sys = SystemState::new(&settings);
        let mut hal = SimulationHal::new();
        let mut planner = SimPlanner::new();
        let mut stepper = SimStepper::new();
        let mut gateway = MotionGateway::new();
        let mut position = [0.0; N_AXIS];
        let mut state = CannedCycleState {
            retract_position: 5.0,
            prev_position: 5.0,
            xyz: [0.0, 0.0, -10.0, 0.0, 0.0, 0.0],
            delta: 3.0,
            ..CannedCycleState::default()
        };
        let data = PlanLineData::default();

        let ok = canned_drill(
            &mut gateway,
            &mut sys,
            &mut hal,
            &mut planner,
            &mut stepper,
            &settings,
            &mut position,
            &mut state,
            DrillMotion::DrillChipBreak,
            1,
            false,
            [0.0; N_AXIS],
            2,
            SpindleState::default(),
            0.0,
            &data,
        );
        assert!(ok);
        assert!(planner.buffered_len() > 2);
    }

    #[test]
    fn boring_dwell_ticks_at_bottom_before_retract() {
        let settings = Settings::default();
        let mut sys = SystemState::new(&settings);
        let mut hal = SimulationHal::new();
        let mut planner = SimPlanner::new();
        let mut stepper = SimStepper::new();
        let mut gateway = MotionGateway::new();
        let mut position = [0.0; N_AXIS];
        let mut state = CannedCycleState {
            retract_position: 5.0,
            prev_position: 5.0,
            xyz: [0.0, 0.0, -10.0, 0.0, 0.0, 0.0],
            delta: 20.0,
            dwell: 0.25,
            ..CannedCycleState::default()
        };
        let data = PlanLineData::default();

        let ok = canned_drill(
            &mut gateway,
            &mut sys,
            &mut hal,
            &mut planner,
            &mut stepper,
            &settings,
            &mut position,
            &mut state,
            DrillMotion::BoringDwell,
            1,
            false,
            [0.0; N_AXIS],
            2,
            SpindleState::default(),
            0.0,
            &data,
        );
        assert!(ok);
        let total: u32 = hal.dwell_ticks.iter().sum();
        assert_eq!(total, 250);
    }
}
