//! Arc synthesizer: approximates a circular/helical arc by N linear
//! segments of equal angular step (SPEC_FULL.md §4.2).
//!
//! Grounded on `motion_control.c::mc_arc`.

use mc_common::consts::{ARC_ANGULAR_TRAVEL_EPSILON, N_ARC_CORRECTION, N_AXIS};
use mc_common::plan::PlanLineData;
use mc_hal::traits::{Hal, Planner, Stepper};

use crate::motion::gateway::MotionGateway;
use crate::sys::SystemState;

/// The two in-plane axis indices and the linear (helical) axis index.
#[derive(Debug, Clone, Copy)]
pub struct ArcPlane {
    pub axis_0: usize,
    pub axis_1: usize,
    pub axis_linear: usize,
}

#[allow(clippy::too_many_arguments)]
pub fn arc(
    gateway: &mut MotionGateway,
    sys: &mut SystemState,
    hal: &mut dyn Hal,
    planner: &mut dyn Planner,
    stepper: &mut dyn Stepper,
    settings: &mc_common::config::Settings,
    position: &[f64; N_AXIS],
    target: &[f64; N_AXIS],
    offset: [f64; 2],
    plane: ArcPlane,
    clockwise: bool,
    pl_data: &PlanLineData,
) -> bool {
    let radius = (offset[0] * offset[0] + offset[1] * offset[1]).sqrt();
    let center = [
        position[plane.axis_0] + offset[0],
        position[plane.axis_1] + offset[1],
    ];

    let mut r = [-offset[0], -offset[1]];
    let rt = [
        target[plane.axis_0] - center[0],
        target[plane.axis_1] - center[1],
    ];

    let cross = r[0] * rt[1] - r[1] * rt[0];
    let dot = r[0] * rt[0] + r[1] * rt[1];
    let mut angular_travel = cross.atan2(dot);
    if clockwise {
        if angular_travel > -ARC_ANGULAR_TRAVEL_EPSILON {
            angular_travel -= 2.0 * std::f64::consts::PI;
        }
    } else if angular_travel < ARC_ANGULAR_TRAVEL_EPSILON {
        angular_travel += 2.0 * std::f64::consts::PI;
    }

    let tol = settings.arc_tolerance;
    let segments = (((0.5 * angular_travel * radius).abs()) / (tol * (2.0 * radius - tol)).sqrt()) as u32;

    let mut pl_data = *pl_data;
    if segments == 0 {
        return gateway.line(sys, hal, planner, stepper, settings, target, &pl_data);
    }

    if pl_data.condition.contains(mc_common::plan::PlanCondition::INVERSE_TIME) {
        pl_data.feed_rate *= segments as f64;
        pl_data.condition.remove(mc_common::plan::PlanCondition::INVERSE_TIME);
    }

    let theta_per_segment = angular_travel / segments as f64;
    let linear_per_segment = (target[plane.axis_linear] - position[plane.axis_linear]) / segments as f64;

    let cos_t = 1.0 - 0.5 * theta_per_segment * theta_per_segment;
    let sin_t = theta_per_segment * (1.0 - theta_per_segment * theta_per_segment / 6.0);

    let mut cur = *position;
    for i in 1..segments {
        if i % N_ARC_CORRECTION == 0 {
            let exact = theta_per_segment * i as f64;
            r = [
                -offset[0] * exact.cos() + offset[1] * exact.sin(),
                -offset[0] * exact.sin() - offset[1] * exact.cos(),
            ];
        } else {
            r = [r[0] * cos_t - r[1] * sin_t, r[0] * sin_t + r[1] * cos_t];
        }

        cur[plane.axis_0] = center[0] + r[0];
        cur[plane.axis_1] = center[1] + r[1];
        cur[plane.axis_linear] += linear_per_segment;

        if !gateway.line(sys, hal, planner, stepper, settings, &cur, &pl_data) {
            return false;
        }
    }

    gateway.line(sys, hal, planner, stepper, settings, target, &pl_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_common::config::Settings;
    use mc_hal::sim::{SimPlanner, SimStepper, SimulationHal};

    #[test]
    fn full_circle_subdivides_into_multiple_segments() {
        let settings = Settings::default();
        let mut sys = SystemState::new(&settings);
        let mut hal = SimulationHal::new();
        let mut planner = SimPlanner::new();
        let mut stepper = SimStepper::new();
        let mut gateway = MotionGateway::new();
        let plane = ArcPlane {
            axis_0: 0,
            axis_1: 1,
            axis_linear: 2,
        };
        let position = [10.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let target = position;
        let offset = [-10.0, 0.0];
        let data = PlanLineData::default();

        let ok = arc(
            &mut gateway, &mut sys, &mut hal, &mut planner, &mut stepper, &settings, &position, &target, offset,
            plane, false, &data,
        );
        assert!(ok);
        assert!(planner.buffered_len() > 1);
    }

    #[test]
    fn degenerate_near_zero_arc_emits_single_segment() {
        let settings = Settings::default();
        let mut sys = SystemState::new(&settings);
        let mut hal = SimulationHal::new();
        let mut planner = SimPlanner::new();
        let mut stepper = SimStepper::new();
        let mut gateway = MotionGateway::new();
        let plane = ArcPlane {
            axis_0: 0,
            axis_1: 1,
            axis_linear: 2,
        };
        let position = [10.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let mut target = position;
        target[0] = 10.001;
        let offset = [-10.0, 0.0];
        let data = PlanLineData::default();

        let ok = arc(
            &mut gateway, &mut sys, &mut hal, &mut planner, &mut stepper, &settings, &position, &target, offset,
            plane, false, &data,
        );
        assert!(ok);
        assert_eq!(planner.buffered_len(), 1);
    }
}
