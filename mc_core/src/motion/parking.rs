//! Parking motion: always accepted regardless of planner buffer state or
//! feed-hold status, since it must be able to retract the tool even while
//! the rest of the machine is held (SPEC_FULL.md §4.5 "Parking").
//!
//! Grounded on `motion_control.c::mc_parking_motion`.

use mc_common::consts::N_AXIS;
use mc_common::plan::PlanLineData;
use mc_hal::traits::{Planner, Stepper};

/// Inserts a single parking line at the planner's always-free ring-buffer
/// head and primes the stepper to execute it immediately, bypassing the
/// ordinary backpressure and feed-hold gating the motion gateway applies.
pub fn park(planner: &mut dyn Planner, stepper: &mut dyn Stepper, target: &[f64; N_AXIS], pl_data: &PlanLineData) -> bool {
    let accepted = planner.buffer_line(target, pl_data);
    stepper.parking_setup_buffer();
    stepper.wake_up();
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_common::plan::PlanLineData;
    use mc_hal::sim::{SimPlanner, SimStepper};

    #[test]
    fn parking_wakes_stepper_regardless_of_buffer_state() {
        let mut planner = SimPlanner::new();
        let mut stepper = SimStepper::new();
        let data = PlanLineData::default();
        let ok = park(&mut planner, &mut stepper, &[1.0; N_AXIS], &data);
        assert!(ok);
        assert!(stepper.is_running());
    }
}
