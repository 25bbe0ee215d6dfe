//! Deterministic stand-in for the step-pulse generator (out of scope;
//! SPEC_FULL.md §6). Tracks only the bookkeeping a real stepper driver
//! would expose to the core: whether pulses are running and how many
//! times the buffer was refilled.

use crate::traits::Stepper;

#[derive(Debug, Default)]
pub struct SimStepper {
    running: bool,
    prep_count: u32,
    reset_count: u32,
    parking_setups: u32,
}

impl SimStepper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn prep_count(&self) -> u32 {
        self.prep_count
    }
}

impl Stepper for SimStepper {
    fn prep_buffer(&mut self) {
        self.prep_count += 1;
    }

    fn wake_up(&mut self) {
        self.running = true;
    }

    fn go_idle(&mut self) {
        self.running = false;
    }

    fn reset(&mut self) {
        self.running = false;
        self.reset_count += 1;
    }

    fn parking_setup_buffer(&mut self) {
        self.parking_setups += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wake_up_then_go_idle_toggles_running() {
        let mut stepper = SimStepper::new();
        assert!(!stepper.is_running());
        stepper.wake_up();
        assert!(stepper.is_running());
        stepper.go_idle();
        assert!(!stepper.is_running());
    }

    #[test]
    fn reset_stops_and_counts() {
        let mut stepper = SimStepper::new();
        stepper.wake_up();
        stepper.reset();
        assert!(!stepper.is_running());
        assert_eq!(stepper.reset_count, 1);
    }
}
