//! Deterministic stand-in for the velocity/acceleration planner. Buffers
//! segments in a bounded queue, tracks the synced position, and reports
//! back pressure like a real look-ahead planner would — without actually
//! performing any trajectory math (out of scope; SPEC_FULL.md §6).

use std::collections::VecDeque;

use mc_common::consts::N_AXIS;
use mc_common::plan::PlanLineData;

use crate::traits::Planner;

const SIM_PLANNER_BUFFER_SIZE: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct BufferedSegment {
    pub target: [f64; N_AXIS],
    pub data: PlanLineData,
}

#[derive(Debug)]
pub struct SimPlanner {
    queue: VecDeque<BufferedSegment>,
    position: [f64; N_AXIS],
    feed_override: u8,
    rapid_override: u8,
}

impl Default for SimPlanner {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            position: [0.0; N_AXIS],
            feed_override: mc_common::consts::DEFAULT_FEED_OVERRIDE,
            rapid_override: mc_common::consts::DEFAULT_RAPID_OVERRIDE,
        }
    }
}

impl SimPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> [f64; N_AXIS] {
        self.position
    }

    /// Pop and discard the oldest buffered segment, as the stepper would
    /// once it finishes executing it.
    pub fn consume_one(&mut self) -> Option<BufferedSegment> {
        self.queue.pop_front()
    }

    pub fn buffered_len(&self) -> usize {
        self.queue.len()
    }

    pub fn overrides(&self) -> (u8, u8) {
        (self.feed_override, self.rapid_override)
    }
}

impl Planner for SimPlanner {
    fn buffer_line(&mut self, target: &[f64; N_AXIS], data: &PlanLineData) -> bool {
        if self.queue.len() >= SIM_PLANNER_BUFFER_SIZE {
            return false;
        }
        if target == &self.position {
            return false;
        }
        self.queue.push_back(BufferedSegment {
            target: *target,
            data: *data,
        });
        self.position = *target;
        true
    }

    fn check_full_buffer(&self) -> bool {
        self.queue.len() >= SIM_PLANNER_BUFFER_SIZE
    }

    fn has_current_block(&self) -> bool {
        !self.queue.is_empty()
    }

    fn reset(&mut self) {
        self.queue.clear();
    }

    fn sync_position(&mut self, position: &[f64; N_AXIS]) {
        self.position = *position;
    }

    fn feed_override(&mut self, feed_pct: u8, rapid_pct: u8) {
        self.feed_override = feed_pct;
        self.rapid_override = rapid_pct;
    }
}
