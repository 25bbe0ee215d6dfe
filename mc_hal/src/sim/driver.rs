//! In-memory simulation of every HAL capability: a scripted byte stream,
//! software limit/probe/control-pin state the test harness can poke
//! directly, and spindle/coolant state capture for assertions.

use std::collections::VecDeque;

use mc_common::error::{AlarmCode, StatusCode};
use mc_common::plan::{CoolantState, SpindleState};
use mc_common::state::MachineState;

use crate::error::HalError;
use crate::traits::{
    ControlHal, CoolantHal, DriverHooks, DwellHal, Hal, LimitsHal, ProbeHal, ReportsHal, SpindleHal, StreamHal,
};
use crate::types::{ControlState, LimitsMask, SERIAL_NO_DATA};

/// Every status/alarm/report callback the test harness wants to observe
/// after running a scenario.
#[derive(Debug, Default, Clone)]
pub struct ReportLog {
    pub status_messages: Vec<StatusCode>,
    pub alarm_feedback: Vec<AlarmCode>,
    pub alarm_reports: Vec<AlarmCode>,
    pub shown_messages: Vec<String>,
    pub echoed_lines: Vec<String>,
    pub status_reports: u32,
    pub gcode_reports: u32,
    pub pid_reports: u32,
    pub probe_parameter_reports: u32,
}

#[derive(Debug, Default)]
pub struct SimulationHal {
    input: VecDeque<u8>,
    suspended: bool,
    limits_mask: LimitsMask,
    hard_limits_enabled: bool,
    homing_limits_enabled: bool,
    probe_invert: bool,
    probe_triggered: bool,
    control: ControlState,
    pub spindle: SpindleState,
    pub spindle_rpm: f64,
    pub coolant: CoolantState,
    pub reset_count: u32,
    pub log: ReportLog,
    pub dwell_ticks: Vec<u32>,
}

impl SimulationHal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes onto the simulated stream (test harness helper).
    pub fn feed(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    pub fn feed_line(&mut self, line: &str) {
        self.feed(line.as_bytes());
        self.feed(b"\n");
    }

    pub fn set_limit(&mut self, mask: LimitsMask, engaged: bool) {
        if engaged {
            self.limits_mask.insert(mask);
        } else {
            self.limits_mask.remove(mask);
        }
    }

    pub fn set_probe_triggered(&mut self, triggered: bool) {
        self.probe_triggered = triggered;
    }

    pub fn set_control(&mut self, control: ControlState) {
        self.control = control;
    }

    pub fn request_e_stop(&mut self, active: bool) {
        self.control.e_stop = active;
    }

    pub fn request_reset(&mut self) {
        self.control.reset = true;
    }
}

impl StreamHal for SimulationHal {
    fn read(&mut self) -> i16 {
        if self.suspended {
            return SERIAL_NO_DATA;
        }
        self.input.pop_front().map(i16::from).unwrap_or(SERIAL_NO_DATA)
    }

    fn suspend_read(&mut self, suspend: bool) -> bool {
        let prev = self.suspended;
        self.suspended = suspend;
        prev
    }

    fn cancel_read_buffer(&mut self) {
        self.input.clear();
    }
}

impl LimitsHal for SimulationHal {
    fn enable(&mut self, hard: bool, homing: bool) {
        self.hard_limits_enabled = hard;
        self.homing_limits_enabled = homing;
    }

    fn get_state(&self) -> LimitsMask {
        self.limits_mask
    }
}

impl ProbeHal for SimulationHal {
    fn configure_invert_mask(&mut self, invert: bool) {
        self.probe_invert = invert;
    }

    fn get_state(&self) -> bool {
        self.probe_triggered != self.probe_invert
    }
}

impl SpindleHal for SimulationHal {
    fn set_state(&mut self, state: SpindleState, rpm: f64) {
        self.spindle = state;
        self.spindle_rpm = rpm;
    }
}

impl CoolantHal for SimulationHal {
    fn set_state(&mut self, state: CoolantState) {
        self.coolant = state;
    }
}

impl ControlHal for SimulationHal {
    fn get_state(&self) -> ControlState {
        self.control
    }
}

impl DwellHal for SimulationHal {
    fn delay_tick(&mut self, ms: u32) {
        self.dwell_ticks.push(ms);
    }
}

impl ReportsHal for SimulationHal {
    fn status_message(&mut self, code: StatusCode) {
        self.log.status_messages.push(code);
    }

    fn feedback_message(&mut self, alarm: AlarmCode) {
        self.log.alarm_feedback.push(alarm);
    }

    fn show_message(&mut self, message: &str) {
        self.log.shown_messages.push(message.to_string());
    }

    fn report_realtime_status(&mut self) {
        self.log.status_reports += 1;
    }

    fn report_gcode_modes(&mut self) {
        self.log.gcode_reports += 1;
    }

    fn report_pid_log(&mut self) {
        self.log.pid_reports += 1;
    }

    fn report_probe_parameters(&mut self) {
        self.log.probe_parameter_reports += 1;
    }

    fn report_alarm_message(&mut self, alarm: AlarmCode) {
        self.log.alarm_reports.push(alarm);
    }

    fn report_echo_line_received(&mut self, line: &str) {
        self.log.echoed_lines.push(line.to_string());
    }
}

impl DriverHooks for SimulationHal {
    fn driver_reset(&mut self) {
        self.reset_count += 1;
        self.control.reset = false;
    }

    fn execute_realtime(&mut self, _state: MachineState) {}

    fn driver_rt_command_execute(&mut self, _cmd: u8) {}
}

impl Hal for SimulationHal {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn init(&mut self) -> Result<(), HalError> {
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        Ok(())
    }
}
