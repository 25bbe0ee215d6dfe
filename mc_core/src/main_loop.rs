//! The main loop driver (SPEC_FULL.md §4.6): startup checks, then the
//! six-step loop body. G-code tokenizing, `$` system commands, and `[`
//! user commands are out-of-scope collaborators (SPEC_FULL.md §1
//! Non-goals: "does not interpret G-code tokens beyond receiving parsed
//! parameter blocks") — consumed here through small dispatch traits.
//!
//! Grounded on `protocol.c`'s `protocol_main_loop`.

use mc_common::error::StatusCode;
use mc_hal::traits::{Hal, Planner, Stepper};

use crate::input_filter::{enqueue_realtime_command, LineEvent, LineFilter};
use crate::realtime::{auto_cycle_start, execute_realtime_checkpoint};
use crate::sys::SystemState;

/// Result of dispatching one assembled G-code block to the out-of-scope
/// parser (SPEC_FULL.md §1 Non-goals).
pub trait GcodeHandler: Send {
    fn execute_block(&mut self, line: &[u8], user_message: Option<&str>) -> StatusCode;
}

/// `$...` system commands (settings queries/writes, homing trigger, etc).
pub trait SystemCommandHandler: Send {
    fn execute(&mut self, line: &[u8]) -> StatusCode;
}

/// `[...` user-installed commands; absent unless the integrator installs one.
pub trait UserCommandHandler: Send {
    fn execute(&mut self, line: &[u8]) -> StatusCode;
}

/// Everything the main loop needs beyond `SystemState`, bundled so `run`
/// doesn't take an unreadable number of parameters.
pub struct MainLoopContext<'a> {
    pub hal: &'a mut dyn Hal,
    pub planner: &'a mut dyn Planner,
    pub stepper: &'a mut dyn Stepper,
    pub settings: &'a mc_common::config::Settings,
    pub gcode: &'a mut dyn GcodeHandler,
    pub system_commands: &'a mut dyn SystemCommandHandler,
    pub user_commands: Option<&'a mut dyn UserCommandHandler>,
}

/// Startup sequence (SPEC_FULL.md §4.6 "Startup"), run once before the loop.
pub fn startup(sys: &mut SystemState, ctx: &mut MainLoopContext) {
    use mc_common::error::AlarmCode;
    use mc_common::state::MachineState;
    use mc_hal::traits::{ControlHal, LimitsHal};

    if ControlHal::get_state(ctx.hal).e_stop {
        sys.raise_alarm(AlarmCode::EStop);
        return;
    }
    if ctx.settings.homing.enabled && !sys.flags.homed {
        sys.raise_alarm(AlarmCode::HomingRequired);
        return;
    }
    if ctx.settings.limits.check_at_init && !LimitsHal::get_state(ctx.hal).is_empty() {
        sys.raise_alarm(AlarmCode::LimitsEngaged);
        return;
    }
    if ctx.settings.flags.force_initialization_alarm {
        sys.raise_alarm(AlarmCode::AbortCycle);
        return;
    }
    if matches!(sys.state(), MachineState::Alarm | MachineState::Sleep) {
        // Re-assert whatever alarm is already latched; nothing further to do.
    }
    // Otherwise the machine is already IDLE (the state machine's initial
    // state); safety-door checks and startup scripts are driven by the
    // first realtime checkpoint and the gcode/system-command handlers.
}

/// One iteration of the loop body (SPEC_FULL.md §4.6 "Loop body" steps 1-6).
/// Returns `false` when the realtime executor observes abort, signalling
/// the caller to exit to the reinitialization site.
pub fn run_once(sys: &mut SystemState, filter: &mut LineFilter, ctx: &mut MainLoopContext) -> bool {
    // Step 1: drain input, feeding each byte through realtime extraction
    // then the line filter.
    loop {
        let raw = ctx.hal.read();
        if raw == mc_hal::types::SERIAL_NO_DATA {
            break;
        }
        let byte = raw as u8;
        let keep_rt_commands = false; // nocaps/comment suppression handled inside the filter
        if enqueue_realtime_command(byte, sys, ctx.settings, keep_rt_commands) {
            continue;
        }
        if let Some(event) = filter.push_byte(byte, sys.flags.block_delete_enabled, sys) {
            if !dispatch_line(sys, event, ctx) {
                return false;
            }
        }
    }

    // Step 5: auto-cycle-start then a checkpoint.
    auto_cycle_start(sys);
    if !execute_realtime_checkpoint(sys, ctx.hal, ctx.planner, ctx.stepper, ctx.settings) {
        return false;
    }

    // Step 6: sleep-timer poll is a HAL/platform concern out of this core's
    // scope beyond requesting the transition; nothing further to do here.
    true
}

fn dispatch_line(sys: &mut SystemState, event: LineEvent, ctx: &mut MainLoopContext) -> bool {
    if !execute_realtime_checkpoint(sys, ctx.hal, ctx.planner, ctx.stepper, ctx.settings) {
        return false;
    }

    let status = classify_and_execute(sys, &event, ctx);
    ctx.hal.status_message(status);
    true
}

fn classify_and_execute(sys: &mut SystemState, event: &LineEvent, ctx: &mut MainLoopContext) -> StatusCode {
    use mc_common::state::MachineState;

    if event.overflow {
        return StatusCode::Overflow;
    }
    if event.line.is_empty() && event.user_message.is_none() {
        return StatusCode::Ok;
    }
    if event.line.first() == Some(&b'$') {
        let status = ctx.system_commands.execute(&event.line);
        if status == StatusCode::LimitsEngaged {
            sys.raise_alarm(mc_common::error::AlarmCode::LimitsEngaged);
        }
        return status;
    }
    if event.line.first() == Some(&b'[') {
        if let Some(handler) = ctx.user_commands.as_deref_mut() {
            return handler.execute(&event.line);
        }
    }
    if matches!(sys.state(), MachineState::Alarm | MachineState::EStop | MachineState::Jog) {
        return StatusCode::SystemGClock;
    }
    if event.block_deleted {
        return StatusCode::Ok;
    }
    ctx.gcode.execute_block(&event.line, event.user_message.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_common::config::Settings;
    use mc_hal::sim::{SimPlanner, SimStepper, SimulationHal};

    struct NoopGcode;
    impl GcodeHandler for NoopGcode {
        fn execute_block(&mut self, _line: &[u8], _msg: Option<&str>) -> StatusCode {
            StatusCode::Ok
        }
    }

    struct NoopSystemCommands;
    impl SystemCommandHandler for NoopSystemCommands {
        fn execute(&mut self, _line: &[u8]) -> StatusCode {
            StatusCode::Ok
        }
    }

    #[test]
    fn empty_line_reports_ok() {
        let settings = Settings::default();
        let mut sys = SystemState::new(&settings);
        let mut hal = SimulationHal::new();
        let mut planner = SimPlanner::new();
        let mut stepper = SimStepper::new();
        let mut gcode = NoopGcode;
        let mut system_commands = NoopSystemCommands;
        hal.feed_line("");
        let mut filter = LineFilter::new();
        let mut ctx = MainLoopContext {
            hal: &mut hal,
            planner: &mut planner,
            stepper: &mut stepper,
            settings: &settings,
            gcode: &mut gcode,
            system_commands: &mut system_commands,
            user_commands: None,
        };
        assert!(run_once(&mut sys, &mut filter, &mut ctx));
        assert_eq!(ctx.hal.log.status_messages, vec![StatusCode::Ok]);
    }

    #[test]
    fn overflow_line_reports_overflow() {
        let settings = Settings::default();
        let mut sys = SystemState::new(&settings);
        let mut hal = SimulationHal::new();
        let mut planner = SimPlanner::new();
        let mut stepper = SimStepper::new();
        let mut gcode = NoopGcode;
        let mut system_commands = NoopSystemCommands;
        let long_line = "X".repeat(mc_common::consts::LINE_BUFFER_SIZE + 5);
        hal.feed_line(&long_line);
        let mut filter = LineFilter::new();
        let mut ctx = MainLoopContext {
            hal: &mut hal,
            planner: &mut planner,
            stepper: &mut stepper,
            settings: &settings,
            gcode: &mut gcode,
            system_commands: &mut system_commands,
            user_commands: None,
        };
        assert!(run_once(&mut sys, &mut filter, &mut ctx));
        assert_eq!(ctx.hal.log.status_messages, vec![StatusCode::Overflow]);
    }

    #[test]
    fn gcode_rejected_while_locked_in_alarm() {
        let settings = Settings::default();
        let mut sys = SystemState::new(&settings);
        sys.raise_alarm(mc_common::error::AlarmCode::SoftLimit);
        let mut hal = SimulationHal::new();
        let mut planner = SimPlanner::new();
        let mut stepper = SimStepper::new();
        let mut gcode = NoopGcode;
        let mut system_commands = NoopSystemCommands;
        hal.feed_line("G1X1");
        let mut filter = LineFilter::new();
        let mut ctx = MainLoopContext {
            hal: &mut hal,
            planner: &mut planner,
            stepper: &mut stepper,
            settings: &settings,
            gcode: &mut gcode,
            system_commands: &mut system_commands,
            user_commands: None,
        };
        assert!(run_once(&mut sys, &mut filter, &mut ctx));
        assert_eq!(ctx.hal.log.status_messages, vec![StatusCode::SystemGClock]);
    }
}
