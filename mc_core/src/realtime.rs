//! The realtime executor (SPEC_FULL.md §4.8): a single checkpoint function
//! invoked from every blocking wait in the main loop and motion
//! synthesizers. Ordering of its six steps is fixed and must never be
//! reordered by a caller.
//!
//! Grounded on `protocol.c`'s `protocol_exec_rt_system`.

use mc_common::consts::{MAX_OVERRIDE_PCT, MIN_OVERRIDE_PCT};
use mc_common::exec::ExecState;
use mc_common::state::MachineState;
use mc_hal::traits::{CoolantHal, Hal, Planner, SpindleHal, Stepper};
use mc_hal::types::SERIAL_NO_DATA;

use crate::input_filter::{self, CAN};
use crate::state_machine::StateEvent;
use crate::sys::SystemState;

/// Run one realtime checkpoint. Returns `false` once `sys.abort` is set, at
/// which point every caller up the stack must unwind to the main loop
/// (SPEC_FULL.md §5 "Cancellation semantics").
pub fn execute_realtime_checkpoint(
    sys: &mut SystemState,
    hal: &mut dyn Hal,
    planner: &mut dyn Planner,
    stepper: &mut dyn Stepper,
    settings: &mc_common::config::Settings,
) -> bool {
    // Step 1: display any pending message.
    if let Some(message) = sys.message.take() {
        hal.show_message(&message);
    }

    // Step 2: alarm handling.
    let alarm_bits = sys.exec_alarm.take();
    if !alarm_bits.is_empty() {
        if let Some(alarm) = crate::sys::highest_priority_alarm(alarm_bits) {
            sys.raise_alarm(alarm);
            hal.report_alarm_message(alarm);

            use mc_common::error::AlarmCode::*;
            if matches!(alarm, HardLimit | SoftLimit | EStop) {
                block_until_reset(sys, hal, settings);
            }
        }
    }

    // Step 3: read-and-clear exec_state.
    let bits = sys.exec_state.take();

    if bits.contains(ExecState::RESET) {
        hal.driver_reset();
        if sys.state() != MachineState::EStop {
            sys.abort = true;
        }
        return !sys.abort;
    }

    if bits.contains(ExecState::STOP) {
        run_stop_sequence(sys, hal, planner, stepper);
    }

    if bits.contains(ExecState::STATUS_REPORT) {
        hal.report_realtime_status();
    }
    if bits.contains(ExecState::GCODE_REPORT) {
        hal.report_gcode_modes();
    }
    if bits.contains(ExecState::PID_REPORT) {
        hal.report_pid_log();
    }

    if sys.flags.feed_hold_pending {
        sys.flags.feed_hold_pending = false;
        if !bits.contains(ExecState::CYCLE_START) {
            sys.apply_event(StateEvent::FeedHold);
        }
    }

    dispatch_remaining(sys, bits);

    // Step 4: drain override FIFOs unless delayed.
    if !sys.flags.delay_overrides {
        drain_feed_overrides(sys, planner);
        drain_accessory_overrides(sys, hal);
    }

    // Step 5: refill the step-segment buffer in motion-bearing states.
    if sys.state().drains_step_buffer() {
        stepper.prep_buffer();
    }

    // Step 6.
    !sys.abort
}

/// Translate exec_state bits not already consumed by steps 1-4 into state
/// events (SPEC_FULL.md §4.8 step 3: "remaining bits passed to
/// `update_state`").
fn dispatch_remaining(sys: &mut SystemState, bits: ExecState) {
    if bits.contains(ExecState::CYCLE_START) {
        let _ = sys.apply_event(StateEvent::CycleStart);
    }
    if bits.contains(ExecState::MOTION_CANCEL) {
        let _ = sys.apply_event(StateEvent::MotionCancel);
    }
    if bits.contains(ExecState::SAFETY_DOOR) {
        let _ = sys.apply_event(StateEvent::SafetyDoorOpened);
    }
    if bits.contains(ExecState::SLEEP) {
        let _ = sys.apply_event(StateEvent::SleepRequested);
    }
    if bits.contains(ExecState::TOOL_CHANGE_ACK) {
        let _ = sys.apply_event(StateEvent::ToolChangeAck);
    }
}

fn run_stop_sequence(sys: &mut SystemState, hal: &mut dyn Hal, planner: &mut dyn Planner, stepper: &mut dyn Stepper) {
    use mc_common::plan::{CoolantState, SpindleState};

    stepper.reset();
    SpindleHal::set_state(hal, SpindleState::default(), 0.0);
    sys.coolant = CoolantState::default();
    CoolantHal::set_state(hal, sys.coolant);
    planner.reset();
    planner.sync_position(&sys.position);
    sys.machine.force_idle();
}

/// Blocking loop entered on a hard-limit, soft-limit, or e-stop alarm: only
/// reset and status-report bytes have any effect until reset is observed
/// (SPEC_FULL.md §4.8 step 2).
fn block_until_reset(sys: &mut SystemState, hal: &mut dyn Hal, settings: &mc_common::config::Settings) {
    loop {
        let raw = hal.read();
        if raw == SERIAL_NO_DATA {
            continue;
        }
        let byte = raw as u8;
        if byte == CAN {
            continue;
        }
        let consumed = input_filter::enqueue_realtime_command(byte, sys, settings, false);
        if !consumed {
            continue;
        }
        if sys.exec_state.peek().contains(ExecState::RESET) {
            return;
        }
        if sys.exec_state.peek().contains(ExecState::STATUS_REPORT) {
            sys.exec_state.clear(ExecState::STATUS_REPORT);
            hal.report_realtime_status();
        }
    }
}

/// Start a cycle once the planner has buffered work and the machine is
/// idle (SPEC_FULL.md §4.6 step 5, §4.1 step 5 "ensures steppers run if a
/// block is available").
pub fn auto_cycle_start(sys: &mut SystemState) {
    if sys.state() == MachineState::Idle {
        let _ = sys.apply_event(StateEvent::CycleStart);
    }
}

fn clamp_pct(value: i32) -> u8 {
    value.clamp(MIN_OVERRIDE_PCT as i32, MAX_OVERRIDE_PCT as i32) as u8
}

fn drain_feed_overrides(sys: &mut SystemState, planner: &mut dyn Planner) {
    use mc_common::consts::{
        DEFAULT_FEED_OVERRIDE, DEFAULT_RAPID_OVERRIDE, FEED_OVERRIDE_COARSE_INCREMENT,
        FEED_OVERRIDE_FINE_INCREMENT, RAPID_OVERRIDE_LOW, RAPID_OVERRIDE_MEDIUM,
    };
    use mc_common::exec::FeedOverrideCmd::*;

    let mut changed = false;
    while let Some(cmd) = sys.feed_override_fifo.pop() {
        changed = true;
        let o = &mut sys.overrides;
        match cmd {
            Reset => o.feed_rate_pct = DEFAULT_FEED_OVERRIDE,
            CoarsePlus => o.feed_rate_pct = clamp_pct(o.feed_rate_pct as i32 + FEED_OVERRIDE_COARSE_INCREMENT as i32),
            CoarseMinus => o.feed_rate_pct = clamp_pct(o.feed_rate_pct as i32 - FEED_OVERRIDE_COARSE_INCREMENT as i32),
            FinePlus => o.feed_rate_pct = clamp_pct(o.feed_rate_pct as i32 + FEED_OVERRIDE_FINE_INCREMENT as i32),
            FineMinus => o.feed_rate_pct = clamp_pct(o.feed_rate_pct as i32 - FEED_OVERRIDE_FINE_INCREMENT as i32),
            RapidReset => o.rapid_rate_pct = DEFAULT_RAPID_OVERRIDE,
            RapidMedium => o.rapid_rate_pct = RAPID_OVERRIDE_MEDIUM,
            RapidLow => o.rapid_rate_pct = RAPID_OVERRIDE_LOW,
        }
    }
    if changed {
        planner.feed_override(sys.overrides.feed_rate_pct, sys.overrides.rapid_rate_pct);
        sys.report.insert(crate::sys::ReportFlags::OVERRIDES);
    }
}

fn drain_accessory_overrides(sys: &mut SystemState, hal: &mut dyn Hal) {
    use mc_common::consts::{
        DEFAULT_SPINDLE_RPM_OVERRIDE, SPINDLE_OVERRIDE_COARSE_INCREMENT, SPINDLE_OVERRIDE_FINE_INCREMENT,
    };
    use mc_common::exec::AccessoryOverrideCmd::*;
    use mc_common::state::MachineState as M;

    while let Some(cmd) = sys.accessory_override_fifo.pop() {
        match cmd {
            SpindleReset => sys.overrides.spindle_rpm_pct = DEFAULT_SPINDLE_RPM_OVERRIDE,
            SpindleCoarsePlus => {
                sys.overrides.spindle_rpm_pct =
                    clamp_pct(sys.overrides.spindle_rpm_pct as i32 + SPINDLE_OVERRIDE_COARSE_INCREMENT as i32);
            }
            SpindleCoarseMinus => {
                sys.overrides.spindle_rpm_pct =
                    clamp_pct(sys.overrides.spindle_rpm_pct as i32 - SPINDLE_OVERRIDE_COARSE_INCREMENT as i32);
            }
            SpindleFinePlus => {
                sys.overrides.spindle_rpm_pct =
                    clamp_pct(sys.overrides.spindle_rpm_pct as i32 + SPINDLE_OVERRIDE_FINE_INCREMENT as i32);
            }
            SpindleFineMinus => {
                sys.overrides.spindle_rpm_pct =
                    clamp_pct(sys.overrides.spindle_rpm_pct as i32 - SPINDLE_OVERRIDE_FINE_INCREMENT as i32);
            }
            SpindleStop => {
                if sys.state() == M::Hold {
                    sys.overrides.spindle_stop = !sys.overrides.spindle_stop;
                }
            }
            CoolantFloodToggle => {
                if matches!(sys.state(), M::Idle | M::Cycle | M::Hold) {
                    sys.coolant.flood = !sys.coolant.flood;
                    CoolantHal::set_state(hal, sys.coolant);
                    sys.report.insert(crate::sys::ReportFlags::COOLANT);
                }
            }
            CoolantMistToggle => {
                if matches!(sys.state(), M::Idle | M::Cycle | M::Hold) {
                    sys.coolant.mist = !sys.coolant.mist;
                    CoolantHal::set_state(hal, sys.coolant);
                    sys.report.insert(crate::sys::ReportFlags::COOLANT);
                }
            }
        }
        sys.report.insert(crate::sys::ReportFlags::OVERRIDES);
    }
}
