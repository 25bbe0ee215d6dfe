//! Shared runtime state aggregate (SPEC_FULL.md §3 "System state").
//!
//! A single owned struct constructed once at startup and passed by `&mut`
//! to every component — no process-wide mutable statics. Fields touched
//! from both the stream-interrupt path and the main loop are the two
//! realtime bitfields and the two override FIFOs; everything else here is
//! plain and main-loop-only.

use mc_common::consts::N_AXIS;
use mc_common::exec::{AccessoryOverrideFifo, AtomicExecAlarm, AtomicExecState, FeedOverrideFifo};
use mc_common::message::PendingMessage;
use mc_common::state::MachineState;

use crate::state_machine::StateMachine;

/// Suspend reasons, tracked as a bitfield so more than one can be in
/// effect at once (e.g. feed-hold pending while the safety door is ajar).
bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SuspendFlags: u8 {
        const HOLD          = 1 << 0;
        const SAFETY_DOOR   = 1 << 1;
        const RESTART_RETRACT = 1 << 2;
        const RESTORE_COMPLETE = 1 << 3;
        const JOG_CANCEL    = 1 << 4;
    }
}

/// Current override percentages and the spindle-stop sub-state entered
/// during a feed hold (SPEC_FULL.md §3 "override").
#[derive(Debug, Clone, Copy)]
pub struct OverrideState {
    pub feed_rate_pct: u8,
    pub rapid_rate_pct: u8,
    pub spindle_rpm_pct: u8,
    pub spindle_stop: bool,
}

impl OverrideState {
    pub fn from_settings(cfg: &mc_common::config::OverrideConfig) -> Self {
        Self {
            feed_rate_pct: cfg.default_feed,
            rapid_rate_pct: cfg.default_rapid,
            spindle_rpm_pct: cfg.default_spindle,
            spindle_stop: false,
        }
    }
}

/// Bitfield of reports pending emission (SPEC_FULL.md §3 "report").
bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ReportFlags: u8 {
        const HOMED     = 1 << 0;
        const SPINDLE   = 1 << 1;
        const COOLANT   = 1 << 2;
        const OVERRIDES = 1 << 3;
        const PROBE     = 1 << 4;
    }
}

/// Miscellaneous booleans that don't warrant their own field
/// (SPEC_FULL.md §3 "flags").
#[derive(Debug, Clone, Copy, Default)]
pub struct MiscFlags {
    pub exit: bool,
    pub block_delete_enabled: bool,
    pub optional_stop_disable: bool,
    pub feed_hold_pending: bool,
    pub delay_overrides: bool,
    pub probe_succeeded: bool,
    pub homed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Off,
    Active,
    Triggered,
}

/// Top-level runtime aggregate (SPEC_FULL.md §3). Owned by the main-loop
/// driver; every component that needs it receives `&mut SystemState`.
#[derive(Debug)]
pub struct SystemState {
    pub machine: StateMachine,
    pub abort: bool,
    pub suspend: SuspendFlags,
    /// Authoritative per-axis machine position (mm), ground truth that the
    /// out-of-scope parser/planner positions are synced to.
    pub position: [f64; N_AXIS],
    pub probe_state: ProbeState,
    pub probe_position: [f64; N_AXIS],
    /// Modal coolant state, mirrored from the HAL (SPEC_FULL.md §4.8 step 4
    /// accessory overrides).
    pub coolant: mc_common::plan::CoolantState,
    pub overrides: OverrideState,
    pub report: ReportFlags,
    pub flags: MiscFlags,
    pub message: PendingMessage,
    pub exec_state: AtomicExecState,
    pub exec_alarm: AtomicExecAlarm,
    pub feed_override_fifo: FeedOverrideFifo,
    pub accessory_override_fifo: AccessoryOverrideFifo,
}

impl SystemState {
    pub fn new(settings: &mc_common::config::Settings) -> Self {
        Self {
            machine: StateMachine::new(),
            abort: false,
            suspend: SuspendFlags::empty(),
            position: [0.0; N_AXIS],
            probe_state: ProbeState::Off,
            probe_position: [0.0; N_AXIS],
            coolant: mc_common::plan::CoolantState::default(),
            overrides: OverrideState::from_settings(&settings.overrides),
            report: ReportFlags::empty(),
            flags: MiscFlags {
                block_delete_enabled: settings.flags.block_delete_enabled,
                ..MiscFlags::default()
            },
            message: PendingMessage::new(),
            exec_state: AtomicExecState::new(),
            exec_alarm: AtomicExecAlarm::new(),
            feed_override_fifo: FeedOverrideFifo::default(),
            accessory_override_fifo: AccessoryOverrideFifo::default(),
        }
    }

    pub fn state(&self) -> MachineState {
        self.machine.state()
    }

    /// Apply a state-machine event, marking a state-change report pending
    /// (SPEC_FULL.md §3 invariant: "the setter emits a state-change report
    /// flag").
    pub fn apply_event(&mut self, event: crate::state_machine::StateEvent) -> crate::state_machine::TransitionResult {
        let result = self.machine.handle_event(event);
        if matches!(result, crate::state_machine::TransitionResult::Ok(_)) {
            self.exec_state.set(mc_common::exec::ExecState::STATUS_REPORT);
        }
        result
    }

    /// True once `abort` latches; every blocking wait must observe this at
    /// its next cooperative checkpoint and return early.
    pub fn is_aborted(&self) -> bool {
        self.abort
    }

    /// Force the machine into `ALARM`/`ESTOP` and latch the alarm flag so
    /// the realtime executor reports it on the next checkpoint
    /// (SPEC_FULL.md §4.8 step 2).
    pub fn raise_alarm(&mut self, alarm: mc_common::error::AlarmCode) {
        self.machine.force_alarm(alarm);
        self.exec_alarm.set(alarm_to_exec_bit(alarm));
        self.exec_state.set(mc_common::exec::ExecState::STATUS_REPORT);
    }
}

fn alarm_to_exec_bit(alarm: mc_common::error::AlarmCode) -> mc_common::exec::ExecAlarm {
    use mc_common::error::AlarmCode::*;
    use mc_common::exec::ExecAlarm;
    match alarm {
        HardLimit => ExecAlarm::HARD_LIMIT,
        SoftLimit => ExecAlarm::SOFT_LIMIT,
        EStop => ExecAlarm::E_STOP,
        AbortCycle => ExecAlarm::ABORT_CYCLE,
        HomingRequired => ExecAlarm::HOMING_REQUIRED,
        HomingFailReset => ExecAlarm::HOMING_FAIL_RESET,
        LimitsEngaged => ExecAlarm::LIMITS_ENGAGED,
        ProbeFailInitial => ExecAlarm::PROBE_FAIL_INITIAL,
        ProbeFailContact => ExecAlarm::PROBE_FAIL_CONTACT,
    }
}

/// Recover the highest-priority latched alarm from a taken `ExecAlarm`
/// bitset, for the realtime executor's step 2 (hard/soft-limit/e-stop take
/// priority over the others when more than one bit is somehow latched at
/// once).
pub(crate) fn highest_priority_alarm(
    bits: mc_common::exec::ExecAlarm,
) -> Option<mc_common::error::AlarmCode> {
    use mc_common::error::AlarmCode::*;
    use mc_common::exec::ExecAlarm;
    const ORDER: &[(ExecAlarm, mc_common::error::AlarmCode)] = &[
        (ExecAlarm::E_STOP, EStop),
        (ExecAlarm::HARD_LIMIT, HardLimit),
        (ExecAlarm::SOFT_LIMIT, SoftLimit),
        (ExecAlarm::LIMITS_ENGAGED, LimitsEngaged),
        (ExecAlarm::HOMING_FAIL_RESET, HomingFailReset),
        (ExecAlarm::HOMING_REQUIRED, HomingRequired),
        (ExecAlarm::PROBE_FAIL_CONTACT, ProbeFailContact),
        (ExecAlarm::PROBE_FAIL_INITIAL, ProbeFailInitial),
        (ExecAlarm::ABORT_CYCLE, AbortCycle),
    ];
    ORDER
        .iter()
        .find(|(bit, _)| bits.contains(*bit))
        .map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_idle_not_aborted() {
        let settings = mc_common::config::Settings::default();
        let sys = SystemState::new(&settings);
        assert_eq!(sys.state(), MachineState::Idle);
        assert!(!sys.is_aborted());
    }

    #[test]
    fn apply_event_marks_status_report_pending() {
        let settings = mc_common::config::Settings::default();
        let mut sys = SystemState::new(&settings);
        sys.apply_event(crate::state_machine::StateEvent::CycleStart);
        assert_eq!(sys.state(), MachineState::Cycle);
        assert!(sys
            .exec_state
            .peek()
            .contains(mc_common::exec::ExecState::STATUS_REPORT));
    }
}
