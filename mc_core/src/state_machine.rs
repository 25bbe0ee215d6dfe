//! State transition rules for `MachineState` (SPEC_FULL.md §4.6, §4.8 step 3).
//!
//! Event-driven `handle_event`/`TransitionResult` shape, covering the
//! 11-state IDLE/CYCLE/HOLD/JOG/HOMING/SAFETY_DOOR/ALARM/ESTOP/SLEEP/
//! CHECK_MODE/TOOL_CHANGE machine and the realtime
//! executor's remaining-bits dispatch (SPEC_FULL.md §4.8 step 3: "remaining
//! bits passed to `update_state`").

use mc_common::error::AlarmCode;
use mc_common::state::MachineState;

/// Event driving a `MachineState` transition, corresponding to one
/// remaining `ExecState` bit (after RESET/STOP/reports are handled by the
/// realtime executor) or to a motion-synthesizer completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    CycleStart,
    FeedHold,
    SafetyDoorOpened,
    SafetyDoorClosed,
    MotionCancel,
    SleepRequested,
    ToolChangeAck,
    JogStarted,
    JogComplete,
    HomingStarted,
    HomingComplete,
    CheckModeEntered,
    CheckModeExited,
    /// An alarm condition was latched; carries the specific alarm so the
    /// caller can report it.
    Alarm(AlarmCode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    Ok(MachineState),
    Rejected(&'static str),
}

/// Owns the current `MachineState` and applies `StateEvent`s to it.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: MachineState,
}

impl StateMachine {
    pub const fn new() -> Self {
        Self {
            state: MachineState::Idle,
        }
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    /// Force the machine into `ESTOP` or `ALARM`, bypassing the normal
    /// transition table (SPEC_FULL.md §4.8 step 2: "If an alarm flag is
    /// latched, transition state to ESTOP ... or ALARM").
    pub fn force_alarm(&mut self, alarm: AlarmCode) {
        self.state = if alarm == AlarmCode::EStop {
            MachineState::EStop
        } else {
            MachineState::Alarm
        };
    }

    /// Force the machine back to `IDLE`, bypassing the normal transition
    /// table (SPEC_FULL.md §4.8 step 3: the `STOP` bit "transition[s] to
    /// IDLE" unconditionally once the stop sequence completes).
    pub fn force_idle(&mut self) {
        self.state = MachineState::Idle;
    }

    pub fn handle_event(&mut self, event: StateEvent) -> TransitionResult {
        use MachineState::*;
        use StateEvent::*;

        if let Alarm(code) = event {
            self.force_alarm(code);
            return TransitionResult::Ok(self.state);
        }

        let next = match (self.state, event) {
            (Idle, CycleStart) => Cycle,
            (Idle, ToolChangeAck) => ToolChange,
            (ToolChange, CycleStart) => Cycle,
            (Idle, JogStarted) => Jog,
            (ToolChange, JogStarted) => Jog,
            (Cycle, FeedHold) => Hold,
            (Cycle, SafetyDoorOpened) => SafetyDoor,
            (Hold, CycleStart) => Cycle,
            (Hold, SleepRequested) => Sleep,
            (Hold, SafetyDoorOpened) => SafetyDoor,
            (SafetyDoor, SafetyDoorClosed) => Hold,
            (SafetyDoor, SleepRequested) => Sleep,
            (Idle, HomingStarted) => Homing,
            (Homing, HomingComplete) => Idle,
            (Idle, JogComplete) => Idle,
            (Jog, JogComplete) => Idle,
            (Jog, MotionCancel) => Idle,
            (Idle, CheckModeEntered) => CheckMode,
            (CheckMode, CheckModeExited) => Idle,
            (Sleep, CycleStart) => Idle,
            // A state-preserving event (e.g. a stray FeedHold while already
            // held) is a no-op, not a rejection.
            (s, FeedHold) if s == Hold => s,
            (s, SafetyDoorClosed) if s != SafetyDoor => s,
            _ => {
                return TransitionResult::Rejected(invalid_transition_reason(self.state, event));
            }
        };

        self.state = next;
        TransitionResult::Ok(next)
    }

    /// States in which incoming G-code is rejected (SPEC_FULL.md §4.6 step 2).
    pub fn blocks_gcode(&self) -> bool {
        self.state.blocks_gcode()
    }

    pub fn allows_jog_start(&self) -> bool {
        matches!(self.state, MachineState::Idle | MachineState::ToolChange)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid_transition_reason(state: MachineState, event: StateEvent) -> &'static str {
    use MachineState::*;
    match state {
        Alarm => "Alarm: only reset clears this state",
        EStop => "EStop: only reset clears this state",
        _ => {
            let _ = event;
            "event not valid for current state"
        }
    }
}
