//! Top-level machine state.

use serde::{Deserialize, Serialize};

/// The coarse-grained state the whole controller sits in. Exactly one is
/// active at a time (FR matches the source `STATE_*` mask convention, but
/// represented here as a plain enum since states here are mutually
/// exclusive, never OR'd together for storage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MachineState {
    Idle = 0,
    Cycle,
    Hold,
    Jog,
    Homing,
    SafetyDoor,
    Alarm,
    EStop,
    Sleep,
    CheckMode,
    ToolChange,
}

impl MachineState {
    /// States in which the realtime executor refills the step-segment
    /// buffer (SPEC_FULL.md §4.8 step 5).
    pub fn drains_step_buffer(self) -> bool {
        matches!(
            self,
            MachineState::Cycle
                | MachineState::Hold
                | MachineState::SafetyDoor
                | MachineState::Homing
                | MachineState::Sleep
                | MachineState::Jog
        )
    }

    /// States in which incoming G-code is rejected with `SystemGClock`
    /// (SPEC_FULL.md §4.6 step 2).
    pub fn blocks_gcode(self) -> bool {
        matches!(
            self,
            MachineState::Alarm | MachineState::EStop | MachineState::Jog
        )
    }

    pub fn is_motion_state(self) -> bool {
        matches!(
            self,
            MachineState::Cycle | MachineState::Homing | MachineState::Jog
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MachineState::Idle => "Idle",
            MachineState::Cycle => "Run",
            MachineState::Hold => "Hold",
            MachineState::Jog => "Jog",
            MachineState::Homing => "Home",
            MachineState::SafetyDoor => "Door",
            MachineState::Alarm => "Alarm",
            MachineState::EStop => "EStop",
            MachineState::Sleep => "Sleep",
            MachineState::CheckMode => "Check",
            MachineState::ToolChange => "Tool",
        }
    }
}

impl Default for MachineState {
    fn default() -> Self {
        MachineState::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle() {
        assert_eq!(MachineState::default(), MachineState::Idle);
    }

    #[test]
    fn step_buffer_drain_states() {
        assert!(MachineState::Cycle.drains_step_buffer());
        assert!(MachineState::Jog.drains_step_buffer());
        assert!(!MachineState::Idle.drains_step_buffer());
        assert!(!MachineState::Alarm.drains_step_buffer());
    }

    #[test]
    fn gcode_block_states() {
        assert!(MachineState::Alarm.blocks_gcode());
        assert!(MachineState::EStop.blocks_gcode());
        assert!(MachineState::Jog.blocks_gcode());
        assert!(!MachineState::Idle.blocks_gcode());
        assert!(!MachineState::Cycle.blocks_gcode());
    }
}
