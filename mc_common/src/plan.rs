//! Planner-facing data structures passed through (not owned) the motion
//! gateway and synthesizers: `PlanLineData`, canned-cycle state, thread
//! state (SPEC_FULL.md §3).

use crate::consts::N_AXIS;

bitflags::bitflags! {
    /// Condition flags carried alongside a planned line (SPEC_FULL.md §3
    /// "a bitfield of conditions").
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PlanCondition: u16 {
        const RAPID_MOTION        = 1 << 0;
        const INVERSE_TIME        = 1 << 1;
        const JOG_MOTION          = 1 << 2;
        const SPINDLE_SYNCHRONIZED = 1 << 3;
        const NO_FEED_OVERRIDE    = 1 << 4;
        const FEED_HOLD_DISABLE   = 1 << 5;
        const BACKLASH_MOTION     = 1 << 6;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpindleDirection {
    Cw,
    Ccw,
}

#[derive(Debug, Clone, Copy)]
pub struct SpindleState {
    pub on: bool,
    pub direction: SpindleDirection,
}

impl Default for SpindleState {
    fn default() -> Self {
        Self {
            on: false,
            direction: SpindleDirection::Cw,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoolantState {
    pub flood: bool,
    pub mist: bool,
}

/// Data accompanying one planned motion segment. Passed through the motion
/// gateway to the planner, never owned by it.
#[derive(Debug, Clone, Copy)]
pub struct PlanLineData {
    pub feed_rate: f64,
    pub spindle_rpm: f64,
    pub spindle: SpindleState,
    pub line_number: i32,
    pub condition: PlanCondition,
}

impl Default for PlanLineData {
    fn default() -> Self {
        Self {
            feed_rate: 0.0,
            spindle_rpm: 0.0,
            spindle: SpindleState::default(),
            line_number: 0,
            condition: PlanCondition::empty(),
        }
    }
}

/// Retract-plane restoration policy for canned drill cycles (SPEC_FULL.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetractMode {
    /// Restore to the R-plane used during the cycle.
    RPos,
    /// Restore to the Z position in effect before the cycle started.
    Previous,
}

/// Which canned-drilling variant is active; affects chip-break retract math
/// (SPEC_FULL.md §4.3 step 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrillMotion {
    Drill,
    DrillChipBreak,
    Boring,
    BoringDwell,
}

#[derive(Debug, Clone, Copy)]
pub struct CannedCycleState {
    pub retract_position: f64,
    pub prev_position: f64,
    pub xyz: [f64; N_AXIS],
    pub delta: f64,
    pub dwell: f64,
    pub retract_mode: RetractMode,
    pub rapid_retract: bool,
    pub spindle_off: bool,
}

impl Default for CannedCycleState {
    fn default() -> Self {
        Self {
            retract_position: 0.0,
            prev_position: 0.0,
            xyz: [0.0; N_AXIS],
            delta: 0.0,
            dwell: 0.0,
            retract_mode: RetractMode::RPos,
            rapid_retract: true,
            spindle_off: false,
        }
    }
}

/// End-taper configuration for threading (SPEC_FULL.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaperKind {
    None,
    Entry,
    Exit,
    Both,
}

#[derive(Debug, Clone, Copy)]
pub struct ThreadState {
    pub pitch: f64,
    pub initial_depth: f64,
    pub depth: f64,
    pub depth_degression: f64,
    pub infeed_angle: f64,
    pub spring_passes: u16,
    pub end_taper_type: TaperKind,
    pub end_taper_length: f64,
    pub main_taper_height: f64,
    pub peak: f64,
    pub cut_direction: f64,
    pub z_final: f64,
}

impl Default for ThreadState {
    fn default() -> Self {
        Self {
            pitch: 0.0,
            initial_depth: 0.0,
            depth: 0.0,
            depth_degression: 1.0,
            infeed_angle: 0.0,
            spring_passes: 0,
            end_taper_type: TaperKind::None,
            end_taper_length: 0.0,
            main_taper_height: 0.0,
            peak: 0.0,
            cut_direction: 1.0,
            z_final: 0.0,
        }
    }
}
