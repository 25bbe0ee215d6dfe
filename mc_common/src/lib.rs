//! Shared types for the CNC motion controller core: machine state, realtime
//! bitfields and override FIFOs, planner-facing data structures, the
//! configuration schema, and the status/alarm error taxonomy.

pub mod config;
pub mod consts;
pub mod error;
pub mod exec;
pub mod message;
pub mod plan;
pub mod state;

pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::consts::*;
    pub use crate::error::{AlarmCode, StatusCode};
    pub use crate::exec::{
        AccessoryOverrideCmd, AccessoryOverrideFifo, AtomicExecAlarm, AtomicExecState, ExecAlarm,
        ExecState, FeedOverrideCmd, FeedOverrideFifo,
    };
    pub use crate::message::PendingMessage;
    pub use crate::plan::{
        CannedCycleState, DrillMotion, PlanCondition, PlanLineData, RetractMode, SpindleState,
        TaperKind, ThreadState,
    };
    pub use crate::state::MachineState;
}
