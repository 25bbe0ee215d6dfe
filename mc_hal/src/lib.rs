//! Hardware abstraction layer for the CNC motion controller core:
//! collaborator traits (SPEC_FULL.md §6) and a deterministic simulation
//! backend used by the core's own test suite.

pub mod error;
pub mod sim;
pub mod traits;
pub mod types;

pub mod prelude {
    pub use crate::error::HalError;
    pub use crate::sim::{SimPlanner, SimStepper, SimulationHal};
    pub use crate::traits::{
        ControlHal, CoolantHal, DriverHooks, Hal, LimitsHal, Planner, ProbeHal, ReportsHal,
        SpindleHal, Stepper, StreamHal,
    };
    pub use crate::types::{ControlState, LimitsMask, PlannerSegment, ReportedCoolant, ReportedSpindle, SERIAL_NO_DATA};
}
