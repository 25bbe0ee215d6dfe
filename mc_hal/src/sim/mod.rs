//! Deterministic in-memory simulation backend: a software-only stand-in
//! for real hardware, suitable for the core's own integration tests and as
//! a template for a real serial/EtherCAT driver.

mod driver;
mod planner;
mod stepper;

pub use driver::SimulationHal;
pub use planner::SimPlanner;
pub use stepper::SimStepper;
