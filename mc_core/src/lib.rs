//! CNC motion controller core library: state machine, realtime executor,
//! input filter, main loop, and motion synthesizers (SPEC_FULL.md).
//!
//! The binary (`src/main.rs`) is a thin CLI wrapper around this library.

pub mod error;
pub mod homing;
pub mod input_filter;
pub mod main_loop;
pub mod motion;
pub mod realtime;
pub mod reset;
pub mod state_machine;
pub mod suspend;
pub mod sys;
