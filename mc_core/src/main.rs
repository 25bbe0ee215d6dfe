//! # Motion Controller Core
//!
//! CLI entry point: loads configuration, constructs a HAL backend (the
//! simulation backend unless a real driver is wired in), and runs the
//! main loop to completion or shutdown signal.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use mc_common::error::StatusCode;
use mc_core::error::McError;
use mc_core::main_loop::{self, GcodeHandler, MainLoopContext, SystemCommandHandler};
use mc_core::sys::SystemState;
use mc_hal::sim::{SimPlanner, SimStepper, SimulationHal};

/// Motion controller core runtime.
#[derive(Parser, Debug)]
#[command(name = "mc_core")]
#[command(version)]
#[command(about = "CNC motion controller core runtime")]
struct Args {
    /// Path to the TOML settings file.
    #[arg(short, long, default_value = "/etc/mc_core/settings.toml")]
    config: PathBuf,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,

    /// Request PREEMPT_RT scheduling for this process (requires the `rt` feature).
    #[arg(long)]
    rt: bool,
}

struct RejectAllGcode;
impl GcodeHandler for RejectAllGcode {
    fn execute_block(&mut self, _line: &[u8], _user_message: Option<&str>) -> StatusCode {
        StatusCode::PlannerRejected("no g-code parser wired in".to_string())
    }
}

struct NoopSystemCommands;
impl SystemCommandHandler for NoopSystemCommands {
    fn execute(&mut self, _line: &[u8]) -> StatusCode {
        StatusCode::Ok
    }
}

fn main() {
    if let Err(err) = run() {
        error!("startup failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), McError> {
    let args = Args::parse();
    setup_tracing(&args);

    info!("motion controller core v{} starting...", env!("CARGO_PKG_VERSION"));

    let settings = load_settings(&args.config)?;
    settings.validate().map_err(McError::Config)?;

    #[cfg(feature = "rt")]
    if args.rt {
        apply_rt_scheduling()?;
    }
    #[cfg(not(feature = "rt"))]
    if args.rt {
        error!("--rt requested but the `rt` feature was not compiled in");
    }

    let mut sys = SystemState::new(&settings);
    let mut hal = SimulationHal::new();
    let mut planner = SimPlanner::new();
    let mut stepper = SimStepper::new();
    let mut gcode = RejectAllGcode;
    let mut system_commands = NoopSystemCommands;

    {
        let mut ctx = MainLoopContext {
            hal: &mut hal,
            planner: &mut planner,
            stepper: &mut stepper,
            settings: &settings,
            gcode: &mut gcode,
            system_commands: &mut system_commands,
            user_commands: None,
        };
        main_loop::startup(&mut sys, &mut ctx);

        let mut filter = mc_core::input_filter::LineFilter::new();
        while main_loop::run_once(&mut sys, &mut filter, &mut ctx) {}
    }

    info!("motion controller core shutdown complete");
    Ok(())
}

fn load_settings(path: &PathBuf) -> Result<mc_common::config::Settings, McError> {
    let text = std::fs::read_to_string(path).map_err(|source| McError::ConfigRead {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| McError::ConfigParse {
        path: path.display().to_string(),
        source: Box::new(source),
    })
}

/// No-op unless the `rt` feature is enabled; sets SCHED_FIFO priority 80
/// on the calling process.
#[cfg(feature = "rt")]
fn apply_rt_scheduling() -> Result<(), McError> {
    let param = libc::sched_param { sched_priority: 80 };
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(McError::Config(format!("sched_setscheduler(SCHED_FIFO, 80) failed: {err}")));
    }
    info!("applied SCHED_FIFO real-time scheduling");
    Ok(())
}

fn setup_tracing(args: &Args) {
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
