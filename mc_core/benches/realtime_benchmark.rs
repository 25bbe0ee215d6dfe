//! Realtime executor micro-benchmark.
//!
//! Measures the cost of one cooperative checkpoint call with nothing
//! pending, and with an override FIFO backlog draining.

use criterion::{criterion_group, criterion_main, Criterion};

use mc_common::config::Settings;
use mc_common::exec::{AccessoryOverrideCmd, FeedOverrideCmd};
use mc_core::realtime::execute_realtime_checkpoint;
use mc_core::sys::SystemState;
use mc_hal::sim::{SimPlanner, SimStepper, SimulationHal};

fn bench_idle_checkpoint(c: &mut Criterion) {
    let settings = Settings::default();
    let mut sys = SystemState::new(&settings);
    let mut hal = SimulationHal::new();
    let mut planner = SimPlanner::new();
    let mut stepper = SimStepper::new();

    c.bench_function("realtime_checkpoint_idle", |b| {
        b.iter(|| execute_realtime_checkpoint(&mut sys, &mut hal, &mut planner, &mut stepper, &settings));
    });
}

fn bench_checkpoint_with_override_backlog(c: &mut Criterion) {
    let settings = Settings::default();
    let mut sys = SystemState::new(&settings);
    let mut hal = SimulationHal::new();
    let mut planner = SimPlanner::new();
    let mut stepper = SimStepper::new();

    c.bench_function("realtime_checkpoint_draining_overrides", |b| {
        b.iter(|| {
            sys.feed_override_fifo.push(FeedOverrideCmd::CoarsePlus);
            sys.accessory_override_fifo.push(AccessoryOverrideCmd::SpindleCoarsePlus);
            execute_realtime_checkpoint(&mut sys, &mut hal, &mut planner, &mut stepper, &settings)
        });
    });
}

criterion_group!(benches, bench_idle_checkpoint, bench_checkpoint_with_override_backlog);
criterion_main!(benches);
