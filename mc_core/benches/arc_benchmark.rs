//! Arc synthesizer micro-benchmark.
//!
//! Measures segment-generation cost for a full-circle arc versus a
//! small arc that only needs a handful of segments.

use criterion::{criterion_group, criterion_main, Criterion};

use mc_common::config::Settings;
use mc_common::plan::PlanLineData;
use mc_core::motion::arc::{arc, ArcPlane};
use mc_core::motion::MotionGateway;
use mc_core::sys::SystemState;
use mc_hal::sim::{SimPlanner, SimStepper, SimulationHal};

const PLANE: ArcPlane = ArcPlane {
    axis_0: 0,
    axis_1: 1,
    axis_linear: 2,
};

fn bench_full_circle(c: &mut Criterion) {
    let settings = Settings::default();
    let pl_data = PlanLineData {
        feed_rate: 500.0,
        ..Default::default()
    };

    c.bench_function("arc_full_circle_r10", |b| {
        b.iter(|| {
            let mut gateway = MotionGateway::new();
            let mut sys = SystemState::new(&settings);
            let mut hal = SimulationHal::new();
            let mut planner = SimPlanner::new();
            let mut stepper = SimStepper::new();
            let position = [0.0, -10.0, 0.0, 0.0, 0.0, 0.0];
            let target = position;
            arc(
                &mut gateway,
                &mut sys,
                &mut hal,
                &mut planner,
                &mut stepper,
                &settings,
                &position,
                &target,
                [0.0, 10.0],
                PLANE,
                true,
                &pl_data,
            )
        });
    });
}

fn bench_small_arc(c: &mut Criterion) {
    let settings = Settings::default();
    let pl_data = PlanLineData {
        feed_rate: 500.0,
        ..Default::default()
    };

    c.bench_function("arc_quarter_circle_r1", |b| {
        b.iter(|| {
            let mut gateway = MotionGateway::new();
            let mut sys = SystemState::new(&settings);
            let mut hal = SimulationHal::new();
            let mut planner = SimPlanner::new();
            let mut stepper = SimStepper::new();
            let position = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0];
            let target = [0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
            arc(
                &mut gateway,
                &mut sys,
                &mut hal,
                &mut planner,
                &mut stepper,
                &settings,
                &position,
                &target,
                [-1.0, 0.0],
                PLANE,
                false,
                &pl_data,
            )
        });
    });
}

criterion_group!(benches, bench_full_circle, bench_small_arc);
criterion_main!(benches);
