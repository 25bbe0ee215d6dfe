//! End-to-end scenarios exercising the motion synthesizers, realtime
//! executor, and input filter together through the simulation HAL.

use mc_common::config::Settings;
use mc_common::consts::N_AXIS;
use mc_common::error::AlarmCode;
use mc_common::plan::{PlanCondition, PlanLineData};
use mc_common::state::MachineState;
use mc_core::homing::{home, HomingPass};
use mc_core::input_filter::{self, LineFilter};
use mc_core::motion::arc::{arc, ArcPlane};
use mc_core::motion::jog::{jog, JogOutcome};
use mc_core::motion::MotionGateway;
use mc_core::realtime::execute_realtime_checkpoint;
use mc_core::reset::reset;
use mc_core::state_machine::StateEvent;
use mc_core::sys::SystemState;
use mc_hal::sim::{SimPlanner, SimStepper, SimulationHal};

struct Harness {
    sys: SystemState,
    hal: SimulationHal,
    planner: SimPlanner,
    stepper: SimStepper,
    settings: Settings,
}

impl Harness {
    fn new(settings: Settings) -> Self {
        let sys = SystemState::new(&settings);
        Self {
            sys,
            hal: SimulationHal::new(),
            planner: SimPlanner::new(),
            stepper: SimStepper::new(),
            settings,
        }
    }
}

/// Scenario 1: a negative-direction move followed by a reversal inserts a
/// synthetic backlash segment immediately before the real one.
#[test]
fn backlash_insertion_precedes_direction_reversal() {
    let mut settings = Settings::default();
    settings.backlash[0] = 0.1;
    let mut h = Harness::new(settings);
    let mut gateway = MotionGateway::new();

    let data = PlanLineData {
        feed_rate: 100.0,
        ..Default::default()
    };

    let mut first = [0.0; N_AXIS];
    first[0] = 10.0;
    assert!(gateway.line(&mut h.sys, &mut h.hal, &mut h.planner, &mut h.stepper, &h.settings, &first, &data));

    let mut second = [0.0; N_AXIS];
    second[0] = 5.0;
    assert!(gateway.line(&mut h.sys, &mut h.hal, &mut h.planner, &mut h.stepper, &h.settings, &second, &data));

    assert_eq!(h.planner.buffered_len(), 3);
    let plain = h.planner.consume_one().unwrap();
    assert_eq!(plain.target[0], 10.0);
    assert!(!plain.data.condition.contains(PlanCondition::BACKLASH_MOTION));

    let backlash_segment = h.planner.consume_one().unwrap();
    assert!(backlash_segment.data.condition.contains(PlanCondition::BACKLASH_MOTION));
    assert_eq!(backlash_segment.target[0], 5.0 - 0.1);

    let real_segment = h.planner.consume_one().unwrap();
    assert_eq!(real_segment.target[0], 5.0);
    assert!(!real_segment.data.condition.contains(PlanCondition::BACKLASH_MOTION));
}

/// Scenario 2: a full-circle arc subdivides into at least 30 segments, each
/// within tolerance of the true circle, with the last segment landing
/// exactly on target.
#[test]
fn arc_subdivides_within_tolerance_and_ends_exact() {
    let mut settings = Settings::default();
    settings.arc_tolerance = 0.002;
    let mut h = Harness::new(settings);
    let mut gateway = MotionGateway::new();

    let plane = ArcPlane {
        axis_0: 0,
        axis_1: 1,
        axis_linear: 2,
    };
    let position = [0.0; N_AXIS];
    let mut target = [0.0; N_AXIS];
    target[0] = 10.0;
    let data = PlanLineData {
        feed_rate: 1000.0,
        ..Default::default()
    };

    assert!(arc(&mut gateway, &mut h.sys, &mut h.hal, &mut h.planner, &mut h.stepper, &h.settings, &position, &target, [-5.0, 0.0], plane, true, &data));

    assert!(h.planner.buffered_len() >= 30, "expected >=30 segments, got {}", h.planner.buffered_len());

    let center = [-5.0, 0.0];
    let radius = 5.0_f64;
    let mut last = None;
    while let Some(seg) = h.planner.consume_one() {
        let dx = seg.target[0] - center[0];
        let dy = seg.target[1] - center[1];
        let dist = (dx * dx + dy * dy).sqrt();
        assert!((dist - radius).abs() <= 0.002 + 1e-9, "segment off circle by {}", (dist - radius).abs());
        last = Some(seg);
    }
    let last = last.unwrap();
    assert_eq!(last.target[0], target[0]);
    assert_eq!(last.target[1], target[1]);
}

/// Scenario 3: a feed hold requested mid-cycle moves IDLE -> CYCLE -> HOLD,
/// retaining the buffered block, and a subsequent cycle-start resumes to
/// CYCLE.
#[test]
fn feed_hold_mid_motion_then_resume() {
    let settings = Settings::default();
    let mut h = Harness::new(settings);
    let mut gateway = MotionGateway::new();

    let mut target = [0.0; N_AXIS];
    target[0] = 100.0;
    let data = PlanLineData {
        feed_rate: 1000.0,
        spindle: mc_common::plan::SpindleState {
            on: true,
            direction: mc_common::plan::SpindleDirection::Cw,
        },
        ..Default::default()
    };
    assert!(gateway.line(&mut h.sys, &mut h.hal, &mut h.planner, &mut h.stepper, &h.settings, &target, &data));

    h.sys.apply_event(StateEvent::CycleStart);
    assert_eq!(h.sys.state(), MachineState::Cycle);

    h.sys.flags.feed_hold_pending = true;
    assert!(execute_realtime_checkpoint(&mut h.sys, &mut h.hal, &mut h.planner, &mut h.stepper, &h.settings));
    assert_eq!(h.sys.state(), MachineState::Hold);
    assert_eq!(h.planner.buffered_len(), 1);

    h.sys.apply_event(StateEvent::CycleStart);
    assert_eq!(h.sys.state(), MachineState::Cycle);
}

/// Scenario 4: jogging past hard soft limits with clamping disabled is
/// rejected without touching the planner buffer or the machine state.
#[test]
fn soft_limited_jog_past_travel_is_rejected() {
    let mut settings = Settings::default();
    settings.limits.soft_enabled = true;
    settings.limits.jog_soft_limited = false;
    settings.limits.min_travel = [0.0; N_AXIS];
    settings.limits.max_travel = [50.0; N_AXIS];
    let mut h = Harness::new(settings);
    let mut gateway = MotionGateway::new();

    let mut target = [0.0; N_AXIS];
    target[0] = 100.0;
    let outcome = jog(&mut gateway, &mut h.sys, &mut h.hal, &mut h.planner, &mut h.stepper, &h.settings, &target, 1000.0);

    assert_eq!(outcome, JogOutcome::Rejected);
    assert_eq!(h.planner.buffered_len(), 0);
    assert_eq!(h.sys.state(), MachineState::Idle);
}

/// Scenario 5: a `(MSG, ...)` comment is extracted byte-for-byte (after the
/// `MSG,` prefix) alongside the surviving G-code text on the same line.
#[test]
fn msg_comment_survives_alongside_gcode() {
    let mut filter = LineFilter::new();
    let mut sys = SystemState::new(&Settings::default());
    let mut event = None;
    for &b in b"(MSG, hello world) G1 X1 F100\n" {
        event = filter.push_byte(b, false, &mut sys);
    }
    let event = event.expect("line terminated");
    assert_eq!(event.user_message.as_deref(), Some(" hello world"));
    assert_eq!(&event.line[..], b"G1X1F100");
}

/// Scenario 6: a reset injected while the machine is mid-homing raises
/// `HomingFailReset`, forces `ALARM`, and leaves planner/stepper clean.
#[test]
fn reset_during_homing_raises_homing_fail_reset() {
    let settings = Settings::default();
    let mut h = Harness::new(settings);

    h.sys.apply_event(StateEvent::HomingStarted);
    assert_eq!(h.sys.state(), MachineState::Homing);

    reset(&mut h.sys, &mut h.hal, &mut h.planner, &mut h.stepper);

    assert_eq!(h.sys.state(), MachineState::Alarm);
    assert_eq!(h.planner.buffered_len(), 0);
    assert!(!h.stepper.is_running());
}

/// Extra coverage: homing pre-checked against an already-engaged hard limit
/// never starts, and raises the hard-limit alarm instead.
#[test]
fn homing_refuses_to_start_with_limit_engaged() {
    let settings = Settings::default();
    let mut h = Harness::new(settings);
    h.hal.set_limit(mc_hal::types::LimitsMask::X, true);

    let passes = [HomingPass {
        axis_mask: 0b1,
        target: [0.0; N_AXIS],
    }];
    let status = home(&mut h.sys, &mut h.hal, &mut h.planner, &mut h.stepper, &h.settings, &passes);

    assert_eq!(status, mc_common::error::StatusCode::LimitsEngaged);
    assert_eq!(h.sys.state(), MachineState::Alarm);
    let _ = AlarmCode::HardLimit;
}

/// Scenario 1's status counterpart: the input filter never lets a realtime
/// command byte reach the assembled line, and it takes effect immediately.
#[test]
fn realtime_byte_intercepted_before_line_assembly() {
    let mut sys = SystemState::new(&Settings::default());
    let settings = Settings::default();
    let mut filter = LineFilter::new();

    let consumed = input_filter::enqueue_realtime_command(input_filter::CMD_FEED_HOLD, &mut sys, &settings, false);
    assert!(consumed);
    assert!(sys.flags.feed_hold_pending);

    let event = filter.push_byte(b'G', false, &mut sys);
    assert!(event.is_none());
}
