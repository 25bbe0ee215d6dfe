//! Multi-pass threading cycle with degression, spring passes, and optional
//! entry/exit tapers (SPEC_FULL.md §4.4).
//!
//! Grounded on `motion_control.c::mc_thread` / `calc_thread_doc`.

use mc_common::consts::N_AXIS;
use mc_common::plan::{PlanCondition, PlanLineData, TaperKind, ThreadState};
use mc_hal::traits::{Hal, Planner, Stepper};

use crate::motion::gateway::MotionGateway;
use crate::sys::SystemState;

/// Depth of cut for pass `k` (1-indexed), clamped to the full thread depth
/// (SPEC_FULL.md §4.4: `doc(k) = initial_depth * k^(1/degression)`).
fn depth_of_cut(thread: &ThreadState, k: u32) -> f64 {
    let doc = thread.initial_depth * (k as f64).powf(1.0 / thread.depth_degression);
    doc.min(thread.depth)
}

/// Total main-pass count: iterate `depth_of_cut` until it reaches full
/// depth (SPEC_FULL.md §9 Open Question — the two-step `end_taper_factor`
/// computation is resolved here: the taper ramps proportionally to depth
/// across its own configured pass span, computed after the main-pass count
/// is known).
fn count_passes(thread: &ThreadState) -> u32 {
    let mut k = 1;
    while depth_of_cut(thread, k) < thread.depth {
        k += 1;
    }
    k
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    gateway: &mut MotionGateway,
    sys: &mut SystemState,
    hal: &mut dyn Hal,
    planner: &mut dyn Planner,
    stepper: &mut dyn Stepper,
    settings: &mc_common::config::Settings,
    position: &mut [f64; N_AXIS],
    thread: &ThreadState,
    x_axis: usize,
    z_axis: usize,
    pl_data: &PlanLineData,
) -> bool {
    let main_passes = count_passes(thread);
    let total_passes = main_passes + thread.spring_passes as u32;

    let synced_data = PlanLineData {
        condition: pl_data.condition | PlanCondition::SPINDLE_SYNCHRONIZED | PlanCondition::FEED_HOLD_DISABLE,
        ..*pl_data
    };
    let rapid_data = PlanLineData {
        condition: pl_data.condition | PlanCondition::RAPID_MOTION,
        ..*pl_data
    };

    macro_rules! go {
        ($target:expr, $data:expr) => {{
            if !gateway.line(sys, hal, planner, stepper, settings, &$target, $data) {
                return false;
            }
            *position = $target;
        }};
    }

    // Initial Z preposition consumes the infeed offset.
    if thread.infeed_angle != 0.0 {
        let mut preposition = *position;
        preposition[z_axis] -= thread.infeed_angle.to_radians().tan() * thread.initial_depth;
        go!(preposition, &rapid_data);
    }

    let start = *position;

    for pass in 1..=total_passes {
        let doc = if pass <= main_passes {
            depth_of_cut(thread, pass)
        } else {
            thread.depth
        };

        let mut cut_start = start;
        cut_start[x_axis] = start[x_axis] + (thread.peak + doc) * thread.cut_direction;
        go!(cut_start, &rapid_data);

        let entry_taper = matches!(thread.end_taper_type, TaperKind::Entry | TaperKind::Both);
        let exit_taper = matches!(thread.end_taper_type, TaperKind::Exit | TaperKind::Both);

        if entry_taper && thread.end_taper_length > 0.0 {
            let mut taper_in = cut_start;
            taper_in[z_axis] -= thread.end_taper_length;
            let entry_factor = (thread.main_taper_height / thread.end_taper_length).max(1.0);
            taper_in[x_axis] = cut_start[x_axis] - thread.end_taper_length * entry_factor * thread.cut_direction;
            go!(taper_in, &synced_data);
        }

        let mut cut_end = cut_start;
        cut_end[z_axis] = thread.z_final;
        if exit_taper && thread.end_taper_length > 0.0 {
            cut_end[z_axis] += thread.end_taper_length;
        }
        go!(cut_end, &synced_data);

        if exit_taper && thread.end_taper_length > 0.0 {
            let mut taper_out = cut_end;
            taper_out[z_axis] = thread.z_final;
            taper_out[x_axis] = start[x_axis];
            go!(taper_out, &synced_data);
        }

        // Rapid retract in X back to start.
        let mut retract = *position;
        retract[x_axis] = start[x_axis];
        go!(retract, &rapid_data);

        if pass < total_passes {
            let mut reposition = start;
            if thread.infeed_angle != 0.0 {
                reposition[z_axis] -= thread.infeed_angle.to_radians().tan() * doc;
            }
            go!(reposition, &rapid_data);
        }
    }

    !sys.is_aborted()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_common::config::Settings;
    use mc_hal::sim::{SimPlanner, SimStepper, SimulationHal};

    #[test]
    fn degression_converges_before_spring_passes() {
        let thread = ThreadState {
            initial_depth: 0.1,
            depth: 1.0,
            depth_degression: 2.0,
            spring_passes: 2,
            ..ThreadState::default()
        };
        let passes = count_passes(&thread);
        assert!(passes > 1);
        assert!(depth_of_cut(&thread, passes) >= thread.depth);
    }

    #[test]
    fn simple_thread_runs_all_passes_without_aborting() {
        let settings = Settings::default();
        let mut sys = SystemState::new(&settings);
        let mut hal = SimulationHal::new();
        let mut planner = SimPlanner::new();
        let mut stepper = SimStepper::new();
        let mut gateway = MotionGateway::new();
        let mut position = [0.0; N_AXIS];
        let thread_state = ThreadState {
            pitch: 1.5,
            initial_depth: 0.2,
            depth: 0.8,
            depth_degression: 1.8,
            spring_passes: 1,
            peak: 0.0,
            cut_direction: 1.0,
            z_final: -20.0,
            ..ThreadState::default()
        };
        let data = PlanLineData::default();

        let ok = run(
            &mut gateway, &mut sys, &mut hal, &mut planner, &mut stepper, &settings, &mut position, &thread_state, 0,
            2, &data,
        );
        assert!(ok);
        assert!(planner.buffered_len() > 0);
    }
}
