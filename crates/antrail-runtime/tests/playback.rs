//! End-to-end playback tests: spawn, walk, settle, advance, finish, cancel.

use antrail_runtime::prelude::*;
use std::time::Duration;

const DT: Duration = Duration::from_millis(50);

fn abc_graph() -> GraphModel {
    GraphModel::new(
        vec![
            Node::planar("A", 0.0, 0.0),
            Node::planar("B", 10.0, 0.0),
            Node::planar("C", 10.0, 10.0),
        ],
        vec![Edge::new("A", "B", 2.0), Edge::new("B", "C", 3.0)],
    )
    .unwrap()
}

fn controller() -> PlaybackController {
    PlaybackController::with_graph(
        abc_graph(),
        PlaybackConfig {
            seed: Some(7),
            ..PlaybackConfig::default()
        },
    )
    .unwrap()
}

fn iteration(number: u32, paths: &str) -> String {
    format!(
        r#"{{"iteration": {number}, "best_distance": 5.0, "best_path": ["A", "B", "C"],
            "paths": {paths}, "pheromone_levels": {{"('B', 'A')": {number}.0}}}}"#
    )
}

fn trace_with(iterations: &[String]) -> OptimizationTrace {
    parse_trace(&format!(
        r#"{{"best_path": ["A", "B", "C"], "distance": 5.0, "iterations": [{}]}}"#,
        iterations.join(",")
    ))
    .unwrap()
}

fn abc_trace(count: u32) -> OptimizationTrace {
    let iterations: Vec<String> = (1..=count)
        .map(|n| iteration(n, r#"[[["A", "B", "C"], 5.0], [["A", "B"], 2.0]]"#))
        .collect();
    trace_with(&iterations)
}

/// Upper bound on ticks for one iteration: every segment at minimum speed,
/// plus the settle delay, plus slack.
fn tick_budget(config: &PlaybackConfig, segments: usize) -> usize {
    let per_segment = (1.0 / config.min_speed).ceil() as usize;
    let settle = (config.settle_delay_ms / config.reference_dt_ms) as usize;
    segments * per_segment + settle + 5
}

#[test]
fn single_agent_walks_the_path_and_disappears() {
    let mut c = controller();
    c.load_trace(trace_with(&[iteration(1, r#"[[["A", "B", "C"], 5.0]]"#)]))
        .unwrap();
    c.start().unwrap();

    let agents = c.agents();
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].position, Point::new(0.0, 0.0));
    assert_eq!(agents[0].path, vec![NodeId::from("A"), NodeId::from("B"), NodeId::from("C")]);
    assert!(agents[0].is_best);

    let speed = agents[0].speed;
    let needed = (2.0 / speed).ceil() as usize + 2;
    for _ in 0..needed {
        c.tick(DT).unwrap();
    }
    assert!(c.agents().is_empty());
}

#[test]
fn progress_stays_bounded_and_segments_only_grow() {
    let mut c = controller();
    c.load_trace(abc_trace(1)).unwrap();
    c.start().unwrap();

    let mut last_segment: Vec<usize> = c.agents().iter().map(|a| a.segment_index).collect();
    while !c.agents().is_empty() {
        c.tick(DT).unwrap();
        for agent in c.agents() {
            assert!((0.0..1.0).contains(&agent.progress), "{}", agent.progress);
            assert!(agent.segment_index >= last_segment[agent.id]);
            assert!(agent.segment_index < agent.path.len() - 1);
            last_segment[agent.id] = agent.segment_index;
        }
    }
}

#[test]
fn playback_ends_ready_after_the_last_iteration() {
    let mut c = controller();
    c.load_trace(abc_trace(3)).unwrap();
    c.start().unwrap();

    let budget = 3 * tick_budget(c.config(), 2);
    let mut advanced = Vec::new();
    let mut finished = false;
    for _ in 0..budget {
        match c.tick(DT).unwrap() {
            TickOutcome::Advanced { iteration } => advanced.push(iteration),
            TickOutcome::Finished => {
                finished = true;
                break;
            }
            _ => {}
        }
        assert_ne!(c.state(), PlaybackState::Animating { iteration: 3 });
    }

    assert!(finished);
    assert_eq!(advanced, vec![1, 2]);
    assert_eq!(c.state(), PlaybackState::Ready);
    assert!(c.agents().is_empty());
    assert!(c.tick(DT).is_err());
}

#[test]
fn settle_delay_holds_the_next_iteration_back() {
    let mut c = controller();
    c.load_trace(abc_trace(2)).unwrap();
    c.start().unwrap();

    let mut outcome = c.tick(DT).unwrap();
    while !matches!(outcome, TickOutcome::Settling { .. }) {
        outcome = c.tick(DT).unwrap();
    }
    assert_eq!(
        outcome,
        TickOutcome::Settling {
            remaining: Duration::from_millis(500)
        }
    );

    // 500ms of settling at 50ms per tick
    for _ in 0..9 {
        assert!(matches!(c.tick(DT).unwrap(), TickOutcome::Settling { .. }));
        assert_eq!(c.state(), PlaybackState::Animating { iteration: 0 });
    }
    assert_eq!(c.tick(DT).unwrap(), TickOutcome::Advanced { iteration: 1 });
    assert_eq!(c.agents().len(), 2);
}

#[test]
fn zero_length_iteration_still_settles() {
    let mut c = controller();
    c.load_trace(trace_with(&[
        iteration(1, r#"[[["A"], 0.0]]"#),
        iteration(2, r#"[[["A", "B"], 2.0]]"#),
    ]))
    .unwrap();
    c.start().unwrap();

    assert!(matches!(c.tick(DT).unwrap(), TickOutcome::Settling { .. }));
    assert!(matches!(c.tick(DT).unwrap(), TickOutcome::Settling { .. }));
    assert_eq!(c.state(), PlaybackState::Animating { iteration: 0 });
}

#[test]
fn stop_during_settle_cancels_the_advance() {
    let mut c = controller();
    c.load_trace(abc_trace(2)).unwrap();
    let token = c.start().unwrap();

    while !matches!(c.tick(DT).unwrap(), TickOutcome::Settling { .. }) {}
    c.stop().unwrap();
    assert_eq!(c.state(), PlaybackState::Ready);
    assert!(c.agents().is_empty());

    // a tick that was already in flight wakes up and does nothing
    for _ in 0..20 {
        assert_eq!(c.tick_scheduled(token, DT).unwrap(), TickOutcome::Stale);
    }
    assert!(c.agents().is_empty());
    assert_eq!(c.frame().settle_remaining_ms, None);

    // a fresh run does not inherit the old settle
    let fresh = c.start().unwrap();
    assert_ne!(fresh, token);
    assert!(matches!(
        c.tick_scheduled(fresh, DT).unwrap(),
        TickOutcome::Running { .. }
    ));
}

#[test]
fn loading_a_trace_mid_run_cancels_it() {
    let mut c = controller();
    c.load_trace(abc_trace(2)).unwrap();
    let token = c.start().unwrap();
    c.tick(DT).unwrap();

    c.load_trace(abc_trace(1)).unwrap();
    assert_eq!(c.state(), PlaybackState::Ready);
    assert!(c.agents().is_empty());
    assert_eq!(c.tick_scheduled(token, DT).unwrap(), TickOutcome::Stale);
}

#[test]
fn out_of_sequence_iteration_stops_playback() {
    let mut c = controller();
    c.load_trace(trace_with(&[
        iteration(1, r#"[[["A", "B"], 2.0]]"#),
        iteration(3, r#"[[["A", "B"], 2.0]]"#),
    ]))
    .unwrap();
    c.start().unwrap();

    let budget = tick_budget(c.config(), 1);
    let mut error = None;
    for _ in 0..budget {
        match c.tick(DT) {
            Ok(_) => {}
            Err(e) => {
                error = Some(e);
                break;
            }
        }
    }
    let error = error.unwrap();
    assert!(error.is_sequencing());
    assert_eq!(c.state(), PlaybackState::Ready);
    assert_eq!(c.iteration_index(), 0);
}

#[test]
fn misnumbered_first_iteration_refuses_to_start() {
    let mut c = controller();
    c.load_trace(trace_with(&[iteration(2, r#"[[["A", "B"], 2.0]]"#)]))
        .unwrap();
    assert!(c.start().unwrap_err().is_sequencing());
    assert_eq!(c.state(), PlaybackState::Ready);
}

#[test]
fn invalid_transitions_fail_loudly() {
    let mut c = controller();
    c.load_trace(abc_trace(1)).unwrap();
    assert!(matches!(
        c.tick(DT),
        Err(AntrailError::InvalidTransition { operation: "tick", .. })
    ));
    assert!(c.stop().is_err());

    c.start().unwrap();
    assert!(matches!(
        c.start(),
        Err(AntrailError::InvalidTransition { operation: "start", .. })
    ));
}

#[test]
fn graph_reload_stops_and_clears_the_cache() {
    let mut c = controller();
    c.load_trace(abc_trace(1)).unwrap();
    c.start().unwrap();
    c.tick(DT).unwrap();
    assert!(c.resolver().cached_len() > 0);

    c.replace_graph(abc_graph());
    assert_eq!(c.state(), PlaybackState::Ready);
    assert!(c.agents().is_empty());
    assert_eq!(c.resolver().cached_len(), 0);
    assert!(c.trace().is_some());
}

#[test]
fn frame_reports_the_iteration_on_screen() {
    let mut c = controller();
    assert_eq!(c.frame().total_iterations, 0);

    c.load_trace(abc_trace(2)).unwrap();
    c.start().unwrap();
    c.tick(DT).unwrap();

    let frame = c.frame();
    assert!(frame.animating);
    assert_eq!(frame.iteration, Some(1));
    assert_eq!(frame.total_iterations, 2);
    assert_eq!(frame.best_distance, Some(Distance::Finite(5.0)));
    assert_eq!(frame.overall_distance, Some(Distance::Finite(5.0)));
    assert_eq!(frame.agents.len(), 2);
    assert_eq!(frame.agent_positions().count(), 2);

    let overlays = c.overlays(&BlockedEdges::from_pairs([("C", "B")]));
    assert_eq!(overlays[0].pheromone, 1.0);
    assert!(overlays[0].on_best_path);
    assert_eq!(overlays[1].blocked, BlockSource::Override);
}

#[test]
fn routed_mode_renders_straight_until_answered() {
    let mut c = PlaybackController::with_graph(
        abc_graph(),
        PlaybackConfig {
            seed: Some(7),
            path_mode: PathMode::Routed,
            ..PlaybackConfig::default()
        },
    )
    .unwrap();
    c.load_trace(abc_trace(1)).unwrap();
    c.start().unwrap();

    let requests = c.take_route_requests();
    assert_eq!(requests.len(), 2);
    c.tick(DT).unwrap();
    assert!(c.take_route_requests().is_empty());

    for request in &requests {
        let mid = request.from_point.lerp(&request.to_point, 0.5);
        let bent = Point::new(mid.x + 1.0, mid.y + 1.0);
        assert!(c.complete_route(request, Ok(vec![request.from_point, bent, request.to_point])));
    }
    assert_eq!(c.resolver().cached_len(), 2);
    c.tick(DT).unwrap();
}
