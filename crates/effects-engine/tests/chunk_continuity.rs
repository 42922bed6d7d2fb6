//! Scenario tests for chunked evaluation.
//!
//! Export splits the frame range into chunks that are computed
//! independently, each seeded only with the bounded `EvalState` snapshot
//! taken at its boundary. These tests verify that the snapshot really is
//! a sufficient statistic: a chunk recomputed from its seed reproduces
//! the frames a single continuous pass produced, and camera motion stays
//! teleport-free across any continuous pointer sweep.

use screenreel_effects_engine::{EvalState, FrameEvaluator};
use screenreel_timeline_model::{
    Clip, CursorEffectData, EventTrace, FollowStrategy, MouseSample, NormPoint, Recording,
    RecordingStore, TraceEvent, Track, ZoomEffect,
};

fn sweep_recording(duration_ms: f64) -> Recording {
    let mut events = Vec::new();
    let mut t = 0.0;
    while t <= duration_ms {
        let p = t / duration_ms;
        // Diagonal sweep with a sinusoidal wobble, so both axes and the
        // glide filter stay busy.
        events.push(TraceEvent::Mouse(MouseSample {
            time_ms: t,
            x: 100.0 + 800.0 * p,
            y: 500.0 + 300.0 * (p * 6.0).sin(),
            capture_size: None,
        }));
        t += 8.0;
    }
    Recording::new("r1", 1000, 1000, duration_ms)
        .with_trace(EventTrace::from_events(1000, 1000, events))
}

fn mouse_follow_zoom(start: f64, end: f64) -> ZoomEffect {
    ZoomEffect {
        id: "z1".to_string(),
        start_time_ms: start,
        end_time_ms: end,
        target: NormPoint::CENTER,
        scale: 2.0,
        intro_ms: 500.0,
        outro_ms: 500.0,
        follow: FollowStrategy::MouseFollow,
    }
}

fn evaluator() -> FrameEvaluator {
    let track = Track::new("t1", vec![Clip::new("a", "r1", 0.0, 10000.0)]);
    let recordings: RecordingStore = [sweep_recording(10000.0)].into_iter().collect();
    FrameEvaluator::new(
        track,
        vec![mouse_follow_zoom(0.0, 10000.0)],
        CursorEffectData::default(),
        recordings,
        30,
    )
    .unwrap()
}

#[test]
fn chunk_seeded_from_snapshot_matches_continuous_run() {
    let eval = evaluator();

    // One uninterrupted pass over frames [0, 300), snapshotting the
    // state at the frame-150 boundary.
    let mut state = EvalState::default();
    let mut continuous = Vec::new();
    let mut seed = EvalState::default();
    for frame in 0..300u64 {
        if frame == 150 {
            seed = state;
        }
        continuous.push(eval.evaluate_frame(frame, &mut state));
    }

    // Recompute [150, 300) from nothing but the seed.
    let mut chunk_state = seed;
    for frame in 150..300u64 {
        let reseeded = eval.evaluate_frame(frame, &mut chunk_state);
        let reference = &continuous[frame as usize];

        let camera_err = reseeded.zoom_center.distance_to(&reference.zoom_center);
        let cursor_err = reseeded
            .cursor_position
            .distance_to(&reference.cursor_position);
        assert!(
            camera_err < 1e-9 && cursor_err < 1e-9,
            "seam divergence at frame {frame}: camera {camera_err}, cursor {cursor_err}"
        );
        assert_eq!(reseeded.zoom_scale, reference.zoom_scale);
        assert_eq!(reseeded.source_time_ms, reference.source_time_ms);
        assert_eq!(reseeded.cursor_visible, reference.cursor_visible);
    }
}

#[test]
fn snapshot_survives_serialization_across_the_seam() {
    let eval = evaluator();

    let mut state = EvalState::default();
    for frame in 0..150u64 {
        eval.evaluate_frame(frame, &mut state);
    }

    // The seed a worker process would receive over the wire.
    let json = serde_json::to_string(&state).unwrap();
    let mut wire_state: EvalState = serde_json::from_str(&json).unwrap();

    for frame in 150..180u64 {
        let from_wire = eval.evaluate_frame(frame, &mut wire_state);
        let in_process = eval.evaluate_frame(frame, &mut state);
        assert_eq!(from_wire, in_process);
    }
}

#[test]
fn camera_center_never_teleports_during_a_sweep() {
    // A 2000 ms linear sweep inside a 2x zoom on a 1000x1000 capture,
    // sampled every 33 ms: the maximum per-frame displacement of the
    // zoom center must stay below 0.15 normalized units.
    let mut events = Vec::new();
    let mut t = 0.0;
    while t <= 2000.0 {
        events.push(TraceEvent::Mouse(MouseSample {
            time_ms: t,
            x: 1000.0 * t / 2000.0,
            y: 500.0,
            capture_size: None,
        }));
        t += 8.0;
    }
    let recording = Recording::new("r1", 1000, 1000, 2000.0)
        .with_trace(EventTrace::from_events(1000, 1000, events));

    let track = Track::new("t1", vec![Clip::new("a", "r1", 0.0, 2000.0)]);
    let eval = FrameEvaluator::new(
        track,
        vec![mouse_follow_zoom(0.0, 2000.0)],
        CursorEffectData::default(),
        [recording].into_iter().collect(),
        30,
    )
    .unwrap();

    let mut state = EvalState::default();
    let mut prev: Option<NormPoint> = None;
    let mut max_step = 0.0f64;
    let mut t = 0.0;
    while t < 2000.0 {
        let params = eval.evaluate_at(t, &mut state);
        if let Some(p) = prev {
            max_step = max_step.max(p.distance_to(&params.zoom_center));
        }
        prev = Some(params.zoom_center);
        t += 33.0;
    }

    assert!(
        max_step < 0.15,
        "zoom center teleported: max per-frame displacement {max_step}"
    );
}
