mod common;

use std::sync::Arc;

use common::{
    curl_frame, push_up_frame, repetitions, squat_frame, thrust_frame, windmill_frame,
};
use repcounter::profile::{hammer_curl, hip_thrust, push_up, squat, windmill};
use repcounter::{
    EngineEvent, ExerciseProfile, InvalidReason, LandmarkFrame, Orientation, RepEngine, Rejection,
};

const DOWN: f32 = 90.0;
const UP: f32 = 170.0;

fn run(engine: &mut RepEngine, frames: &[LandmarkFrame]) -> Vec<EngineEvent> {
    frames.iter().flat_map(|f| engine.process(f)).collect()
}

/// Sentadilla sin suavizado y con estabilidad de 2 frames
fn fast_squat() -> ExerciseProfile {
    ExerciseProfile {
        min_stable_frames: 2,
        smoothing_window: 1,
        debounce_ms: 500,
        validations: Vec::new(),
        ..squat()
    }
}

fn squat_at(ts: u64, knee: f32) -> LandmarkFrame {
    squat_frame(ts, knee, knee, 0.95)
}

/// Ciclos completos de sentadilla a 20 fps con ruido intercalado:
/// frames de baja confianza a mitad de cada postura, frames intermedios
/// y un frame sin landmarks entre repeticiones.
fn noisy_squat_session(cycles: usize) -> Vec<LandmarkFrame> {
    let mut frames = Vec::new();
    let mut ts = 0u64;
    for _ in 0..cycles {
        for knee in [DOWN, UP] {
            for i in 0..15 {
                let visibility = if i == 6 || i == 7 { 0.2 } else { 0.95 };
                frames.push(squat_frame(ts, knee, knee, visibility));
                ts += 50;
            }
        }
        for _ in 0..3 {
            frames.push(squat_at(ts, 145.0));
            ts += 50;
        }
        frames.push(LandmarkFrame::new(ts, Orientation::Rotation0, Vec::new()));
        ts += 50;
    }
    frames
}

#[test]
fn test_counts_exactly_one_rep_per_cycle_despite_noise() {
    let mut engine = RepEngine::new(Arc::new(squat()));
    let events = run(&mut engine, &noisy_squat_session(5));

    let reps = repetitions(&events);
    assert_eq!(reps.len(), 5);
    assert_eq!(engine.total(), 5);
    let totals: Vec<u32> = reps.iter().map(|(total, _)| *total).collect();
    assert_eq!(totals, vec![1, 2, 3, 4, 5]);

    // Los frames ruidosos dejan aviso, pero no rompen el conteo
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::InvalidFrame {
            reason: InvalidReason::LowConfidence { .. },
            ..
        }
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::InvalidFrame {
            reason: InvalidReason::MissingLandmarks { .. },
            ..
        }
    )));
}

#[test]
fn test_rep_counted_when_secondary_stabilizes() {
    let mut engine = RepEngine::new(Arc::new(fast_squat()));
    let frames = vec![
        squat_at(0, DOWN),
        squat_at(50, DOWN),
        squat_at(100, DOWN),
        squat_at(600, UP),
        squat_at(650, UP),
        squat_at(700, UP),
    ];
    let events = run(&mut engine, &frames);

    assert_eq!(repetitions(&events), vec![(1, 650)]);
    assert_eq!(engine.total(), 1);
}

#[test]
fn test_second_cycle_inside_debounce_is_rejected() {
    let mut engine = RepEngine::new(Arc::new(fast_squat()));
    let frames = vec![
        squat_at(0, DOWN),
        squat_at(50, DOWN),
        squat_at(600, UP),
        squat_at(650, UP),
        squat_at(700, DOWN),
        squat_at(750, DOWN),
        squat_at(800, UP),
        squat_at(850, UP),
        squat_at(900, UP),
    ];
    let events = run(&mut engine, &frames);

    assert_eq!(repetitions(&events), vec![(1, 650)]);
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::InvalidFrame {
            reason: InvalidReason::ValidationRejected {
                rejection: Rejection::Debounce {
                    elapsed_ms: 200,
                    required_ms: 500
                }
            },
            timestamp_ms: 850,
        }
    )));
}

#[test]
fn test_counts_are_always_spaced_by_debounce() {
    let profile = ExerciseProfile {
        min_stable_frames: 1,
        smoothing_window: 1,
        debounce_ms: 1000,
        ..hip_thrust()
    };
    let mut engine = RepEngine::new(Arc::new(profile));

    // Oscilación más rápida que el debounce
    let frames: Vec<LandmarkFrame> = (0..100u64)
        .map(|i| thrust_frame(i * 100, if i % 2 == 0 { 0.0 } else { -60.0 }))
        .collect();
    let events = run(&mut engine, &frames);

    let reps = repetitions(&events);
    assert!(reps.len() >= 2);
    for pair in reps.windows(2) {
        assert!(pair[1].1 - pair[0].1 > 1000);
    }
}

#[test]
fn test_no_rep_without_stable_primary() {
    let mut engine = RepEngine::new(Arc::new(fast_squat()));
    // Un único frame abajo no estabiliza Primary
    let frames = vec![
        squat_at(0, UP),
        squat_at(50, UP),
        squat_at(100, DOWN),
        squat_at(150, UP),
        squat_at(200, UP),
        squat_at(250, UP),
    ];
    let events = run(&mut engine, &frames);

    assert!(repetitions(&events).is_empty());
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::InvalidFrame {
            reason: InvalidReason::ValidationRejected {
                rejection: Rejection::NoPrimaryPhase
            },
            ..
        }
    )));
}

#[test]
fn test_one_legged_descent_is_not_primary() {
    let mut engine = RepEngine::new(Arc::new(fast_squat()));
    let mut frames: Vec<LandmarkFrame> = (0..4u64)
        .map(|i| squat_frame(i * 50, DOWN, UP, 0.95))
        .collect();
    frames.extend((4..8u64).map(|i| squat_at(i * 300, UP)));
    let events = run(&mut engine, &frames);

    assert!(repetitions(&events).is_empty());
    assert!(!events.iter().any(|e| matches!(
        e,
        EngineEvent::PhaseChanged {
            phase: repcounter::Phase::Primary,
            ..
        }
    )));
}

fn curl_hold(frames: &mut Vec<LandmarkFrame>, ts: &mut u64, left: f32, right: f32) {
    for _ in 0..15 {
        frames.push(curl_frame(*ts, left, right));
        *ts += 50;
    }
}

#[test]
fn test_bilateral_curl_counts() {
    let mut engine = RepEngine::new(Arc::new(hammer_curl()));
    let mut frames = Vec::new();
    let mut ts = 0;
    curl_hold(&mut frames, &mut ts, 40.0, 40.0);
    curl_hold(&mut frames, &mut ts, -40.0, -40.0);
    let events = run(&mut engine, &frames);

    assert_eq!(repetitions(&events).len(), 1);
}

#[test]
fn test_single_arm_curl_rejected_as_asymmetric() {
    let mut engine = RepEngine::new(Arc::new(hammer_curl()));
    let mut frames = Vec::new();
    let mut ts = 0;
    curl_hold(&mut frames, &mut ts, 40.0, 40.0);
    curl_hold(&mut frames, &mut ts, -40.0, 40.0);
    let events = run(&mut engine, &frames);

    assert!(repetitions(&events).is_empty());
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::InvalidFrame {
            reason: InvalidReason::ValidationRejected {
                rejection: Rejection::Asymmetric { .. }
            },
            ..
        }
    )));
    assert_eq!(engine.total(), 0);
}

#[test]
fn test_reset_keeps_total_and_does_not_recount() {
    let mut engine = RepEngine::new(Arc::new(fast_squat()));
    let first = vec![
        squat_at(0, DOWN),
        squat_at(50, DOWN),
        squat_at(600, UP),
        squat_at(650, UP),
    ];
    assert_eq!(repetitions(&run(&mut engine, &first)).len(), 1);

    engine.reset(false);
    assert_eq!(engine.total(), 1);

    // Sigue arriba tras el reset: no hay Primary previo
    let still_up: Vec<LandmarkFrame> = (0..5u64).map(|i| squat_at(700 + i * 50, UP)).collect();
    assert!(repetitions(&run(&mut engine, &still_up)).is_empty());

    let second = vec![
        squat_at(1500, DOWN),
        squat_at(1550, DOWN),
        squat_at(2100, UP),
        squat_at(2150, UP),
    ];
    assert_eq!(repetitions(&run(&mut engine, &second)), vec![(2, 2150)]);

    engine.reset(true);
    assert_eq!(engine.total(), 0);
}

#[test]
fn test_orientation_change_disarms_cycle() {
    let mut engine = RepEngine::new(Arc::new(fast_squat()));
    let mut frames = vec![squat_at(0, DOWN), squat_at(50, DOWN)];
    for i in 0..4u64 {
        let mut f = squat_at(600 + i * 50, UP);
        f.orientation = Orientation::Rotation90;
        frames.push(f);
    }
    let events = run(&mut engine, &frames);

    assert!(repetitions(&events).is_empty());
    assert_eq!(engine.snapshot().cycle, "STABLE_SECONDARY_NOT_COUNTED");
}

#[test]
fn test_out_of_order_frame_is_ignored() {
    let mut engine = RepEngine::new(Arc::new(fast_squat()));
    run(&mut engine, &[squat_at(0, DOWN), squat_at(50, DOWN)]);
    let before = engine.snapshot();

    let events = engine.process(&squat_at(20, UP));
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        EngineEvent::InvalidFrame {
            reason: InvalidReason::OutOfOrder {
                timestamp_ms: 20,
                last_ms: 50
            },
            ..
        }
    ));
    assert_eq!(engine.snapshot(), before);

    // El ciclo sigue armado
    let events = run(&mut engine, &[squat_at(600, UP), squat_at(650, UP)]);
    assert_eq!(repetitions(&events), vec![(1, 650)]);
}

#[test]
fn test_counting_suspended_while_disabled() {
    let mut engine = RepEngine::new(Arc::new(fast_squat()));
    engine.set_counting_enabled(false);
    let frames = vec![
        squat_at(0, DOWN),
        squat_at(50, DOWN),
        squat_at(600, UP),
        squat_at(650, UP),
    ];
    let events = run(&mut engine, &frames);

    assert!(repetitions(&events).is_empty());
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::InvalidFrame {
            reason: InvalidReason::ValidationRejected {
                rejection: Rejection::CountingSuspended
            },
            ..
        }
    )));
}

fn quick_thrust() -> ExerciseProfile {
    ExerciseProfile {
        min_stable_frames: 1,
        smoothing_window: 1,
        ..hip_thrust()
    }
}

#[test]
fn test_switch_source_accepts_a_restarted_clock() {
    let mut engine = RepEngine::new(Arc::new(quick_thrust()));
    let before = vec![
        thrust_frame(3_600_000, 0.0),
        thrust_frame(3_602_000, -60.0),
    ];
    assert_eq!(repetitions(&run(&mut engine, &before)), vec![(1, 3_602_000)]);

    engine.switch_source();

    // La cámara nueva arranca su reloj en 0
    let after: Vec<LandmarkFrame> = (0..3u64)
        .flat_map(|c| {
            vec![
                thrust_frame(c * 4000, 0.0),
                thrust_frame(c * 4000 + 2000, -60.0),
            ]
        })
        .collect();
    let events = run(&mut engine, &after);

    assert_eq!(repetitions(&events), vec![(2, 2000), (3, 6000), (4, 10000)]);
    assert!(!events.iter().any(|e| matches!(
        e,
        EngineEvent::InvalidFrame {
            reason: InvalidReason::ValidationRejected {
                rejection: Rejection::Debounce { .. }
            },
            ..
        }
    )));
}

#[test]
fn test_out_of_range_visibility_does_not_pass_the_gate() {
    let mut engine = RepEngine::new(Arc::new(quick_thrust()));
    let json = r#"{"timestamp_ms":0,"landmarks":[
        {"id":"LEFT_SHOULDER","x":100.0,"y":300.0,"visibility":7.5},
        {"id":"RIGHT_SHOULDER","x":200.0,"y":300.0,"visibility":0.0},
        {"id":"LEFT_HIP","x":100.0,"y":300.0,"visibility":0.0},
        {"id":"RIGHT_HIP","x":200.0,"y":300.0,"visibility":0.0}
    ]}"#;
    let frame: LandmarkFrame = serde_json::from_str(json).unwrap();

    let events = engine.process(&frame);
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::InvalidFrame {
            reason: InvalidReason::LowConfidence { .. },
            ..
        }
    )));
    assert!(!events.iter().any(|e| matches!(
        e,
        EngineEvent::PhaseChanged {
            phase: repcounter::Phase::Primary,
            ..
        }
    )));
}

#[test]
fn test_push_up_counts_each_descent() {
    let mut engine = RepEngine::new(Arc::new(push_up()));
    let mut frames = Vec::new();
    let mut ts = 0;
    for _ in 0..3 {
        for elbow in [90.0, 170.0] {
            for _ in 0..20 {
                frames.push(push_up_frame(ts, elbow));
                ts += 50;
            }
        }
    }
    let events = run(&mut engine, &frames);

    let totals: Vec<u32> = repetitions(&events).iter().map(|(t, _)| *t).collect();
    assert_eq!(totals, vec![1, 2, 3]);
}

#[test]
fn test_windmill_counts_both_sides() {
    let mut engine = RepEngine::new(Arc::new(windmill()));
    let t_pose = ((50.0, 200.0), (450.0, 200.0));
    let left_up = ((150.0, 50.0), (220.0, 520.0));
    let right_up = ((280.0, 520.0), (350.0, 50.0));

    let mut frames = Vec::new();
    let mut ts = 0;
    for (left, right) in [t_pose, left_up, t_pose, right_up] {
        for _ in 0..5 {
            frames.push(windmill_frame(ts, left, right));
            ts += 100;
        }
    }
    let events = run(&mut engine, &frames);

    assert_eq!(repetitions(&events), vec![(1, 500), (2, 1500)]);
}
