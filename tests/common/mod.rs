#![allow(dead_code)]

use repcounter::{EngineEvent, Landmark, LandmarkFrame, LandmarkId, Orientation};

/// Sentadilla sintética: muslos verticales y tibias giradas para que el
/// ángulo de cada rodilla sea exactamente el pedido.
pub fn squat_frame(ts: u64, left_knee: f32, right_knee: f32, visibility: f32) -> LandmarkFrame {
    let mut landmarks = Vec::new();
    for (x, angle, side) in [(100.0f32, left_knee, 0), (200.0f32, right_knee, 1)] {
        let (shoulder, hip, knee, ankle) = if side == 0 {
            (
                LandmarkId::LeftShoulder,
                LandmarkId::LeftHip,
                LandmarkId::LeftKnee,
                LandmarkId::LeftAnkle,
            )
        } else {
            (
                LandmarkId::RightShoulder,
                LandmarkId::RightHip,
                LandmarkId::RightKnee,
                LandmarkId::RightAnkle,
            )
        };
        let rad = angle.to_radians();
        landmarks.push(Landmark::new(shoulder, x, 150.0, visibility));
        landmarks.push(Landmark::new(hip, x, 300.0, visibility));
        landmarks.push(Landmark::new(knee, x, 400.0, visibility));
        landmarks.push(Landmark::new(
            ankle,
            x + 100.0 * rad.sin(),
            400.0 - 100.0 * rad.cos(),
            visibility,
        ));
    }
    LandmarkFrame::new(ts, Orientation::Rotation0, landmarks)
}

/// Curl martillo sintético: `diff` = Y muñeca − Y codo por brazo
pub fn curl_frame(ts: u64, left_diff: f32, right_diff: f32) -> LandmarkFrame {
    let landmarks = vec![
        Landmark::new(LandmarkId::LeftShoulder, 100.0, 100.0, 0.9),
        Landmark::new(LandmarkId::RightShoulder, 300.0, 100.0, 0.9),
        Landmark::new(LandmarkId::LeftElbow, 100.0, 250.0, 0.9),
        Landmark::new(LandmarkId::RightElbow, 300.0, 250.0, 0.9),
        Landmark::new(LandmarkId::LeftWrist, 100.0, 250.0 + left_diff, 0.9),
        Landmark::new(LandmarkId::RightWrist, 300.0, 250.0 + right_diff, 0.9),
    ];
    LandmarkFrame::new(ts, Orientation::Rotation0, landmarks)
}

/// Flexión sintética: brazos verticales de hombro a codo y antebrazos
/// girados para que ambos codos marquen `elbow` grados. Lleva z plana.
pub fn push_up_frame(ts: u64, elbow: f32) -> LandmarkFrame {
    let rad = elbow.to_radians();
    let mut landmarks = Vec::new();
    for (x, shoulder, elbow_id, wrist) in [
        (
            100.0f32,
            LandmarkId::LeftShoulder,
            LandmarkId::LeftElbow,
            LandmarkId::LeftWrist,
        ),
        (
            300.0f32,
            LandmarkId::RightShoulder,
            LandmarkId::RightElbow,
            LandmarkId::RightWrist,
        ),
    ] {
        landmarks.push(Landmark::new(shoulder, x, 200.0, 0.9).with_depth(0.0));
        landmarks.push(Landmark::new(elbow_id, x, 300.0, 0.9).with_depth(0.0));
        landmarks.push(
            Landmark::new(
                wrist,
                x + 100.0 * rad.sin(),
                300.0 - 100.0 * rad.cos(),
                0.9,
            )
            .with_depth(0.0),
        );
    }
    LandmarkFrame::new(ts, Orientation::Rotation0, landmarks)
}

/// Molino sintético con muñecas en posiciones absolutas
pub fn windmill_frame(ts: u64, left_wrist: (f32, f32), right_wrist: (f32, f32)) -> LandmarkFrame {
    let landmarks = vec![
        Landmark::new(LandmarkId::LeftShoulder, 200.0, 200.0, 0.9),
        Landmark::new(LandmarkId::RightShoulder, 300.0, 200.0, 0.9),
        Landmark::new(LandmarkId::LeftWrist, left_wrist.0, left_wrist.1, 0.9),
        Landmark::new(LandmarkId::RightWrist, right_wrist.0, right_wrist.1, 0.9),
        Landmark::new(LandmarkId::LeftHip, 220.0, 350.0, 0.9),
        Landmark::new(LandmarkId::RightHip, 280.0, 350.0, 0.9),
        Landmark::new(LandmarkId::LeftKnee, 200.0, 450.0, 0.9),
        Landmark::new(LandmarkId::RightKnee, 300.0, 450.0, 0.9),
        Landmark::new(LandmarkId::LeftAnkle, 180.0, 550.0, 0.9),
        Landmark::new(LandmarkId::RightAnkle, 320.0, 550.0, 0.9),
    ];
    LandmarkFrame::new(ts, Orientation::Rotation0, landmarks)
}

/// Hip thrust sintético: cadera `offset` px por debajo de los hombros
pub fn thrust_frame(ts: u64, offset: f32) -> LandmarkFrame {
    let landmarks = vec![
        Landmark::new(LandmarkId::LeftShoulder, 100.0, 300.0, 0.9),
        Landmark::new(LandmarkId::RightShoulder, 200.0, 300.0, 0.9),
        Landmark::new(LandmarkId::LeftHip, 100.0, 300.0 + offset, 0.9),
        Landmark::new(LandmarkId::RightHip, 200.0, 300.0 + offset, 0.9),
    ];
    LandmarkFrame::new(ts, Orientation::Rotation0, landmarks)
}

pub fn repetitions(events: &[EngineEvent]) -> Vec<(u32, u64)> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::RepetitionCounted {
                total,
                timestamp_ms,
            } => Some((*total, *timestamp_ms)),
            _ => None,
        })
        .collect()
}
