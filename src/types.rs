use serde::{Deserialize, Deserializer, Serialize};

/// Articulaciones del esqueleto de 33 puntos (BlazePose / ML Kit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LandmarkId {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl LandmarkId {
    /// Todas las articulaciones en el orden del modelo (índice 0..33)
    pub const ALL: [LandmarkId; NUM_LANDMARKS] = [
        LandmarkId::Nose,
        LandmarkId::LeftEyeInner,
        LandmarkId::LeftEye,
        LandmarkId::LeftEyeOuter,
        LandmarkId::RightEyeInner,
        LandmarkId::RightEye,
        LandmarkId::RightEyeOuter,
        LandmarkId::LeftEar,
        LandmarkId::RightEar,
        LandmarkId::MouthLeft,
        LandmarkId::MouthRight,
        LandmarkId::LeftShoulder,
        LandmarkId::RightShoulder,
        LandmarkId::LeftElbow,
        LandmarkId::RightElbow,
        LandmarkId::LeftWrist,
        LandmarkId::RightWrist,
        LandmarkId::LeftPinky,
        LandmarkId::RightPinky,
        LandmarkId::LeftIndex,
        LandmarkId::RightIndex,
        LandmarkId::LeftThumb,
        LandmarkId::RightThumb,
        LandmarkId::LeftHip,
        LandmarkId::RightHip,
        LandmarkId::LeftKnee,
        LandmarkId::RightKnee,
        LandmarkId::LeftAnkle,
        LandmarkId::RightAnkle,
        LandmarkId::LeftHeel,
        LandmarkId::RightHeel,
        LandmarkId::LeftFootIndex,
        LandmarkId::RightFootIndex,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LandmarkId::Nose => "NOSE",
            LandmarkId::LeftEyeInner => "LEFT_EYE_INNER",
            LandmarkId::LeftEye => "LEFT_EYE",
            LandmarkId::LeftEyeOuter => "LEFT_EYE_OUTER",
            LandmarkId::RightEyeInner => "RIGHT_EYE_INNER",
            LandmarkId::RightEye => "RIGHT_EYE",
            LandmarkId::RightEyeOuter => "RIGHT_EYE_OUTER",
            LandmarkId::LeftEar => "LEFT_EAR",
            LandmarkId::RightEar => "RIGHT_EAR",
            LandmarkId::MouthLeft => "MOUTH_LEFT",
            LandmarkId::MouthRight => "MOUTH_RIGHT",
            LandmarkId::LeftShoulder => "LEFT_SHOULDER",
            LandmarkId::RightShoulder => "RIGHT_SHOULDER",
            LandmarkId::LeftElbow => "LEFT_ELBOW",
            LandmarkId::RightElbow => "RIGHT_ELBOW",
            LandmarkId::LeftWrist => "LEFT_WRIST",
            LandmarkId::RightWrist => "RIGHT_WRIST",
            LandmarkId::LeftPinky => "LEFT_PINKY",
            LandmarkId::RightPinky => "RIGHT_PINKY",
            LandmarkId::LeftIndex => "LEFT_INDEX",
            LandmarkId::RightIndex => "RIGHT_INDEX",
            LandmarkId::LeftThumb => "LEFT_THUMB",
            LandmarkId::RightThumb => "RIGHT_THUMB",
            LandmarkId::LeftHip => "LEFT_HIP",
            LandmarkId::RightHip => "RIGHT_HIP",
            LandmarkId::LeftKnee => "LEFT_KNEE",
            LandmarkId::RightKnee => "RIGHT_KNEE",
            LandmarkId::LeftAnkle => "LEFT_ANKLE",
            LandmarkId::RightAnkle => "RIGHT_ANKLE",
            LandmarkId::LeftHeel => "LEFT_HEEL",
            LandmarkId::RightHeel => "RIGHT_HEEL",
            LandmarkId::LeftFootIndex => "LEFT_FOOT_INDEX",
            LandmarkId::RightFootIndex => "RIGHT_FOOT_INDEX",
        }
    }

    /// Conversión nombre → articulación (acepta mayúsculas o minúsculas)
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        Self::ALL.iter().copied().find(|id| id.name() == upper)
    }

    /// Índice en el modelo de 33 puntos
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Un landmark detectado en un frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub id: LandmarkId,
    pub x: f32,
    pub y: f32,
    /// Profundidad relativa, si el modelo la entrega
    #[serde(default)]
    pub z: Option<f32>,
    /// Visibilidad / confianza en [0, 1]
    #[serde(deserialize_with = "clamped_visibility")]
    pub visibility: f32,
}

/// Los modelos de pose a veces entregan visibilidades fuera de [0, 1]
fn clamped_visibility<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let visibility = f32::deserialize(deserializer)?;
    Ok(visibility.clamp(0.0, 1.0))
}

impl Landmark {
    pub fn new(id: LandmarkId, x: f32, y: f32, visibility: f32) -> Self {
        Self {
            id,
            x,
            y,
            z: None,
            visibility: visibility.clamp(0.0, 1.0),
        }
    }

    pub fn with_depth(mut self, z: f32) -> Self {
        self.z = Some(z);
        self
    }
}

/// Rotación del dispositivo al capturar el frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl Orientation {
    /// Crea la orientación desde grados (se normaliza a múltiplos de 90)
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            45..=134 => Orientation::Rotation90,
            135..=224 => Orientation::Rotation180,
            225..=314 => Orientation::Rotation270,
            _ => Orientation::Rotation0,
        }
    }

    pub fn degrees(&self) -> i32 {
        match self {
            Orientation::Rotation0 => 0,
            Orientation::Rotation90 => 90,
            Orientation::Rotation180 => 180,
            Orientation::Rotation270 => 270,
        }
    }
}

/// Frame completo de landmarks para un instante
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Marca de tiempo monótona en milisegundos
    pub timestamp_ms: u64,
    #[serde(default)]
    pub orientation: Orientation,
    pub landmarks: Vec<Landmark>,
}

impl LandmarkFrame {
    pub fn new(timestamp_ms: u64, orientation: Orientation, landmarks: Vec<Landmark>) -> Self {
        Self {
            timestamp_ms,
            orientation,
            landmarks,
        }
    }

    /// Busca un landmark por articulación
    pub fn get(&self, id: LandmarkId) -> Option<&Landmark> {
        self.landmarks.iter().find(|l| l.id == id)
    }

    pub fn contains(&self, id: LandmarkId) -> bool {
        self.get(id).is_some()
    }
}

/// Fase clasificada para un frame, independiente del ejercicio
/// (Primary/Secondary equivalen a "abajo/arriba", "bajado/subido", etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Primary,
    Secondary,
    Neutral,
    Invalid,
}

impl Phase {
    pub const COUNT: usize = 4;

    pub fn index(&self) -> usize {
        match self {
            Phase::Primary => 0,
            Phase::Secondary => 1,
            Phase::Neutral => 2,
            Phase::Invalid => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Primary => "PRIMARY",
            Phase::Secondary => "SECONDARY",
            Phase::Neutral => "NEUTRAL",
            Phase::Invalid => "INVALID",
        }
    }
}

/// Constantes del sistema
pub const NUM_LANDMARKS: usize = 33;
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;
pub const MAX_SMOOTHING_WINDOW: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_names_roundtrip() {
        for (i, id) in LandmarkId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(LandmarkId::from_name(id.name()), Some(*id));
        }
        assert_eq!(LandmarkId::from_name("left_knee"), Some(LandmarkId::LeftKnee));
        assert_eq!(LandmarkId::from_name("tail"), None);
    }

    #[test]
    fn test_visibility_clamped_when_deserialized() {
        let json = r#"{"timestamp_ms":10,"landmarks":[
            {"id":"LEFT_HIP","x":1.0,"y":2.0,"visibility":7.5},
            {"id":"RIGHT_HIP","x":3.0,"y":4.0,"visibility":-0.4}
        ]}"#;
        let frame: LandmarkFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.get(LandmarkId::LeftHip).unwrap().visibility, 1.0);
        assert_eq!(frame.get(LandmarkId::RightHip).unwrap().visibility, 0.0);
        assert_eq!(frame.orientation, Orientation::Rotation0);
    }

    #[test]
    fn test_landmark_serde_name() {
        let json = serde_json::to_string(&LandmarkId::LeftShoulder).unwrap();
        assert_eq!(json, "\"LEFT_SHOULDER\"");
    }

    #[test]
    fn test_orientation_from_degrees() {
        assert_eq!(Orientation::from_degrees(0), Orientation::Rotation0);
        assert_eq!(Orientation::from_degrees(90), Orientation::Rotation90);
        assert_eq!(Orientation::from_degrees(-90), Orientation::Rotation270);
        assert_eq!(Orientation::from_degrees(540), Orientation::Rotation180);
    }

    #[test]
    fn test_visibility_is_clamped() {
        let l = Landmark::new(LandmarkId::Nose, 0.0, 0.0, 1.7);
        assert_eq!(l.visibility, 1.0);
    }
}
