//! Perfiles de ejercicio: qué landmarks se requieren, cómo se calculan las
//! features, qué bandas definen cada fase y qué predicados validan una
//! repetición. Un perfil es dato puro; se valida una sola vez al cargarlo.

use crate::types::{LandmarkId, DEFAULT_SMOOTHING_WINDOW, MAX_SMOOTHING_WINDOW};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errores de configuración detectados al cargar un perfil
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unknown built-in profile '{0}'")]
    UnknownProfile(String),

    #[error("Profile '{profile}' declares no required landmarks")]
    NoRequiredLandmarks { profile: String },

    #[error("Duplicate feature key '{0}'")]
    DuplicateFeature(String),

    #[error("Feature '{feature}' references unknown feature '{reference}'")]
    UnknownFeatureReference { feature: String, reference: String },

    #[error("{context} references unknown feature '{feature}'")]
    UnknownFeature { context: String, feature: String },

    #[error("Feature '{feature}' uses landmark {landmark:?} not listed in required_landmarks")]
    UndeclaredLandmark { feature: String, landmark: LandmarkId },

    #[error("Feature '{0}' has an empty landmark group or operand list")]
    EmptyOperands(String),

    #[error("Band on '{feature}' is empty: min {min} >= max {max}")]
    EmptyBand { feature: String, min: f32, max: f32 },

    #[error("Phase rule '{0}' has no bands")]
    EmptyPhaseRule(&'static str),

    #[error("Phase rules '{a}' and '{b}' overlap")]
    OverlappingBands { a: &'static str, b: &'static str },

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Fórmula de una feature escalar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureFormula {
    /// Ángulo en `b` entre b→a y b→c, en grados [0, 180]
    Angle {
        a: LandmarkId,
        b: LandmarkId,
        c: LandmarkId,
    },
    /// media(Y de `from`) − media(Y de `to`); Y menor es "más arriba"
    VerticalOffset {
        from: Vec<LandmarkId>,
        to: Vec<LandmarkId>,
    },
    /// media(X de `from`) − media(X de `to`)
    HorizontalOffset {
        from: Vec<LandmarkId>,
        to: Vec<LandmarkId>,
    },
    /// Distancia euclídea 2-D
    Distance { a: LandmarkId, b: LandmarkId },
    /// Ángulo entre el vector centroide(from)→centroide(to) y la vertical hacia arriba
    Inclination {
        from: Vec<LandmarkId>,
        to: Vec<LandmarkId>,
    },
    /// Media de features definidas antes
    Mean { of: Vec<String> },
    /// |izquierda − derecha| de dos features definidas antes
    Symmetry { left: String, right: String },
}

impl FeatureFormula {
    /// Landmarks que consulta la fórmula (vacío para las derivadas)
    pub fn landmarks(&self) -> Vec<LandmarkId> {
        match self {
            FeatureFormula::Angle { a, b, c } => vec![*a, *b, *c],
            FeatureFormula::VerticalOffset { from, to }
            | FeatureFormula::HorizontalOffset { from, to }
            | FeatureFormula::Inclination { from, to } => {
                from.iter().chain(to.iter()).copied().collect()
            }
            FeatureFormula::Distance { a, b } => vec![*a, *b],
            FeatureFormula::Mean { .. } | FeatureFormula::Symmetry { .. } => Vec::new(),
        }
    }

    /// Features de las que depende (solo las derivadas)
    pub fn dependencies(&self) -> Vec<&str> {
        match self {
            FeatureFormula::Mean { of } => of.iter().map(String::as_str).collect(),
            FeatureFormula::Symmetry { left, right } => vec![left.as_str(), right.as_str()],
            _ => Vec::new(),
        }
    }
}

/// Definición de una feature con nombre
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub key: String,
    pub formula: FeatureFormula,
    /// Si se suaviza temporalmente (las compuertas booleanas no se suavizan)
    #[serde(default = "default_true")]
    pub smooth: bool,
}

impl FeatureSpec {
    pub fn new(key: &str, formula: FeatureFormula) -> Self {
        Self {
            key: key.to_string(),
            formula,
            smooth: true,
        }
    }

    pub fn raw(key: &str, formula: FeatureFormula) -> Self {
        Self {
            smooth: false,
            ..Self::new(key, formula)
        }
    }
}

/// Intervalo semiabierto [min, max) sobre una feature; `None` = sin límite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub feature: String,
    #[serde(default)]
    pub min: Option<f32>,
    #[serde(default)]
    pub max: Option<f32>,
}

impl ThresholdBand {
    pub fn new(feature: &str, min: Option<f32>, max: Option<f32>) -> Self {
        Self {
            feature: feature.to_string(),
            min,
            max,
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        if value.is_nan() {
            return false;
        }
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value < max)
    }

    /// Dos intervalos semiabiertos se intersectan si a < d y c < b
    pub fn intersects(&self, other: &ThresholdBand) -> bool {
        let lo = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let hi = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        match (lo, hi) {
            (Some(lo), Some(hi)) => lo < hi,
            _ => true,
        }
    }
}

/// Conjunción de bandas sobre las features suavizadas
pub type PhaseRule = Vec<ThresholdBand>;

/// Bandas por fase. `neutral` vacío = sin banda explícita
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhaseBands {
    pub primary: PhaseRule,
    pub secondary: PhaseRule,
    #[serde(default)]
    pub neutral: PhaseRule,
}

/// Predicados anti-falsos-positivos evaluados al estabilizar Secondary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationPredicate {
    /// Ambas extremidades deben diferir menos que `tolerance`
    BilateralSynchrony {
        left: String,
        right: String,
        tolerance: f32,
    },
    /// Cada feature debe haber recorrido al menos `min_delta` en el ciclo
    MinDisplacement { features: Vec<String>, min_delta: f32 },
    /// Rechaza configuraciones que coinciden con la fase Secondary de otro ejercicio
    ExcludePattern { name: String, bands: Vec<ThresholdBand> },
}

impl ValidationPredicate {
    fn features(&self) -> Vec<&str> {
        match self {
            ValidationPredicate::BilateralSynchrony { left, right, .. } => {
                vec![left.as_str(), right.as_str()]
            }
            ValidationPredicate::MinDisplacement { features, .. } => {
                features.iter().map(String::as_str).collect()
            }
            ValidationPredicate::ExcludePattern { bands, .. } => {
                bands.iter().map(|b| b.feature.as_str()).collect()
            }
        }
    }
}

/// Perfil de ejercicio completo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseProfile {
    pub name: String,
    pub required_landmarks: Vec<LandmarkId>,
    pub features: Vec<FeatureSpec>,
    pub phases: PhaseBands,
    /// Frames consecutivos para aceptar una fase como estable
    #[serde(default = "default_min_stable_frames")]
    pub min_stable_frames: u32,
    /// Tiempo mínimo entre dos repeticiones contadas
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f32,
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
    /// Frames `Invalid` seguidos que desarman el ciclo actual
    #[serde(default = "default_invalid_reset_frames")]
    pub invalid_reset_frames: u32,
    /// Usar z (si existe) para los ángulos
    #[serde(default)]
    pub use_depth: bool,
    #[serde(default)]
    pub validations: Vec<ValidationPredicate>,
}

fn default_true() -> bool {
    true
}

fn default_min_stable_frames() -> u32 {
    3
}

fn default_debounce_ms() -> u64 {
    800
}

fn default_confidence_floor() -> f32 {
    0.5
}

fn default_smoothing_window() -> usize {
    DEFAULT_SMOOTHING_WINDOW
}

fn default_invalid_reset_frames() -> u32 {
    5
}

impl ExerciseProfile {
    /// Carga y valida un perfil desde un archivo JSON
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Carga y valida un perfil desde un string JSON
    pub fn from_json_str(json: &str) -> Result<Self, ProfileError> {
        let profile: ExerciseProfile = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Perfil incorporado por nombre
    pub fn builtin(name: &str) -> Result<Self, ProfileError> {
        let profile = match name {
            "squat" => squat(),
            "hammer_curl" => hammer_curl(),
            "military_press" => military_press(),
            "front_raise" => front_raise(),
            "sit_up" => sit_up(),
            "hip_thrust" => hip_thrust(),
            "push_up" => push_up(),
            "windmill" => windmill(),
            other => return Err(ProfileError::UnknownProfile(other.to_string())),
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn builtin_names() -> &'static [&'static str] {
        &[
            "squat",
            "hammer_curl",
            "military_press",
            "front_raise",
            "sit_up",
            "hip_thrust",
            "push_up",
            "windmill",
        ]
    }

    /// Acepta un nombre de perfil incorporado o una ruta a un JSON
    pub fn resolve(name_or_path: &str) -> Result<Self, ProfileError> {
        if Self::builtin_names().contains(&name_or_path) {
            Self::builtin(name_or_path)
        } else {
            Self::from_path(name_or_path)
        }
    }

    /// Comprueba la coherencia del perfil. Se llama una vez al cargar.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.required_landmarks.is_empty() {
            return Err(ProfileError::NoRequiredLandmarks {
                profile: self.name.clone(),
            });
        }
        if self.min_stable_frames == 0 {
            return Err(ProfileError::InvalidParameter {
                name: "min_stable_frames",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.invalid_reset_frames == 0 {
            return Err(ProfileError::InvalidParameter {
                name: "invalid_reset_frames",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.smoothing_window == 0 || self.smoothing_window > MAX_SMOOTHING_WINDOW {
            return Err(ProfileError::InvalidParameter {
                name: "smoothing_window",
                reason: format!("must be in 1..={}", MAX_SMOOTHING_WINDOW),
            });
        }
        if !(0.0..1.0).contains(&self.confidence_floor) {
            return Err(ProfileError::InvalidParameter {
                name: "confidence_floor",
                reason: format!("{} is outside [0, 1)", self.confidence_floor),
            });
        }

        let required: HashSet<LandmarkId> = self.required_landmarks.iter().copied().collect();
        let mut defined: HashSet<&str> = HashSet::new();

        for spec in &self.features {
            if defined.contains(spec.key.as_str()) {
                return Err(ProfileError::DuplicateFeature(spec.key.clone()));
            }

            let empty_operands = match &spec.formula {
                FeatureFormula::VerticalOffset { from, to }
                | FeatureFormula::HorizontalOffset { from, to }
                | FeatureFormula::Inclination { from, to } => from.is_empty() || to.is_empty(),
                FeatureFormula::Mean { of } => of.is_empty(),
                _ => false,
            };
            if empty_operands {
                return Err(ProfileError::EmptyOperands(spec.key.clone()));
            }

            for landmark in spec.formula.landmarks() {
                if !required.contains(&landmark) {
                    return Err(ProfileError::UndeclaredLandmark {
                        feature: spec.key.clone(),
                        landmark,
                    });
                }
            }

            // Las derivadas solo pueden usar features definidas antes
            for dep in spec.formula.dependencies() {
                if !defined.contains(dep) {
                    return Err(ProfileError::UnknownFeatureReference {
                        feature: spec.key.clone(),
                        reference: dep.to_string(),
                    });
                }
            }

            defined.insert(spec.key.as_str());
        }

        let rules: [(&'static str, &PhaseRule); 3] = [
            ("primary", &self.phases.primary),
            ("secondary", &self.phases.secondary),
            ("neutral", &self.phases.neutral),
        ];

        for &(name, rule) in rules.iter() {
            if rule.is_empty() && name != "neutral" {
                return Err(ProfileError::EmptyPhaseRule(name));
            }
            check_bands(rule, &defined, &format!("Phase rule '{}'", name))?;
        }

        for (i, &(name_a, rule_a)) in rules.iter().enumerate() {
            for &(name_b, rule_b) in rules.iter().skip(i + 1) {
                if rule_a.is_empty() || rule_b.is_empty() {
                    continue;
                }
                if rules_overlap(rule_a, rule_b) {
                    return Err(ProfileError::OverlappingBands {
                        a: name_a,
                        b: name_b,
                    });
                }
            }
        }

        for predicate in &self.validations {
            for feature in predicate.features() {
                if !defined.contains(feature) {
                    return Err(ProfileError::UnknownFeature {
                        context: "Validation predicate".to_string(),
                        feature: feature.to_string(),
                    });
                }
            }
            match predicate {
                ValidationPredicate::BilateralSynchrony { tolerance, .. }
                    if !tolerance.is_finite() || *tolerance <= 0.0 =>
                {
                    return Err(ProfileError::InvalidParameter {
                        name: "tolerance",
                        reason: format!("{} must be positive", tolerance),
                    });
                }
                ValidationPredicate::MinDisplacement {
                    features,
                    min_delta,
                } => {
                    if features.is_empty() || !min_delta.is_finite() || *min_delta <= 0.0 {
                        return Err(ProfileError::InvalidParameter {
                            name: "min_displacement",
                            reason: "needs at least one feature and a positive min_delta"
                                .to_string(),
                        });
                    }
                }
                ValidationPredicate::ExcludePattern { name, bands } => {
                    if bands.is_empty() {
                        return Err(ProfileError::InvalidParameter {
                            name: "exclude_pattern",
                            reason: format!("pattern '{}' has no bands", name),
                        });
                    }
                    check_bands(bands, &defined, &format!("Exclusion pattern '{}'", name))?;
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Features que usan los predicados de desplazamiento mínimo
    pub fn displacement_features(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        for predicate in &self.validations {
            if let ValidationPredicate::MinDisplacement { features, .. } = predicate {
                keys.extend(features.iter().map(String::as_str));
            }
        }
        keys
    }
}

fn check_bands(
    bands: &[ThresholdBand],
    defined: &HashSet<&str>,
    context: &str,
) -> Result<(), ProfileError> {
    for band in bands {
        if !defined.contains(band.feature.as_str()) {
            return Err(ProfileError::UnknownFeature {
                context: context.to_string(),
                feature: band.feature.clone(),
            });
        }
        if band.min.map_or(false, |v| !v.is_finite()) || band.max.map_or(false, |v| !v.is_finite())
        {
            return Err(ProfileError::InvalidParameter {
                name: "band",
                reason: format!("'{}' has a non-finite bound", band.feature),
            });
        }
        if let (Some(min), Some(max)) = (band.min, band.max) {
            if min >= max {
                return Err(ProfileError::EmptyBand {
                    feature: band.feature.clone(),
                    min,
                    max,
                });
            }
        }
    }
    Ok(())
}

/// Dos conjunciones de bandas son cajas en el espacio de features: se
/// solapan salvo que alguna feature común tenga intervalos disjuntos.
fn rules_overlap(a: &[ThresholdBand], b: &[ThresholdBand]) -> bool {
    let mut per_feature: HashMap<&str, ThresholdBand> = HashMap::new();
    for band in a {
        let merged = match per_feature.get(band.feature.as_str()) {
            Some(prev) => intersect(prev, band),
            None => band.clone(),
        };
        per_feature.insert(band.feature.as_str(), merged);
    }

    for band in b {
        if let Some(existing) = per_feature.get(band.feature.as_str()) {
            if !existing.intersects(band) {
                return false;
            }
        }
    }
    true
}

fn intersect(a: &ThresholdBand, b: &ThresholdBand) -> ThresholdBand {
    let min = match (a.min, b.min) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, y) => x.or(y),
    };
    let max = match (a.max, b.max) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, y) => x.or(y),
    };
    ThresholdBand {
        feature: a.feature.clone(),
        min,
        max,
    }
}

// ========== Perfiles incorporados ==========
//
// Umbrales en grados o en píxeles de imagen, tomados de las actividades
// originales de cada ejercicio.

use LandmarkId::*;

fn band(feature: &str, min: Option<f32>, max: Option<f32>) -> ThresholdBand {
    ThresholdBand::new(feature, min, max)
}

fn mean_of(keys: &[&str]) -> FeatureFormula {
    FeatureFormula::Mean {
        of: keys.iter().map(|k| k.to_string()).collect(),
    }
}

fn symmetry(left: &str, right: &str) -> FeatureFormula {
    FeatureFormula::Symmetry {
        left: left.to_string(),
        right: right.to_string(),
    }
}

/// Sentadilla: Primary = abajo (rodilla 70–140°), Secondary = arriba
pub fn squat() -> ExerciseProfile {
    ExerciseProfile {
        name: "squat".to_string(),
        required_landmarks: vec![
            LeftHip,
            RightHip,
            LeftKnee,
            RightKnee,
            LeftAnkle,
            RightAnkle,
            LeftShoulder,
            RightShoulder,
        ],
        features: vec![
            FeatureSpec::new(
                "left_knee_angle",
                FeatureFormula::Angle {
                    a: LeftHip,
                    b: LeftKnee,
                    c: LeftAnkle,
                },
            ),
            FeatureSpec::new(
                "right_knee_angle",
                FeatureFormula::Angle {
                    a: RightHip,
                    b: RightKnee,
                    c: RightAnkle,
                },
            ),
            FeatureSpec::new("knee_angle", mean_of(&["left_knee_angle", "right_knee_angle"])),
            FeatureSpec::raw("knee_symmetry", symmetry("left_knee_angle", "right_knee_angle")),
            FeatureSpec::new(
                "hip_shoulder_diff",
                FeatureFormula::VerticalOffset {
                    from: vec![LeftHip, RightHip],
                    to: vec![LeftShoulder, RightShoulder],
                },
            ),
        ],
        phases: PhaseBands {
            primary: vec![
                band("knee_angle", Some(70.0), Some(140.0)),
                band("knee_symmetry", None, Some(25.0)),
            ],
            secondary: vec![band("knee_angle", Some(150.0), None)],
            neutral: Vec::new(),
        },
        min_stable_frames: 3,
        debounce_ms: 800,
        confidence_floor: 0.6,
        smoothing_window: 8,
        invalid_reset_frames: 5,
        use_depth: false,
        validations: vec![ValidationPredicate::MinDisplacement {
            features: vec!["knee_angle".to_string()],
            min_delta: 20.0,
        }],
    }
}

/// Curl martillo: Primary = muñecas bajo los codos, Secondary = muñecas a la altura del codo
pub fn hammer_curl() -> ExerciseProfile {
    ExerciseProfile {
        name: "hammer_curl".to_string(),
        required_landmarks: vec![
            LeftShoulder,
            RightShoulder,
            LeftElbow,
            RightElbow,
            LeftWrist,
            RightWrist,
        ],
        features: vec![
            FeatureSpec::new(
                "left_wrist_elbow_diff",
                FeatureFormula::VerticalOffset {
                    from: vec![LeftWrist],
                    to: vec![LeftElbow],
                },
            ),
            FeatureSpec::new(
                "right_wrist_elbow_diff",
                FeatureFormula::VerticalOffset {
                    from: vec![RightWrist],
                    to: vec![RightElbow],
                },
            ),
            FeatureSpec::new(
                "wrist_elbow_diff",
                mean_of(&["left_wrist_elbow_diff", "right_wrist_elbow_diff"]),
            ),
            FeatureSpec::new(
                "wrist_shoulder_diff",
                FeatureFormula::VerticalOffset {
                    from: vec![LeftWrist, RightWrist],
                    to: vec![LeftShoulder, RightShoulder],
                },
            ),
            FeatureSpec::new(
                "left_elbow_spread",
                FeatureFormula::Distance {
                    a: LeftElbow,
                    b: LeftShoulder,
                },
            ),
            FeatureSpec::new(
                "right_elbow_spread",
                FeatureFormula::Distance {
                    a: RightElbow,
                    b: RightShoulder,
                },
            ),
        ],
        phases: PhaseBands {
            primary: vec![band("wrist_elbow_diff", Some(10.0), None)],
            secondary: vec![band("wrist_elbow_diff", None, Some(10.0))],
            neutral: Vec::new(),
        },
        min_stable_frames: 1,
        debounce_ms: 500,
        confidence_floor: 0.3,
        smoothing_window: 7,
        invalid_reset_frames: 5,
        use_depth: false,
        validations: vec![
            ValidationPredicate::BilateralSynchrony {
                left: "left_wrist_elbow_diff".to_string(),
                right: "right_wrist_elbow_diff".to_string(),
                tolerance: 25.0,
            },
            ValidationPredicate::MinDisplacement {
                features: vec![
                    "left_wrist_elbow_diff".to_string(),
                    "right_wrist_elbow_diff".to_string(),
                ],
                min_delta: 8.0,
            },
            // Press por encima de la cabeza: muñecas > 80 px sobre los hombros
            ValidationPredicate::ExcludePattern {
                name: "overhead_press".to_string(),
                bands: vec![band("wrist_shoulder_diff", None, Some(-80.0))],
            },
            // Elevación lateral: codos separados del hombro
            ValidationPredicate::ExcludePattern {
                name: "lateral_raise".to_string(),
                bands: vec![
                    band("left_elbow_spread", Some(200.0), None),
                    band("right_elbow_spread", Some(200.0), None),
                ],
            },
        ],
    }
}

/// Press militar: Primary = codos flexionados, Secondary = brazos extendidos sobre los hombros
pub fn military_press() -> ExerciseProfile {
    ExerciseProfile {
        name: "military_press".to_string(),
        required_landmarks: vec![
            LeftShoulder,
            RightShoulder,
            LeftElbow,
            RightElbow,
            LeftWrist,
            RightWrist,
        ],
        features: vec![
            FeatureSpec::new(
                "left_elbow_angle",
                FeatureFormula::Angle {
                    a: LeftShoulder,
                    b: LeftElbow,
                    c: LeftWrist,
                },
            ),
            FeatureSpec::new(
                "right_elbow_angle",
                FeatureFormula::Angle {
                    a: RightShoulder,
                    b: RightElbow,
                    c: RightWrist,
                },
            ),
            FeatureSpec::new(
                "elbow_angle",
                mean_of(&["left_elbow_angle", "right_elbow_angle"]),
            ),
            // Positivo cuando las muñecas están sobre los hombros
            FeatureSpec::new(
                "wrist_above_shoulder",
                FeatureFormula::VerticalOffset {
                    from: vec![LeftShoulder, RightShoulder],
                    to: vec![LeftWrist, RightWrist],
                },
            ),
        ],
        phases: PhaseBands {
            primary: vec![band("elbow_angle", Some(60.0), Some(120.0))],
            secondary: vec![
                band("elbow_angle", Some(130.0), None),
                band("wrist_above_shoulder", Some(40.0), None),
            ],
            neutral: Vec::new(),
        },
        min_stable_frames: 2,
        debounce_ms: 500,
        confidence_floor: 0.4,
        smoothing_window: 10,
        invalid_reset_frames: 5,
        use_depth: false,
        validations: vec![ValidationPredicate::BilateralSynchrony {
            left: "left_elbow_angle".to_string(),
            right: "right_elbow_angle".to_string(),
            tolerance: 30.0,
        }],
    }
}

/// Elevación frontal: Primary = muñecas bajo los hombros, Secondary = a la altura del hombro
pub fn front_raise() -> ExerciseProfile {
    ExerciseProfile {
        name: "front_raise".to_string(),
        required_landmarks: vec![
            LeftShoulder,
            RightShoulder,
            LeftElbow,
            RightElbow,
            LeftWrist,
            RightWrist,
            LeftHip,
            RightHip,
        ],
        features: vec![
            FeatureSpec::new(
                "wrist_shoulder_diff",
                FeatureFormula::VerticalOffset {
                    from: vec![LeftWrist, RightWrist],
                    to: vec![LeftShoulder, RightShoulder],
                },
            ),
            FeatureSpec::new(
                "left_elbow_angle",
                FeatureFormula::Angle {
                    a: LeftShoulder,
                    b: LeftElbow,
                    c: LeftWrist,
                },
            ),
            FeatureSpec::new(
                "right_elbow_angle",
                FeatureFormula::Angle {
                    a: RightShoulder,
                    b: RightElbow,
                    c: RightWrist,
                },
            ),
            FeatureSpec::new(
                "elbow_angle",
                mean_of(&["left_elbow_angle", "right_elbow_angle"]),
            ),
            FeatureSpec::raw(
                "torso_lean",
                FeatureFormula::Inclination {
                    from: vec![LeftHip, RightHip],
                    to: vec![LeftShoulder, RightShoulder],
                },
            ),
        ],
        phases: PhaseBands {
            primary: vec![
                band("wrist_shoulder_diff", Some(60.0), None),
                band("torso_lean", None, Some(30.0)),
            ],
            secondary: vec![
                band("wrist_shoulder_diff", Some(-20.0), Some(30.0)),
                band("elbow_angle", Some(140.0), None),
                band("torso_lean", None, Some(30.0)),
            ],
            neutral: Vec::new(),
        },
        min_stable_frames: 3,
        debounce_ms: 1000,
        confidence_floor: 0.5,
        smoothing_window: 5,
        invalid_reset_frames: 5,
        use_depth: false,
        validations: vec![ValidationPredicate::BilateralSynchrony {
            left: "left_elbow_angle".to_string(),
            right: "right_elbow_angle".to_string(),
            tolerance: 30.0,
        }],
    }
}

/// Abdominal: Primary = torso tumbado, Secondary = torso erguido
pub fn sit_up() -> ExerciseProfile {
    ExerciseProfile {
        name: "sit_up".to_string(),
        required_landmarks: vec![Nose, LeftShoulder, RightShoulder, LeftHip, RightHip],
        features: vec![FeatureSpec::new(
            "torso_inclination",
            FeatureFormula::Inclination {
                from: vec![LeftHip, RightHip],
                to: vec![LeftShoulder, RightShoulder],
            },
        )],
        phases: PhaseBands {
            primary: vec![band("torso_inclination", Some(60.0), Some(120.0))],
            secondary: vec![band("torso_inclination", None, Some(35.0))],
            neutral: Vec::new(),
        },
        min_stable_frames: 4,
        debounce_ms: 800,
        confidence_floor: 0.5,
        smoothing_window: 8,
        invalid_reset_frames: 5,
        use_depth: false,
        validations: Vec::new(),
    }
}

/// Hip thrust: Primary = cadera abajo, Secondary = cadera elevada sobre los hombros
pub fn hip_thrust() -> ExerciseProfile {
    ExerciseProfile {
        name: "hip_thrust".to_string(),
        required_landmarks: vec![LeftHip, RightHip, LeftShoulder, RightShoulder],
        features: vec![FeatureSpec::new(
            "hip_shoulder_diff",
            FeatureFormula::VerticalOffset {
                from: vec![LeftHip, RightHip],
                to: vec![LeftShoulder, RightShoulder],
            },
        )],
        phases: PhaseBands {
            primary: vec![band("hip_shoulder_diff", Some(-10.0), None)],
            secondary: vec![band("hip_shoulder_diff", None, Some(-40.0))],
            neutral: Vec::new(),
        },
        min_stable_frames: 6,
        debounce_ms: 1000,
        confidence_floor: 0.5,
        smoothing_window: 5,
        invalid_reset_frames: 6,
        use_depth: false,
        validations: Vec::new(),
    }
}

/// Flexión de brazos: Primary = pecho abajo (codo 40–110°), Secondary = brazos
/// extendidos. El ángulo usa profundidad porque la cámara suele verlo de lado.
pub fn push_up() -> ExerciseProfile {
    ExerciseProfile {
        name: "push_up".to_string(),
        required_landmarks: vec![
            LeftShoulder,
            RightShoulder,
            LeftElbow,
            RightElbow,
            LeftWrist,
            RightWrist,
        ],
        features: vec![
            FeatureSpec::new(
                "left_elbow_angle",
                FeatureFormula::Angle {
                    a: LeftShoulder,
                    b: LeftElbow,
                    c: LeftWrist,
                },
            ),
            FeatureSpec::new(
                "right_elbow_angle",
                FeatureFormula::Angle {
                    a: RightShoulder,
                    b: RightElbow,
                    c: RightWrist,
                },
            ),
            FeatureSpec::new(
                "elbow_angle",
                mean_of(&["left_elbow_angle", "right_elbow_angle"]),
            ),
            FeatureSpec::raw(
                "arm_symmetry",
                symmetry("left_elbow_angle", "right_elbow_angle"),
            ),
        ],
        phases: PhaseBands {
            primary: vec![
                band("elbow_angle", Some(40.0), Some(110.0)),
                band("arm_symmetry", None, Some(30.0)),
            ],
            secondary: vec![band("elbow_angle", Some(140.0), None)],
            neutral: Vec::new(),
        },
        min_stable_frames: 6,
        debounce_ms: 800,
        confidence_floor: 0.7,
        smoothing_window: 8,
        invalid_reset_frames: 5,
        use_depth: true,
        validations: vec![ValidationPredicate::MinDisplacement {
            features: vec!["elbow_angle".to_string()],
            min_delta: 30.0,
        }],
    }
}

/// Molino: Primary = brazos en cruz con piernas abiertas, Secondary = una
/// mano al pie contrario mientras la otra apunta arriba. Cualquier lado cuenta.
pub fn windmill() -> ExerciseProfile {
    ExerciseProfile {
        name: "windmill".to_string(),
        required_landmarks: vec![
            LeftShoulder,
            RightShoulder,
            LeftWrist,
            RightWrist,
            LeftHip,
            RightHip,
            LeftKnee,
            RightKnee,
            LeftAnkle,
            RightAnkle,
        ],
        features: vec![
            FeatureSpec::new(
                "left_wrist_drop",
                FeatureFormula::VerticalOffset {
                    from: vec![LeftWrist],
                    to: vec![LeftShoulder, RightShoulder],
                },
            ),
            FeatureSpec::new(
                "right_wrist_drop",
                FeatureFormula::VerticalOffset {
                    from: vec![RightWrist],
                    to: vec![LeftShoulder, RightShoulder],
                },
            ),
            FeatureSpec::raw(
                "arm_asymmetry",
                symmetry("left_wrist_drop", "right_wrist_drop"),
            ),
            FeatureSpec::new(
                "wrist_spread",
                FeatureFormula::Distance {
                    a: LeftWrist,
                    b: RightWrist,
                },
            ),
            FeatureSpec::new(
                "stance",
                FeatureFormula::VerticalOffset {
                    from: vec![LeftAnkle, RightAnkle],
                    to: vec![LeftHip, RightHip],
                },
            ),
        ],
        phases: PhaseBands {
            primary: vec![
                band("arm_asymmetry", None, Some(100.0)),
                band("wrist_spread", Some(300.0), None),
                band("stance", Some(50.0), None),
            ],
            secondary: vec![band("arm_asymmetry", Some(200.0), None)],
            neutral: Vec::new(),
        },
        min_stable_frames: 1,
        debounce_ms: 500,
        confidence_floor: 0.5,
        smoothing_window: 3,
        invalid_reset_frames: 5,
        use_depth: false,
        validations: vec![ValidationPredicate::MinDisplacement {
            features: vec!["arm_asymmetry".to_string()],
            min_delta: 150.0,
        }],
    }
}
