//! Eventos de salida del motor y razones de los avisos.
//!
//! Los avisos (`InvalidFrame`) son informativos: nunca detienen el
//! procesamiento, solo alimentan la interfaz de usuario.

use crate::feature_extractor::ExtractError;
use crate::types::{LandmarkId, Phase};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    PhaseChanged {
        phase: Phase,
        timestamp_ms: u64,
    },
    RepetitionCounted {
        total: u32,
        timestamp_ms: u64,
    },
    InvalidFrame {
        reason: InvalidReason,
        timestamp_ms: u64,
    },
    SetStarted {
        set_index: u32,
    },
    RestStarted {
        set_index: u32,
        duration_ms: u64,
    },
    SetCompleted {
        set_index: u32,
        reps: u32,
    },
    SessionCompleted {
        reps_per_set: Vec<u32>,
    },
}

/// Razón de un frame que no produjo conteo
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvalidReason {
    MissingLandmarks { missing: Vec<LandmarkId> },
    DegenerateGeometry { feature: String },
    LowConfidence { confidence: f32, floor: f32 },
    ValidationRejected { rejection: Rejection },
    OutOfOrder { timestamp_ms: u64, last_ms: u64 },
}

/// Por qué una fase Secondary estable no contó
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rejection {
    NoPrimaryPhase,
    CountingSuspended,
    Debounce {
        elapsed_ms: u64,
        required_ms: u64,
    },
    LowConfidence {
        confidence: f32,
        floor: f32,
    },
    Asymmetric {
        left: String,
        right: String,
        difference: f32,
        tolerance: f32,
    },
    InsufficientDisplacement {
        feature: String,
        delta: f32,
        min_delta: f32,
    },
    ExcludedPattern {
        name: String,
    },
}

impl From<ExtractError> for InvalidReason {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::MissingLandmarks { missing } => InvalidReason::MissingLandmarks { missing },
            ExtractError::DegenerateGeometry { feature } => {
                InvalidReason::DegenerateGeometry { feature }
            }
        }
    }
}

impl From<Rejection> for InvalidReason {
    fn from(rejection: Rejection) -> Self {
        InvalidReason::ValidationRejected { rejection }
    }
}

impl EngineEvent {
    pub fn is_repetition(&self) -> bool {
        matches!(self, EngineEvent::RepetitionCounted { .. })
    }
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::PhaseChanged { phase, timestamp_ms } => {
                write!(f, "[{:>8} ms] fase → {}", timestamp_ms, phase.name())
            }
            EngineEvent::RepetitionCounted {
                total,
                timestamp_ms,
            } => write!(f, "[{:>8} ms] repetición #{}", timestamp_ms, total),
            EngineEvent::InvalidFrame {
                reason,
                timestamp_ms,
            } => write!(f, "[{:>8} ms] aviso: {}", timestamp_ms, reason),
            EngineEvent::SetStarted { set_index } => write!(f, "serie {} iniciada", set_index),
            EngineEvent::RestStarted {
                set_index,
                duration_ms,
            } => write!(
                f,
                "descanso tras la serie {} ({} s)",
                set_index,
                duration_ms / 1000
            ),
            EngineEvent::SetCompleted { set_index, reps } => {
                write!(f, "serie {} completada: {} reps", set_index, reps)
            }
            EngineEvent::SessionCompleted { reps_per_set } => {
                write!(f, "sesión completada: {:?}", reps_per_set)
            }
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::MissingLandmarks { missing } => {
                write!(f, "faltan landmarks {:?}", missing)
            }
            InvalidReason::DegenerateGeometry { feature } => {
                write!(f, "geometría degenerada en '{}'", feature)
            }
            InvalidReason::LowConfidence { confidence, floor } => {
                write!(f, "confianza {:.2} < {:.2}", confidence, floor)
            }
            InvalidReason::ValidationRejected { rejection } => {
                write!(f, "repetición rechazada ({:?})", rejection)
            }
            InvalidReason::OutOfOrder {
                timestamp_ms,
                last_ms,
            } => write!(f, "frame fuera de orden ({} < {})", timestamp_ms, last_ms),
        }
    }
}
