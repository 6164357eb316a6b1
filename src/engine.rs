//! Pipeline síncrono por frame: extractor → suavizado → clasificador → contador.
//!
//! Un único contexto es dueño del motor y procesa un frame a la vez; el
//! motor no guarda frames, solo el historial de features suavizadas.

use crate::events::{EngineEvent, InvalidReason};
use crate::feature_extractor::{ExtractError, FeatureExtractor, FeatureVector};
use crate::phase_classifier::classify;
use crate::profile::ExerciseProfile;
use crate::rep_counter::RepCounter;
use crate::smoother::TemporalSmoother;
use crate::types::{LandmarkFrame, Orientation, Phase};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Estado del motor visible desde otros hilos
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub exercise: String,
    pub total: u32,
    /// Última fase estable
    pub phase: Option<Phase>,
    pub cycle: String,
    pub counting_enabled: bool,
    pub last_timestamp_ms: Option<u64>,
    pub frames_processed: u64,
}

pub struct RepEngine {
    profile: Arc<ExerciseProfile>,
    extractor: FeatureExtractor,
    smoother: TemporalSmoother,
    counter: RepCounter,
    last_timestamp_ms: Option<u64>,
    orientation: Option<Orientation>,
    frames_processed: u64,
}

impl RepEngine {
    /// El perfil debe venir ya validado (`ExerciseProfile::builtin`/`from_path`)
    pub fn new(profile: Arc<ExerciseProfile>) -> Self {
        Self {
            smoother: TemporalSmoother::new(profile.smoothing_window),
            counter: RepCounter::new(Arc::clone(&profile)),
            extractor: FeatureExtractor::new(),
            profile,
            last_timestamp_ms: None,
            orientation: None,
            frames_processed: 0,
        }
    }

    /// Procesa un frame y retorna los eventos que produjo.
    /// Nunca falla: los problemas del frame salen como `InvalidFrame`.
    pub fn process(&mut self, frame: &LandmarkFrame) -> Vec<EngineEvent> {
        let ts = frame.timestamp_ms;

        if let Some(last) = self.last_timestamp_ms {
            if ts < last {
                warn!("frame fuera de orden: {} ms < {} ms, descartado", ts, last);
                return vec![EngineEvent::InvalidFrame {
                    reason: InvalidReason::OutOfOrder {
                        timestamp_ms: ts,
                        last_ms: last,
                    },
                    timestamp_ms: ts,
                }];
            }
        }

        if let Some(prev) = self.orientation {
            if prev != frame.orientation {
                warn!(
                    "cambio de orientación {}° → {}°: reset de suavizado y ciclo",
                    prev.degrees(),
                    frame.orientation.degrees()
                );
                self.smoother.reset(None);
                self.counter.reset_cycle();
            }
        }
        self.orientation = Some(frame.orientation);
        self.last_timestamp_ms = Some(ts);
        self.frames_processed += 1;

        let raw = match self.extractor.extract(frame, &self.profile) {
            Ok(raw) => raw,
            Err(err) => return self.on_extract_error(ts, err),
        };

        let smoothed = self.smooth(raw);
        let phase = classify(&smoothed, &self.profile);
        let mut events = self.counter.observe(ts, phase, Some(&smoothed));

        if phase == Phase::Invalid && self.counter.counter_state().run(Phase::Invalid) == 1 {
            events.insert(
                0,
                EngineEvent::InvalidFrame {
                    reason: InvalidReason::LowConfidence {
                        confidence: smoothed.confidence,
                        floor: self.profile.confidence_floor,
                    },
                    timestamp_ms: ts,
                },
            );
        }

        events
    }

    fn on_extract_error(&mut self, ts: u64, err: ExtractError) -> Vec<EngineEvent> {
        let mut events = match err {
            ExtractError::MissingLandmarks { .. } => {
                // No mezclar muestras de antes y después del hueco
                self.smoother.reset(None);
                self.counter.landmarks_lost(ts)
            }
            ExtractError::DegenerateGeometry { .. } => {
                self.counter.observe(ts, Phase::Invalid, None)
            }
        };

        // Un aviso por racha de frames inválidos
        if self.counter.counter_state().run(Phase::Invalid) == 1 {
            debug!("frame inválido en {} ms: {}", ts, err);
            events.insert(
                0,
                EngineEvent::InvalidFrame {
                    reason: InvalidReason::from(err),
                    timestamp_ms: ts,
                },
            );
        }
        events
    }

    fn smooth(&mut self, raw: FeatureVector) -> FeatureVector {
        let mut values = BTreeMap::new();
        for spec in &self.profile.features {
            if let Some(value) = raw.get(&spec.key) {
                let value = if spec.smooth {
                    self.smoother.smooth(&spec.key, value)
                } else {
                    value
                };
                values.insert(spec.key.clone(), value);
            }
        }
        FeatureVector {
            timestamp_ms: raw.timestamp_ms,
            values,
            confidence: raw.confidence,
        }
    }

    /// Reset síncrono del estado transitorio. El total solo se borra si se pide.
    pub fn reset(&mut self, clear_total: bool) {
        debug!("reset (clear_total = {})", clear_total);
        self.smoother.reset(None);
        self.counter.reset(clear_total);
    }

    /// Cambio de cámara: estado transitorio limpio, total intacto, reloj nuevo
    pub fn switch_source(&mut self) {
        self.reset(false);
        self.counter.clear_debounce();
        self.last_timestamp_ms = None;
        self.orientation = None;
    }

    pub fn set_counting_enabled(&mut self, enabled: bool) {
        self.counter.set_counting_enabled(enabled);
    }

    pub fn total(&self) -> u32 {
        self.counter.total()
    }

    pub fn profile(&self) -> &ExerciseProfile {
        &self.profile
    }

    pub fn counter(&self) -> &RepCounter {
        &self.counter
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            exercise: self.profile.name.clone(),
            total: self.counter.total(),
            phase: self.counter.counter_state().stable_phase,
            cycle: self.counter.state().to_string(),
            counting_enabled: self.counter.counting_enabled(),
            last_timestamp_ms: self.last_timestamp_ms,
            frames_processed: self.frames_processed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile;
    use crate::types::{Landmark, LandmarkId};

    /// Frame de hip thrust con la cadera `offset` px por debajo de los hombros
    fn thrust_frame(ts: u64, offset: f32, visibility: f32) -> LandmarkFrame {
        let landmarks = vec![
            Landmark::new(LandmarkId::LeftShoulder, 100.0, 300.0, visibility),
            Landmark::new(LandmarkId::RightShoulder, 200.0, 300.0, visibility),
            Landmark::new(LandmarkId::LeftHip, 100.0, 300.0 + offset, visibility),
            Landmark::new(LandmarkId::RightHip, 200.0, 300.0 + offset, visibility),
        ];
        LandmarkFrame::new(ts, Orientation::Rotation0, landmarks)
    }

    fn engine() -> RepEngine {
        let mut p = profile::hip_thrust();
        p.min_stable_frames = 2;
        p.smoothing_window = 1;
        RepEngine::new(Arc::new(p))
    }

    #[test]
    fn test_full_cycle_counts() {
        let mut engine = engine();
        let mut events = Vec::new();
        for ts in [0u64, 100, 200] {
            events.extend(engine.process(&thrust_frame(ts, 20.0, 0.9)));
        }
        for ts in [1200u64, 1300, 1400] {
            events.extend(engine.process(&thrust_frame(ts, -80.0, 0.9)));
        }
        assert_eq!(events.iter().filter(|e| e.is_repetition()).count(), 1);
        assert_eq!(engine.total(), 1);
        assert_eq!(engine.snapshot().phase, Some(Phase::Secondary));
    }

    #[test]
    fn test_out_of_order_frame_is_ignored() {
        let mut engine = engine();
        engine.process(&thrust_frame(500, 20.0, 0.9));
        let events = engine.process(&thrust_frame(400, 20.0, 0.9));
        assert_eq!(
            events,
            vec![EngineEvent::InvalidFrame {
                reason: InvalidReason::OutOfOrder {
                    timestamp_ms: 400,
                    last_ms: 500
                },
                timestamp_ms: 400
            }]
        );
        assert_eq!(engine.snapshot().frames_processed, 1);
    }

    #[test]
    fn test_missing_landmarks_advisory_once_per_run() {
        let mut engine = engine();
        let empty = LandmarkFrame::new(0, Orientation::Rotation0, Vec::new());
        let first = engine.process(&empty);
        assert!(matches!(
            first[0],
            EngineEvent::InvalidFrame {
                reason: InvalidReason::MissingLandmarks { .. },
                ..
            }
        ));
        let second = engine.process(&LandmarkFrame { timestamp_ms: 10, ..empty });
        assert!(!second
            .iter()
            .any(|e| matches!(e, EngineEvent::InvalidFrame { .. })));
    }

    #[test]
    fn test_low_confidence_frame_is_invalid() {
        let mut engine = engine();
        let events = engine.process(&thrust_frame(0, 20.0, 0.1));
        assert!(matches!(
            events[0],
            EngineEvent::InvalidFrame {
                reason: InvalidReason::LowConfidence { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_orientation_change_disarms_cycle() {
        let mut engine = engine();
        for ts in [0u64, 100] {
            engine.process(&thrust_frame(ts, 20.0, 0.9));
        }
        assert_eq!(engine.counter().state(), "STABLE_PRIMARY");

        let mut rotated = thrust_frame(200, -80.0, 0.9);
        rotated.orientation = Orientation::Rotation90;
        engine.process(&rotated);
        engine.process(&LandmarkFrame {
            timestamp_ms: 1300,
            ..rotated
        });
        assert_eq!(engine.total(), 0);
    }

    #[test]
    fn test_switch_source_keeps_total_and_clock() {
        let mut engine = engine();
        for ts in [0u64, 100] {
            engine.process(&thrust_frame(ts, 20.0, 0.9));
        }
        for ts in [1200u64, 1300] {
            engine.process(&thrust_frame(ts, -80.0, 0.9));
        }
        assert_eq!(engine.total(), 1);

        engine.switch_source();
        assert_eq!(engine.total(), 1);
        // La nueva cámara puede empezar con un reloj anterior
        let events = engine.process(&thrust_frame(10, 20.0, 0.9));
        assert!(!events.iter().any(|e| matches!(
            e,
            EngineEvent::InvalidFrame {
                reason: InvalidReason::OutOfOrder { .. },
                ..
            }
        )));

        engine.reset(true);
        assert_eq!(engine.total(), 0);
    }
}
