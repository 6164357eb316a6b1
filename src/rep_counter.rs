use crate::events::{EngineEvent, InvalidReason, Rejection};
use crate::feature_extractor::FeatureVector;
use crate::phase_classifier::matches_rule;
use crate::profile::{ExerciseProfile, ValidationPredicate};
use crate::types::Phase;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Estados del ciclo de una repetición
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// Esperando que la fase Primary se estabilice
    AwaitingPrimary,
    /// Primary estable: ciclo armado
    StablePrimary,
    /// Salió de Primary, esperando Secondary estable
    AwaitingSecondary,
    /// Secondary estable; `counted` indica si este ciclo sumó una repetición
    StableSecondary { counted: bool },
}

/// Estado completo del validador. Sustituye a los flags sueltos por ejercicio.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterState {
    pub cycle: CycleState,
    /// Última fase que alcanzó el mínimo de frames consecutivos
    pub stable_phase: Option<Phase>,
    /// Frames consecutivos de la fase actual, indexado por `Phase::index`
    pub runs: [u32; Phase::COUNT],
    pub has_completed_primary: bool,
    pub already_counted: bool,
    pub last_count_ms: Option<u64>,
    pub total: u32,
    /// (mín, máx) de cada feature de desplazamiento desde el último Primary estable
    extents: HashMap<String, (f32, f32)>,
}

impl CounterState {
    fn new() -> Self {
        Self {
            cycle: CycleState::AwaitingPrimary,
            stable_phase: None,
            runs: [0; Phase::COUNT],
            has_completed_primary: false,
            already_counted: false,
            last_count_ms: None,
            total: 0,
            extents: HashMap::new(),
        }
    }

    pub fn run(&self, phase: Phase) -> u32 {
        self.runs[phase.index()]
    }
}

/// Máquina de estados de validación y conteo de repeticiones
pub struct RepCounter {
    profile: Arc<ExerciseProfile>,
    state: CounterState,
    counting_enabled: bool,
}

impl RepCounter {
    pub fn new(profile: Arc<ExerciseProfile>) -> Self {
        Self {
            profile,
            state: CounterState::new(),
            counting_enabled: true,
        }
    }

    /// Alimenta el validador con la fase de un frame.
    /// `features` es `None` cuando el frame no produjo features.
    pub fn observe(
        &mut self,
        timestamp_ms: u64,
        phase: Phase,
        features: Option<&FeatureVector>,
    ) -> Vec<EngineEvent> {
        let mut events = Vec::new();

        // 1) Contadores de frames consecutivos: sube la fase actual, el resto a cero
        for p in [Phase::Primary, Phase::Secondary, Phase::Neutral, Phase::Invalid] {
            if p == phase {
                self.state.runs[p.index()] = self.state.runs[p.index()].saturating_add(1);
            } else {
                self.state.runs[p.index()] = 0;
            }
        }

        // 2) Abandonar un estado estable en cuanto llega otra fase
        match self.state.cycle {
            CycleState::StablePrimary if phase != Phase::Primary => {
                self.state.cycle = CycleState::AwaitingSecondary;
            }
            CycleState::StableSecondary { .. } if phase != Phase::Secondary => {
                self.state.cycle = CycleState::AwaitingPrimary;
            }
            _ => {}
        }

        let run = self.state.run(phase);
        let becomes_stable = run == self.profile.min_stable_frames;

        if becomes_stable && phase == Phase::Primary {
            self.state.extents.clear();
        }
        if let Some(fv) = features {
            if phase != Phase::Invalid {
                self.track_extents(fv);
            }
        }

        if becomes_stable {
            if self.state.stable_phase != Some(phase) {
                debug!(
                    "fase estable {} en {} ms (estado {})",
                    phase.name(),
                    timestamp_ms,
                    self.state()
                );
                self.state.stable_phase = Some(phase);
                events.push(EngineEvent::PhaseChanged {
                    phase,
                    timestamp_ms,
                });
            }

            match phase {
                Phase::Primary => {
                    self.state.cycle = CycleState::StablePrimary;
                    self.state.has_completed_primary = true;
                    self.state.already_counted = false;
                }
                Phase::Secondary => {
                    events.extend(self.on_stable_secondary(timestamp_ms, features));
                }
                Phase::Neutral | Phase::Invalid => {}
            }
        }

        // 3) Invalid sostenido desarma el ciclo sin tocar el total
        if phase == Phase::Invalid && run == self.profile.invalid_reset_frames {
            debug!("{} frames inválidos seguidos: se desarma el ciclo", run);
            self.reset_cycle();
        }

        events
    }

    /// Pérdida de landmarks requeridos: cuenta como frame inválido y desarma el ciclo
    pub fn landmarks_lost(&mut self, timestamp_ms: u64) -> Vec<EngineEvent> {
        let events = self.observe(timestamp_ms, Phase::Invalid, None);
        self.reset_cycle();
        events
    }

    fn on_stable_secondary(
        &mut self,
        timestamp_ms: u64,
        features: Option<&FeatureVector>,
    ) -> Vec<EngineEvent> {
        if self.state.already_counted {
            // Secondary → Secondary sin pasar por Primary: este ciclo ya contó
            self.state.cycle = CycleState::StableSecondary { counted: true };
            return Vec::new();
        }

        match self.validate(timestamp_ms, features) {
            Ok(()) => {
                self.state.total += 1;
                self.state.already_counted = true;
                self.state.has_completed_primary = false;
                self.state.last_count_ms = Some(timestamp_ms);
                self.state.cycle = CycleState::StableSecondary { counted: true };

                info!(
                    "✅ repetición {} ({}) en {} ms",
                    self.state.total, self.profile.name, timestamp_ms
                );

                vec![EngineEvent::RepetitionCounted {
                    total: self.state.total,
                    timestamp_ms,
                }]
            }
            Err(rejection) => {
                debug!("repetición rechazada en {} ms: {:?}", timestamp_ms, rejection);
                // Se rearma solo al volver a un Primary estable
                self.state.has_completed_primary = false;
                self.state.cycle = CycleState::StableSecondary { counted: false };

                vec![EngineEvent::InvalidFrame {
                    reason: InvalidReason::from(rejection),
                    timestamp_ms,
                }]
            }
        }
    }

    /// Condiciones para contar, en orden: ciclo armado, conteo habilitado,
    /// anti-rebote, confianza y predicados del perfil.
    fn validate(
        &self,
        timestamp_ms: u64,
        features: Option<&FeatureVector>,
    ) -> Result<(), Rejection> {
        if !self.state.has_completed_primary {
            return Err(Rejection::NoPrimaryPhase);
        }

        if !self.counting_enabled {
            return Err(Rejection::CountingSuspended);
        }

        if let Some(last) = self.state.last_count_ms {
            let elapsed_ms = timestamp_ms.saturating_sub(last);
            if elapsed_ms <= self.profile.debounce_ms {
                return Err(Rejection::Debounce {
                    elapsed_ms,
                    required_ms: self.profile.debounce_ms,
                });
            }
        }

        let fv = match features {
            Some(fv) => fv,
            None => {
                return Err(Rejection::LowConfidence {
                    confidence: 0.0,
                    floor: self.profile.confidence_floor,
                })
            }
        };

        if fv.confidence <= self.profile.confidence_floor {
            return Err(Rejection::LowConfidence {
                confidence: fv.confidence,
                floor: self.profile.confidence_floor,
            });
        }

        for predicate in &self.profile.validations {
            self.check_predicate(predicate, fv)?;
        }

        Ok(())
    }

    fn check_predicate(
        &self,
        predicate: &ValidationPredicate,
        fv: &FeatureVector,
    ) -> Result<(), Rejection> {
        match predicate {
            ValidationPredicate::BilateralSynchrony {
                left,
                right,
                tolerance,
            } => {
                let difference = match (fv.get(left), fv.get(right)) {
                    (Some(l), Some(r)) => (l - r).abs(),
                    _ => f32::INFINITY,
                };
                if difference < *tolerance {
                    Ok(())
                } else {
                    Err(Rejection::Asymmetric {
                        left: left.clone(),
                        right: right.clone(),
                        difference,
                        tolerance: *tolerance,
                    })
                }
            }
            ValidationPredicate::MinDisplacement {
                features,
                min_delta,
            } => {
                for feature in features {
                    let delta = self
                        .state
                        .extents
                        .get(feature)
                        .map_or(0.0, |(min, max)| max - min);
                    if delta < *min_delta {
                        return Err(Rejection::InsufficientDisplacement {
                            feature: feature.clone(),
                            delta,
                            min_delta: *min_delta,
                        });
                    }
                }
                Ok(())
            }
            ValidationPredicate::ExcludePattern { name, bands } => {
                if matches_rule(fv, bands) {
                    Err(Rejection::ExcludedPattern { name: name.clone() })
                } else {
                    Ok(())
                }
            }
        }
    }

    fn track_extents(&mut self, fv: &FeatureVector) {
        for key in self.profile.displacement_features() {
            if let Some(value) = fv.get(key) {
                let entry = self
                    .state
                    .extents
                    .entry(key.to_string())
                    .or_insert((value, value));
                entry.0 = entry.0.min(value);
                entry.1 = entry.1.max(value);
            }
        }
    }

    /// Limpia los flags del ciclo actual; el total y el último conteo se conservan
    pub fn reset_cycle(&mut self) {
        self.state.cycle = CycleState::AwaitingPrimary;
        self.state.has_completed_primary = false;
        self.state.already_counted = false;
        self.state.extents.clear();
    }

    /// Reset completo del estado transitorio; el total solo se borra si se pide
    pub fn reset(&mut self, clear_total: bool) {
        self.reset_cycle();
        self.state.runs = [0; Phase::COUNT];
        self.state.stable_phase = None;
        if clear_total {
            self.state.total = 0;
            self.state.last_count_ms = None;
        }
    }

    /// Olvida la marca del último conteo. Se usa cuando cambia el reloj
    /// de los frames y las marcas viejas dejan de ser comparables.
    pub fn clear_debounce(&mut self) {
        self.state.last_count_ms = None;
    }

    pub fn set_counting_enabled(&mut self, enabled: bool) {
        self.counting_enabled = enabled;
    }

    pub fn counting_enabled(&self) -> bool {
        self.counting_enabled
    }

    pub fn total(&self) -> u32 {
        self.state.total
    }

    pub fn counter_state(&self) -> &CounterState {
        &self.state
    }

    /// Retorna el estado actual del ciclo (para debugging)
    pub fn state(&self) -> &str {
        match self.state.cycle {
            CycleState::AwaitingPrimary => "AWAITING_PRIMARY",
            CycleState::StablePrimary => "STABLE_PRIMARY",
            CycleState::AwaitingSecondary => "AWAITING_SECONDARY",
            CycleState::StableSecondary { counted: true } => "STABLE_SECONDARY_COUNTED",
            CycleState::StableSecondary { counted: false } => "STABLE_SECONDARY_NOT_COUNTED",
        }
    }
}
