use crate::events::EngineEvent;
use crate::profile::ProfileError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Descanso por defecto entre series
pub const DEFAULT_REST_SECS: u64 = 20;

/// Parámetros de una sesión de entrenamiento
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Repeticiones objetivo por serie
    pub target_reps: u32,
    /// Número total de series
    pub total_sets: u32,
    /// Descanso entre series, en segundos
    pub rest_secs: u64,
    /// Límite de tiempo por serie; al expirar la serie se cierra con las reps hechas
    pub set_time_limit_secs: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target_reps: 10,
            total_sets: 3,
            rest_secs: DEFAULT_REST_SECS,
            set_time_limit_secs: None,
        }
    }
}

impl SessionConfig {
    pub fn rest_duration(&self) -> Duration {
        Duration::from_secs(self.rest_secs)
    }

    pub fn set_time_limit(&self) -> Option<Duration> {
        self.set_time_limit_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.target_reps == 0 {
            return Err(ProfileError::InvalidParameter {
                name: "target_reps",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.total_sets == 0 {
            return Err(ProfileError::InvalidParameter {
                name: "total_sets",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.set_time_limit_secs == Some(0) {
            return Err(ProfileError::InvalidParameter {
                name: "set_time_limit_secs",
                reason: "must be positive when set".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Working,
    Resting,
    Complete,
}

/// Vista inmutable del estado de la sesión para la interfaz
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    /// Serie actual, empezando en 1
    pub set_index: u32,
    pub total_sets: u32,
    pub reps_in_set: u32,
    pub target_reps: u32,
    pub reps_per_set: Vec<u32>,
    /// Descanso restante (en `Resting`) o tiempo restante de la serie (con límite)
    pub time_remaining_ms: Option<u64>,
    pub paused: bool,
}

/// Máquina de estados de series y descansos
pub struct SessionController {
    config: SessionConfig,
    phase: SessionPhase,
    set_index: u32,
    reps_in_set: u32,
    reps_per_set: Vec<u32>,
    rest_remaining: Duration,
    set_elapsed: Duration,
    paused: bool,
}

impl SessionController {
    pub fn new(config: SessionConfig) -> Result<Self, ProfileError> {
        config.validate()?;
        Ok(Self {
            config,
            phase: SessionPhase::Working,
            set_index: 1,
            reps_in_set: 0,
            reps_per_set: Vec::new(),
            rest_remaining: Duration::ZERO,
            set_elapsed: Duration::ZERO,
            paused: false,
        })
    }

    /// Evento de arranque de la primera serie
    pub fn start(&self) -> Vec<EngineEvent> {
        info!(
            "sesión iniciada: {} series x {} reps",
            self.config.total_sets, self.config.target_reps
        );
        vec![EngineEvent::SetStarted {
            set_index: self.set_index,
        }]
    }

    /// Solo se aceptan repeticiones durante una serie activa
    pub fn is_accepting_reps(&self) -> bool {
        self.phase == SessionPhase::Working
    }

    /// Registra una repetición contada. Al llegar al objetivo la serie se cierra
    /// de inmediato, sin esperar al siguiente tick.
    pub fn on_repetition(&mut self) -> Vec<EngineEvent> {
        if !self.is_accepting_reps() {
            return Vec::new();
        }
        self.reps_in_set += 1;
        if self.reps_in_set >= self.config.target_reps {
            self.complete_set()
        } else {
            Vec::new()
        }
    }

    /// Avanza los temporizadores. No hace nada mientras está en pausa.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<EngineEvent> {
        if self.paused {
            return Vec::new();
        }

        match self.phase {
            SessionPhase::Resting => {
                self.rest_remaining = self.rest_remaining.saturating_sub(elapsed);
                if self.rest_remaining.is_zero() {
                    self.set_index += 1;
                    if self.set_index > self.config.total_sets {
                        return self.finish();
                    }
                    self.phase = SessionPhase::Working;
                    self.set_elapsed = Duration::ZERO;
                    info!("descanso terminado, serie {}", self.set_index);
                    return vec![EngineEvent::SetStarted {
                        set_index: self.set_index,
                    }];
                }
                Vec::new()
            }
            SessionPhase::Working => {
                let limit = match self.config.set_time_limit() {
                    Some(limit) => limit,
                    None => return Vec::new(),
                };
                self.set_elapsed += elapsed;
                if self.set_elapsed >= limit {
                    info!(
                        "tiempo agotado en la serie {} ({} reps)",
                        self.set_index, self.reps_in_set
                    );
                    return self.complete_set();
                }
                Vec::new()
            }
            SessionPhase::Complete => Vec::new(),
        }
    }

    /// Congela los temporizadores conservando el tiempo restante
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn rest_remaining(&self) -> Duration {
        self.rest_remaining
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let time_remaining = match self.phase {
            SessionPhase::Resting => Some(self.rest_remaining),
            SessionPhase::Working => self
                .config
                .set_time_limit()
                .map(|limit| limit.saturating_sub(self.set_elapsed)),
            SessionPhase::Complete => None,
        };
        SessionSnapshot {
            phase: self.phase,
            set_index: self.set_index,
            total_sets: self.config.total_sets,
            reps_in_set: self.reps_in_set,
            target_reps: self.config.target_reps,
            reps_per_set: self.reps_per_set.clone(),
            time_remaining_ms: time_remaining.map(|d| d.as_millis() as u64),
            paused: self.paused,
        }
    }

    fn complete_set(&mut self) -> Vec<EngineEvent> {
        let reps = self.reps_in_set;
        self.reps_per_set.push(reps);
        self.reps_in_set = 0;

        info!("✅ serie {} completada ({} reps)", self.set_index, reps);
        let mut events = vec![EngineEvent::SetCompleted {
            set_index: self.set_index,
            reps,
        }];

        if self.set_index >= self.config.total_sets {
            events.extend(self.finish());
        } else {
            self.phase = SessionPhase::Resting;
            self.rest_remaining = self.config.rest_duration();
            events.push(EngineEvent::RestStarted {
                set_index: self.set_index,
                duration_ms: self.rest_remaining.as_millis() as u64,
            });
        }
        events
    }

    fn finish(&mut self) -> Vec<EngineEvent> {
        self.phase = SessionPhase::Complete;
        self.rest_remaining = Duration::ZERO;
        info!("🏁 sesión completada: {:?}", self.reps_per_set);
        vec![EngineEvent::SessionCompleted {
            reps_per_set: self.reps_per_set.clone(),
        }]
    }
}
