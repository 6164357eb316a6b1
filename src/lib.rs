//! Contador de repeticiones a partir de landmarks de pose.
//!
//! Flujo por frame: `feature_extractor` → `smoother` → `phase_classifier`
//! → `rep_counter`, orquestado por `engine`. `session` lleva series y
//! descansos; `runtime` reparte todo en hilos.

pub mod csv_loader;
pub mod engine;
pub mod events;
pub mod feature_extractor;
pub mod phase_classifier;
pub mod profile;
pub mod rep_counter;
pub mod runtime;
pub mod session;
pub mod smoother;
pub mod types;

pub use engine::{EngineSnapshot, RepEngine};
pub use events::{EngineEvent, InvalidReason, Rejection};
pub use profile::{ExerciseProfile, ProfileError};
pub use runtime::{LatestFrameSender, Runtime, RuntimeError};
pub use session::{SessionConfig, SessionController, SessionPhase, SessionSnapshot};
pub use types::{Landmark, LandmarkFrame, LandmarkId, Orientation, Phase};
