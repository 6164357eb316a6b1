use crate::feature_extractor::FeatureVector;
use crate::profile::{ExerciseProfile, ThresholdBand};
use crate::types::Phase;

/// Clasifica un vector de features suavizado en una fase.
///
/// Función pura: no guarda estado entre llamadas. La confianza por debajo
/// del umbral del perfil tiene prioridad sobre cualquier banda.
pub fn classify(features: &FeatureVector, profile: &ExerciseProfile) -> Phase {
    if features.confidence < profile.confidence_floor {
        return Phase::Invalid;
    }

    if matches_rule(features, &profile.phases.primary) {
        Phase::Primary
    } else if matches_rule(features, &profile.phases.secondary) {
        Phase::Secondary
    } else {
        // Una banda neutral explícita o ninguna coincidencia dan el mismo resultado
        Phase::Neutral
    }
}

/// Verdadero si todas las bandas de la regla contienen su feature.
/// Una regla vacía no coincide con nada.
pub fn matches_rule(features: &FeatureVector, rule: &[ThresholdBand]) -> bool {
    !rule.is_empty()
        && rule.iter().all(|band| {
            features
                .get(&band.feature)
                .map_or(false, |value| band.contains(value))
        })
}
