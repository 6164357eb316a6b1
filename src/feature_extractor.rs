use crate::profile::{ExerciseProfile, FeatureFormula};
use crate::types::{LandmarkFrame, LandmarkId};
use std::collections::BTreeMap;
use thiserror::Error;

/// Longitud mínima de un segmento para considerarlo geométricamente válido
const MIN_SEGMENT_LEN: f32 = 1e-6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("Missing required landmarks: {missing:?}")]
    MissingLandmarks { missing: Vec<LandmarkId> },

    #[error("Degenerate geometry in feature '{feature}' (zero-length segment)")]
    DegenerateGeometry { feature: String },
}

/// Valores biomecánicos de un frame, indexados por la clave del perfil
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureVector {
    pub timestamp_ms: u64,
    pub values: BTreeMap<String, f32>,
    /// Visibilidad media de los landmarks consultados
    pub confidence: f32,
}

impl FeatureVector {
    pub fn get(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }
}

/// Punto 2-D o 3-D tomado de un landmark
#[derive(Debug, Clone, Copy)]
struct Point {
    x: f32,
    y: f32,
    z: Option<f32>,
}

/// Calcula las features de un perfil a partir de un frame de landmarks.
/// Sin estado: el mismo frame y perfil producen siempre el mismo vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extrae todas las features declaradas en el perfil, en orden
    pub fn extract(
        &self,
        frame: &LandmarkFrame,
        profile: &ExerciseProfile,
    ) -> Result<FeatureVector, ExtractError> {
        let missing: Vec<LandmarkId> = profile
            .required_landmarks
            .iter()
            .copied()
            .filter(|id| match frame.get(*id) {
                Some(l) => !l.x.is_finite() || !l.y.is_finite() || !l.visibility.is_finite(),
                None => true,
            })
            .collect();

        if !missing.is_empty() {
            return Err(ExtractError::MissingLandmarks { missing });
        }

        let visibilities: Vec<f32> = profile
            .required_landmarks
            .iter()
            .filter_map(|id| frame.get(*id))
            .map(|l| l.visibility)
            .collect();

        let mut values = BTreeMap::new();

        for spec in &profile.features {
            let value = match &spec.formula {
                FeatureFormula::Angle { a, b, c } => {
                    let (pa, pb, pc) = (
                        self.point(frame, *a),
                        self.point(frame, *b),
                        self.point(frame, *c),
                    );
                    self.angle(pa, pb, pc, profile.use_depth)
                        .ok_or_else(|| degenerate(&spec.key))?
                }
                FeatureFormula::VerticalOffset { from, to } => {
                    self.centroid(frame, from).y - self.centroid(frame, to).y
                }
                FeatureFormula::HorizontalOffset { from, to } => {
                    self.centroid(frame, from).x - self.centroid(frame, to).x
                }
                FeatureFormula::Distance { a, b } => {
                    let (pa, pb) = (self.point(frame, *a), self.point(frame, *b));
                    (pa.x - pb.x).hypot(pa.y - pb.y)
                }
                FeatureFormula::Inclination { from, to } => {
                    let start = self.centroid(frame, from);
                    let end = self.centroid(frame, to);
                    self.inclination(start, end)
                        .ok_or_else(|| degenerate(&spec.key))?
                }
                FeatureFormula::Mean { of } => {
                    let operands: Vec<f32> =
                        of.iter().filter_map(|k| values.get(k).copied()).collect();
                    self.mean(&operands)
                }
                FeatureFormula::Symmetry { left, right } => {
                    let l = values.get(left).copied().unwrap_or(0.0);
                    let r = values.get(right).copied().unwrap_or(0.0);
                    (l - r).abs()
                }
            };
            values.insert(spec.key.clone(), value);
        }

        Ok(FeatureVector {
            timestamp_ms: frame.timestamp_ms,
            values,
            confidence: self.mean(&visibilities),
        })
    }

    /// Los landmarks requeridos ya fueron comprobados en `extract`
    fn point(&self, frame: &LandmarkFrame, id: LandmarkId) -> Point {
        frame
            .get(id)
            .map(|l| Point {
                x: l.x,
                y: l.y,
                z: l.z,
            })
            .unwrap_or(Point {
                x: 0.0,
                y: 0.0,
                z: None,
            })
    }

    fn centroid(&self, frame: &LandmarkFrame, group: &[LandmarkId]) -> Point {
        let points: Vec<Point> = group.iter().map(|id| self.point(frame, *id)).collect();
        let xs: Vec<f32> = points.iter().map(|p| p.x).collect();
        let ys: Vec<f32> = points.iter().map(|p| p.y).collect();
        Point {
            x: self.mean(&xs),
            y: self.mean(&ys),
            z: None,
        }
    }

    /// Ángulo en `b` formado por b→a y b→c, en grados [0, 180].
    /// Usa z solo si se pide y los tres puntos la tienen.
    fn angle(&self, a: Point, b: Point, c: Point, use_depth: bool) -> Option<f32> {
        let depth = match (use_depth, a.z, b.z, c.z) {
            (true, Some(za), Some(zb), Some(zc)) => Some((za - zb, zc - zb)),
            _ => None,
        };
        let (z1, z2) = depth.unwrap_or((0.0, 0.0));

        let v1 = [a.x - b.x, a.y - b.y, z1];
        let v2 = [c.x - b.x, c.y - b.y, z2];

        let dot = v1[0] * v2[0] + v1[1] * v2[1] + v1[2] * v2[2];
        let n1 = self.norm(&v1);
        let n2 = self.norm(&v2);

        if n1 < MIN_SEGMENT_LEN || n2 < MIN_SEGMENT_LEN {
            return None;
        }

        let cos = (dot / (n1 * n2)).clamp(-1.0, 1.0);
        Some(cos.acos().to_degrees())
    }

    /// Ángulo entre start→end y la vertical de imagen hacia arriba (0, -1)
    fn inclination(&self, start: Point, end: Point) -> Option<f32> {
        let v = [end.x - start.x, end.y - start.y, 0.0];
        let n = self.norm(&v);
        if n < MIN_SEGMENT_LEN {
            return None;
        }
        let cos = (-v[1] / n).clamp(-1.0, 1.0);
        Some(cos.acos().to_degrees())
    }

    // ========== Funciones auxiliares ==========

    fn mean(&self, data: &[f32]) -> f32 {
        if data.is_empty() {
            return 0.0;
        }
        data.iter().sum::<f32>() / data.len() as f32
    }

    fn norm(&self, v: &[f32; 3]) -> f32 {
        (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
    }
}

fn degenerate(key: &str) -> ExtractError {
    ExtractError::DegenerateGeometry {
        feature: key.to_string(),
    }
}
