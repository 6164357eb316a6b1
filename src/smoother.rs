use crate::types::DEFAULT_SMOOTHING_WINDOW;
use std::collections::{HashMap, VecDeque};

/// Media móvil por feature: una ventana circular por clave
pub struct TemporalSmoother {
    capacity: usize,
    windows: HashMap<String, VecDeque<f32>>,
}

impl TemporalSmoother {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            windows: HashMap::new(),
        }
    }

    /// Añade el valor crudo a la ventana de `key` y retorna la media
    pub fn smooth(&mut self, key: &str, raw: f32) -> f32 {
        let capacity = self.capacity;
        let window = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| VecDeque::with_capacity(capacity));

        window.push_back(raw);
        // Descartar la muestra más antigua al superar la capacidad
        while window.len() > capacity {
            window.pop_front();
        }

        window.iter().sum::<f32>() / window.len() as f32
    }

    /// Limpia el historial de una clave o de todas (`None`)
    pub fn reset(&mut self, key: Option<&str>) {
        match key {
            Some(k) => {
                self.windows.remove(k);
            }
            None => self.windows.clear(),
        }
    }

    /// Número de muestras acumuladas para una clave
    pub fn len(&self, key: &str) -> usize {
        self.windows.get(key).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.windows.values().all(VecDeque::is_empty)
    }
}

impl Default for TemporalSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_WINDOW)
    }
}
