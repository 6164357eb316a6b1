use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use csv::ReaderBuilder;

use crate::types::{Landmark, LandmarkFrame, LandmarkId, Orientation};

const NUM_COLUMNS: usize = 7;

/// Carga una grabación de landmarks desde un CSV con el formato
/// timestamp_ms,orientation,landmark,x,y,z,visibility (una fila por landmark).
pub fn load_frames_from_csv(path: impl AsRef<Path>) -> Result<Vec<LandmarkFrame>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("No se pudo abrir el CSV {:?}", path))?;
    load_frames_from_reader(file).with_context(|| format!("CSV inválido: {:?}", path))
}

/// Igual que `load_frames_from_csv` pero desde cualquier lector
pub fn load_frames_from_reader<R: Read>(reader: R) -> Result<Vec<LandmarkFrame>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut frames: BTreeMap<u64, LandmarkFrame> = BTreeMap::new();

    for (row_idx, result) in reader.records().enumerate() {
        let row = row_idx + 1;
        let record = result.with_context(|| format!("Fila {} inválida", row))?;
        if record.len() < NUM_COLUMNS {
            bail!("La fila {} no tiene {} columnas", row, NUM_COLUMNS);
        }

        let timestamp_ms: u64 = record[0]
            .parse()
            .with_context(|| format!("timestamp_ms inválido en fila {}", row))?;
        let degrees: i32 = record[1]
            .parse()
            .with_context(|| format!("orientation inválida en fila {}", row))?;
        let id = LandmarkId::from_name(&record[2])
            .ok_or_else(|| anyhow!("Landmark desconocido '{}' en fila {}", &record[2], row))?;
        let x: f32 = record[3]
            .parse()
            .with_context(|| format!("x inválido en fila {}", row))?;
        let y: f32 = record[4]
            .parse()
            .with_context(|| format!("y inválido en fila {}", row))?;
        let z: Option<f32> = if record[5].is_empty() {
            None
        } else {
            Some(
                record[5]
                    .parse()
                    .with_context(|| format!("z inválido en fila {}", row))?,
            )
        };
        let visibility: f32 = record[6]
            .parse()
            .with_context(|| format!("visibility inválida en fila {}", row))?;

        let mut landmark = Landmark::new(id, x, y, visibility);
        if let Some(z) = z {
            landmark = landmark.with_depth(z);
        }

        let orientation = Orientation::from_degrees(degrees);
        let frame = frames
            .entry(timestamp_ms)
            .or_insert_with(|| LandmarkFrame::new(timestamp_ms, orientation, Vec::new()));
        if frame.orientation != orientation {
            bail!(
                "orientation {} en fila {} no coincide con la del frame {} ({})",
                degrees,
                row,
                timestamp_ms,
                frame.orientation.degrees()
            );
        }

        // Un landmark repetido en el mismo instante reemplaza al anterior
        if let Some(existing) = frame.landmarks.iter_mut().find(|l| l.id == id) {
            *existing = landmark;
        } else {
            frame.landmarks.push(landmark);
        }
    }

    if frames.is_empty() {
        bail!("El CSV no contiene datos");
    }

    Ok(frames.into_values().collect())
}
