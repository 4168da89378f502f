// gramian_sim/src/persistence.rs

//! JSON files written by the scenarios.
//!
//! Non-finite measures (an infinite condition number, say) are written as the strings
//! `"inf"`, `"-inf"` or `"nan"` and read back as the same values.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use gramian_core::gramian::{GramianArray, GramianBatch};
use gramian_core::search::{Extrema, SearchOutcome};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{SimError, SimResult};

/// Writes `value` as pretty-printed JSON, creating parent directories as needed.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> SimResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SimError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| SimError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(|e| SimError::io(path, e))?;
    info!("Wrote {}", path.display());
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> SimResult<T> {
    let file = File::open(path).map_err(|e| SimError::io(path, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Saves a batch as `{ "shape": [6, 6, n], "data": [...] }`.
pub fn save_batch(path: &Path, batch: &GramianBatch) -> SimResult<()> {
    save_json(path, &batch.to_array())
}

/// Loads a batch written by [`save_batch`], checking its shape.
pub fn load_batch(path: &Path) -> SimResult<GramianBatch> {
    let array: GramianArray = load_json(path)?;
    Ok(GramianBatch::from_array(&array)?)
}

/// One extremum of a search, with the parametrisation of the candidate that reached it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremumRecord<C> {
    pub index: Option<usize>,
    #[serde(with = "gramian_core::utils::serde_helpers::non_finite_option")]
    pub value: Option<f64>,
    pub parameters: Option<C>,
}

/// The `<measure>_<min|max>` map of a search outcome. All eight keys are always present.
pub fn search_records<C: Clone>(outcome: &SearchOutcome<C>) -> BTreeMap<String, ExtremumRecord<C>> {
    let mut records = BTreeMap::new();
    for (measure, extrema) in outcome.result.entries() {
        let Extrema { min, max } = *extrema;
        for (kind, extremum) in [("min", min), ("max", max)] {
            let record = ExtremumRecord {
                index: extremum.map(|e| e.index),
                value: extremum.map(|e| e.value),
                parameters: extremum.and_then(|e| outcome.candidate(&e).cloned()),
            };
            records.insert(format!("{measure}_{kind}"), record);
        }
    }
    records
}

pub fn save_search_result<C: Clone + Serialize>(path: &Path, outcome: &SearchOutcome<C>) -> SimResult<()> {
    save_json(path, &search_records(outcome))
}
