//! On-disk AOI definitions.

use crate::aoi::index::AoiIndex;
use crate::aoi::types::AoiDefinition;
use crate::error::StateError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid AOI in file: {0}")]
    Invalid(#[from] StateError),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AoiFile {
    aois: Vec<AoiDefinition>,
}

/// Load definitions from `path`. A missing file means no AOIs.
pub fn load_definitions(path: &Path) -> Result<Vec<AoiDefinition>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    let file: AoiFile = serde_json::from_str(&content)?;
    Ok(file.aois)
}

/// Load definitions from `path` straight into a fresh index.
pub fn load_index(path: &Path) -> Result<AoiIndex, StoreError> {
    let definitions = load_definitions(path)?;
    Ok(AoiIndex::from_definitions(&definitions)?)
}

/// Write the index's definitions to `path`, creating parent directories.
pub fn save_index(index: &AoiIndex, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = AoiFile {
        aois: index.definitions(),
    };
    std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
    Ok(())
}
