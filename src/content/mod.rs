//! Learn line content schema and the JSON content source.

pub mod model;

pub use model::*;

use std::path::Path;

use crate::error::ContentError;

/// Parse an ordered sequence of learn lines from a JSON array.
pub fn parse_lines(json: &str) -> Result<Vec<LearnLine>, ContentError> {
    let lines: Vec<LearnLine> = serde_json::from_str(json)?;
    tracing::debug!(count = lines.len(), "learn lines parsed");
    Ok(lines)
}

/// Read and parse learn lines from a JSON file.
pub fn load_lines<P: AsRef<Path>>(path: P) -> Result<Vec<LearnLine>, ContentError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_lines(&raw)
}
