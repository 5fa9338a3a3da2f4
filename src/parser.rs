//! Loaders for ontology (OBO) and annotation (GAF) files

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::{EnrichError, EnrichResult};

/// Module to parse OBO 1.2 ontology files
pub(crate) mod obo;

/// Module to parse GAF annotation files
pub(crate) mod gaf;

/// Opens a file for buffered reading
fn open(path: &Path) -> EnrichResult<BufReader<File>> {
    let filename = path.display().to_string();
    let file = File::open(path).map_err(|_| EnrichError::CannotOpenFile(filename))?;
    Ok(BufReader::new(file))
}

/// Maps a failed read of line `number` (0 based) to an [`EnrichError::InvalidInput`]
fn line_error(source: &str, number: usize) -> EnrichError {
    EnrichError::InvalidInput(format!("invalid data in {source} line {}", number + 1))
}
