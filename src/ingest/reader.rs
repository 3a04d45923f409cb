//! Document reader: path to parsed nested document.
//!
//! JSON and JSON-LD parse through serde_json. RDF/XML and N-Triples are
//! recognized members of the format set without an implemented reader, so
//! they surface `NotImplemented` instead of silently succeeding.

use std::path::Path;

use serde_json::Value;

use crate::error::{GraphldError, Result};

/// File extensions this reader recognizes (case-insensitive).
pub const SUPPORTED_FORMATS: &[&str] = &["json", "jsonld", "json-ld", "rdf", "xml", "nt"];

/// Extensions with an implemented parser.
const JSON_FORMATS: &[&str] = &["json", "jsonld", "json-ld"];

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// True when `path` has an extension with an implemented reader.
pub fn is_loadable(path: &Path) -> bool {
    JSON_FORMATS.contains(&extension(path).as_str())
}

/// Read and parse one source document.
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(GraphldError::NotFound(format!(
            "{} was not found",
            path.display()
        )));
    }

    let ext = extension(path);
    if JSON_FORMATS.contains(&ext.as_str()) {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    } else if SUPPORTED_FORMATS.contains(&ext.as_str()) {
        log::warn!("RDF/XML & N-Triples readers are not implemented");
        Err(GraphldError::NotImplemented(format!(
            "no reader for `{ext}` documents"
        )))
    } else {
        Err(GraphldError::UnsupportedFormat(format!(
            "expected one of {}, got `{}`",
            SUPPORTED_FORMATS.join(", "),
            if ext.is_empty() { "<none>" } else { &ext }
        )))
    }
}
