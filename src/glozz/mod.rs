//! Glozz stand-off annotation format.
//!
//! A document is a pair of files: `.ac` holds the raw text and `.aa` holds
//! the XML annotation layer pointing into it by character offset.

mod ids;
mod reader;
mod writer;

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::models::Document;

pub use ids::{IdGenerator, TimestampCache};
pub use reader::read_annotations;
pub use writer::write_annotations;

/// Errors reading or writing Glozz files.
#[derive(Debug, Error)]
pub enum GlozzError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Malformed <{element}>: {reason}")]
    Malformed { element: String, reason: String },

    #[error("<{element}> is missing attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },
}

impl GlozzError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Load a document from its `.aa` annotation file and `.ac` text file.
pub fn load_document(aa_path: &Path, ac_path: &Path) -> Result<Document, GlozzError> {
    let text = fs::read_to_string(ac_path).map_err(|e| GlozzError::io(ac_path, e))?;
    let xml = fs::read_to_string(aa_path).map_err(|e| GlozzError::io(aa_path, e))?;
    read_annotations(&xml, text)
}

/// Write the annotation layer of `doc` to `aa_path`, creating directories.
pub fn store_annotations(aa_path: &Path, doc: &Document) -> Result<(), GlozzError> {
    if let Some(parent) = aa_path.parent() {
        fs::create_dir_all(parent).map_err(|e| GlozzError::io(parent, e))?;
    }
    fs::write(aa_path, write_annotations(doc)).map_err(|e| GlozzError::io(aa_path, e))
}

/// Write the raw text of `doc` to `ac_path`, creating directories.
pub fn store_text(ac_path: &Path, doc: &Document) -> Result<(), GlozzError> {
    if let Some(parent) = ac_path.parent() {
        fs::create_dir_all(parent).map_err(|e| GlozzError::io(parent, e))?;
    }
    fs::write(ac_path, &doc.text).map_err(|e| GlozzError::io(ac_path, e))
}
