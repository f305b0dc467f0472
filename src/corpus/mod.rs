//! STAC corpus directory layout.
//!
//! ```text
//! <root>/<doc>/unannotated/<doc>_<subdoc>.{ac,aa}
//! <root>/<doc>/units/<annotator>/<doc>_<subdoc>.aa
//! <root>/<doc>/discourse/<annotator>/<doc>_<subdoc>.aa
//! ```

mod file_id;
mod filter;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::glozz::{self, GlozzError};
use crate::models::Document;

pub use file_id::{FileId, Stage};
pub use filter::CorpusFilter;

/// Documents keyed by file id, in corpus order.
pub type Corpus = BTreeMap<FileId, Document>;

/// Errors locating or loading corpus files.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Corpus directory not found: {0}")]
    NotFound(PathBuf),

    #[error("Cannot list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No text file {text} for {id}")]
    MissingText { id: FileId, text: PathBuf },

    #[error("Failed to load {id}: {source}")]
    Glozz {
        id: FileId,
        #[source]
        source: GlozzError,
    },
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, CorpusError> {
    let entries = fs::read_dir(dir).map_err(|source| CorpusError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

/// Collect the ids of `.aa` files in one stage directory.
fn scan_stage_dir(
    dir: &Path,
    doc: &str,
    stage: Stage,
    annotator: Option<&str>,
    ids: &mut Vec<FileId>,
) -> Result<(), CorpusError> {
    for path in sorted_entries(dir)? {
        if path.extension().and_then(|e| e.to_str()) != Some("aa") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match FileId::subdoc_from_stem(doc, stem) {
            Some(subdoc) => ids.push(FileId::new(
                doc,
                subdoc,
                stage,
                annotator.map(String::from),
            )),
            None => tracing::debug!("Skipping {} (not named after {})", path.display(), doc),
        }
    }
    Ok(())
}

/// List the annotation files under `root` accepted by `filter`.
pub fn list_corpus(root: &Path, filter: &CorpusFilter) -> Result<Vec<FileId>, CorpusError> {
    if !root.is_dir() {
        return Err(CorpusError::NotFound(root.to_path_buf()));
    }

    let mut ids = Vec::new();
    for doc_dir in sorted_entries(root)? {
        if !doc_dir.is_dir() {
            continue;
        }
        let Some(doc) = file_name(&doc_dir) else {
            continue;
        };
        if !filter.accepts_doc(doc) {
            continue;
        }
        for stage in Stage::ALL {
            if !filter.accepts_stage(stage) {
                continue;
            }
            let stage_dir = doc_dir.join(stage.as_str());
            if !stage_dir.is_dir() {
                continue;
            }
            if stage.has_annotator() {
                for annotator_dir in sorted_entries(&stage_dir)? {
                    if let (true, Some(annotator)) = (annotator_dir.is_dir(), file_name(&annotator_dir)) {
                        scan_stage_dir(&annotator_dir, doc, stage, Some(annotator), &mut ids)?;
                    }
                }
            } else {
                scan_stage_dir(&stage_dir, doc, stage, None, &mut ids)?;
            }
        }
    }

    ids.retain(|id| filter.accepts(id));
    ids.sort();
    Ok(ids)
}

/// Load one document of the corpus rooted at `root`.
pub fn load(root: &Path, id: &FileId) -> Result<Document, CorpusError> {
    let text = id.text_path(root);
    if !text.is_file() {
        return Err(CorpusError::MissingText {
            id: id.clone(),
            text,
        });
    }
    glozz::load_document(&id.annotation_path(root), &text).map_err(|source| CorpusError::Glozz {
        id: id.clone(),
        source,
    })
}

/// Read every document under `root` accepted by `filter`.
pub fn read_corpus(root: &Path, filter: &CorpusFilter) -> Result<Corpus, CorpusError> {
    let mut corpus = Corpus::new();
    for id in list_corpus(root, filter)? {
        let doc = load(root, &id)?;
        tracing::debug!("Read {} ({} units)", id, doc.units.len());
        corpus.insert(id, doc);
    }
    tracing::info!("Read {} documents from {}", corpus.len(), root.display());
    Ok(corpus)
}

/// Write `doc` under `output_root` at the path `id` maps to.
///
/// The raw text is written alongside in the `unannotated` directory so the
/// output is itself a readable corpus.
pub fn save_document(output_root: &Path, id: &FileId, doc: &Document) -> Result<(), CorpusError> {
    let wrap = |source| CorpusError::Glozz {
        id: id.clone(),
        source,
    };
    glozz::store_annotations(&id.annotation_path(output_root), doc).map_err(wrap)?;
    let text_path = id.text_path(output_root);
    if !text_path.exists() {
        glozz::store_text(&text_path, doc).map_err(wrap)?;
    }
    Ok(())
}
