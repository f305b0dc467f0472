//! Annotation manager: generic batch orchestration for any `Annotator`.

use std::path::PathBuf;

use crate::corpus::{self, Corpus, FileId};
use crate::glozz::IdGenerator;

use super::annotator::Annotator;
use super::types::{AnnotationEvent, BatchAnnotationResult};

/// Runs an `Annotator` over a corpus and saves the results under an output
/// directory.
pub struct AnnotationManager {
    output_dir: PathBuf,
}

impl AnnotationManager {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Documents of `corpus` the annotator reads.
    pub fn count_needing(&self, annotator: &dyn Annotator, corpus: &Corpus) -> usize {
        corpus
            .keys()
            .filter(|id| id.stage == annotator.stage())
            .count()
    }

    /// Annotate every matching document, emitting events for progress
    /// tracking.
    ///
    /// The caller decides how to present progress; the manager stays free of
    /// UI concerns. An annotation error aborts the batch. A document that
    /// cannot be saved is reported as failed and the batch goes on.
    pub fn run_batch(
        &self,
        annotator: &dyn Annotator,
        corpus: Corpus,
        on_event: &mut dyn FnMut(AnnotationEvent),
    ) -> anyhow::Result<BatchAnnotationResult> {
        let total = self.count_needing(annotator, &corpus);
        on_event(AnnotationEvent::Started {
            total_documents: total,
        });

        let mut result = BatchAnnotationResult::default();
        for (id, mut doc) in corpus {
            if id.stage != annotator.stage() {
                continue;
            }
            let document_id = id.to_string();
            on_event(AnnotationEvent::DocumentStarted {
                document_id: document_id.clone(),
            });

            let mut ids = IdGenerator::for_document(annotator.author(), &doc);
            let output = match annotator.annotate(&mut doc, &mut ids) {
                Ok(output) => output,
                Err(e) => {
                    on_event(AnnotationEvent::DocumentFailed {
                        document_id: document_id.clone(),
                        error: e.to_string(),
                    });
                    return Err(anyhow::Error::new(e).context(format!(
                        "{} aborted on {}",
                        annotator.display_name(),
                        document_id
                    )));
                }
            };

            match self.save(annotator, &id, &doc) {
                Ok(()) => {
                    on_event(AnnotationEvent::DocumentCompleted {
                        document_id,
                        changes: output.changes(),
                    });
                    result.succeeded += 1;
                }
                Err(e) => {
                    tracing::warn!("{}: {}", document_id, e);
                    on_event(AnnotationEvent::DocumentFailed {
                        document_id,
                        error: e.to_string(),
                    });
                    result.failed += 1;
                }
            }
        }

        on_event(AnnotationEvent::Complete {
            succeeded: result.succeeded,
            failed: result.failed,
        });
        Ok(result)
    }

    fn save(
        &self,
        annotator: &dyn Annotator,
        id: &FileId,
        doc: &crate::models::Document,
    ) -> Result<(), corpus::CorpusError> {
        let target = annotator.output_id(id);
        for issue in doc.validate() {
            tracing::warn!("{}: {}", target, issue);
        }
        corpus::save_document(&self.output_dir, &target, doc)
    }
}
