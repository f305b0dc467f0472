//! Types shared across annotators.

use thiserror::Error;

use crate::models::AnnoId;

/// Events emitted during a batch run.
/// Used by the CLI to drive progress bars and status messages.
#[derive(Debug, Clone)]
pub enum AnnotationEvent {
    Started {
        total_documents: usize,
    },
    DocumentStarted {
        document_id: String,
    },
    DocumentCompleted {
        document_id: String,
        changes: usize,
    },
    DocumentFailed {
        document_id: String,
        error: String,
    },
    Complete {
        succeeded: usize,
        failed: usize,
    },
}

/// Result of annotating a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationOutput {
    /// The document changed; the count is annotations added or rewritten.
    Changed(usize),
    /// Nothing to annotate; the document is written back unchanged.
    NoResult,
}

impl AnnotationOutput {
    pub fn changes(&self) -> usize {
        match self {
            Self::Changed(n) => *n,
            Self::NoResult => 0,
        }
    }
}

/// Result of a batch annotation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchAnnotationResult {
    pub succeeded: usize,
    pub failed: usize,
}

/// Errors from annotators. Every one aborts the run: they mean the event
/// vocabulary does not fit the corpus.
#[derive(Debug, Error)]
pub enum AnnotationError {
    /// An opening event arrived while the same category was still pending.
    #[error("{category} sequence opened at {unit} while {pending} is still pending")]
    UnflushedBuffer {
        category: &'static str,
        pending: AnnoId,
        unit: AnnoId,
    },
}
