//! Service layer: annotation passes and corpus editing.
//!
//! Services work on in-memory documents and are driven by the CLI; they
//! never print directly.

pub mod annotation;
pub mod dialogue_act;
pub mod split;

pub use annotation::{
    AnnotationError, AnnotationEvent, AnnotationManager, AnnotationOutput, Annotator,
    BatchAnnotationResult, DiscourseAnnotator, GameEvent, UnitsAnnotator,
};
pub use dialogue_act::{Classifier, DialogueActAnnotator, LinearModel, ModelError};
pub use split::{mini_diff, split_edu, SplitError, SplitOutcome};
