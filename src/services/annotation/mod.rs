//! Annotation pipeline: trait-based passes over corpus documents.
//!
//! Game-event lines are recognized once by [`GameEvent::parse`]; the units
//! and discourse annotators then act on the recognized events. The
//! `AnnotationManager` provides a single batch loop that works with any
//! annotator.

mod annotator;
mod discourse;
mod event;
mod manager;
mod types;
mod units;

pub use annotator::{game_events, Annotator, EventUnit};
pub use discourse::{
    DiscourseAnnotator, DiscourseBuilder, DiscourseOutput, CONTINUATION, QUESTION_ANSWER_PAIR,
    RESULT, SEQUENCE,
};
pub use event::{GameEvent, Resource, ResourceMention};
pub use manager::AnnotationManager;
pub use types::{AnnotationError, AnnotationEvent, AnnotationOutput, BatchAnnotationResult};
pub use units::{UnitAnnotation, UnitsAnnotator};
