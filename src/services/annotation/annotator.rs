//! Annotator trait: shared abstraction for document annotation passes.

use crate::corpus::{FileId, Stage};
use crate::glozz::IdGenerator;
use crate::models::{AnnoId, Document, Span, NONPLAYER_SEGMENT};

use super::event::GameEvent;
use super::types::{AnnotationError, AnnotationOutput};

/// A pass that adds annotations to documents of one corpus stage.
///
/// Implementations wrap one analysis (unit re-typing, discourse linking,
/// dialogue-act prediction) and expose it through a uniform interface so the
/// `AnnotationManager` can drive them identically.
pub trait Annotator {
    /// Short machine name, used in logs.
    fn annotation_type(&self) -> &str;

    /// Human-readable name for CLI progress output.
    fn display_name(&self) -> &str;

    /// Stage of the documents this annotator reads.
    fn stage(&self) -> Stage;

    /// Author recorded on the annotations it creates.
    fn author(&self) -> &str;

    /// Where the annotated version of `id` is saved.
    fn output_id(&self, id: &FileId) -> FileId {
        id.clone()
    }

    /// Annotate a single document in place.
    fn annotate(
        &self,
        doc: &mut Document,
        ids: &mut IdGenerator,
    ) -> Result<AnnotationOutput, AnnotationError>;
}

/// A `NonplayerSegment` unit and the event its text expresses.
#[derive(Debug, Clone)]
pub struct EventUnit {
    pub id: AnnoId,
    pub span: Span,
    pub event: GameEvent,
}

/// Recognize the event of every `NonplayerSegment` unit, in text order.
pub fn game_events(doc: &Document) -> Vec<EventUnit> {
    let mut events: Vec<EventUnit> = doc
        .units
        .iter()
        .filter(|u| u.is_type(NONPLAYER_SEGMENT))
        .map(|u| EventUnit {
            id: u.id.clone(),
            span: u.span,
            event: GameEvent::parse(&doc.text_of(u.span)),
        })
        .collect();
    events.sort_by(|a, b| a.span.cmp(&b.span).then_with(|| a.id.cmp(&b.id)));
    events
}
