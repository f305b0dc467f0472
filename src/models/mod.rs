//! Data models for Glozz documents and their annotations.

mod annotation;
mod document;
mod span;

pub use annotation::{
    AnnoId, Features, Metadata, Relation, Schema, Unit, CDU, NONPLAYER_SEGMENT, RESOURCE,
};
pub use document::{is_edu, Document, Header, IntegrityIssue, EDU_TYPES};
pub use span::Span;
