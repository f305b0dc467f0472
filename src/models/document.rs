//! In-memory Glozz document: raw text plus its stand-off annotations.

use std::collections::HashSet;
use std::fmt;

use super::annotation::{AnnoId, Relation, Schema, Unit, RESOURCE};
use super::span::Span;

/// Unit types that count as elementary discourse units.
pub const EDU_TYPES: &[&str] = &[
    "Segment",
    "Offer",
    "Counteroffer",
    "Accept",
    "Refusal",
    "Reject",
    "Other",
    "Strategic_comment",
];

/// Whether the unit is an EDU (a segment or a dialogue act).
pub fn is_edu(unit: &Unit) -> bool {
    EDU_TYPES.contains(&unit.unit_type.as_str())
}

/// A broken document invariant found by [`Document::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// Relation endpoint that names no unit or schema.
    DanglingRelationEnd { relation: AnnoId, missing: AnnoId },
    /// Schema member that names no annotation.
    DanglingSchemaMember { schema: AnnoId, missing: AnnoId },
    /// Complex discourse unit without members.
    EmptyCdu { schema: AnnoId },
    /// Unit whose span runs past the end of the text.
    SpanOutOfBounds { unit: AnnoId, span: Span },
    /// Resource mention not enclosed by any event unit.
    OrphanResource { unit: AnnoId },
    /// Two annotations sharing an id.
    DuplicateId { id: AnnoId },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingRelationEnd { relation, missing } => {
                write!(f, "relation {} points at missing {}", relation, missing)
            }
            Self::DanglingSchemaMember { schema, missing } => {
                write!(f, "schema {} contains missing {}", schema, missing)
            }
            Self::EmptyCdu { schema } => write!(f, "CDU {} has no members", schema),
            Self::SpanOutOfBounds { unit, span } => {
                write!(f, "unit {} span {} is past the end of the text", unit, span)
            }
            Self::OrphanResource { unit } => {
                write!(f, "resource {} lies outside every event unit", unit)
            }
            Self::DuplicateId { id } => write!(f, "id {} is used more than once", id),
        }
    }
}

/// Attributes of the optional document-level `<metadata/>` element.
pub type Header = Vec<(String, String)>;

/// A document: text buffer and the annotations over it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub header: Option<Header>,
    pub units: Vec<Unit>,
    pub relations: Vec<Relation>,
    pub schemas: Vec<Schema>,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Number of characters in the text.
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Text covered by `span`, clipped to the end of the buffer.
    pub fn text_of(&self, span: Span) -> String {
        self.text
            .chars()
            .skip(span.start)
            .take(span.len())
            .collect()
    }

    pub fn unit(&self, id: &AnnoId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == *id)
    }

    pub fn unit_mut(&mut self, id: &AnnoId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == *id)
    }

    pub fn schema(&self, id: &AnnoId) -> Option<&Schema> {
        self.schemas.iter().find(|s| s.id == *id)
    }

    /// Every id in use by a unit, relation or schema.
    pub fn ids(&self) -> HashSet<&AnnoId> {
        self.units
            .iter()
            .map(|u| &u.id)
            .chain(self.relations.iter().map(|r| &r.id))
            .chain(self.schemas.iter().map(|s| &s.id))
            .collect()
    }

    /// Units whose span lies within `span`, in text order.
    pub fn units_within(&self, span: Span) -> Vec<&Unit> {
        let mut units: Vec<&Unit> = self
            .units
            .iter()
            .filter(|u| span.encloses(&u.span))
            .collect();
        units.sort_by_key(|u| (u.span, u.unit_type.clone()));
        units
    }

    /// Remove a unit by id.
    ///
    /// References to it are left alone; callers redirect them first.
    pub fn remove_unit(&mut self, id: &AnnoId) -> Option<Unit> {
        let pos = self.units.iter().position(|u| u.id == *id)?;
        Some(self.units.remove(pos))
    }

    /// Point every relation endpoint and schema member naming the unit `old`
    /// at the schema `replacement` instead.
    ///
    /// Returns whether anything referenced `old`.
    pub fn redirect_unit_to_schema(&mut self, old: &AnnoId, replacement: &AnnoId) -> bool {
        let mut referenced = false;
        for rel in &mut self.relations {
            if rel.source == *old {
                rel.source = replacement.clone();
                referenced = true;
            }
            if rel.target == *old {
                rel.target = replacement.clone();
                referenced = true;
            }
        }
        for schema in &mut self.schemas {
            if schema.replace_unit_with_schema(old, replacement.clone()) {
                referenced = true;
            }
        }
        referenced
    }

    /// Rename a unit, rewriting every reference to it.
    pub fn rename_unit(&mut self, old: &AnnoId, new: AnnoId) {
        if let Some(unit) = self.unit_mut(old) {
            unit.id = new.clone();
        }
        for rel in &mut self.relations {
            if rel.source == *old {
                rel.source = new.clone();
            }
            if rel.target == *old {
                rel.target = new.clone();
            }
        }
        for schema in &mut self.schemas {
            for member in &mut schema.units {
                if member == old {
                    *member = new.clone();
                }
            }
        }
    }

    /// Check referential integrity and span invariants.
    pub fn validate(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();

        let mut seen = HashSet::new();
        for id in self
            .units
            .iter()
            .map(|u| &u.id)
            .chain(self.relations.iter().map(|r| &r.id))
            .chain(self.schemas.iter().map(|s| &s.id))
        {
            if !seen.insert(id) {
                issues.push(IntegrityIssue::DuplicateId { id: id.clone() });
            }
        }

        let unit_ids: HashSet<&AnnoId> = self.units.iter().map(|u| &u.id).collect();
        let rel_ids: HashSet<&AnnoId> = self.relations.iter().map(|r| &r.id).collect();
        let schema_ids: HashSet<&AnnoId> = self.schemas.iter().map(|s| &s.id).collect();

        for rel in &self.relations {
            for end in [&rel.source, &rel.target] {
                if !unit_ids.contains(end) && !schema_ids.contains(end) {
                    issues.push(IntegrityIssue::DanglingRelationEnd {
                        relation: rel.id.clone(),
                        missing: end.clone(),
                    });
                }
            }
        }

        for schema in &self.schemas {
            if schema.is_cdu() && schema.is_empty() {
                issues.push(IntegrityIssue::EmptyCdu {
                    schema: schema.id.clone(),
                });
            }
            let dangling = schema
                .units
                .iter()
                .filter(|m| !unit_ids.contains(m))
                .chain(schema.relations.iter().filter(|m| !rel_ids.contains(m)))
                .chain(schema.schemas.iter().filter(|m| !schema_ids.contains(m)));
            for missing in dangling {
                issues.push(IntegrityIssue::DanglingSchemaMember {
                    schema: schema.id.clone(),
                    missing: missing.clone(),
                });
            }
        }

        let text_len = self.text_len();
        for unit in &self.units {
            if unit.span.end > text_len {
                issues.push(IntegrityIssue::SpanOutOfBounds {
                    unit: unit.id.clone(),
                    span: unit.span,
                });
            }
            if unit.is_type(RESOURCE)
                && !self
                    .units
                    .iter()
                    .any(|p| !p.is_type(RESOURCE) && p.span.encloses(&unit.span))
            {
                issues.push(IntegrityIssue::OrphanResource {
                    unit: unit.id.clone(),
                });
            }
        }

        issues
    }
}
