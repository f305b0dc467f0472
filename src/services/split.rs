//! Splitting an EDU into several EDUs.
//!
//! The same split is applied to every stage of a document. New ids come from
//! a run-wide [`TimestampCache`], so an EDU created from a given sub-span has
//! the same id in the units and discourse layers.

use std::collections::HashSet;
use std::fmt::Write as _;

use thiserror::Error;

use crate::corpus::{FileId, Stage};
use crate::glozz::TimestampCache;
use crate::models::{is_edu, AnnoId, Document, Metadata, Schema, Span, Unit};

/// Tag prepended to copied types and features in the units stage, marking
/// them for manual review.
pub const REVIEW_TAG: &str = "FIXME:";

/// Errors from [`split_edu`]. The document is left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("must have at least one span")]
    NoSpans,

    #[error("span {0} is empty")]
    EmptySpan(Span),

    #[error("spans {0} and {1} overlap")]
    OverlappingSpans(Span, Span),

    #[error("no EDU spans exactly {0}")]
    NoMatch(Span),

    #[error("no EDU spans exactly {0} (already split by hand?)")]
    NoPresplitMatch(Span),
}

/// What [`split_edu`] did to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOutcome {
    /// The enclosing EDU was replaced.
    Split {
        removed: AnnoId,
        created: Vec<AnnoId>,
        /// CDU standing in for the removed EDU, if anything referenced it.
        cdu: Option<AnnoId>,
    },
    /// The EDUs already existed; they were re-stamped as `(old, new)` ids.
    Restamped(Vec<(AnnoId, AnnoId)>),
}

/// Smallest span covering all of `spans`.
pub fn enclosing_span(spans: &[Span]) -> Result<Span, SplitError> {
    Span::enclosing(spans.iter()).ok_or(SplitError::NoSpans)
}

/// Sort the requested spans, rejecting empty or overlapping ones.
fn check_spans(spans: &[Span]) -> Result<Vec<Span>, SplitError> {
    let mut sorted = spans.to_vec();
    sorted.sort();
    if let Some(empty) = sorted.iter().find(|s| s.is_empty()) {
        return Err(SplitError::EmptySpan(*empty));
    }
    if let Some(pair) = sorted.windows(2).find(|w| w[0].overlaps(&w[1])) {
        return Err(SplitError::OverlappingSpans(pair[0], pair[1]));
    }
    Ok(sorted)
}

fn find_edu(doc: &Document, span: Span) -> Option<&Unit> {
    doc.units.iter().find(|u| u.span == span && is_edu(u))
}

fn stamped(metadata: &Metadata, author: &str, stamp: i64) -> Metadata {
    let mut metadata = metadata.clone();
    metadata.set_author(author);
    metadata.set_creation_date(stamp);
    metadata
}

/// Split the EDU spanning exactly the union of `spans` into one EDU per span.
///
/// References to the old EDU are redirected to a CDU of the new ones. In the
/// discourse stage, when no EDU covers the union, the split is assumed to
/// have been made by hand and the matching EDUs are re-stamped instead.
pub fn split_edu(
    doc: &mut Document,
    stage: Stage,
    spans: &[Span],
    cache: &mut TimestampCache,
    author: &str,
) -> Result<SplitOutcome, SplitError> {
    let sorted = check_spans(spans)?;
    let big = enclosing_span(&sorted)?;

    match find_edu(doc, big).cloned() {
        Some(edu) => Ok(actually_split(doc, stage, &sorted, big, edu, cache, author)),
        None if stage == Stage::Discourse => restamp_presplit(doc, &sorted, cache, author),
        None => Err(SplitError::NoMatch(big)),
    }
}

fn actually_split(
    doc: &mut Document,
    stage: Stage,
    spans: &[Span],
    big: Span,
    edu: Unit,
    cache: &mut TimestampCache,
    author: &str,
) -> SplitOutcome {
    let mut created = Vec::with_capacity(spans.len());
    for &span in spans {
        let stamp = cache.get(span);
        let mut part = edu.clone();
        part.id = AnnoId::from_parts(author, stamp);
        part.span = span;
        part.metadata = stamped(&edu.metadata, author, stamp);
        if stage == Stage::Units {
            part.unit_type = format!("{}{}", REVIEW_TAG, part.unit_type);
            for value in part.features.values_mut() {
                value.insert_str(0, REVIEW_TAG);
            }
        }
        created.push(part.id.clone());
        doc.units.push(part);
    }

    let cdu_stamp = cache.get_group(big);
    let cdu_id = AnnoId::from_parts(author, cdu_stamp);
    let referenced = doc.redirect_unit_to_schema(&edu.id, &cdu_id);
    doc.remove_unit(&edu.id);

    let cdu = if referenced {
        Schema::cdu(
            cdu_id,
            created.iter().cloned(),
            Metadata::created(author, cdu_stamp),
        )
        .map(|schema| {
            let id = schema.id.clone();
            doc.schemas.push(schema);
            id
        })
    } else {
        None
    };

    tracing::debug!("Split {} into {} EDUs", edu.id, created.len());
    SplitOutcome::Split {
        removed: edu.id,
        created,
        cdu,
    }
}

fn restamp_presplit(
    doc: &mut Document,
    spans: &[Span],
    cache: &mut TimestampCache,
    author: &str,
) -> Result<SplitOutcome, SplitError> {
    let mut targets = Vec::with_capacity(spans.len());
    for &span in spans {
        let edu = find_edu(doc, span).ok_or(SplitError::NoPresplitMatch(span))?;
        targets.push((edu.id.clone(), span));
    }

    let mut renamed = Vec::with_capacity(targets.len());
    for (old, span) in targets {
        let stamp = cache.get(span);
        let new = AnnoId::from_parts(author, stamp);
        if let Some(unit) = doc.unit_mut(&old) {
            unit.metadata = stamped(&unit.metadata, author, stamp);
        }
        doc.rename_unit(&old, new.clone());
        renamed.push((old, new));
    }
    Ok(SplitOutcome::Restamped(renamed))
}

fn describe(doc: &Document, unit: &Unit) -> String {
    format!(
        "{} {} {} {:?}",
        unit.id,
        unit.unit_type,
        unit.span,
        doc.text_of(unit.span)
    )
}

/// Before/after listing of the units within `span`.
///
/// Units only in `old` are marked `-`, units only in `new` are marked `+`.
pub fn mini_diff(id: &FileId, old: &Document, new: &Document, span: Span) -> String {
    let old_units = old.units_within(span);
    let new_units = new.units_within(span);
    let old_ids: HashSet<&AnnoId> = old_units.iter().map(|u| &u.id).collect();
    let new_ids: HashSet<&AnnoId> = new_units.iter().map(|u| &u.id).collect();

    let mut out = String::new();
    let _ = writeln!(out, "======= SPLIT EDU {} ========", id);
    let _ = writeln!(out, "...");
    for unit in &old_units {
        let mark = if new_ids.contains(&unit.id) { ' ' } else { '-' };
        let _ = writeln!(out, "{} {}", mark, describe(old, unit));
    }
    for unit in new_units.iter().filter(|u| !old_ids.contains(&u.id)) {
        let _ = writeln!(out, "+ {}", describe(new, unit));
    }
    let _ = writeln!(out, "...");
    out
}
