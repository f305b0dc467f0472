//! Fresh annotation ids and creation stamps.
//!
//! Glozz ids are `<author>_<creation-date>` where the date is a millisecond
//! timestamp, so minting an id means picking an unused stamp.

use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::models::{AnnoId, Document, Metadata, Span};

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Mints ids for annotations added by a tool.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    author: String,
    next: i64,
    taken: HashSet<AnnoId>,
}

impl IdGenerator {
    /// Generator whose stamps start at `stamp`.
    pub fn starting_at(author: impl Into<String>, stamp: i64) -> Self {
        Self {
            author: author.into(),
            next: stamp,
            taken: HashSet::new(),
        }
    }

    /// Generator for adding annotations to `doc`.
    ///
    /// Stamps start after both the current time and the newest creation date
    /// in the document, and never reuse an id already present.
    pub fn for_document(author: impl Into<String>, doc: &Document) -> Self {
        let newest = doc
            .units
            .iter()
            .map(|u| &u.metadata)
            .chain(doc.relations.iter().map(|r| &r.metadata))
            .chain(doc.schemas.iter().map(|s| &s.metadata))
            .filter_map(Metadata::creation_date)
            .max()
            .unwrap_or(0);
        let mut generator = Self::starting_at(author, now_millis().max(newest + 1));
        generator.reserve(doc);
        generator
    }

    /// Mark every id of `doc` as unavailable.
    pub fn reserve(&mut self, doc: &Document) {
        self.taken.extend(doc.ids().into_iter().cloned());
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Next unused id together with matching creation metadata.
    pub fn mint(&mut self) -> (AnnoId, Metadata) {
        loop {
            let stamp = self.next;
            self.next += 1;
            let id = AnnoId::from_parts(&self.author, stamp);
            if self.taken.insert(id.clone()) {
                return (id, Metadata::created(&self.author, stamp));
            }
        }
    }
}

/// Hands out one stable stamp per span for the duration of a run.
///
/// Splitting the same EDU in several stages of a document must produce the
/// same new ids in each, so stamps are keyed by span rather than drawn
/// fresh. Units and the CDUs grouping them are keyed separately: a CDU may
/// cover exactly the span of one of its units.
#[derive(Debug, Clone)]
pub struct TimestampCache {
    next: i64,
    stamps: HashMap<Span, i64>,
    groups: HashMap<Span, i64>,
}

fn draw(next: &mut i64, stamps: &mut HashMap<Span, i64>, span: Span) -> i64 {
    *stamps.entry(span).or_insert_with(|| {
        let stamp = *next;
        *next += 1;
        stamp
    })
}

impl TimestampCache {
    pub fn new() -> Self {
        Self::starting_at(now_millis())
    }

    pub fn starting_at(stamp: i64) -> Self {
        Self {
            next: stamp,
            stamps: HashMap::new(),
            groups: HashMap::new(),
        }
    }

    /// Stamp of the unit covering `span`.
    pub fn get(&mut self, span: Span) -> i64 {
        draw(&mut self.next, &mut self.stamps, span)
    }

    /// Stamp of the CDU covering `span`, never equal to a unit stamp.
    pub fn get_group(&mut self, span: Span) -> i64 {
        draw(&mut self.next, &mut self.groups, span)
    }
}

impl Default for TimestampCache {
    fn default() -> Self {
        Self::new()
    }
}
