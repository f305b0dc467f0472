//! Units, relations and schemas as stored in a Glozz annotation layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::span::Span;

/// Unit type of server-generated game messages before annotation.
pub const NONPLAYER_SEGMENT: &str = "NonplayerSegment";
/// Unit type of resource mentions attached to game events.
pub const RESOURCE: &str = "Resource";
/// Schema type used for complex discourse units.
pub const CDU: &str = "Complex_discourse_unit";

/// Glozz local identifier, conventionally `<author>_<creation-date>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnoId(String);

impl AnnoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the id Glozz derives from an author and a creation stamp.
    pub fn from_parts(author: &str, stamp: i64) -> Self {
        Self(format!("{}_{}", author, stamp))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnnoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Insertion-ordered string map.
///
/// Glozz files list features and metadata in a meaningful order, so a plain
/// hash map would reorder them on write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features(Vec<(String, String)>);

impl Features {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace the value of `key` in place, or append it.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.0.iter_mut().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Features {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut features = Features::new();
        for (k, v) in iter {
            features.insert(k, v);
        }
        features
    }
}

/// Glozz annotation metadata (`author`, `creation-date`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata(Features);

impl Metadata {
    pub const AUTHOR: &'static str = "author";
    pub const CREATION_DATE: &'static str = "creation-date";
    pub const LAST_MODIFIER: &'static str = "lastModifier";
    pub const LAST_MODIFICATION_DATE: &'static str = "lastModificationDate";

    /// Metadata for an annotation created by a tool rather than in Glozz.
    pub fn created(author: &str, stamp: i64) -> Self {
        let mut entries = Features::new();
        entries.insert(Self::AUTHOR, author);
        entries.insert(Self::CREATION_DATE, stamp.to_string());
        entries.insert(Self::LAST_MODIFIER, "n/a");
        entries.insert(Self::LAST_MODIFICATION_DATE, "0");
        Self(entries)
    }

    pub fn author(&self) -> Option<&str> {
        self.0.get(Self::AUTHOR)
    }

    pub fn creation_date(&self) -> Option<i64> {
        self.0.get(Self::CREATION_DATE)?.trim().parse().ok()
    }

    pub fn set_author(&mut self, author: &str) {
        self.0.insert(Self::AUTHOR, author);
    }

    pub fn set_creation_date(&mut self, stamp: i64) {
        self.0.insert(Self::CREATION_DATE, stamp.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A typed span of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: AnnoId,
    pub span: Span,
    pub unit_type: String,
    pub features: Features,
    pub metadata: Metadata,
}

impl Unit {
    pub fn new(id: AnnoId, span: Span, unit_type: impl Into<String>) -> Self {
        Self {
            id,
            span,
            unit_type: unit_type.into(),
            features: Features::new(),
            metadata: Metadata::default(),
        }
    }

    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_type(&self, unit_type: &str) -> bool {
        self.unit_type == unit_type
    }
}

/// A directed, labelled link between two units or schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: AnnoId,
    pub source: AnnoId,
    pub target: AnnoId,
    pub rel_type: String,
    pub features: Features,
    pub metadata: Metadata,
}

impl Relation {
    pub fn new(id: AnnoId, source: AnnoId, target: AnnoId, rel_type: impl Into<String>) -> Self {
        Self {
            id,
            source,
            target,
            rel_type: rel_type.into(),
            features: Features::new(),
            metadata: Metadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A grouping of units, relations and other schemas.
///
/// Members are kept in insertion order without duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub id: AnnoId,
    pub units: Vec<AnnoId>,
    pub relations: Vec<AnnoId>,
    pub schemas: Vec<AnnoId>,
    pub schema_type: String,
    pub features: Features,
    pub metadata: Metadata,
}

impl Schema {
    /// A schema with no members; used when reading files, where Glozz
    /// itself allows empty schemas.
    pub fn empty(id: AnnoId, schema_type: impl Into<String>) -> Self {
        Self {
            id,
            units: Vec::new(),
            relations: Vec::new(),
            schemas: Vec::new(),
            schema_type: schema_type.into(),
            features: Features::new(),
            metadata: Metadata::default(),
        }
    }

    /// Build a complex discourse unit over `units`.
    ///
    /// Returns `None` when `units` is empty.
    pub fn cdu<I>(id: AnnoId, units: I, metadata: Metadata) -> Option<Self>
    where
        I: IntoIterator<Item = AnnoId>,
    {
        let mut schema = Self::empty(id, CDU).with_metadata(metadata);
        for unit in units {
            schema.add_unit(unit);
        }
        if schema.is_empty() {
            None
        } else {
            Some(schema)
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn add_unit(&mut self, id: AnnoId) {
        if !self.units.contains(&id) {
            self.units.push(id);
        }
    }

    pub fn add_relation(&mut self, id: AnnoId) {
        if !self.relations.contains(&id) {
            self.relations.push(id);
        }
    }

    pub fn add_schema(&mut self, id: AnnoId) {
        if !self.schemas.contains(&id) {
            self.schemas.push(id);
        }
    }

    pub fn is_cdu(&self) -> bool {
        self.schema_type == CDU
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty() && self.relations.is_empty() && self.schemas.is_empty()
    }

    /// Replace a direct unit member with a schema member.
    ///
    /// Returns false if `old` was not a unit member.
    pub fn replace_unit_with_schema(&mut self, old: &AnnoId, schema: AnnoId) -> bool {
        let before = self.units.len();
        self.units.retain(|u| u != old);
        if self.units.len() == before {
            return false;
        }
        self.add_schema(schema);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_keep_insertion_order() {
        let mut features = Features::new();
        features.insert("Surface_act", "Assertion");
        features.insert("Addressee", "All");
        features.insert("Surface_act", "Question");

        let pairs: Vec<(&str, &str)> = features.iter().collect();
        assert_eq!(
            pairs,
            vec![("Surface_act", "Question"), ("Addressee", "All")]
        );
    }

    #[test]
    fn test_cdu_requires_members() {
        let meta = Metadata::created("stac", 1);
        assert!(Schema::cdu(AnnoId::from("stac_1"), Vec::new(), meta.clone()).is_none());

        let cdu = Schema::cdu(
            AnnoId::from("stac_1"),
            vec![AnnoId::from("a"), AnnoId::from("b"), AnnoId::from("a")],
            meta,
        )
        .unwrap();
        assert_eq!(cdu.units, vec![AnnoId::from("a"), AnnoId::from("b")]);
        assert!(cdu.is_cdu());
    }

    #[test]
    fn test_metadata_accessors() {
        let meta = Metadata::created("stacutil", 1400000000123);
        assert_eq!(meta.author(), Some("stacutil"));
        assert_eq!(meta.creation_date(), Some(1400000000123));
        assert_eq!(meta.get(Metadata::LAST_MODIFIER), Some("n/a"));
    }

    #[test]
    fn test_replace_unit_with_schema() {
        let mut schema = Schema::empty(AnnoId::from("s"), CDU);
        schema.add_unit(AnnoId::from("u1"));
        schema.add_unit(AnnoId::from("u2"));

        assert!(schema.replace_unit_with_schema(&AnnoId::from("u1"), AnnoId::from("cdu")));
        assert!(!schema.replace_unit_with_schema(&AnnoId::from("zz"), AnnoId::from("cdu")));
        assert_eq!(schema.units, vec![AnnoId::from("u2")]);
        assert_eq!(schema.schemas, vec![AnnoId::from("cdu")]);
    }
}
