//! Glozz `.aa` reader.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::models::{AnnoId, Document, Features, Metadata, Relation, Schema, Span, Unit};

use super::GlozzError;

/// Minimal element tree; Glozz files are small enough to hold whole.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, GlozzError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| GlozzError::Xml(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| GlozzError::Xml(e.to_string()))?
                .into_owned();
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            ..Default::default()
        })
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn required_attr(&self, key: &str) -> Result<&str, GlozzError> {
        self.attr(key).ok_or_else(|| GlozzError::MissingAttribute {
            element: self.name.clone(),
            attribute: key.to_string(),
        })
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn required_child(&self, name: &str) -> Result<&Element, GlozzError> {
        self.child(name).ok_or_else(|| GlozzError::Malformed {
            element: self.name.clone(),
            reason: format!("missing <{}>", name),
        })
    }
}

fn parse_tree(xml: &str) -> Result<Element, GlozzError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader
            .read_event()
            .map_err(|e| GlozzError::Xml(e.to_string()))?
        {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| GlozzError::Xml("unbalanced closing tag".to_string()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    let text = text.unescape().map_err(|e| GlozzError::Xml(e.to_string()))?;
                    top.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or_else(|| GlozzError::Xml("no root element".to_string()))
}

fn read_metadata(parent: &Element) -> Metadata {
    let mut metadata = Metadata::default();
    if let Some(meta) = parent.child("metadata") {
        for entry in &meta.children {
            metadata.insert(entry.name.clone(), entry.text.clone());
        }
    }
    metadata
}

/// Returns the type and feature set of a `<characterisation>` block.
fn read_characterisation(parent: &Element) -> Result<(String, Features), GlozzError> {
    let charac = parent.required_child("characterisation")?;
    let anno_type = charac.required_child("type")?.text.clone();
    let mut features = Features::new();
    if let Some(set) = charac.child("featureSet") {
        for feature in set.children.iter().filter(|c| c.name == "feature") {
            features.insert(feature.required_attr("name")?, feature.text.clone());
        }
    }
    Ok((anno_type, features))
}

fn read_position(positioning: &Element, which: &str) -> Result<usize, GlozzError> {
    let index = positioning
        .required_child(which)?
        .required_child("singlePosition")?
        .required_attr("index")?;
    index.trim().parse().map_err(|_| GlozzError::Malformed {
        element: which.to_string(),
        reason: format!("bad position index '{}'", index),
    })
}

fn read_unit(element: &Element) -> Result<Unit, GlozzError> {
    let id = AnnoId::new(element.required_attr("id")?);
    let (unit_type, features) = read_characterisation(element)?;
    let positioning = element.required_child("positioning")?;
    let start = read_position(positioning, "start")?;
    let end = read_position(positioning, "end")?;
    if start > end {
        return Err(GlozzError::Malformed {
            element: format!("unit {}", id),
            reason: format!("start {} is after end {}", start, end),
        });
    }
    let span = Span { start, end };
    Ok(Unit::new(id, span, unit_type)
        .with_features(features)
        .with_metadata(read_metadata(element)))
}

fn read_relation(element: &Element) -> Result<Relation, GlozzError> {
    let id = AnnoId::new(element.required_attr("id")?);
    let (rel_type, features) = read_characterisation(element)?;
    let terms: Vec<&Element> = element
        .required_child("positioning")?
        .children
        .iter()
        .filter(|c| c.name == "term")
        .collect();
    let [source, target] = terms.as_slice() else {
        return Err(GlozzError::Malformed {
            element: format!("relation {}", id),
            reason: format!("expected 2 terms, found {}", terms.len()),
        });
    };
    let mut relation = Relation::new(
        id,
        AnnoId::new(source.required_attr("id")?),
        AnnoId::new(target.required_attr("id")?),
        rel_type,
    )
    .with_metadata(read_metadata(element));
    relation.features = features;
    Ok(relation)
}

fn read_schema(element: &Element) -> Result<Schema, GlozzError> {
    let id = AnnoId::new(element.required_attr("id")?);
    let (schema_type, features) = read_characterisation(element)?;
    let mut schema = Schema::empty(id, schema_type).with_metadata(read_metadata(element));
    schema.features = features;
    if let Some(positioning) = element.child("positioning") {
        for member in &positioning.children {
            let member_id = AnnoId::new(member.required_attr("id")?);
            match member.name.as_str() {
                "embedded-unit" => schema.add_unit(member_id),
                "embedded-relation" => schema.add_relation(member_id),
                "embedded-schema" => schema.add_schema(member_id),
                other => tracing::debug!("Ignoring schema member element <{}>", other),
            }
        }
    }
    Ok(schema)
}

/// Parse an `.aa` annotation layer over `text`.
pub fn read_annotations(xml: &str, text: impl Into<String>) -> Result<Document, GlozzError> {
    let root = parse_tree(xml)?;
    if root.name != "annotations" {
        return Err(GlozzError::Malformed {
            element: root.name,
            reason: "expected <annotations> root".to_string(),
        });
    }

    let mut doc = Document::new(text);
    for child in &root.children {
        match child.name.as_str() {
            "metadata" => doc.header = Some(child.attrs.clone()),
            "unit" => doc.units.push(read_unit(child)?),
            "relation" => doc.relations.push(read_relation(child)?),
            "schema" => doc.schemas.push(read_schema(child)?),
            other => tracing::debug!("Ignoring top-level element <{}>", other),
        }
    }
    Ok(doc)
}
