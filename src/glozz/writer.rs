//! Glozz `.aa` writer.
//!
//! Always produces the same layout (XML declaration, two-space indentation,
//! empty elements self-closed), so reading and re-writing a file in that
//! layout reproduces it byte for byte.

use std::fmt::Write as _;

use quick_xml::escape::partial_escape;

use crate::models::{Document, Features, Metadata, Relation, Schema, Unit};

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

fn text(value: &str) -> String {
    partial_escape(value).into_owned()
}

fn attr(value: &str) -> String {
    partial_escape(value).replace('"', "&quot;")
}

struct XmlOut {
    buf: String,
}

impl XmlOut {
    fn line(&mut self, depth: usize, content: &str) {
        for _ in 0..depth {
            self.buf.push_str("  ");
        }
        self.buf.push_str(content);
        self.buf.push('\n');
    }

    fn metadata(&mut self, depth: usize, metadata: &Metadata) {
        if metadata.is_empty() {
            self.line(depth, "<metadata/>");
            return;
        }
        self.line(depth, "<metadata>");
        for (key, value) in metadata.iter() {
            self.line(depth + 1, &format!("<{key}>{}</{key}>", text(value)));
        }
        self.line(depth, "</metadata>");
    }

    fn characterisation(&mut self, depth: usize, anno_type: &str, features: &Features) {
        self.line(depth, "<characterisation>");
        self.line(depth + 1, &format!("<type>{}</type>", text(anno_type)));
        if features.is_empty() {
            self.line(depth + 1, "<featureSet/>");
        } else {
            self.line(depth + 1, "<featureSet>");
            for (name, value) in features.iter() {
                self.line(
                    depth + 2,
                    &format!(r#"<feature name="{}">{}</feature>"#, attr(name), text(value)),
                );
            }
            self.line(depth + 1, "</featureSet>");
        }
        self.line(depth, "</characterisation>");
    }

    fn unit(&mut self, unit: &Unit) {
        self.line(1, &format!(r#"<unit id="{}">"#, attr(unit.id.as_str())));
        self.metadata(2, &unit.metadata);
        self.characterisation(2, &unit.unit_type, &unit.features);
        self.line(2, "<positioning>");
        for (tag, index) in [("start", unit.span.start), ("end", unit.span.end)] {
            self.line(3, &format!("<{tag}>"));
            self.line(4, &format!(r#"<singlePosition index="{index}"/>"#));
            self.line(3, &format!("</{tag}>"));
        }
        self.line(2, "</positioning>");
        self.line(1, "</unit>");
    }

    fn relation(&mut self, relation: &Relation) {
        self.line(1, &format!(r#"<relation id="{}">"#, attr(relation.id.as_str())));
        self.metadata(2, &relation.metadata);
        self.characterisation(2, &relation.rel_type, &relation.features);
        self.line(2, "<positioning>");
        for term in [&relation.source, &relation.target] {
            self.line(3, &format!(r#"<term id="{}"/>"#, attr(term.as_str())));
        }
        self.line(2, "</positioning>");
        self.line(1, "</relation>");
    }

    fn schema(&mut self, schema: &Schema) {
        self.line(1, &format!(r#"<schema id="{}">"#, attr(schema.id.as_str())));
        self.metadata(2, &schema.metadata);
        self.characterisation(2, &schema.schema_type, &schema.features);
        if schema.is_empty() {
            self.line(2, "<positioning/>");
        } else {
            self.line(2, "<positioning>");
            let members = schema
                .units
                .iter()
                .map(|id| ("embedded-unit", id))
                .chain(schema.relations.iter().map(|id| ("embedded-relation", id)))
                .chain(schema.schemas.iter().map(|id| ("embedded-schema", id)));
            for (tag, id) in members {
                self.line(3, &format!(r#"<{tag} id="{}"/>"#, attr(id.as_str())));
            }
            self.line(2, "</positioning>");
        }
        self.line(1, "</schema>");
    }
}

/// Render the annotation layer of `doc` as an `.aa` file.
pub fn write_annotations(doc: &Document) -> String {
    let mut out = XmlOut { buf: String::new() };
    out.line(0, DECLARATION);
    out.line(0, "<annotations>");
    if let Some(header) = &doc.header {
        let mut element = String::from("<metadata");
        for (key, value) in header {
            let _ = write!(element, r#" {}="{}""#, key, attr(value));
        }
        element.push_str("/>");
        out.line(1, &element);
    }
    for unit in &doc.units {
        out.unit(unit);
    }
    for relation in &doc.relations {
        out.relation(relation);
    }
    for schema in &doc.schemas {
        out.schema(schema);
    }
    out.line(0, "</annotations>");
    out.buf
}
