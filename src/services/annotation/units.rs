//! Units-stage annotation of game events.
//!
//! Re-types each `NonplayerSegment` as a dialogue act, sets its surface act
//! and addressee, and adds a `Resource` unit for every resource it mentions.

use crate::corpus::Stage;
use crate::glozz::IdGenerator;
use crate::models::{Document, Features, Unit, RESOURCE};

use super::annotator::{game_events, Annotator};
use super::event::{GameEvent, ResourceMention};
use super::types::{AnnotationError, AnnotationOutput};

/// How one event line is annotated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitAnnotation<'a> {
    pub unit_type: &'static str,
    pub surface_act: &'static str,
    pub addressee: String,
    /// Resource mentions with their `Status` feature.
    pub resources: Vec<(&'a ResourceMention, &'static str)>,
}

impl<'a> UnitAnnotation<'a> {
    fn assertion(unit_type: &'static str) -> Self {
        Self {
            unit_type,
            surface_act: "Assertion",
            addressee: "All".to_string(),
            resources: Vec::new(),
        }
    }

    pub fn for_event(event: &'a GameEvent) -> Self {
        match event {
            GameEvent::Offered { give, receive, .. } => Self {
                unit_type: "Offer",
                surface_act: "Question",
                addressee: "?".to_string(),
                resources: vec![(give, "Givable"), (receive, "Receivable")],
            },
            GameEvent::Traded {
                give,
                receive,
                partner,
                ..
            } => Self {
                unit_type: "Accept",
                surface_act: "Assertion",
                addressee: partner.clone(),
                resources: vec![(give, "?"), (receive, "Possessed")],
            },
            GameEvent::Rejected { .. } => Self::assertion("Reject"),
            GameEvent::Gained { resources, .. } => Self {
                resources: resources.iter().map(|r| (r, "Possessed")).collect(),
                ..Self::assertion("Other")
            },
            GameEvent::Monopolized { resource, .. } => Self {
                resources: vec![(resource, "Possessed")],
                ..Self::assertion("Other")
            },
            _ => Self::assertion("Other"),
        }
    }
}

fn resource_features(mention: &ResourceMention, status: &str) -> Features {
    let mut features = Features::new();
    features.insert("Status", status);
    features.insert("Quantity", mention.quantity_feature());
    features.insert("Correctness", "True");
    features.insert("Kind", mention.kind.as_str());
    features
}

/// Annotator for the `units` stage of non-linguistic events.
pub struct UnitsAnnotator {
    author: String,
}

impl UnitsAnnotator {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
        }
    }
}

impl Annotator for UnitsAnnotator {
    fn annotation_type(&self) -> &str {
        "nonling_units"
    }

    fn display_name(&self) -> &str {
        "Game event units"
    }

    fn stage(&self) -> Stage {
        Stage::Units
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn annotate(
        &self,
        doc: &mut Document,
        ids: &mut IdGenerator,
    ) -> Result<AnnotationOutput, AnnotationError> {
        let events = game_events(doc);
        if events.is_empty() {
            return Ok(AnnotationOutput::NoResult);
        }

        let mut changes = 0;
        let mut resources = Vec::new();
        for item in &events {
            let annotation = UnitAnnotation::for_event(&item.event);
            let Some(unit) = doc.unit_mut(&item.id) else {
                continue;
            };
            unit.unit_type = annotation.unit_type.to_string();
            unit.features.insert("Surface_act", annotation.surface_act);
            unit.features.insert("Addressee", annotation.addressee.as_str());
            changes += 1;

            for (mention, status) in annotation.resources {
                let (id, metadata) = ids.mint();
                resources.push(
                    Unit::new(id, mention.span.shift(item.span.start), RESOURCE)
                        .with_features(resource_features(mention, status))
                        .with_metadata(metadata),
                );
            }
            tracing::debug!("{} -> {}", item.id, annotation.unit_type);
        }

        changes += resources.len();
        doc.units.extend(resources);
        Ok(AnnotationOutput::Changed(changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnnoId, Span, NONPLAYER_SEGMENT};

    fn doc_with_lines(lines: &[&str]) -> Document {
        let mut text = String::new();
        let mut units = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let start = text.chars().count();
            text.push_str(line);
            let end = text.chars().count();
            text.push(' ');
            units.push(Unit::new(
                AnnoId::new(format!("u{}", i)),
                Span::new(start, end),
                NONPLAYER_SEGMENT,
            ));
        }
        let mut doc = Document::new(text);
        doc.units = units;
        doc
    }

    fn resources(doc: &Document) -> Vec<&Unit> {
        doc.units.iter().filter(|u| u.is_type(RESOURCE)).collect()
    }

    #[test]
    fn test_gain_resource_span_within_parent() {
        let mut doc = doc_with_lines(&["Game started.", "Alice gets 3 wood."]);
        let mut ids = IdGenerator::starting_at("stac", 1);
        UnitsAnnotator::new("stac").annotate(&mut doc, &mut ids).unwrap();

        let gain = doc.unit(&AnnoId::from("u1")).unwrap();
        assert_eq!(gain.unit_type, "Other");
        assert_eq!(gain.features.get("Addressee"), Some("All"));

        let res = resources(&doc);
        assert_eq!(res.len(), 1);
        assert!(gain.span.encloses(&res[0].span));
        assert_eq!(doc.text_of(res[0].span), "3 wood");
        let features: Vec<(&str, &str)> = res[0].features.iter().collect();
        assert_eq!(
            features,
            vec![
                ("Status", "Possessed"),
                ("Quantity", "3"),
                ("Correctness", "True"),
                ("Kind", "wood"),
            ]
        );
        assert!(doc.validate().is_empty());
    }

    #[test]
    fn test_offer_and_trade_annotations() {
        let mut doc = doc_with_lines(&[
            "Bob made an offer to trade 1 ore for 2 clay.",
            "Bob traded 1 ore for 2 clay from Carol.",
            "Carol rejected trade offer.",
        ]);
        let mut ids = IdGenerator::starting_at("stac", 1);
        UnitsAnnotator::new("stac").annotate(&mut doc, &mut ids).unwrap();

        let offer = doc.unit(&AnnoId::from("u0")).unwrap();
        assert_eq!(offer.unit_type, "Offer");
        assert_eq!(offer.features.get("Surface_act"), Some("Question"));
        assert_eq!(offer.features.get("Addressee"), Some("?"));

        let trade = doc.unit(&AnnoId::from("u1")).unwrap();
        assert_eq!(trade.unit_type, "Accept");
        assert_eq!(trade.features.get("Addressee"), Some("Carol"));

        let reject = doc.unit(&AnnoId::from("u2")).unwrap();
        assert_eq!(reject.unit_type, "Reject");
        assert_eq!(reject.features.get("Surface_act"), Some("Assertion"));

        let statuses: Vec<(String, &str)> = resources(&doc)
            .iter()
            .map(|u| (doc.text_of(u.span), u.features.get("Status").unwrap_or("")))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("1 ore".to_string(), "Givable"),
                ("2 clay".to_string(), "Receivable"),
                ("1 ore".to_string(), "?"),
                ("2 clay".to_string(), "Possessed"),
            ]
        );
    }

    #[test]
    fn test_monopoly_resource_has_unknown_quantity() {
        let mut doc = doc_with_lines(&["Eve monopolized sheep."]);
        let mut ids = IdGenerator::starting_at("stac", 1);
        UnitsAnnotator::new("stac").annotate(&mut doc, &mut ids).unwrap();

        let res = resources(&doc);
        assert_eq!(doc.text_of(res[0].span), "sheep");
        assert_eq!(res[0].features.get("Quantity"), Some("?"));
    }

    #[test]
    fn test_second_run_is_noop() {
        let mut doc = doc_with_lines(&["Alice gets 1 wheat, 2 sheep.", "Alice built a city."]);
        let mut ids = IdGenerator::starting_at("stac", 1);
        let annotator = UnitsAnnotator::new("stac");

        let first = annotator.annotate(&mut doc, &mut ids).unwrap();
        assert_eq!(first, AnnotationOutput::Changed(4));
        let snapshot = doc.clone();

        let second = annotator.annotate(&mut doc, &mut ids).unwrap();
        assert_eq!(second, AnnotationOutput::NoResult);
        assert_eq!(doc, snapshot);
    }
}
