//! Discourse-stage linking of game events.
//!
//! Game events come in small sequences: a roll followed by the gains it
//! produced, a soldier card followed by discards and a robber move, an offer
//! followed by its answers. [`DiscourseBuilder`] folds over the events of one
//! document keeping one pending buffer per category and emits relations and
//! CDUs when a sequence closes.

use std::collections::HashMap;

use crate::corpus::Stage;
use crate::glozz::IdGenerator;
use crate::models::{AnnoId, Document, Relation, Schema};

use super::annotator::{game_events, Annotator};
use super::event::GameEvent;
use super::types::{AnnotationError, AnnotationOutput};

pub const SEQUENCE: &str = "Sequence";
pub const RESULT: &str = "Result";
pub const CONTINUATION: &str = "Continuation";
pub const QUESTION_ANSWER_PAIR: &str = "Question-answer_pair";

/// Trade partner name used for trades with the bank.
const BANK: &str = "the bank";

/// Relations and CDUs produced for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscourseOutput {
    pub relations: Vec<Relation>,
    pub schemas: Vec<Schema>,
}

impl DiscourseOutput {
    pub fn len(&self) -> usize {
        self.relations.len() + self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append everything to `doc`.
    pub fn apply(self, doc: &mut Document) {
        doc.relations.extend(self.relations);
        doc.schemas.extend(self.schemas);
    }
}

/// Mints ids for, and collects, emitted annotations.
struct Emitter<'a> {
    ids: &'a mut IdGenerator,
    output: DiscourseOutput,
}

impl Emitter<'_> {
    fn relate(&mut self, source: &AnnoId, target: &AnnoId, label: &str) {
        let (id, metadata) = self.ids.mint();
        tracing::debug!("{} {} -> {}", label, source, target);
        self.output.relations.push(
            Relation::new(id, source.clone(), target.clone(), label).with_metadata(metadata),
        );
    }

    fn cdu(&mut self, members: &[AnnoId]) -> Option<AnnoId> {
        let (id, metadata) = self.ids.mint();
        let schema = Schema::cdu(id, members.iter().cloned(), metadata)?;
        let id = schema.id.clone();
        self.output.schemas.push(schema);
        Some(id)
    }

    /// Close a chain of events: one relation for a pair, otherwise a CDU of
    /// everything after the opener linked to it by `Result`, with its
    /// members linked pairwise by `member_label`.
    fn close_chain(&mut self, chain: Vec<AnnoId>, pair_label: &str, member_label: &str) {
        match chain.as_slice() {
            [] | [_] => {}
            [opener, second] => self.relate(opener, second, pair_label),
            [opener, members @ ..] => {
                if let Some(cdu) = self.cdu(members) {
                    self.relate(opener, &cdu, RESULT);
                }
                for pair in members.windows(2) {
                    self.relate(&pair[0], &pair[1], member_label);
                }
            }
        }
    }
}

/// Players who joined but have not sat down yet.
#[derive(Debug, Default)]
struct JoinState {
    pending: HashMap<String, AnnoId>,
}

/// The "Game started." line awaiting the board layout.
#[derive(Debug, Default)]
struct SetupState {
    started: Option<AnnoId>,
}

/// A non-seven roll and the gains that followed it.
#[derive(Debug, Default)]
struct DiceChain {
    events: Vec<AnnoId>,
}

/// A seven or soldier card and the robber events that followed it.
#[derive(Debug, Default)]
struct RobberChain {
    events: Vec<AnnoId>,
}

impl RobberChain {
    fn open(&mut self, unit: &AnnoId) -> Result<(), AnnotationError> {
        if let Some(pending) = self.events.first() {
            return Err(AnnotationError::UnflushedBuffer {
                category: "robber",
                pending: pending.clone(),
                unit: unit.clone(),
            });
        }
        self.events.push(unit.clone());
        Ok(())
    }
}

/// The latest trade offer.
#[derive(Debug, Default)]
struct TradeState {
    offer: Option<AnnoId>,
}

/// A monopoly card awaiting its resolution.
#[derive(Debug, Default)]
struct MonopolyState {
    card: Option<AnnoId>,
}

/// Fold over the game events of one document.
pub struct DiscourseBuilder<'a> {
    emitter: Emitter<'a>,
    join: JoinState,
    setup: SetupState,
    dice: DiceChain,
    robber: RobberChain,
    trade: TradeState,
    monopoly: MonopolyState,
}

impl<'a> DiscourseBuilder<'a> {
    pub fn new(ids: &'a mut IdGenerator) -> Self {
        Self {
            emitter: Emitter {
                ids,
                output: DiscourseOutput::default(),
            },
            join: JoinState::default(),
            setup: SetupState::default(),
            dice: DiceChain::default(),
            robber: RobberChain::default(),
            trade: TradeState::default(),
            monopoly: MonopolyState::default(),
        }
    }

    fn close_dice(&mut self) {
        let chain = std::mem::take(&mut self.dice.events);
        self.emitter.close_chain(chain, SEQUENCE, CONTINUATION);
    }

    fn close_robber(&mut self) {
        let chain = std::mem::take(&mut self.robber.events);
        self.emitter.close_chain(chain, SEQUENCE, SEQUENCE);
    }

    fn append_robber(&mut self, unit: &AnnoId, event: &GameEvent) {
        if self.robber.events.is_empty() {
            tracing::warn!("{} ({}) with no seven or soldier card before it", unit, event.name());
        }
        self.robber.events.push(unit.clone());
    }

    fn answer_offer(&mut self, unit: &AnnoId) {
        match &self.trade.offer {
            Some(offer) => {
                let offer = offer.clone();
                self.emitter.relate(&offer, unit, QUESTION_ANSWER_PAIR);
            }
            None => tracing::warn!("{} answers a trade offer that was never made", unit),
        }
    }

    /// Consume the next event, in text order.
    pub fn step(&mut self, unit: &AnnoId, event: &GameEvent) -> Result<(), AnnotationError> {
        match event {
            GameEvent::Joined { player } => {
                self.join.pending.insert(player.clone(), unit.clone());
            }
            GameEvent::SatDown { player, .. } => match self.join.pending.remove(player) {
                Some(joined) => self.emitter.relate(&joined, unit, SEQUENCE),
                None => tracing::warn!("{} sat down at {} without joining", player, unit),
            },
            GameEvent::GameStarted => self.setup.started = Some(unit.clone()),
            GameEvent::BoardLayoutSet => match self.setup.started.take() {
                Some(started) => self.emitter.relate(&started, unit, SEQUENCE),
                None => tracing::warn!("Board layout set at {} before the game started", unit),
            },
            GameEvent::Rolled { .. } => {
                self.close_dice();
                if event.is_seven() {
                    self.robber.open(unit)?;
                } else {
                    self.dice.events.push(unit.clone());
                }
            }
            GameEvent::Gained { .. } => {
                if self.dice.events.is_empty() {
                    tracing::warn!("Gain at {} with no roll before it", unit);
                } else {
                    self.dice.events.push(unit.clone());
                }
            }
            GameEvent::NoGain => {
                match self.dice.events.first() {
                    Some(roll) => {
                        let roll = roll.clone();
                        self.emitter.relate(&roll, unit, RESULT);
                    }
                    None => tracing::warn!("No gain at {} with no roll before it", unit),
                }
                self.dice.events.clear();
            }
            GameEvent::SoldierPlayed { .. } => self.robber.open(unit)?,
            GameEvent::NeedsDiscard { .. }
            | GameEvent::Discarded { .. }
            | GameEvent::WillMoveRobber { .. }
            | GameEvent::MovedRobberChoosingVictim { .. } => self.append_robber(unit, event),
            GameEvent::MovedRobber { .. } | GameEvent::Stole { .. } => {
                self.append_robber(unit, event);
                self.close_robber();
            }
            GameEvent::Offered { .. } => self.trade.offer = Some(unit.clone()),
            GameEvent::Traded { partner, .. } => {
                if partner != BANK {
                    self.answer_offer(unit);
                }
            }
            GameEvent::Rejected { .. } => self.answer_offer(unit),
            GameEvent::MonopolyPlayed { .. } => {
                if let Some(pending) = &self.monopoly.card {
                    return Err(AnnotationError::UnflushedBuffer {
                        category: "monopoly",
                        pending: pending.clone(),
                        unit: unit.clone(),
                    });
                }
                self.monopoly.card = Some(unit.clone());
            }
            GameEvent::Monopolized { .. } => match self.monopoly.card.take() {
                Some(card) => self.emitter.relate(&card, unit, SEQUENCE),
                None => tracing::warn!("Monopoly at {} with no card played", unit),
            },
            GameEvent::Unrecognized => {}
        }
        Ok(())
    }

    /// Flush the pending dice chain and return everything emitted.
    pub fn finish(mut self) -> DiscourseOutput {
        self.close_dice();
        if let Some(opener) = self.robber.events.first() {
            tracing::warn!(
                "Robber sequence opened at {} never closed ({} events)",
                opener,
                self.robber.events.len()
            );
        }
        if let Some(card) = &self.monopoly.card {
            tracing::warn!("Monopoly card {} never resolved", card);
        }
        self.emitter.output
    }
}

/// Annotator for the `discourse` stage of non-linguistic events.
pub struct DiscourseAnnotator {
    author: String,
}

impl DiscourseAnnotator {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
        }
    }
}

impl Annotator for DiscourseAnnotator {
    fn annotation_type(&self) -> &str {
        "nonling_discourse"
    }

    fn display_name(&self) -> &str {
        "Game event relations"
    }

    fn stage(&self) -> Stage {
        Stage::Discourse
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

        let mut builder = DiscourseBuilder::new(ids);
        for item in &events {
            builder.step(&item.id, &item.event)?;
        }
        let output = builder.finish();
        if output.is_empty() {
            return Ok(AnnotationOutput::NoResult);
        }

        let changes = output.len();
        output.apply(doc);
        Ok(AnnotationOutput::Changed(changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lines: &[&str]) -> Result<DiscourseOutput, AnnotationError> {
        let mut ids = IdGenerator::starting_at("stac", 100);
        let mut builder = DiscourseBuilder::new(&mut ids);
        for (i, line) in lines.iter().enumerate() {
            builder.step(&AnnoId::new(format!("e{}", i)), &GameEvent::parse(line))?;
        }
        Ok(builder.finish())
    }

    fn edges(output: &DiscourseOutput) -> Vec<(String, String, String)> {
        output
            .relations
            .iter()
            .map(|r| {
                (
                    r.source.to_string(),
                    r.target.to_string(),
                    r.rel_type.clone(),
                )
            })
            .collect()
    }

    fn e(source: &str, target: &str, label: &str) -> (String, String, String) {
        (source.to_string(), target.to_string(), label.to_string())
    }

    #[test]
    fn test_roll_with_two_gains_forms_cdu() {
        let output = run(&[
            "Alice rolled a 2 and a 4.",
            "Alice gets 1 wood.",
            "Bob gets 2 ore.",
            "Bob rolled a 1 and a 1.",
        ])
        .unwrap();

        assert_eq!(output.schemas.len(), 1);
        let cdu = &output.schemas[0];
        assert!(cdu.is_cdu());
        assert_eq!(cdu.units, vec![AnnoId::from("e1"), AnnoId::from("e2")]);
        assert_eq!(
            edges(&output),
            vec![
                e("e0", cdu.id.as_str(), RESULT),
                e("e1", "e2", CONTINUATION),
            ]
        );
    }

    #[test]
    fn test_three_gains_then_roll() {
        let output = run(&[
            "Alice rolled a 2 and a 4.",
            "Alice gets 1 wood.",
            "Bob gets 2 ore.",
            "Carol gets 1 sheep, 1 wheat.",
            "Bob rolled a 5 and a 5.",
        ])
        .unwrap();

        assert_eq!(output.schemas.len(), 1);
        let cdu = &output.schemas[0];
        assert_eq!(
            cdu.units,
            vec![AnnoId::from("e1"), AnnoId::from("e2"), AnnoId::from("e3")]
        );
        assert_eq!(
            edges(&output),
            vec![
                e("e0", cdu.id.as_str(), RESULT),
                e("e1", "e2", CONTINUATION),
                e("e2", "e3", CONTINUATION),
            ]
        );
    }

    #[test]
    fn test_seven_closes_dice_chain_before_robber() {
        let output = run(&[
            "Alice rolled a 2 and a 4.",
            "Alice gets 1 wood.",
            "Bob gets 2 ore.",
            "Bob rolled a 3 and a 4.",
            "Bob moved the robber.",
        ])
        .unwrap();

        assert_eq!(output.schemas.len(), 1);
        let cdu = &output.schemas[0];
        assert_eq!(cdu.units, vec![AnnoId::from("e1"), AnnoId::from("e2")]);
        assert_eq!(
            edges(&output),
            vec![
                e("e0", cdu.id.as_str(), RESULT),
                e("e1", "e2", CONTINUATION),
                e("e3", "e4", SEQUENCE),
            ]
        );
    }

    #[test]
    fn test_soldier_then_move_is_single_sequence() {
        let output = run(&["Alice played a soldier card.", "Alice moved the robber."]).unwrap();
        assert!(output.schemas.is_empty());
        assert_eq!(edges(&output), vec![e("e0", "e1", SEQUENCE)]);
    }

    #[test]
    fn test_roll_with_single_gain_is_sequence() {
        let output = run(&["Alice rolled a 2 and a 4.", "Alice gets 1 wood."]).unwrap();
        assert!(output.schemas.is_empty());
        assert_eq!(edges(&output), vec![e("e0", "e1", SEQUENCE)]);
    }

    #[test]
    fn test_lone_roll_emits_nothing() {
        let output = run(&["Alice rolled a 2 and a 4.", "Bob rolled a 5 and a 4."]).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_no_gain_is_result_of_roll() {
        let output = run(&["Alice rolled a 6 and a 6.", "No player gets anything."]).unwrap();
        assert_eq!(edges(&output), vec![e("e0", "e1", RESULT)]);
    }

    #[test]
    fn test_robber_sequence_after_seven() {
        let output = run(&[
            "Alice rolled a 3 and a 4.",
            "Bob needs to discard.",
            "Bob discarded 4 resources.",
            "Alice will move the robber.",
            "Alice moved the robber.",
        ])
        .unwrap();

        assert_eq!(output.schemas.len(), 1);
        let cdu = &output.schemas[0];
        assert_eq!(cdu.units.len(), 4);
        let rels = edges(&output);
        assert_eq!(rels[0], e("e0", cdu.id.as_str(), RESULT));
        assert_eq!(
            &rels[1..],
            &[
                e("e1", "e2", SEQUENCE),
                e("e2", "e3", SEQUENCE),
                e("e3", "e4", SEQUENCE),
            ]
        );
    }

    #[test]
    fn test_soldier_then_steal_closes_robber() {
        let output = run(&[
            "Alice played a soldier card.",
            "Alice moved the robber, must choose a victim.",
            "Alice stole a resource from Bob",
            "Bob played a soldier card.",
        ])
        .unwrap();
        assert_eq!(output.schemas.len(), 1);
        assert_eq!(output.relations.len(), 2);
    }

    #[test]
    fn test_reopening_robber_is_fatal() {
        let err = run(&["Alice played a soldier card.", "Bob rolled a 6 and a 1."]).unwrap_err();
        assert!(matches!(
            err,
            AnnotationError::UnflushedBuffer { category: "robber", .. }
        ));
    }

    #[test]
    fn test_reopening_monopoly_is_fatal() {
        let err = run(&[
            "Alice played a monopoly card.",
            "Bob played a monopoly card.",
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            AnnotationError::UnflushedBuffer { category: "monopoly", .. }
        ));
    }

    #[test]
    fn test_setup_join_trade_and_monopoly_links() {
        let output = run(&[
            "Alice joined the game.",
            "Bob joined the game.",
            "Bob sat down at seat 1.",
            "Alice sat down at seat 0.",
            "Game started.",
            "Board layout set.",
            "Alice made an offer to trade 1 ore for 1 wood.",
            "Bob rejected trade offer.",
            "Carol traded 1 wood for 1 ore from Alice.",
            "Alice traded 4 clay for 1 sheep from the bank.",
            "Alice played a monopoly card.",
            "Alice monopolized wheat.",
        ])
        .unwrap();

        assert_eq!(
            edges(&output),
            vec![
                e("e1", "e2", SEQUENCE),
                e("e0", "e3", SEQUENCE),
                e("e4", "e5", SEQUENCE),
                e("e6", "e7", QUESTION_ANSWER_PAIR),
                e("e6", "e8", QUESTION_ANSWER_PAIR),
                e("e10", "e11", SEQUENCE),
            ]
        );
    }

    #[test]
    fn test_end_of_stream_flushes_dice_chain() {
        let output = run(&[
            "Alice rolled a 2 and a 4.",
            "Alice gets 1 wood.",
            "Bob gets 1 clay.",
            "Carol gets 2 sheep.",
        ])
        .unwrap();
        assert_eq!(output.schemas.len(), 1);
        assert_eq!(output.schemas[0].units.len(), 3);
        assert_eq!(output.relations.len(), 3);
    }

    #[test]
    fn test_annotator_appends_to_document() {
        use crate::models::{Span, Unit, NONPLAYER_SEGMENT};

        let text = "Game started. Board layout set.";
        let mut doc = Document::new(text);
        doc.units.push(Unit::new(AnnoId::from("b"), Span::new(14, 31), NONPLAYER_SEGMENT));
        doc.units.push(Unit::new(AnnoId::from("a"), Span::new(0, 13), NONPLAYER_SEGMENT));

        let mut ids = IdGenerator::for_document("stac", &doc);
        let output = DiscourseAnnotator::new("stac")
            .annotate(&mut doc, &mut ids)
            .unwrap();
        assert_eq!(output, AnnotationOutput::Changed(1));
        assert_eq!(doc.relations[0].source, AnnoId::from("a"));
        assert_eq!(doc.relations[0].target, AnnoId::from("b"));
        assert!(doc.validate().is_empty());
    }
}
