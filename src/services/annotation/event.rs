//! Recognition of server-generated game messages.
//!
//! Each `NonplayerSegment` line of a game transcript is one of a fixed set of
//! templates. [`GameEvent::parse`] turns the line into a closed variant so the
//! annotators can match on it instead of re-running regexes.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::models::Span;

/// Settlers of Catan resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Clay,
    Ore,
    Sheep,
    Wheat,
    Wood,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clay => "clay",
            Self::Ore => "ore",
            Self::Sheep => "sheep",
            Self::Wheat => "wheat",
            Self::Wood => "wood",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clay" => Ok(Self::Clay),
            "ore" => Ok(Self::Ore),
            "sheep" => Ok(Self::Sheep),
            "wheat" => Ok(Self::Wheat),
            "wood" => Ok(Self::Wood),
            other => Err(format!("unknown resource '{}'", other)),
        }
    }
}

/// A resource mentioned in an event line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMention {
    /// `None` when the line names a kind without a count (monopolies).
    pub quantity: Option<u32>,
    pub kind: Resource,
    /// Character span relative to the start of the event text.
    pub span: Span,
}

impl ResourceMention {
    /// Value of the `Quantity` feature.
    pub fn quantity_feature(&self) -> String {
        self.quantity
            .map(|q| q.to_string())
            .unwrap_or_else(|| "?".to_string())
    }
}

/// A recognized game message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Joined {
        player: String,
    },
    SatDown {
        player: String,
        seat: u8,
    },
    GameStarted,
    BoardLayoutSet,
    Rolled {
        player: String,
        dice: (u8, u8),
    },
    Offered {
        player: String,
        give: ResourceMention,
        receive: ResourceMention,
    },
    Traded {
        player: String,
        give: ResourceMention,
        receive: ResourceMention,
        partner: String,
    },
    Rejected {
        player: String,
    },
    Gained {
        player: String,
        resources: Vec<ResourceMention>,
    },
    NoGain,
    SoldierPlayed {
        player: String,
    },
    NeedsDiscard {
        player: String,
    },
    Discarded {
        player: String,
        count: u32,
    },
    WillMoveRobber {
        player: String,
    },
    MovedRobber {
        player: String,
    },
    MovedRobberChoosingVictim {
        player: String,
    },
    Stole {
        player: String,
        victim: String,
    },
    MonopolyPlayed {
        player: String,
    },
    Monopolized {
        player: String,
        resource: ResourceMention,
    },
    Unrecognized,
}

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).unwrap());
    };
}

pattern!(JOINED, r"(.+) joined the game\.");
pattern!(SAT_DOWN, r"(.+) sat down at seat (\d)\.");
pattern!(ROLLED, r"(.+) rolled a (\d) and a (\d)\.");
pattern!(
    OFFERED,
    r"(.+) made an offer to trade (\d+) (clay|ore|sheep|wheat|wood) for (\d+) (clay|ore|sheep|wheat|wood)\."
);
pattern!(
    TRADED,
    r"(.+) traded (\d+) (clay|ore|sheep|wheat|wood) for (\d+) (clay|ore|sheep|wheat|wood) from (.+)\."
);
pattern!(REJECTED, r"(.+) rejected trade offer\.");
pattern!(GAINED_ONE, r"(.+) gets (\d+) (clay|ore|sheep|wheat|wood)\.");
pattern!(
    GAINED_TWO,
    r"(.+) gets (\d+) (clay|ore|sheep|wheat|wood), (\d+) (clay|ore|sheep|wheat|wood)\."
);
pattern!(NO_GAIN, r"No player gets anything\.");
pattern!(SOLDIER, r"(.+) played a soldier card\.");
pattern!(NEEDS_DISCARD, r"(.+) needs to discard\.");
pattern!(DISCARDED, r"(.+) discarded (\d+) resources\.");
pattern!(WILL_MOVE_ROBBER, r"(.+) will move the robber\.");
pattern!(MOVED_ROBBER, r"(.+) moved the robber\.");
pattern!(CHOOSING_VICTIM, r"(.+) moved the robber, must choose a victim\.");
// Stole lines carry no final period.
pattern!(STOLE, r"(.+) stole a resource from (.+)");
pattern!(MONOPOLY_PLAYED, r"(.+) played a monopoly card\.");
pattern!(MONOPOLIZED, r"(.+) monopolized (clay|ore|sheep|wheat|wood)\.");

type Parser = fn(&str) -> Option<GameEvent>;

/// Templates in priority order; the first that matches wins.
const PARSERS: &[Parser] = &[
    parse_joined,
    parse_sat_down,
    parse_game_started,
    parse_board_layout_set,
    parse_rolled,
    parse_offered,
    parse_traded,
    parse_rejected,
    parse_gained_one,
    parse_gained_two,
    parse_no_gain,
    parse_soldier,
    parse_needs_discard,
    parse_discarded,
    parse_will_move_robber,
    parse_moved_robber,
    parse_choosing_victim,
    parse_stole,
    parse_monopoly_played,
    parse_monopolized,
];

fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

fn group(caps: &Captures, i: usize) -> String {
    caps.get(i).map_or_else(String::new, |m| m.as_str().to_string())
}

/// Mention covering the quantity group through the kind group.
fn mention(text: &str, caps: &Captures, quantity: usize, kind: usize) -> Option<ResourceMention> {
    let q = caps.get(quantity)?;
    let k = caps.get(kind)?;
    Some(ResourceMention {
        quantity: Some(q.as_str().parse().ok()?),
        kind: k.as_str().parse().ok()?,
        span: Span::new(char_offset(text, q.start()), char_offset(text, k.end())),
    })
}

fn parse_joined(text: &str) -> Option<GameEvent> {
    let caps = JOINED.captures(text)?;
    Some(GameEvent::Joined {
        player: group(&caps, 1),
    })
}

fn parse_sat_down(text: &str) -> Option<GameEvent> {
    let caps = SAT_DOWN.captures(text)?;
    Some(GameEvent::SatDown {
        player: group(&caps, 1),
        seat: caps[2].parse().ok()?,
    })
}

fn parse_game_started(text: &str) -> Option<GameEvent> {
    (text == "Game started.").then_some(GameEvent::GameStarted)
}

fn parse_board_layout_set(text: &str) -> Option<GameEvent> {
    (text == "Board layout set.").then_some(GameEvent::BoardLayoutSet)
}

fn parse_rolled(text: &str) -> Option<GameEvent> {
    let caps = ROLLED.captures(text)?;
    Some(GameEvent::Rolled {
        player: group(&caps, 1),
        dice: (caps[2].parse().ok()?, caps[3].parse().ok()?),
    })
}

fn parse_offered(text: &str) -> Option<GameEvent> {
    let caps = OFFERED.captures(text)?;
    Some(GameEvent::Offered {
        player: group(&caps, 1),
        give: mention(text, &caps, 2, 3)?,
        receive: mention(text, &caps, 4, 5)?,
    })
}

fn parse_traded(text: &str) -> Option<GameEvent> {
    let caps = TRADED.captures(text)?;
    Some(GameEvent::Traded {
        player: group(&caps, 1),
        give: mention(text, &caps, 2, 3)?,
        receive: mention(text, &caps, 4, 5)?,
        partner: group(&caps, 6),
    })
}

fn parse_rejected(text: &str) -> Option<GameEvent> {
    let caps = REJECTED.captures(text)?;
    Some(GameEvent::Rejected {
        player: group(&caps, 1),
    })
}

fn parse_gained_one(text: &str) -> Option<GameEvent> {
    let caps = GAINED_ONE.captures(text)?;
    Some(GameEvent::Gained {
        player: group(&caps, 1),
        resources: vec![mention(text, &caps, 2, 3)?],
    })
}

fn parse_gained_two(text: &str) -> Option<GameEvent> {
    let caps = GAINED_TWO.captures(text)?;
    Some(GameEvent::Gained {
        player: group(&caps, 1),
        resources: vec![mention(text, &caps, 2, 3)?, mention(text, &caps, 4, 5)?],
    })
}

fn parse_no_gain(text: &str) -> Option<GameEvent> {
    NO_GAIN.is_match(text).then_some(GameEvent::NoGain)
}

fn parse_soldier(text: &str) -> Option<GameEvent> {
    let caps = SOLDIER.captures(text)?;
    Some(GameEvent::SoldierPlayed {
        player: group(&caps, 1),
    })
}

fn parse_needs_discard(text: &str) -> Option<GameEvent> {
    let caps = NEEDS_DISCARD.captures(text)?;
    Some(GameEvent::NeedsDiscard {
        player: group(&caps, 1),
    })
}

fn parse_discarded(text: &str) -> Option<GameEvent> {
    let caps = DISCARDED.captures(text)?;
    Some(GameEvent::Discarded {
        player: group(&caps, 1),
        count: caps[2].parse().ok()?,
    })
}

fn parse_will_move_robber(text: &str) -> Option<GameEvent> {
    let caps = WILL_MOVE_ROBBER.captures(text)?;
    Some(GameEvent::WillMoveRobber {
        player: group(&caps, 1),
    })
}

fn parse_moved_robber(text: &str) -> Option<GameEvent> {
    let caps = MOVED_ROBBER.captures(text)?;
    Some(GameEvent::MovedRobber {
        player: group(&caps, 1),
    })
}

fn parse_choosing_victim(text: &str) -> Option<GameEvent> {
    let caps = CHOOSING_VICTIM.captures(text)?;
    Some(GameEvent::MovedRobberChoosingVictim {
        player: group(&caps, 1),
    })
}

fn parse_stole(text: &str) -> Option<GameEvent> {
    let caps = STOLE.captures(text)?;
    Some(GameEvent::Stole {
        player: group(&caps, 1),
        victim: group(&caps, 2),
    })
}

fn parse_monopoly_played(text: &str) -> Option<GameEvent> {
    let caps = MONOPOLY_PLAYED.captures(text)?;
    Some(GameEvent::MonopolyPlayed {
        player: group(&caps, 1),
    })
}

fn parse_monopolized(text: &str) -> Option<GameEvent> {
    let caps = MONOPOLIZED.captures(text)?;
    let kind = caps.get(2)?;
    Some(GameEvent::Monopolized {
        player: group(&caps, 1),
        resource: ResourceMention {
            quantity: None,
            kind: kind.as_str().parse().ok()?,
            span: Span::new(char_offset(text, kind.start()), char_offset(text, kind.end())),
        },
    })
}

impl GameEvent {
    /// Recognize a game message. Never fails; unknown lines are
    /// [`GameEvent::Unrecognized`].
    pub fn parse(text: &str) -> Self {
        PARSERS
            .iter()
            .find_map(|parse| parse(text))
            .unwrap_or(Self::Unrecognized)
    }

    /// Whether this is a dice roll totalling seven, which triggers the robber.
    pub fn is_seven(&self) -> bool {
        matches!(self, Self::Rolled { dice: (a, b), .. } if u16::from(*a) + u16::from(*b) == 7)
    }

    /// Short variant name for log messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Joined { .. } => "joined",
            Self::SatDown { .. } => "sat_down",
            Self::GameStarted => "game_started",
            Self::BoardLayoutSet => "board_layout_set",
            Self::Rolled { .. } => "rolled",
            Self::Offered { .. } => "offered",
            Self::Traded { .. } => "traded",
            Self::Rejected { .. } => "rejected",
            Self::Gained { .. } => "gained",
            Self::NoGain => "no_gain",
            Self::SoldierPlayed { .. } => "soldier_played",
            Self::NeedsDiscard { .. } => "needs_discard",
            Self::Discarded { .. } => "discarded",
            Self::WillMoveRobber { .. } => "will_move_robber",
            Self::MovedRobber { .. } => "moved_robber",
            Self::MovedRobberChoosingVictim { .. } => "moved_robber_choosing_victim",
            Self::Stole { .. } => "stole",
            Self::MonopolyPlayed { .. } => "monopoly_played",
            Self::Monopolized { .. } => "monopolized",
            Self::Unrecognized => "unrecognized",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(text: &str, span: Span) -> String {
        text.chars().skip(span.start).take(span.len()).collect()
    }

    #[test]
    fn test_gain_mention_delimits_quantity_and_kind() {
        let text = "Alice gets 3 wood.";
        match GameEvent::parse(text) {
            GameEvent::Gained { player, resources } => {
                assert_eq!(player, "Alice");
                assert_eq!(resources.len(), 1);
                assert_eq!(resources[0].span, Span::new(11, 17));
                assert_eq!(slice(text, resources[0].span), "3 wood");
                assert_eq!(resources[0].quantity, Some(3));
                assert_eq!(resources[0].kind, Resource::Wood);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_two_resource_gain_reads_both_groups() {
        let text = "Bob gets 1 clay, 2 ore.";
        let GameEvent::Gained { resources, .. } = GameEvent::parse(text) else {
            panic!("expected a gain");
        };
        assert_eq!(resources.len(), 2);
        assert_eq!(slice(text, resources[0].span), "1 clay");
        assert_eq!(slice(text, resources[1].span), "2 ore");
        assert_eq!(resources[1].quantity, Some(2));
        assert_eq!(resources[1].kind, Resource::Ore);
    }

    #[test]
    fn test_offer_and_trade_mentions() {
        let text = "Carol made an offer to trade 2 sheep for 1 wheat.";
        let GameEvent::Offered { give, receive, .. } = GameEvent::parse(text) else {
            panic!("expected an offer");
        };
        assert_eq!(slice(text, give.span), "2 sheep");
        assert_eq!(slice(text, receive.span), "1 wheat");

        let text = "Carol traded 2 sheep for 1 wheat from Dave.";
        let GameEvent::Traded {
            give,
            receive,
            partner,
            ..
        } = GameEvent::parse(text)
        else {
            panic!("expected a trade");
        };
        assert_eq!(slice(text, give.span), "2 sheep");
        assert_eq!(slice(text, receive.span), "1 wheat");
        assert_eq!(partner, "Dave");
    }

    #[test]
    fn test_offsets_count_characters_not_bytes() {
        let text = "Zoë gets 3 wood.";
        let GameEvent::Gained { resources, .. } = GameEvent::parse(text) else {
            panic!("expected a gain");
        };
        assert_eq!(resources[0].span, Span::new(9, 15));
        assert_eq!(slice(text, resources[0].span), "3 wood");
    }

    #[test]
    fn test_monopoly_mention_is_kind_only() {
        let text = "Eve monopolized wheat.";
        let GameEvent::Monopolized { resource, .. } = GameEvent::parse(text) else {
            panic!("expected a monopoly");
        };
        assert_eq!(resource.quantity, None);
        assert_eq!(resource.quantity_feature(), "?");
        assert_eq!(slice(text, resource.span), "wheat");
    }

    #[test]
    fn test_every_template_is_recognized() {
        let cases = [
            ("Alice joined the game.", "joined"),
            ("Alice sat down at seat 2.", "sat_down"),
            ("Game started.", "game_started"),
            ("Board layout set.", "board_layout_set"),
            ("Alice rolled a 3 and a 5.", "rolled"),
            ("Alice rejected trade offer.", "rejected"),
            ("No player gets anything.", "no_gain"),
            ("Alice played a soldier card.", "soldier_played"),
            ("Alice needs to discard.", "needs_discard"),
            ("Alice discarded 4 resources.", "discarded"),
            ("Alice will move the robber.", "will_move_robber"),
            ("Alice moved the robber.", "moved_robber"),
            (
                "Alice moved the robber, must choose a victim.",
                "moved_robber_choosing_victim",
            ),
            ("Alice stole a resource from Bob", "stole"),
            ("Alice played a monopoly card.", "monopoly_played"),
            ("Alice built a road.", "unrecognized"),
        ];
        for (text, expected) in cases {
            assert_eq!(GameEvent::parse(text).name(), expected, "{}", text);
        }
    }

    #[test]
    fn test_exact_sentences_must_match_whole_text() {
        assert_eq!(GameEvent::parse("Game started. Again"), GameEvent::Unrecognized);
    }

    #[test]
    fn test_priority_order_first_match_wins() {
        // Matches both the join and the stole templates; join comes first.
        let text = "Alice stole a resource from Bob joined the game.";
        assert_eq!(GameEvent::parse(text).name(), "joined");
    }

    #[test]
    fn test_is_seven() {
        assert!(GameEvent::parse("Bob rolled a 3 and a 4.").is_seven());
        assert!(!GameEvent::parse("Bob rolled a 3 and a 3.").is_seven());
        assert!(!GameEvent::NoGain.is_seven());
    }
}
