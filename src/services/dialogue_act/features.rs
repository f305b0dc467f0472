//! Feature vectors for dialogue-act classification.
//!
//! Each EDU becomes a fixed set of named features computed from its text
//! and from its position within the enclosing turn and dialogue.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{is_edu, Document, Span, Unit};

use super::addressee::mentions;
use super::model::ModelError;

pub const TURN: &str = "Turn";
pub const DIALOGUE: &str = "Dialogue";
pub const EMITTER: &str = "Emitter";

/// Value of one feature.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Continuous(f64),
    Discrete(String),
}

impl FeatureValue {
    fn flag(value: bool) -> Self {
        Self::Discrete(if value { "True" } else { "False" }.to_string())
    }

    fn word(value: Option<&str>) -> Self {
        Self::Discrete(value.map_or_else(|| "?".to_string(), str::to_lowercase))
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continuous(v) => write!(f, "{}", v),
            Self::Discrete(v) => f.write_str(v),
        }
    }
}

/// Named feature values of one EDU.
pub type FeatureVector = BTreeMap<String, FeatureValue>;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\w']+|[^\w\s]+").unwrap());
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w").unwrap());
static EMOTICON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[:;=8][-o^']?[)(\]\[dDpPoO/\\|*@3]+|\^[_.]?\^|<3|[xX][dD]+|[oO]_[oO])$").unwrap()
});
static RESOURCE_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:clay|brick|ore|rock|stone|sheep|wool|wheat|grain|wood|lumber|timber)s?\b",
    )
    .unwrap()
});
static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:\d+|one|two|three|four|five|six|seven|eight|nine|ten)\b").unwrap()
});

/// Split text into word and punctuation tokens.
pub fn tokenize(text: &str) -> Vec<&str> {
    TOKEN.find_iter(text).map(|m| m.as_str()).collect()
}

/// A word list loaded from `<resources>/<name>.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexicon {
    pub name: String,
    words: HashSet<String>,
}

impl Lexicon {
    pub fn new<I, S>(name: impl Into<String>, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty() && !w.starts_with('#'))
                .collect(),
        }
    }

    /// Load every `*.txt` file of `dir` as a lexicon, sorted by name.
    pub fn load_dir(dir: &Path) -> Result<Vec<Lexicon>, ModelError> {
        let entries = fs::read_dir(dir).map_err(|source| ModelError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("txt"))
            .collect();
        paths.sort();

        let mut lexicons = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
                continue;
            };
            let contents = fs::read_to_string(&path).map_err(|source| ModelError::Io {
                path: path.clone(),
                source,
            })?;
            let lexicon = Lexicon::new(name, contents.lines());
            tracing::debug!("Loaded lexicon {} ({} words)", lexicon.name, lexicon.len());
            lexicons.push(lexicon);
        }
        Ok(lexicons)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Feature name, `lex_<name>`.
    pub fn feature_name(&self) -> String {
        format!("lex_{}", self.name)
    }

    /// Number of tokens that are lexicon words.
    pub fn count(&self, tokens: &[&str]) -> usize {
        tokens
            .iter()
            .filter(|t| self.words.contains(&t.to_lowercase()))
            .count()
    }
}

/// Turn and dialogue structure of a document.
#[derive(Debug, Clone)]
pub struct DocumentContext<'a> {
    turns: Vec<&'a Unit>,
    dialogues: Vec<&'a Unit>,
    edus: Vec<&'a Unit>,
    players: BTreeSet<String>,
}

/// Where an EDU sits in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EduContext {
    pub speaker: Option<String>,
    /// 1-based index among the EDUs of the enclosing turn.
    pub position_in_turn: usize,
    pub first_in_dialogue: bool,
}

fn enclosing<'a>(units: &[&'a Unit], span: Span) -> Option<&'a Unit> {
    units.iter().copied().find(|u| u.span.encloses(&span))
}

impl<'a> DocumentContext<'a> {
    pub fn new(doc: &'a Document) -> Self {
        let mut turns: Vec<&Unit> = doc.units.iter().filter(|u| u.is_type(TURN)).collect();
        let mut dialogues: Vec<&Unit> = doc.units.iter().filter(|u| u.is_type(DIALOGUE)).collect();
        let mut edus: Vec<&Unit> = doc.units.iter().filter(|u| is_edu(u)).collect();
        turns.sort_by_key(|u| u.span);
        dialogues.sort_by_key(|u| u.span);
        edus.sort_by_key(|u| u.span);

        let players = turns
            .iter()
            .filter_map(|t| t.features.get(EMITTER))
            .filter(|e| !e.is_empty())
            .map(String::from)
            .collect();

        Self {
            turns,
            dialogues,
            edus,
            players,
        }
    }

    /// Emitters of every turn in the document.
    pub fn players(&self) -> &BTreeSet<String> {
        &self.players
    }

    /// EDUs of the document in text order.
    pub fn edus(&self) -> &[&'a Unit] {
        &self.edus
    }

    pub fn edu_context(&self, edu: &Unit) -> EduContext {
        let turn = enclosing(&self.turns, edu.span);
        let speaker = turn
            .and_then(|t| t.features.get(EMITTER))
            .map(String::from);

        let position_in_turn = match turn {
            Some(t) => {
                self.edus
                    .iter()
                    .filter(|e| t.span.encloses(&e.span) && e.span < edu.span)
                    .count()
                    + 1
            }
            None => 1,
        };

        let first_in_dialogue = match enclosing(&self.dialogues, edu.span) {
            Some(d) => !self
                .edus
                .iter()
                .any(|e| d.span.encloses(&e.span) && e.span < edu.span),
            None => false,
        };

        EduContext {
            speaker,
            position_in_turn,
            first_in_dialogue,
        }
    }
}

/// Whether every token of `text` is an emoticon.
fn is_emoticon_only(text: &str) -> bool {
    let mut chunks = text.split_whitespace().peekable();
    chunks.peek().is_some() && chunks.all(|c| EMOTICON.is_match(c))
}

/// Compute the feature vector of one EDU.
pub fn extract_features(
    text: &str,
    context: &EduContext,
    players: &BTreeSet<String>,
    lexicons: &[Lexicon],
) -> FeatureVector {
    let tokens = tokenize(text);
    let words: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| WORD.is_match(t))
        .collect();
    let trimmed = text.trim_end();

    let mut features = FeatureVector::new();
    let mut set = |name: &str, value: FeatureValue| {
        features.insert(name.to_string(), value);
    };

    set("num_tokens", FeatureValue::Continuous(tokens.len() as f64));
    set("word_first", FeatureValue::word(words.first().copied()));
    set("word_last", FeatureValue::word(words.last().copied()));
    set("ends_with_qtn", FeatureValue::flag(trimmed.ends_with('?')));
    set("ends_with_bang", FeatureValue::flag(trimmed.ends_with('!')));
    set(
        "has_correction_star",
        FeatureValue::flag(text.split_whitespace().any(|c| c.starts_with('*') || c.ends_with('*'))),
    );
    set(
        "has_emoticons",
        FeatureValue::flag(text.split_whitespace().any(|c| EMOTICON.is_match(c))),
    );
    set("is_emoticon_only", FeatureValue::flag(is_emoticon_only(text)));
    set(
        "has_player_name",
        FeatureValue::flag(players.iter().any(|p| mentions(text, p))),
    );
    set("has_resource", FeatureValue::flag(RESOURCE_WORD.is_match(text)));
    set("has_number", FeatureValue::flag(NUMBER.is_match(text)));
    set(
        "position_in_turn",
        FeatureValue::Continuous(context.position_in_turn as f64),
    );
    set(
        "first_in_dialogue",
        FeatureValue::flag(context.first_in_dialogue),
    );
    for lexicon in lexicons {
        set(
            &lexicon.feature_name(),
            FeatureValue::Continuous(lexicon.count(&words) as f64),
        );
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnnoId, Features};

    fn turn(id: &str, span: Span, emitter: &str) -> Unit {
        let mut features = Features::new();
        features.insert(EMITTER, emitter);
        Unit::new(AnnoId::from(id), span, TURN).with_features(features)
    }

    fn no_context() -> EduContext {
        EduContext {
            speaker: None,
            position_in_turn: 1,
            first_in_dialogue: false,
        }
    }

    fn discrete(features: &FeatureVector, name: &str) -> String {
        match features.get(name) {
            Some(FeatureValue::Discrete(v)) => v.clone(),
            other => panic!("{} is {:?}", name, other),
        }
    }

    #[test]
    fn test_tokenize_splits_punctuation() {
        assert_eq!(tokenize("anyone got wood? :)"), vec!["anyone", "got", "wood", "?", ":)"]);
    }

    #[test]
    fn test_surface_features() {
        let players: BTreeSet<String> = ["Alice", "Bob"].iter().map(|s| s.to_string()).collect();
        let features = extract_features("Bob, anyone have 2 sheep?", &no_context(), &players, &[]);

        assert_eq!(features.get("num_tokens"), Some(&FeatureValue::Continuous(7.0)));
        assert_eq!(discrete(&features, "word_first"), "bob");
        assert_eq!(discrete(&features, "word_last"), "sheep");
        assert_eq!(discrete(&features, "ends_with_qtn"), "True");
        assert_eq!(discrete(&features, "ends_with_bang"), "False");
        assert_eq!(discrete(&features, "has_player_name"), "True");
        assert_eq!(discrete(&features, "has_resource"), "True");
        assert_eq!(discrete(&features, "has_number"), "True");
        assert_eq!(discrete(&features, "has_emoticons"), "False");
    }

    #[test]
    fn test_emoticon_and_correction_features() {
        let players = BTreeSet::new();
        let features = extract_features(":) ;)", &no_context(), &players, &[]);
        assert_eq!(discrete(&features, "is_emoticon_only"), "True");
        assert_eq!(discrete(&features, "word_first"), "?");

        let features = extract_features("*wheat", &no_context(), &players, &[]);
        assert_eq!(discrete(&features, "has_correction_star"), "True");
        assert_eq!(discrete(&features, "is_emoticon_only"), "False");
    }

    #[test]
    fn test_lexicon_counts() {
        let lexicon = Lexicon::new("greetings", ["hi", "Hello", "# comment", ""]);
        assert_eq!(lexicon.len(), 2);
        let features = extract_features("Hello hi there", &no_context(), &BTreeSet::new(), &[lexicon]);
        assert_eq!(features.get("lex_greetings"), Some(&FeatureValue::Continuous(2.0)));
    }

    #[test]
    fn test_document_context() {
        let mut doc = Document::new("hi all. wood? no.");
        doc.units.push(Unit::new(AnnoId::from("d"), Span::new(0, 17), DIALOGUE));
        doc.units.push(turn("t1", Span::new(0, 13), "Alice"));
        doc.units.push(turn("t2", Span::new(14, 17), "Bob"));
        doc.units.push(Unit::new(AnnoId::from("e1"), Span::new(0, 7), "Segment"));
        doc.units.push(Unit::new(AnnoId::from("e2"), Span::new(8, 13), "Segment"));
        doc.units.push(Unit::new(AnnoId::from("e3"), Span::new(14, 17), "Segment"));

        let context = DocumentContext::new(&doc);
        let players: Vec<&str> = context.players().iter().map(String::as_str).collect();
        assert_eq!(players, vec!["Alice", "Bob"]);
        assert_eq!(context.edus().len(), 3);

        let e2 = context.edu_context(doc.unit(&AnnoId::from("e2")).unwrap());
        assert_eq!(e2.speaker.as_deref(), Some("Alice"));
        assert_eq!(e2.position_in_turn, 2);
        assert!(!e2.first_in_dialogue);

        let e1 = context.edu_context(doc.unit(&AnnoId::from("e1")).unwrap());
        assert!(e1.first_in_dialogue);
        let e3 = context.edu_context(doc.unit(&AnnoId::from("e3")).unwrap());
        assert_eq!(e3.speaker.as_deref(), Some("Bob"));
        assert_eq!(e3.position_in_turn, 1);
    }

    #[test]
    fn test_load_lexicon_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("pronouns.txt"), "you\nme\n").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        let lexicons = Lexicon::load_dir(dir.path()).unwrap();
        assert_eq!(lexicons.len(), 1);
        assert_eq!(lexicons[0].feature_name(), "lex_pronouns");
    }
}
