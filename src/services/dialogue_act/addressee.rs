//! Heuristic addressee guessing.

use std::collections::BTreeSet;

use regex::Regex;

/// Whether `text` mentions `name` as a whole word, ignoring case.
pub fn mentions(text: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    match Regex::new(&format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(name))) {
        Ok(re) => re.is_match(text),
        Err(_) => text.to_lowercase().contains(&name.to_lowercase()),
    }
}

/// Players other than the speaker that the text names, joined by `; `,
/// or `?` when nobody is named.
pub fn guess_addressee(text: &str, speaker: Option<&str>, players: &BTreeSet<String>) -> String {
    let named: Vec<&str> = players
        .iter()
        .map(String::as_str)
        .filter(|p| Some(*p) != speaker)
        .filter(|p| mentions(text, p))
        .collect();
    if named.is_empty() {
        "?".to_string()
    } else {
        named.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players() -> BTreeSet<String> {
        ["Alice", "Bob", "Carol"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_names_other_players() {
        assert_eq!(
            guess_addressee("carol, bob: wood for sheep?", Some("Alice"), &players()),
            "Bob; Carol"
        );
    }

    #[test]
    fn test_speaker_is_not_an_addressee() {
        assert_eq!(guess_addressee("Alice needs ore", Some("Alice"), &players()), "?");
    }

    #[test]
    fn test_whole_word_match_only() {
        assert!(!mentions("Bobby has wheat", "Bob"));
        assert!(mentions("thanks Bob!", "Bob"));
        assert!(!mentions("anything", ""));
    }
}
