//! Character spans over a document's raw text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Half-open character range `[start, end)`.
///
/// Offsets count Unicode scalar values, which is how Glozz positions
/// annotations in the `.ac` text, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a span, swapping the bounds if they are given backwards.
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies entirely within this span.
    pub fn encloses(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether the two spans share at least one character.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Smallest span covering both.
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Move the span right by `offset` characters.
    pub fn shift(&self, offset: usize) -> Span {
        Span {
            start: self.start + offset,
            end: self.end + offset,
        }
    }

    /// Smallest span covering every span in the iterator, or `None` if empty.
    pub fn enclosing<'a, I>(spans: I) -> Option<Span>
    where
        I: IntoIterator<Item = &'a Span>,
    {
        spans.into_iter().fold(None, |acc: Option<Span>, s| {
            Some(match acc {
                Some(a) => a.merge(s),
                None => *s,
            })
        })
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.start, self.end)
    }
}

/// Parses the command-line form `START,END`.
impl FromStr for Span {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (left, right) = s
            .split_once(',')
            .ok_or_else(|| format!("expected START,END but got '{}'", s))?;
        let start = left
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("bad span start '{}': {}", left, e))?;
        let end = right
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("bad span end '{}': {}", right, e))?;
        if start > end {
            return Err(format!("span start {} is after end {}", start, end));
        }
        Ok(Span { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comma_span() {
        assert_eq!("3,10".parse::<Span>().unwrap(), Span::new(3, 10));
        assert_eq!(" 3 , 10 ".parse::<Span>().unwrap(), Span::new(3, 10));
        assert!("3-10".parse::<Span>().is_err());
        assert!("10,3".parse::<Span>().is_err());
        assert!("a,3".parse::<Span>().is_err());
    }

    #[test]
    fn test_enclosing() {
        let spans = [Span::new(20, 35), Span::new(10, 20)];
        assert_eq!(Span::enclosing(&spans), Some(Span::new(10, 35)));
        assert_eq!(Span::enclosing(&[]), None);
    }

    #[test]
    fn test_overlap_and_enclosure() {
        let outer = Span::new(0, 10);
        assert!(outer.encloses(&Span::new(2, 10)));
        assert!(!outer.encloses(&Span::new(2, 11)));
        assert!(Span::new(0, 5).overlaps(&Span::new(4, 6)));
        // Adjacent spans share a boundary but no character.
        assert!(!Span::new(0, 5).overlaps(&Span::new(5, 6)));
    }
}
