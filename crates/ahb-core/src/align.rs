//! Alignment of two key-column sequences
//!
//! The alignment walks the previous and subsequent key sequences with one
//! cursor each. On a mismatch it searches forward in the *subsequent*
//! sequence only, re-synchronizing on the previous cursor's key; it never
//! looks ahead in the previous sequence. The result is greedy and
//! order-dependent: a key that moved backwards shows up as a removal plus
//! an addition rather than a move, and with duplicate keys the first
//! forward match wins.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// How key values are compared during alignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMatching {
    /// Keys must be byte-identical
    #[default]
    Exact,
    /// All whitespace is removed before comparing; emitted values keep it
    IgnoreWhitespace,
}

impl KeyMatching {
    fn normalize<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match self {
            KeyMatching::Exact => Cow::Borrowed(key),
            KeyMatching::IgnoreWhitespace if key.chars().any(char::is_whitespace) => {
                Cow::Owned(key.chars().filter(|c| !c.is_whitespace()).collect())
            }
            KeyMatching::IgnoreWhitespace => Cow::Borrowed(key),
        }
    }
}

/// Diff tag carried by every merged row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffTag {
    Unchanged,
    New,
    Removed,
}

impl DiffTag {
    /// Text written to the `diff` column
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffTag::Unchanged => "",
            DiffTag::New => "NEW",
            DiffTag::Removed => "REMOVED",
        }
    }
}

impl fmt::Display for DiffTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One alignment decision, referring to rows by index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// `previous[previous]` and `subsequent[subsequent]` carry the same key
    Unchanged { previous: usize, subsequent: usize },
    /// `subsequent[subsequent]` has no counterpart
    New { subsequent: usize },
    /// `previous[previous]` has no counterpart
    Removed { previous: usize },
}

impl Alignment {
    pub fn diff_tag(&self) -> DiffTag {
        match self {
            Alignment::Unchanged { .. } => DiffTag::Unchanged,
            Alignment::New { .. } => DiffTag::New,
            Alignment::Removed { .. } => DiffTag::Removed,
        }
    }

    /// Index of the contributing previous row, if any
    pub fn previous(&self) -> Option<usize> {
        match *self {
            Alignment::Unchanged { previous, .. } | Alignment::Removed { previous } => Some(previous),
            Alignment::New { .. } => None,
        }
    }

    /// Index of the contributing subsequent row, if any
    pub fn subsequent(&self) -> Option<usize> {
        match *self {
            Alignment::Unchanged { subsequent, .. } | Alignment::New { subsequent } => {
                Some(subsequent)
            }
            Alignment::Removed { .. } => None,
        }
    }
}

/// Align two key sequences
///
/// Every index of both inputs appears in exactly one decision, and each
/// side's indices appear in ascending order.
pub fn align<S: AsRef<str>>(
    previous: &[S],
    subsequent: &[S],
    matching: KeyMatching,
) -> Vec<Alignment> {
    let prev: Vec<Cow<'_, str>> = previous
        .iter()
        .map(|k| matching.normalize(k.as_ref()))
        .collect();
    let next: Vec<Cow<'_, str>> = subsequent
        .iter()
        .map(|k| matching.normalize(k.as_ref()))
        .collect();

    let mut decisions = Vec::with_capacity(prev.len().max(next.len()));
    let (mut i, mut j) = (0, 0);

    while i < prev.len() || j < next.len() {
        if i >= prev.len() {
            decisions.push(Alignment::New { subsequent: j });
            j += 1;
        } else if j >= next.len() {
            decisions.push(Alignment::Removed { previous: i });
            i += 1;
        } else if prev[i] == next[j] {
            decisions.push(Alignment::Unchanged {
                previous: i,
                subsequent: j,
            });
            i += 1;
            j += 1;
        } else {
            match next[j..].iter().position(|k| *k == prev[i]) {
                Some(offset) => {
                    // offset > 0 here, the equal case was handled above
                    decisions.extend((j..j + offset).map(|s| Alignment::New { subsequent: s }));
                    j += offset;
                }
                None => {
                    decisions.push(Alignment::Removed { previous: i });
                    i += 1;
                }
            }
        }
    }

    decisions
}
