//! Lookup policies over the entry table
//!
//! The table itself carries no match policy; the consumer owns it. Prefix
//! and substring matching keep table order, fuzzy matching orders by score
//! with table order as the tie-break, so every mode is deterministic.

use clap::ValueEnum;
use nucleo::pattern::{Atom, AtomKind, CaseMatching};
use nucleo::{Config, Matcher, Utf32Str};
use serde::{Deserialize, Serialize};

use super::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Prefix,
    Substring,
    Fuzzy,
}

/// How a query is matched against entry keys.
#[derive(Debug, Clone)]
pub struct MatchPolicy {
    pub mode: MatchMode,
    pub case_sensitive: bool,
    /// Whether the empty query matches every entry. On by default: the
    /// reference consumer is an incremental search box, and an empty box
    /// showing the full table is the useful degenerate case.
    pub empty_matches_all: bool,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            mode: MatchMode::Prefix,
            case_sensitive: false,
            empty_matches_all: true,
        }
    }
}

/// Look `query` up in `entries` under `policy`. Returns borrowed entries;
/// each carries its full occurrence sequence.
pub fn lookup<'a>(entries: &'a [Entry], query: &str, policy: &MatchPolicy) -> Vec<&'a Entry> {
    if query.is_empty() {
        return if policy.empty_matches_all {
            entries.iter().collect()
        } else {
            Vec::new()
        };
    }

    match policy.mode {
        MatchMode::Fuzzy => fuzzy(entries, query, policy.case_sensitive),
        mode => {
            let needle = if policy.case_sensitive {
                query.to_string()
            } else {
                query.to_lowercase()
            };
            entries
                .iter()
                .filter(|entry| {
                    let key = if policy.case_sensitive {
                        std::borrow::Cow::Borrowed(entry.key.as_str())
                    } else {
                        std::borrow::Cow::Owned(entry.key.to_lowercase())
                    };
                    match mode {
                        MatchMode::Prefix => key.starts_with(needle.as_str()),
                        _ => key.contains(needle.as_str()),
                    }
                })
                .collect()
        }
    }
}

fn fuzzy<'a>(entries: &'a [Entry], query: &str, case_sensitive: bool) -> Vec<&'a Entry> {
    let case = if case_sensitive {
        CaseMatching::Respect
    } else {
        CaseMatching::Ignore
    };
    let atom = Atom::new(query, case, AtomKind::Fuzzy, false);
    let mut matcher = Matcher::new(Config::DEFAULT);
    let mut buf = Vec::new();

    let mut scored: Vec<(u16, usize)> = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let haystack = Utf32Str::new(&entry.key, &mut buf);
        if let Some(score) = atom.score(haystack, &mut matcher) {
            scored.push((score, i));
        }
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, i)| &entries[i]).collect()
}
