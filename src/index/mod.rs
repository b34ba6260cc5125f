//! In-memory symbol search index
//!
//! Loads the search tables emitted by a documentation generator into an
//! ordered, immutable index and answers lookups over it. Supported inputs
//! are a single Doxygen-style `*.js` shard, a JSON export produced by
//! `doxidx convert`, or a whole generated `search/` directory.

pub mod doxygen;
pub mod query;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::index::query::MatchPolicy;

/// A single documented location of a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Human-readable qualified context, e.g. `File::open(const char *path)`.
    pub label: String,
    /// Target page path, relative to the documentation root.
    pub page: String,
    /// In-page anchor id.
    pub anchor: String,
}

impl Occurrence {
    /// Location in `page#anchor` form, as the search widget links it.
    pub fn location(&self) -> String {
        format!("{}#{}", self.page, self.anchor)
    }
}

/// One index entry: a normalized key plus every place the symbol is
/// documented. Keys are plain strings; the generator's escaping scheme
/// (e.g. `operator_3c_3c`) carries no extra semantics here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    /// Display name shown in results (original casing, decoded entities).
    pub name: String,
    pub occurrences: Vec<Occurrence>,
}

/// A malformed record found while loading. The record is skipped and
/// loading continues; defects are surfaced by `doxidx validate`.
#[derive(Debug, Clone)]
pub struct Defect {
    pub key: String,
    pub message: String,
}

/// Errors that make an index file unusable as a whole. Individual bad
/// entries are not errors; they become [`Defect`]s instead.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Syntax {
        path: PathBuf,
        #[source]
        source: doxygen::ParseError,
    },

    #[error("{}: invalid JSON export", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unrecognized index format: {} (expected .js, .json, or a directory)", .0.display())]
    UnknownFormat(PathBuf),

    #[error("no index shards found under {}", .0.display())]
    NoShards(PathBuf),
}

/// Summary statistics for a loaded index.
#[derive(Debug)]
pub struct IndexStats {
    pub entries: usize,
    pub occurrences: usize,
    pub pages: usize,
    /// Key and occurrence count of the entry with the most occurrences.
    pub largest: Option<(String, usize)>,
}

/// The symbol index table. Built once by a loader, immutable afterwards;
/// shared reads need no synchronization.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    entries: Vec<Entry>,
    defects: Vec<Defect>,
}

impl SymbolIndex {
    /// Build an index from already-decoded entries, skipping malformed
    /// ones. Entry order is preserved.
    pub fn from_entries(raw: Vec<Entry>) -> Self {
        let mut entries = Vec::with_capacity(raw.len());
        let mut defects = Vec::new();

        for mut entry in raw {
            if entry.key.is_empty() {
                defects.push(Defect {
                    key: entry.name.clone(),
                    message: "empty key".to_string(),
                });
                continue;
            }

            let before = entry.occurrences.len();
            entry
                .occurrences
                .retain(|o| !o.page.is_empty() && !o.anchor.is_empty());
            if entry.occurrences.len() < before {
                defects.push(Defect {
                    key: entry.key.clone(),
                    message: "occurrence missing page or anchor".to_string(),
                });
            }

            if entry.occurrences.is_empty() {
                defects.push(Defect {
                    key: entry.key.clone(),
                    message: "no occurrences".to_string(),
                });
                continue;
            }

            if entry.name.is_empty() {
                entry.name = entry.key.clone();
            }

            entries.push(entry);
        }

        Self { entries, defects }
    }

    /// Load an index from a shard file, a JSON export, or a generated
    /// `search/` directory.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        if path.is_dir() {
            Self::load_dir(path)
        } else {
            Self::load_file(path)
        }
    }

    /// Load a single index file, dispatching on extension.
    pub fn load_file(path: &Path) -> Result<Self, IndexError> {
        let content = fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let index = match ext {
            "js" => {
                let table = doxygen::parse(&content).map_err(|source| IndexError::Syntax {
                    path: path.to_path_buf(),
                    source,
                })?;
                let mut index = Self::from_entries(table.entries);
                let mut defects = table.defects;
                defects.append(&mut index.defects);
                index.defects = defects;
                index
            }
            "json" => {
                let raw: Vec<Entry> =
                    serde_json::from_str(&content).map_err(|source| IndexError::Json {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Self::from_entries(raw)
            }
            _ => return Err(IndexError::UnknownFormat(path.to_path_buf())),
        };

        if !index.defects.is_empty() {
            warn!(
                "{}: skipped {} malformed record(s)",
                path.display(),
                index.defects.len()
            );
        }
        debug!("{}: loaded {} entries", path.display(), index.entries.len());

        Ok(index)
    }

    /// Load and merge every shard under a generated `search/` directory.
    /// Shards merge in sorted-filename order, each keeping its own entry
    /// order, so the merged table is deterministic.
    fn load_dir(dir: &Path) -> Result<Self, IndexError> {
        let shards = shard_files(dir);
        if shards.is_empty() {
            return Err(IndexError::NoShards(dir.to_path_buf()));
        }

        let mut merged = Self::default();
        for shard in &shards {
            let mut index = Self::load_file(shard)?;
            merged.entries.append(&mut index.entries);
            merged.defects.append(&mut index.defects);
        }
        Ok(merged)
    }

    /// Look the query up according to the given policy. Cannot fail; an
    /// unmatched query yields an empty sequence.
    pub fn lookup(&self, query: &str, policy: &MatchPolicy) -> Vec<&Entry> {
        query::lookup(&self.entries, query, policy)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn defects(&self) -> &[Defect] {
        &self.defects
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        let occurrences = self.entries.iter().map(|e| e.occurrences.len()).sum();
        let pages: BTreeSet<&str> = self
            .entries
            .iter()
            .flat_map(|e| e.occurrences.iter().map(|o| o.page.as_str()))
            .collect();
        let largest = self
            .entries
            .iter()
            .max_by_key(|e| e.occurrences.len())
            .map(|e| (e.key.clone(), e.occurrences.len()));

        IndexStats {
            entries: self.entries.len(),
            occurrences,
            pages: pages.len(),
            largest,
        }
    }
}

/// Index shards under a generated search directory, sorted by path.
/// `search.js` (the widget script) and `searchdata.js` (section metadata)
/// are not tables and are skipped.
pub fn shard_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension().is_some_and(|ext| ext == "js")
                && p.file_name()
                    .is_some_and(|n| n != "search.js" && n != "searchdata.js")
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::query::MatchPolicy;

    impl SymbolIndex {
        /// Exact-key lookup, as a convenience for assertions.
        fn get(&self, key: &str) -> Option<&Entry> {
            self.entries.iter().find(|e| e.key == key)
        }
    }

    fn entry(key: &str, occurrences: &[(&str, &str, &str)]) -> Entry {
        Entry {
            key: key.to_string(),
            name: key.to_string(),
            occurrences: occurrences
                .iter()
                .map(|(label, page, anchor)| Occurrence {
                    label: label.to_string(),
                    page: page.to_string(),
                    anchor: anchor.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn from_entries_drops_malformed_records() {
        let raw = vec![
            entry("open", &[("open", "page_a.html", "anchor1")]),
            entry("ghost", &[]),
            entry("half", &[("half", "", "anchor2")]),
        ];

        let index = SymbolIndex::from_entries(raw);

        assert_eq!(index.len(), 1);
        assert!(index.get("open").is_some());
        assert!(index.get("ghost").is_none());
        // one defect for the dropped occurrence, one for the emptied entry
        assert_eq!(index.defects().len(), 3);
    }

    #[test]
    fn every_loaded_entry_has_occurrences() {
        let raw = vec![
            entry("a", &[("a", "a.html", "x")]),
            entry("b", &[]),
            entry("c", &[("c", "c.html", "y"), ("c", "c.html", "z")]),
        ];

        let index = SymbolIndex::from_entries(raw);
        assert!(index.entries().iter().all(|e| !e.occurrences.is_empty()));
    }

    #[test]
    fn exact_lookup_returns_all_occurrences_in_order() {
        let index = SymbolIndex::from_entries(vec![entry(
            "open",
            &[("open", "page_a.html", "anchor1"), ("open", "page_a.html", "anchor2")],
        )]);

        let results = index.lookup("open", &MatchPolicy::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].occurrences.len(), 2);
        assert_eq!(results[0].occurrences[0].anchor, "anchor1");
        assert_eq!(results[0].occurrences[1].anchor, "anchor2");

        assert!(index.lookup("xyz-not-present", &MatchPolicy::default()).is_empty());
    }

    #[test]
    fn json_round_trip_preserves_entry_order() {
        let index = SymbolIndex::from_entries(vec![
            entry("zeta", &[("zeta", "z.html", "a1")]),
            entry("alpha", &[("alpha", "a.html", "a2")]),
            entry("mid", &[("mid", "m.html", "a3"), ("mid()", "m.html", "a4")]),
        ]);

        let json = serde_json::to_string(index.entries()).unwrap();
        let reparsed: Vec<Entry> = serde_json::from_str(&json).unwrap();

        assert_eq!(reparsed, index.entries());
    }

    #[test]
    fn stats_count_entries_occurrences_and_pages() {
        let index = SymbolIndex::from_entries(vec![
            entry("a", &[("a", "one.html", "x"), ("a", "two.html", "y")]),
            entry("b", &[("b", "one.html", "z")]),
        ]);

        let stats = index.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.occurrences, 3);
        assert_eq!(stats.pages, 2);
        assert_eq!(stats.largest, Some(("a".to_string(), 2)));
    }

    #[test]
    fn shard_files_skips_widget_scripts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("functions_0.js"), "[]").unwrap();
        std::fs::write(dir.path().join("classes_0.js"), "[]").unwrap();
        std::fs::write(dir.path().join("search.js"), "// widget").unwrap();
        std::fs::write(dir.path().join("nomatches.html"), "<html>").unwrap();

        let shards = shard_files(dir.path());
        let names: Vec<_> = shards
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, ["classes_0.js", "functions_0.js"]);
    }
}
