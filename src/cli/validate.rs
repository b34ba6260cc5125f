//! Index validation command
//!
//! Checks the invariants the generator is supposed to uphold: every entry
//! has at least one occurrence, anchor references are well formed, and keys
//! are unique within each table. Uniqueness is checked per shard, not
//! across a merged directory, because the generator legitimately reuses a
//! key in several shards.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::index::{shard_files, SymbolIndex};

mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const SUCCESS: &str = "\x1b[38;2;165;214;167m";      // #A5D6A7
    pub const ERROR: &str = "\x1b[38;2;239;154;154m";        // #EF9A9A
    pub const MUTED: &str = "\x1b[38;2;84;110;122m";         // #546E7A
}

/// Returns `true` when every table passed every check.
pub fn run(index_path: &Path) -> Result<bool> {
    let tables: Vec<PathBuf> = if index_path.is_dir() {
        shard_files(index_path)
    } else {
        vec![index_path.to_path_buf()]
    };

    if tables.is_empty() {
        anyhow::bail!("no index shards found under {}", index_path.display());
    }

    println!();
    let mut total_defects = 0;
    for table_path in &tables {
        total_defects += validate_table(table_path)?;
    }

    println!();
    if total_defects == 0 {
        println!(
            "{}{}  ✓ {} table(s) valid{}",
            colors::SUCCESS,
            colors::BOLD,
            tables.len(),
            colors::RESET
        );
    } else {
        println!(
            "{}{}  ✗ {} defect(s) across {} table(s){}",
            colors::ERROR,
            colors::BOLD,
            total_defects,
            tables.len(),
            colors::RESET
        );
    }
    println!();

    Ok(total_defects == 0)
}

fn validate_table(path: &Path) -> Result<usize> {
    let index = SymbolIndex::load_file(path)
        .with_context(|| format!("Failed to load index from {}", path.display()))?;

    let mut messages: Vec<String> = index
        .defects()
        .iter()
        .map(|d| format!("{}: {}", d.key, d.message))
        .collect();

    // keys must be unique within one table
    let mut seen = HashSet::new();
    for entry in index.entries() {
        if !seen.insert(entry.key.as_str()) {
            messages.push(format!("{}: duplicate key", entry.key));
        }
    }

    if messages.is_empty() {
        println!(
            "{}  ✓ {} ({} entries){}",
            colors::SUCCESS,
            path.display(),
            index.len(),
            colors::RESET
        );
    } else {
        println!(
            "{}  ✗ {}{}",
            colors::ERROR,
            path.display(),
            colors::RESET
        );
        for message in &messages {
            println!("{}      {}{}", colors::MUTED, message, colors::RESET);
        }
    }

    Ok(messages.len())
}
