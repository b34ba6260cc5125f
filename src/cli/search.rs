//! Index search command
//!
//! Looks a query up in a loaded symbol index and renders the matching
//! entries with every documented location.

use anyhow::{Context, Result};
use std::path::Path;

use crate::index::query::{MatchMode, MatchPolicy};
use crate::index::{Entry, SymbolIndex};

// ANSI color codes
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const PRIMARY: &str = "\x1b[38;2;100;181;246m";      // #64B5F6
    pub const SUCCESS: &str = "\x1b[38;2;165;214;167m";      // #A5D6A7
    pub const WARNING: &str = "\x1b[38;2;255;202;40m";       // #FFCA28
    pub const MUTED: &str = "\x1b[38;2;84;110;122m";         // #546E7A
    pub const FG: &str = "\x1b[38;2;212;212;215m";           // #D4D4D7
    pub const HIGHLIGHT: &str = "\x1b[38;2;255;183;77m";     // Orange highlight
}

mod symbols {
    pub const SEARCH: &str = "󰍉";
    pub const ANCHOR: &str = "󰌷";
    pub const MATCH: &str = "󰄬";
}

pub fn run(index_path: &Path, query: &str, policy: &MatchPolicy, limit: usize) -> Result<()> {
    print_header(query, index_path, policy.mode);

    let index = SymbolIndex::load(index_path)
        .with_context(|| format!("Failed to load index from {}", index_path.display()))?;

    if index.is_empty() {
        print_warning("Index is empty");
        return Ok(());
    }

    let mut results = index.lookup(query, policy);
    let total = results.len();
    results.truncate(limit);

    if results.is_empty() {
        print_no_results(query);
        return Ok(());
    }

    print_results(&results, total, query);

    Ok(())
}

fn print_header(query: &str, index_path: &Path, mode: MatchMode) {
    let mode_str = match mode {
        MatchMode::Prefix => "prefix",
        MatchMode::Substring => "substring",
        MatchMode::Fuzzy => "fuzzy",
    };

    println!();
    println!(
        "{}{}  {} Symbol Search{}",
        colors::PRIMARY, colors::BOLD, symbols::SEARCH, colors::RESET
    );
    println!(
        "{}  │ Query: {}\"{}\"{}",
        colors::MUTED, colors::HIGHLIGHT, query, colors::RESET
    );
    println!(
        "{}  │ Index: {} ({} match){}",
        colors::MUTED,
        index_path.display(),
        mode_str,
        colors::RESET
    );
    println!(
        "{}  ╰{}─{}",
        colors::MUTED, "─".repeat(50), colors::RESET
    );
    println!();
}

fn print_results(results: &[&Entry], total: usize, query: &str) {
    println!(
        "{}{}  {} Found {} matching entries for \"{}\"{}",
        colors::SUCCESS, colors::BOLD, symbols::MATCH,
        total, query, colors::RESET
    );
    println!();

    for (i, entry) in results.iter().enumerate() {
        println!(
            "{}  {}. {}{}{} {}({}){}",
            colors::MUTED,
            i + 1,
            colors::FG,
            entry.name,
            colors::RESET,
            colors::MUTED,
            entry.key,
            colors::RESET
        );

        for occ in &entry.occurrences {
            println!(
                "{}      {} {}{}",
                colors::MUTED,
                symbols::ANCHOR,
                occ.location(),
                colors::RESET
            );
            if occ.label != entry.name {
                println!("{}        {}{}", colors::MUTED, occ.label, colors::RESET);
            }
        }

        println!();
    }

    if total > results.len() {
        println!(
            "{}  … {} more; raise --limit to see them{}",
            colors::MUTED,
            total - results.len(),
            colors::RESET
        );
        println!();
    }
}

fn print_no_results(query: &str) {
    println!(
        "{}  {} No entries match \"{}\"{}",
        colors::WARNING, symbols::SEARCH, query, colors::RESET
    );
    println!();
    println!(
        "{}  Try:{}",
        colors::MUTED, colors::RESET
    );
    println!(
        "{}  • A shorter prefix (e.g., 'op' instead of 'operator'){}",
        colors::MUTED, colors::RESET
    );
    println!(
        "{}  • --mode substring or --mode fuzzy{}",
        colors::MUTED, colors::RESET
    );
    println!();
}

fn print_warning(message: &str) {
    println!(
        "{}  {} {}{}",
        colors::WARNING, symbols::SEARCH, message, colors::RESET
    );
}
