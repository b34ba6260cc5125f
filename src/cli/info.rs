//! Index statistics command

use anyhow::{Context, Result};
use std::path::Path;

use crate::index::SymbolIndex;

mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const PRIMARY: &str = "\x1b[38;2;100;181;246m";      // #64B5F6
    pub const MUTED: &str = "\x1b[38;2;84;110;122m";         // #546E7A
    pub const FG: &str = "\x1b[38;2;212;212;215m";           // #D4D4D7
    pub const WARNING: &str = "\x1b[38;2;255;245;157m";      // #FFF59D
}

pub fn run(index_path: &Path) -> Result<()> {
    let index = SymbolIndex::load(index_path)
        .with_context(|| format!("Failed to load index from {}", index_path.display()))?;
    let stats = index.stats();

    println!();
    println!(
        "{}{}  Symbol Index — {}{}",
        colors::PRIMARY,
        colors::BOLD,
        index_path.display(),
        colors::RESET
    );
    println!("{}  {}{}", colors::MUTED, "─".repeat(50), colors::RESET);
    print_stat("Entries", &stats.entries.to_string());
    print_stat("Occurrences", &stats.occurrences.to_string());
    print_stat("Distinct pages", &stats.pages.to_string());
    if let Some((key, count)) = &stats.largest {
        print_stat("Largest entry", &format!("{} ({} occurrences)", key, count));
    }

    if !index.defects().is_empty() {
        println!(
            "{}  Skipped records:   {}{}{}",
            colors::MUTED,
            colors::WARNING,
            index.defects().len(),
            colors::RESET
        );
    }
    println!();

    Ok(())
}

fn print_stat(label: &str, value: &str) {
    println!(
        "{}  {:<18} {}{}{}",
        colors::MUTED,
        format!("{}:", label),
        colors::FG,
        value,
        colors::RESET
    );
}
