//! Index conversion command
//!
//! Re-serializes a loaded index. JSON is the interchange format (entries in
//! table order, round-trip safe); `js` writes the generator's own shard
//! format back out.

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::fs;
use std::path::Path;

use crate::index::{doxygen, SymbolIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Js,
}

pub fn run(index_path: &Path, output: Option<&Path>, format: Format) -> Result<()> {
    let index = SymbolIndex::load(index_path)
        .with_context(|| format!("Failed to load index from {}", index_path.display()))?;

    let rendered = match format {
        Format::Json => {
            let mut json = serde_json::to_string_pretty(index.entries())
                .context("Failed to serialize index")?;
            json.push('\n');
            json
        }
        Format::Js => doxygen::emit(index.entries()),
    };

    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Wrote {} entries to {}",
                index.len(),
                path.display()
            );
        }
        None => print!("{}", rendered),
    }

    Ok(())
}
