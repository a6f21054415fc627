//! Fmt command implementation for mdlab CLI.

use std::fs;
use std::path::Path;

use crate::colors;

/// Execute the fmt command.
pub fn execute(document: &Path, check: bool) -> anyhow::Result<()> {
    let text = fs::read_to_string(document)?;
    let formatted = mdlab_doc::serialize(&mdlab_doc::parse(&text));

    if formatted == text {
        println!("{}{} is canonical{}", colors::GREEN, document.display(), colors::RESET);
        return Ok(());
    }

    if check {
        anyhow::bail!("{} is not in canonical form", document.display());
    }

    fs::write(document, formatted)?;
    println!("{}Formatted{} {}", colors::GREEN, colors::RESET, document.display());
    Ok(())
}
