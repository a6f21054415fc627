//! List command implementation for mdlab CLI.

use std::path::Path;

use mdlab_doc::{Cell, CellKind};

use crate::colors;

/// Execute the list command.
pub fn execute(document: &Path) -> anyhow::Result<()> {
    let cells = mdlab_doc::read_document(document)?;

    if cells.is_empty() {
        println!("{}No cells found.{}", colors::YELLOW, colors::RESET);
        return Ok(());
    }

    for (position, cell) in cells.iter().enumerate() {
        println!("{}", describe(position, cell));
    }
    Ok(())
}

/// One line per cell: position, kind, language, directive and a preview.
fn describe(position: usize, cell: &Cell) -> String {
    let preview = cell.content.lines().next().unwrap_or_default();
    let preview: String = preview.chars().take(50).collect();

    match cell.kind {
        CellKind::Prose => format!("{:>3}  prose  {}{}{}", position, colors::DIM, preview, colors::RESET),
        CellKind::Code => {
            let directive = cell
                .directive
                .as_ref()
                .map(|d| format!(" :{}", d))
                .unwrap_or_default();
            let output = if cell.captured_output.is_some() {
                " [output]"
            } else {
                ""
            };
            format!(
                "{:>3}  code   {}{}{}{}{}  {}",
                position,
                colors::CYAN,
                cell.language().unwrap_or_default(),
                directive,
                colors::RESET,
                output,
                preview
            )
        }
    }
}
