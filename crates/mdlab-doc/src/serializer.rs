//! Writes a cell sequence back to markdown.

use crate::cell::{Cell, CellKind, split_fence_info};
use crate::lang::{abbreviation, canonical_language};
use crate::parser::OUTPUT_FENCE_TAG;

/// Render cells as markdown.
///
/// For any document made of well-formed fences,
/// `serialize(&parse(text)) == text` once blank lines at the start of the
/// document are dropped.
pub fn serialize(cells: &[Cell]) -> String {
    let mut out = String::new();

    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push('\n');
            out.push_str(&cell.leading_whitespace);
        }

        match cell.kind {
            CellKind::Prose => out.push_str(cell.content.trim_matches(['\n', '\r'])),
            CellKind::Code => write_code_cell(&mut out, cell),
        }
    }

    if let Some(last) = cells.last() {
        out.push_str(&last.trailing_whitespace);
    }

    out
}

fn write_code_cell(out: &mut String, cell: &Cell) {
    out.push_str(&cell.indent);
    out.push_str("```");
    out.push_str(&fence_info(cell));
    out.push('\n');
    if !cell.content.is_empty() || cell.blank_body {
        out.push_str(&cell.content);
        out.push('\n');
    }
    out.push_str(&cell.indent);
    out.push_str("```");

    if let Some(output) = cell.captured_output.as_deref().filter(|o| !o.is_empty()) {
        out.push_str("\n\n");
        out.push_str(&cell.output_indent);
        out.push_str("```");
        out.push_str(OUTPUT_FENCE_TAG);
        out.push('\n');
        out.push_str(output);
        if !output.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&cell.output_indent);
        out.push_str("```");
    }
}

/// The fence info string for a code cell.
///
/// Reuses the tag as it was written when it still describes the cell;
/// otherwise builds `<abbrev> :<directive>`.
fn fence_info(cell: &Cell) -> String {
    let language = cell.language().unwrap_or_default();

    if let Some(info) = &cell.fence_info {
        let (tag, directive) = split_fence_info(info);
        if canonical_language(tag) == language && directive == cell.directive {
            return info.clone();
        }
    }

    let mut info = abbreviation(language).to_string();
    if let Some(directive) = &cell.directive {
        info.push_str(" :");
        info.push_str(&directive.to_string());
    }
    info
}
