//! Parser for mdlab markdown notebooks.
//!
//! Splits a document into prose and code cells while recording enough of the
//! surrounding layout (blank-line runs, fence indentation, the fence tag as
//! written) for [`serialize`](crate::serialize) to reproduce the text.

use crate::cell::{Cell, CellKind, split_fence_info};
use crate::lang::canonical_language;

/// Fence tag of a captured output block.
pub const OUTPUT_FENCE_TAG: &str = "text";

const FENCE: &str = "```";

/// Parser for markdown notebooks.
pub struct DocumentParser {
    // Reserved for future configuration
}

/// An opening fence line split into its parts.
struct FenceOpener<'a> {
    indent: &'a str,
    info: &'a str,
}

impl DocumentParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self {}
    }

    /// Parse document text into cells.
    ///
    /// Never fails: text that is not a recognizable fence ends up in prose cells.
    pub fn parse(&self, text: &str) -> Vec<Cell> {
        let lines: Vec<&str> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();

        let mut cells: Vec<Cell> = Vec::new();
        if lines.len() < 2 {
            return cells;
        }

        // Blank lines at the very start of the document are not attributed.
        let mut cursor = blank_run_end(&lines, 0);
        let mut leading = String::new();

        while cursor < lines.len() {
            cursor = match parse_fence_opener(lines[cursor]) {
                Some(opener) => self.parse_code_block(&lines, cursor, opener, &leading, &mut cells),
                None => self.parse_prose(&lines, cursor, &leading, &mut cells),
            };

            let run_end = blank_run_end(&lines, cursor);
            let blanks = "\n".repeat(run_end - cursor);
            cursor = run_end;

            if cursor >= lines.len() {
                if let Some(last) = cells.last_mut() {
                    last.trailing_whitespace = blanks;
                }
            } else {
                leading = blanks;
            }
        }

        tracing::debug!("Parsed document into {} cells", cells.len());
        cells
    }

    /// Parse a fenced block starting at `start`, returning the line after it.
    fn parse_code_block(
        &self,
        lines: &[&str],
        start: usize,
        opener: FenceOpener<'_>,
        leading: &str,
        cells: &mut Vec<Cell>,
    ) -> usize {
        let body_start = start + 1;
        let mut body_end = body_start;
        while body_end < lines.len() && !is_fence_closer(lines[body_end]) {
            body_end += 1;
        }

        // An unterminated fence runs to the end of the document.
        let next = (body_end + 1).min(lines.len());
        let body = &lines[body_start..body_end];

        let (tag, directive) = split_fence_info(opener.info);

        if tag == OUTPUT_FENCE_TAG
            && let Some(previous) = cells.last_mut()
            && accepts_output(previous)
        {
            let mut output = String::new();
            for line in body {
                output.push_str(line);
                output.push('\n');
            }
            previous.captured_output = Some(output);
            previous.output_indent = opener.indent.to_string();
            return next;
        }

        cells.push(Cell {
            kind: CellKind::Code,
            language: Some(canonical_language(tag).to_string()),
            directive,
            content: body.join("\n"),
            leading_whitespace: leading.to_string(),
            trailing_whitespace: String::new(),
            captured_output: None,
            indent: opener.indent.to_string(),
            output_indent: String::new(),
            blank_body: body.len() == 1 && body[0].is_empty(),
            fence_info: Some(opener.info.to_string()),
        });

        next
    }

    /// Parse prose up to the next fence opener, returning the line after its
    /// last non-blank line.
    fn parse_prose(
        &self,
        lines: &[&str],
        start: usize,
        leading: &str,
        cells: &mut Vec<Cell>,
    ) -> usize {
        let mut end = start;
        while end < lines.len() && parse_fence_opener(lines[end]).is_none() {
            end += 1;
        }

        // Blank lines before the next fence belong to the following cell.
        while end > start && lines[end - 1].is_empty() {
            end -= 1;
        }

        let content = lines[start..end].join("\n");
        if !content.trim().is_empty() {
            cells.push(Cell {
                leading_whitespace: leading.to_string(),
                ..Cell::prose(content)
            });
        }

        end
    }
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a `text` fence directly after this cell is its output.
fn accepts_output(cell: &Cell) -> bool {
    cell.is_code()
        && cell.language() != Some(OUTPUT_FENCE_TAG)
        && cell.captured_output.is_none()
}

/// Index of the first non-empty line at or after `start`.
fn blank_run_end(lines: &[&str], start: usize) -> usize {
    let mut end = start;
    while end < lines.len() && lines[end].is_empty() {
        end += 1;
    }
    end
}

/// Match an opening fence: optional tab or 4-space indent, three backticks and a tag.
fn parse_fence_opener(line: &str) -> Option<FenceOpener<'_>> {
    let (indent, rest) = if let Some(rest) = line.strip_prefix("    ") {
        ("    ", rest)
    } else if let Some(rest) = line.strip_prefix('\t') {
        ("\t", rest)
    } else {
        ("", line)
    };

    let info = rest.strip_prefix(FENCE)?;
    if info.trim().is_empty() {
        return None;
    }

    Some(FenceOpener { indent, info })
}

fn is_fence_closer(line: &str) -> bool {
    line.trim_start().starts_with(FENCE)
}
