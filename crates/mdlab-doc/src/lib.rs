//! Document model for mdlab notebooks.
//!
//! A notebook is a plain markdown file. Fenced code blocks become code cells,
//! everything between them becomes prose cells, and a `text` fence right after
//! a code block is that cell's captured output.
//!
//! # Architecture
//!
//! ```text
//! notebook.md ─────► DocumentParser ─────► Vec<Cell> ─────► serialize ─────► notebook.md
//!                                              │
//!                                              ▼
//!                                   (host edits, run outputs)
//! ```

mod cell;
mod directive;
mod error;
mod image;
mod lang;
mod parser;
mod serializer;

pub use cell::{Cell, CellKind, DEFAULT_LEADING_WHITESPACE, split_fence_info};
pub use directive::Directive;
pub use error::{DocError, DocResult};
pub use image::bump_image_versions;
pub use lang::{LANG_IDS, abbreviation, canonical_language};
pub use parser::{DocumentParser, OUTPUT_FENCE_TAG};
pub use serializer::serialize;

use std::fs;
use std::path::Path;

/// Parse document text into cells.
pub fn parse(text: &str) -> Vec<Cell> {
    DocumentParser::new().parse(text)
}

/// Read and parse a notebook file.
pub fn read_document(path: impl AsRef<Path>) -> DocResult<Vec<Cell>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| DocError::ReadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(parse(&text))
}

/// Serialize cells and write them to a notebook file.
pub fn write_document(path: impl AsRef<Path>, cells: &[Cell]) -> DocResult<()> {
    let path = path.as_ref();
    fs::write(path, serialize(cells)).map_err(|e| DocError::WriteError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    tracing::info!("Wrote {} ({} cells)", path.display(), cells.len());
    Ok(())
}
