//! The cell model shared by the parser, the serializer and the execution engine.

use crate::directive::Directive;

/// Separator recorded for cells that did not come from a parsed document.
///
/// One blank line, which is how the serializer separates cells by default.
pub const DEFAULT_LEADING_WHITESPACE: &str = "\n";

/// Type of cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// Prose between code fences.
    Prose,
    /// A fenced, executable code block.
    Code,
}

/// One unit of the document.
///
/// Cells carry no identifier: their position in the sequence is their identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Cell type
    pub kind: CellKind,

    /// Canonical language identifier (code cells only)
    pub language: Option<String>,

    /// Directive parsed from the fence tag suffix (code cells only)
    pub directive: Option<Directive>,

    /// Text between the fence markers, or the trimmed prose
    pub content: String,

    /// Blank lines between the previous cell and this one, one `\n` per line
    pub leading_whitespace: String,

    /// Blank lines ending the document, set only on the final cell
    pub trailing_whitespace: String,

    /// Output previously written as a trailing `text` fence
    pub captured_output: Option<String>,

    /// Indentation in front of the opening fence
    pub indent: String,

    /// Indentation in front of the captured output fence
    pub output_indent: String,

    /// The fence held a single empty line rather than nothing at all
    ///
    /// Both give empty `content`; the serializer needs to tell them apart.
    pub blank_body: bool,

    /// Fence info string exactly as written (`js :once`), used to keep the
    /// original spelling when the language and directive are unchanged
    pub fence_info: Option<String>,
}

impl Cell {
    /// Create a new code cell.
    pub fn code(language: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: CellKind::Code,
            language: Some(language.into()),
            directive: None,
            content: content.into(),
            leading_whitespace: DEFAULT_LEADING_WHITESPACE.to_string(),
            trailing_whitespace: String::new(),
            captured_output: None,
            indent: String::new(),
            output_indent: String::new(),
            blank_body: false,
            fence_info: None,
        }
    }

    /// Create a new prose cell.
    pub fn prose(content: impl Into<String>) -> Self {
        Self {
            kind: CellKind::Prose,
            language: None,
            directive: None,
            content: content.into(),
            leading_whitespace: DEFAULT_LEADING_WHITESPACE.to_string(),
            trailing_whitespace: String::new(),
            captured_output: None,
            indent: String::new(),
            output_indent: String::new(),
            blank_body: false,
            fence_info: None,
        }
    }

    /// Attach a directive (builder style).
    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.directive = Some(directive);
        self
    }

    /// Whether this is a code cell.
    pub fn is_code(&self) -> bool {
        self.kind == CellKind::Code
    }

    /// The language of a code cell, `None` for prose.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Whether the cell carries the given directive.
    pub fn has_directive(&self, directive: &Directive) -> bool {
        self.directive.as_ref() == Some(directive)
    }

    /// Replace the captured output; empty text clears it.
    pub fn set_output(&mut self, output: Option<String>) {
        self.captured_output = output.filter(|text| !text.is_empty());
    }
}

/// Split a fence info string into a language tag and a directive.
///
/// `"rust :skip"` gives `("rust", Some(Skip))`.
pub fn split_fence_info(info: &str) -> (&str, Option<Directive>) {
    match info.split_once(':') {
        Some((lang, directive)) => (lang.trim(), Directive::parse(directive)),
        None => (info.trim(), None),
    }
}
