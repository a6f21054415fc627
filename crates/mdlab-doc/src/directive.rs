//! Per-cell directives.
//!
//! A directive is written as a suffix on the fence's language tag:
//!
//! ```text
//! ```python :once
//! ```rust :create=helpers.rs
//! ```
//!
//! The spelling of each keyword is the contract between the document and the
//! execution engine, so it is matched exactly.

use std::fmt;

/// A structured command attached to a code cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Discard all same-language history before this cell.
    Restart,
    /// Place the cell at file/module scope instead of the entry point body.
    Global,
    /// Never include the cell in a synthesized program.
    Skip,
    /// Include the cell only when it is the one being run.
    Once,
    /// Write the cell's content to a file in the temp workspace instead of running it.
    Create(String),
    /// Do not show the process output for this cell.
    Clear,
    /// A suffix outside the known vocabulary.
    ///
    /// Kept so the document round-trips; it has no effect on execution.
    Unrecognized(String),
}

impl Directive {
    /// Parse the text after the `:` of a fence tag.
    ///
    /// Returns `None` for an empty suffix.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let directive = match raw {
            "restart" => Self::Restart,
            "global" => Self::Global,
            "skip" => Self::Skip,
            "once" => Self::Once,
            "clear" => Self::Clear,
            _ => match raw.split_once('=') {
                Some((name, file)) if name.trim() == "create" && !file.trim().is_empty() => {
                    Self::Create(file.trim().to_string())
                }
                _ => Self::Unrecognized(raw.to_string()),
            },
        };

        Some(directive)
    }

    /// The keyword part of the directive.
    pub fn name(&self) -> &str {
        match self {
            Self::Restart => "restart",
            Self::Global => "global",
            Self::Skip => "skip",
            Self::Once => "once",
            Self::Create(_) => "create",
            Self::Clear => "clear",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create(file) => write!(f, "create={}", file),
            other => f.write_str(other.name()),
        }
    }
}
