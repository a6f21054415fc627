//! Error types for mdlab-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for mdlab-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mdlab-core.
///
/// User code errors are never reported here: they reach the cell as the
/// toolchain's own diagnostics in the process output.
#[derive(Debug, Error)]
pub enum Error {
    /// The toolchain binary for a language is not on PATH.
    #[error("command: {program} not on path")]
    ToolchainMissing {
        program: String,
        install_url: &'static str,
    },

    /// The toolchain was found but the process could not be started.
    #[error("failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    /// No synthesizer exists for the language.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Cell position out of range.
    #[error("cell not found at position {0}")]
    CellNotFound(usize),

    /// The cell at the position is prose.
    #[error("cell {0} is not a code cell")]
    NotACodeCell(usize),

    /// Configuration file could not be read or parsed.
    #[error("config error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Document I/O error.
    #[error(transparent)]
    Doc(#[from] mdlab_doc::DocError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Render the error with a recovery hint for the user.
    pub fn with_hint(&self) -> String {
        match self {
            Self::ToolchainMissing {
                program,
                install_url,
            } => format!(
                "{}\n  hint: add {} to PATH or install it from {}",
                self, program, install_url
            ),
            Self::UnsupportedLanguage(_) => format!(
                "{}\n  hint: supported languages are python, rust, go, javascript, typescript, zig and shells",
                self
            ),
            Self::Config { .. } => format!("{}\n  hint: run with --config to use another file", self),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolchain_missing_hint() {
        let err = Error::ToolchainMissing {
            program: "go".to_string(),
            install_url: "https://go.dev/doc/install",
        };
        assert_eq!(err.to_string(), "command: go not on path");
        assert!(err.with_hint().contains("https://go.dev/doc/install"));
    }

    #[test]
    fn test_plain_errors_have_no_hint() {
        let err = Error::CellNotFound(7);
        assert_eq!(err.with_hint(), "cell not found at position 7");
    }
}
