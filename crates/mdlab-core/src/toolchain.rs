//! Toolchain discovery.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::family::LanguageFamily;

/// A located toolchain executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Name the program was found under.
    program: String,

    /// Resolved executable path.
    path: PathBuf,
}

impl Toolchain {
    /// Build a toolchain from an already known executable.
    pub fn new(program: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            path: path.into(),
        }
    }

    /// Find the first of `programs` on PATH, then try `fallbacks`.
    pub fn locate(
        programs: &[&str],
        fallbacks: &[PathBuf],
        install_url: &'static str,
    ) -> Result<Self> {
        for program in programs {
            if let Ok(path) = which::which(program) {
                tracing::debug!("Found {} at {}", program, path.display());
                return Ok(Self::new(*program, path));
            }
        }

        for path in fallbacks {
            if path.is_file() {
                let program = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                tracing::debug!("Using fallback {}", path.display());
                return Ok(Self::new(program, path.clone()));
            }
        }

        Err(Error::ToolchainMissing {
            program: programs.first().copied().unwrap_or_default().to_string(),
            install_url,
        })
    }

    /// Locate the toolchain for a language family.
    pub fn for_family(family: LanguageFamily) -> Result<Self> {
        Self::locate(
            family.programs(),
            &family.fallback_paths(),
            family.install_url(),
        )
    }

    /// Program name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Executable path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_toolchain_reports_first_program() {
        let err = Toolchain::locate(
            &["mdlab-no-such-tool", "mdlab-no-such-tool-either"],
            &[],
            "https://example.invalid/install",
        )
        .unwrap_err();

        match err {
            Error::ToolchainMissing {
                program,
                install_url,
            } => {
                assert_eq!(program, "mdlab-no-such-tool");
                assert_eq!(install_url, "https://example.invalid/install");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fallback_path() {
        let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
        let fake = temp.path().join("zig");
        std::fs::write(&fake, "").expect("write");

        let toolchain = Toolchain::locate(&["mdlab-no-such-zig"], &[fake.clone()], "")
            .expect("fallback should be used");
        assert_eq!(toolchain.program(), "zig");
        assert_eq!(toolchain.path(), fake.as_path());
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_sh() {
        let toolchain = Toolchain::locate(&["sh"], &[], "").expect("sh is on PATH");
        assert_eq!(toolchain.program(), "sh");
        assert!(toolchain.path().is_absolute());
    }
}
