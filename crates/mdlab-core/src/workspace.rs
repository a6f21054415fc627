//! Temp workspace management.
//!
//! Every execution synthesizes its program into a shared directory tree:
//!
//! ```text
//! $TMPDIR/mdl/
//! ├── python/mdlab.py
//! ├── rust/                # Cargo.toml + src/main.rs
//! ├── go/                  # go.mod + main.go
//! ├── javascript/main.js
//! ├── typescript/main.ts
//! ├── zig/main.zig
//! ├── shell/main.<ext>
//! └── <files written by `create=` cells>
//! ```
//!
//! Files are overwritten in place on every run. Only one cell runs at a time,
//! so nothing here is locked.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::family::LanguageFamily;

/// The shared synthesis directory.
#[derive(Debug, Clone)]
pub struct TempWorkspace {
    root: PathBuf,
}

impl TempWorkspace {
    /// Create a workspace handle. Nothing is created on disk yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a path. Relative paths land under the root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Directory for a language family.
    pub fn family_dir(&self, family: LanguageFamily) -> PathBuf {
        self.root.join(family.dir_name())
    }

    /// Absolute path of a family's synthesized entry file.
    pub fn entry_path(&self, family: LanguageFamily) -> PathBuf {
        self.root.join(family.entry_file())
    }

    /// Write a file, creating parent directories.
    ///
    /// Unchanged content is not rewritten so incremental toolchains keep their
    /// caches. With `overwrite` unset an existing file is left alone.
    pub fn write_file(
        &self,
        path: impl AsRef<Path>,
        contents: &str,
        overwrite: bool,
    ) -> Result<PathBuf> {
        let path = self.resolve(path);

        if path.exists() {
            if !overwrite {
                return Ok(path);
            }
            if fs::read_to_string(&path).is_ok_and(|existing| existing == contents) {
                tracing::debug!("Unchanged: {}", path.display());
                return Ok(path);
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        tracing::debug!("Wrote {} ({} bytes)", path.display(), contents.len());

        Ok(path)
    }

    /// Remove the whole workspace.
    ///
    /// Returns `false` when there was nothing to remove.
    pub fn clean(&self) -> Result<bool> {
        if !self.root.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&self.root)?;
        tracing::info!("Removed {}", self.root.display());
        Ok(true)
    }
}
