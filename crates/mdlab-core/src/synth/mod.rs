//! Program synthesis.
//!
//! Each language family turns a same-language [`History`] into one complete
//! program that is run from scratch. Synthesis is plain text assembly: it
//! never fails on malformed user code, whose errors surface later as the
//! toolchain's own diagnostics.
//!
//! # Shape of a synthesized program
//!
//! ```text
//! <imports hoisted from every contributing cell>
//! <global cells, spliced entry points, module-scope declarations>
//! <entry point> {
//!     <sentinel>            // entry 1
//!     <cell 1 body>
//!     <sentinel>            // entry 2 (skipped: marker only)
//!     <sentinel>            // entry 3
//!     <cell 3 body>
//! }
//! ```

mod go;
mod jai;
mod python;
mod rust;
pub mod scan;
mod script;
mod shell;
mod zig;

pub use go::GoSynthesizer;
pub use jai::JaiSynthesizer;
pub use python::PythonSynthesizer;
pub use rust::{RustSynthesizer, generate_manifest};
pub use script::ScriptSynthesizer;
pub use shell::ShellSynthesizer;
pub use zig::ZigSynthesizer;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Result;
use crate::family::LanguageFamily;
use crate::history::History;
use crate::toolchain::Toolchain;

/// Where the program is being synthesized for.
#[derive(Debug, Clone)]
pub struct SynthesisContext {
    /// Temp workspace root.
    pub workspace_root: PathBuf,

    /// Directory of the document being run, if it has one on disk.
    pub document_dir: Option<PathBuf>,
}

impl SynthesisContext {
    /// Create a context rooted at the temp workspace.
    pub fn new(workspace_root: impl Into<PathBuf>, document_dir: Option<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            document_dir,
        }
    }

    /// Working directory for programs that read files next to the document.
    pub fn working_dir(&self) -> &Path {
        self.document_dir.as_deref().unwrap_or(&self.workspace_root)
    }

    /// Absolute path of a family's entry file.
    pub fn entry_path(&self, family: LanguageFamily) -> PathBuf {
        self.workspace_root.join(family.entry_file())
    }

    /// Absolute path of a family's directory.
    pub fn family_dir(&self, family: LanguageFamily) -> PathBuf {
        self.workspace_root.join(family.dir_name())
    }
}

/// An auxiliary file written next to the entry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldFile {
    /// Relative to the workspace root, or absolute.
    pub path: PathBuf,
    pub contents: String,
    /// Replace an existing file. Files the toolchain edits itself (`go.mod`)
    /// are only written once.
    pub overwrite: bool,
}

/// The result of synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedProgram {
    /// Source of the entry file.
    pub source: String,

    /// Leave the cell's output untouched (`clear`).
    pub suppress_output: bool,

    /// Number of sentinel markers the program prints.
    pub boundaries: usize,

    /// Output segment holding the current cell's output (1-based).
    pub target_segment: usize,

    /// Third-party packages the program imports.
    pub dependencies: Vec<String>,

    /// Auxiliary files.
    pub files: Vec<ScaffoldFile>,
}

impl SynthesizedProgram {
    /// A program with one boundary per history entry.
    pub fn from_history(source: String, history: &History) -> Self {
        Self {
            source,
            suppress_output: history.suppresses_output(),
            boundaries: history.len(),
            target_segment: history.len(),
            dependencies: Vec::new(),
            files: Vec::new(),
        }
    }
}

/// A single process to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    /// Run `program` from `cwd` with no arguments.
    pub fn new(program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    /// Add an argument (builder style).
    pub fn arg(mut self, arg: impl AsRef<std::ffi::OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Everything needed to run a synthesized program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    /// Steps run to completion first, such as dependency resolution.
    pub preparation: Vec<Invocation>,
    pub main: Invocation,
}

impl Launch {
    /// A launch with no preparation steps.
    pub fn new(main: Invocation) -> Self {
        Self {
            preparation: Vec::new(),
            main,
        }
    }
}

/// A user-written entry point declaration: `keyword name(...) { ... }`, or
/// `name keyword (...) { ... }` when `name_first` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPattern {
    pub keyword: &'static str,
    pub name: &'static str,
    pub name_first: bool,
}

/// One synthesis strategy per language family.
pub trait Synthesizer: Send + Sync {
    /// Family served by this synthesizer.
    fn family(&self) -> LanguageFamily;

    /// Statement printing the sentinel marker, ending in a newline.
    fn sentinel(&self) -> String;

    /// Entry point declaration spliced out of cells, for languages that
    /// have one.
    fn entry_pattern(&self) -> Option<EntryPattern> {
        None
    }

    /// Entry file relative to the workspace root.
    fn entry_file(&self) -> PathBuf {
        self.family().entry_file()
    }

    /// Locate the toolchain.
    fn toolchain(&self) -> Result<Toolchain> {
        Toolchain::for_family(self.family())
    }

    /// Build the program for a history.
    fn synthesize(&self, history: &History, ctx: &SynthesisContext) -> SynthesizedProgram;

    /// Commands that run a synthesized program.
    fn launch(
        &self,
        program: &SynthesizedProgram,
        toolchain: &Toolchain,
        ctx: &SynthesisContext,
    ) -> Launch;
}

/// Get the synthesizer for a family.
pub fn synthesizer_for(family: LanguageFamily, config: &Config) -> Box<dyn Synthesizer> {
    match family {
        LanguageFamily::Python => Box::new(PythonSynthesizer::new(config.python.clone())),
        LanguageFamily::Rust => Box::new(RustSynthesizer),
        LanguageFamily::Go => Box::new(GoSynthesizer),
        LanguageFamily::JavaScript | LanguageFamily::TypeScript => {
            Box::new(ScriptSynthesizer::new(family))
        }
        LanguageFamily::Zig => Box::new(ZigSynthesizer),
        LanguageFamily::Jai => Box::new(JaiSynthesizer::new(config.jai.clone())),
        LanguageFamily::Shell(shell) => Box::new(ShellSynthesizer::new(shell)),
    }
}
