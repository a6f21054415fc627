//! Language families that mdlab knows how to run.

use std::fmt;
use std::path::PathBuf;

/// Install pages reported when a toolchain is missing.
pub mod install_urls {
    pub const RUST: &str = "https://rustup.rs";
    pub const GO: &str = "https://go.dev/doc/install";
    pub const PYTHON: &str = "https://www.python.org/downloads/";
    pub const NODE: &str = "https://nodejs.org/en/download/package-manager";
    pub const ESR: &str = "https://www.npmjs.com/package/esbuild-runner";
    pub const ZIG: &str = "https://www.zvm.app/guides/install-zvm/";
    pub const JAI: &str = "https://github.com/Jai-Community/Jai-Community-Library/wiki/Getting-Started";
    pub const BASH: &str = "https://hackernoon.com/how-to-install-bash-on-windows-10-lqb73yj3";
    pub const ZSH: &str = "https://github.com/ohmyzsh/ohmyzsh/wiki/Installing-ZSH";
    pub const FISH: &str = "https://fishshell.com/";
    pub const NUSHELL: &str = "https://www.nushell.sh/book/installation.html";
    pub const POWERSHELL: &str =
        "https://learn.microsoft.com/en-us/powershell/scripting/install/install-powershell";
}

/// Shells that run a single cell as a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Nushell,
    PowerShell,
}

impl Shell {
    /// Script file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Bash => "sh",
            Self::Zsh => "zsh",
            Self::Fish => "fish",
            Self::Nushell => "nu",
            Self::PowerShell => "ps1",
        }
    }
}

/// A group of languages sharing one synthesis strategy and toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageFamily {
    Python,
    Rust,
    Go,
    JavaScript,
    TypeScript,
    Zig,
    Jai,
    Shell(Shell),
}

impl LanguageFamily {
    /// Resolve a canonical language id (see `mdlab_doc::canonical_language`).
    pub fn from_language(language: &str) -> Option<Self> {
        let family = match language {
            "python" => Self::Python,
            "rust" => Self::Rust,
            "go" => Self::Go,
            "javascript" => Self::JavaScript,
            "typescript" => Self::TypeScript,
            "zig" => Self::Zig,
            "jai" => Self::Jai,
            "bash" | "shellscript" => Self::Shell(Shell::Bash),
            "zsh" => Self::Shell(Shell::Zsh),
            "fish" => Self::Shell(Shell::Fish),
            "nushell" => Self::Shell(Shell::Nushell),
            "powershell" => Self::Shell(Shell::PowerShell),
            _ => return None,
        };
        Some(family)
    }

    /// Subdirectory of the temp workspace owned by this family.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Rust => "rust",
            Self::Go => "go",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Zig => "zig",
            Self::Jai => "jai",
            Self::Shell(_) => "shell",
        }
    }

    /// Synthesized entry file, relative to the temp workspace root.
    pub fn entry_file(self) -> PathBuf {
        let dir = PathBuf::from(self.dir_name());
        match self {
            Self::Python => dir.join("mdlab.py"),
            Self::Rust => dir.join("src").join("main.rs"),
            Self::Go => dir.join("main.go"),
            Self::JavaScript => dir.join("main.js"),
            Self::TypeScript => dir.join("main.ts"),
            Self::Zig => dir.join("main.zig"),
            Self::Jai => dir.join("main.jai"),
            Self::Shell(shell) => dir.join(format!("main.{}", shell.extension())),
        }
    }

    /// Program names searched on PATH, in order of preference.
    pub fn programs(self) -> &'static [&'static str] {
        match self {
            Self::Python => &["python3", "python"],
            Self::Rust => &["cargo"],
            Self::Go => &["go"],
            Self::JavaScript => &["node"],
            Self::TypeScript => &["esr"],
            Self::Zig => &["zig"],
            Self::Jai if cfg!(windows) => &["jai"],
            Self::Jai if cfg!(target_os = "macos") => &["jai", "jai-macos"],
            Self::Jai => &["jai", "jai-linux"],
            Self::Shell(Shell::Bash) => &["bash"],
            Self::Shell(Shell::Zsh) => &["zsh"],
            Self::Shell(Shell::Fish) => &["fish"],
            Self::Shell(Shell::Nushell) => &["nu"],
            Self::Shell(Shell::PowerShell) if cfg!(windows) => &["powershell", "pwsh"],
            Self::Shell(Shell::PowerShell) => &["pwsh", "powershell"],
        }
    }

    /// Where to get the toolchain.
    pub fn install_url(self) -> &'static str {
        match self {
            Self::Python => install_urls::PYTHON,
            Self::Rust => install_urls::RUST,
            Self::Go => install_urls::GO,
            Self::JavaScript => install_urls::NODE,
            Self::TypeScript => install_urls::ESR,
            Self::Zig => install_urls::ZIG,
            Self::Jai => install_urls::JAI,
            Self::Shell(Shell::Bash) => install_urls::BASH,
            Self::Shell(Shell::Zsh) => install_urls::ZSH,
            Self::Shell(Shell::Fish) => install_urls::FISH,
            Self::Shell(Shell::Nushell) => install_urls::NUSHELL,
            Self::Shell(Shell::PowerShell) => install_urls::POWERSHELL,
        }
    }

    /// Toolchain locations checked when nothing is found on PATH.
    pub fn fallback_paths(self) -> Vec<PathBuf> {
        match (self, dirs::home_dir()) {
            (Self::Zig, Some(home)) => vec![home.join(".zvm").join("bin").join("zig")],
            (Self::Jai, Some(home)) => {
                let bin = home.join("jai").join("bin");
                ["jai-linux", "jai-macos", "jai.exe"]
                    .iter()
                    .map(|name| bin.join(name))
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    /// Shells run only the current cell, so their output is always segment 1.
    pub fn is_shell(self) -> bool {
        matches!(self, Self::Shell(_))
    }
}

impl fmt::Display for LanguageFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}
