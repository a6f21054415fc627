//! Rust synthesis.
//!
//! Cells become statements of one `fn main` inside a throwaway cargo
//! project. Items declared in a block are visible to the whole block, so
//! cells can define structs and functions inline. A cell's own `fn main`
//! is renamed and called in place.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::demux::SENTINEL;
use crate::family::LanguageFamily;
use crate::history::{History, Role};
use crate::toolchain::Toolchain;

use super::scan::{self, RUST};
use super::{
    EntryPattern, Invocation, Launch, ScaffoldFile, SynthesisContext, SynthesizedProgram,
    Synthesizer,
};

/// Crate roots that never need a dependency.
const BUILTIN_ROOTS: &[&str] = &[
    "std", "core", "alloc", "self", "super", "crate", "proc_macro", "test",
];

const ENTRY: EntryPattern = EntryPattern {
    keyword: "fn",
    name: "main",
    name_first: false,
};

const PACKAGE_NAME: &str = "mdlab";
const EDITION: &str = "2021";

pub struct RustSynthesizer;

impl Synthesizer for RustSynthesizer {
    fn family(&self) -> LanguageFamily {
        LanguageFamily::Rust
    }

    fn sentinel(&self) -> String {
        format!("println!(\"{SENTINEL}\");\n")
    }

    fn entry_pattern(&self) -> Option<EntryPattern> {
        Some(ENTRY)
    }

    fn synthesize(&self, history: &History, _ctx: &SynthesisContext) -> SynthesizedProgram {
        let mut preamble = String::from("#![allow(unused)]\n");
        let mut body = String::new();
        let mut contributing = Vec::new();

        for planned in history.plan() {
            body.push_str("    ");
            body.push_str(&self.sentinel());

            let content = planned.entry.content.as_str();
            match planned.role {
                Role::Dropped | Role::Skipped => continue,
                Role::Global => {
                    preamble.push_str(content);
                    preamble.push('\n');
                }
                Role::Body => {
                    let cell_main = format!("__mdlab_cell_main_{}", planned.entry.index);
                    let spliced = scan::splice_entry_point(
                        content,
                        &RUST,
                        ENTRY.keyword,
                        ENTRY.name,
                        &cell_main,
                    );
                    match spliced {
                        Some(spliced) => {
                            body.push_str(&spliced.remainder);
                            body.push('\n');
                            body.push_str(&spliced.function);
                            body.push('\n');
                            if spliced.returns.contains("Result") {
                                body.push_str(&format!(
                                    "    if let Err(e) = {cell_main}() {{ eprintln!(\"Error: {{e:?}}\"); }}\n"
                                ));
                            } else {
                                body.push_str(&format!("    {cell_main}();\n"));
                            }
                        }
                        None => {
                            body.push_str(content);
                            body.push('\n');
                        }
                    }
                }
            }
            contributing.push(content);
        }

        let dependencies = external_crates(&contributing);
        let source = format!("{preamble}\nfn main() {{\n{body}}}\n");

        let mut program = SynthesizedProgram::from_history(source, history);
        program.files.push(ScaffoldFile {
            path: PathBuf::from(LanguageFamily::Rust.dir_name()).join("Cargo.toml"),
            contents: generate_manifest(PACKAGE_NAME, EDITION, &dependencies),
            overwrite: true,
        });
        program.dependencies = dependencies;
        program
    }

    fn launch(
        &self,
        _program: &SynthesizedProgram,
        toolchain: &Toolchain,
        ctx: &SynthesisContext,
    ) -> Launch {
        let manifest = ctx.family_dir(self.family()).join("Cargo.toml");
        Launch::new(
            Invocation::new(toolchain.path(), ctx.working_dir())
                .arg("run")
                .arg("--quiet")
                .arg("--manifest-path")
                .arg(manifest),
        )
    }
}

/// Generate the Cargo.toml of the synthesized project.
///
/// Dependencies are unpinned; the standalone `[workspace]` table keeps the
/// project out of any enclosing workspace.
pub fn generate_manifest(name: &str, edition: &str, dependencies: &[String]) -> String {
    let mut toml = String::new();

    toml.push_str("[package]\n");
    toml.push_str(&format!("name = \"{}\"\n", name));
    toml.push_str("version = \"0.1.0\"\n");
    toml.push_str(&format!("edition = \"{}\"\n", edition));
    toml.push('\n');

    toml.push_str("[dependencies]\n");
    for dep in dependencies {
        toml.push_str(&format!("{} = \"*\"\n", dep));
    }

    toml.push('\n');
    toml.push_str("[workspace]\n");
    toml
}

/// Crates named by `use` and `extern crate` lines, sorted.
///
/// Roots that are modules or enums declared in the cells themselves, and
/// capitalized roots, are not crates.
fn external_crates(contents: &[&str]) -> Vec<String> {
    let mut roots = BTreeSet::new();
    let mut local = BTreeSet::new();

    for content in contents {
        let masked = scan::mask(content, &RUST);
        for line in masked.lines() {
            let line = line.trim();
            let words: Vec<&str> = line.split_whitespace().collect();
            if let [kind, name, ..] = words.as_slice()
                && matches!(*kind, "mod" | "enum" | "pub")
            {
                let name = if *kind == "pub" {
                    words.get(2).copied().filter(|_| matches!(*name, "mod" | "enum"))
                } else {
                    Some(*name)
                };
                if let Some(name) = name {
                    local.insert(ident_prefix(name).to_string());
                }
            }

            if let Some(root) = use_root(line) {
                roots.insert(root.to_string());
            }
        }
    }

    roots
        .into_iter()
        .filter(|root| !BUILTIN_ROOTS.contains(&root.as_str()))
        .filter(|root| !root.starts_with(|c: char| c.is_uppercase()))
        .filter(|root| !local.contains(root))
        .collect()
}

fn use_root(line: &str) -> Option<&str> {
    let rest = line
        .strip_prefix("pub ")
        .or_else(|| line.strip_prefix("pub(crate) "))
        .unwrap_or(line);
    let path = rest
        .strip_prefix("use ")
        .or_else(|| rest.strip_prefix("extern crate "))?;
    let root = ident_prefix(path.trim_start().trim_start_matches("::"));
    (!root.is_empty()).then_some(root)
}

fn ident_prefix(text: &str) -> &str {
    let end = text
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    &text[..end]
}
