//! Python synthesis.
//!
//! Python has no entry point, so cells are concatenated at module scope. A
//! small header makes modules next to the document and in the temp workspace
//! importable.

use std::path::PathBuf;

use crate::demux::SENTINEL;
use crate::error::Result;
use crate::family::{LanguageFamily, install_urls};
use crate::history::History;
use crate::toolchain::Toolchain;

use super::{Invocation, Launch, ScaffoldFile, SynthesisContext, SynthesizedProgram, Synthesizer};

/// Names that are statements, never values to print.
const STATEMENT_KEYWORDS: &[&str] = &["pass", "break", "continue", "return", "raise", "else", "try", "finally"];

pub struct PythonSynthesizer {
    interpreter: Option<String>,
}

impl PythonSynthesizer {
    /// `interpreter` overrides the `python3`/`python` lookup.
    pub fn new(interpreter: Option<String>) -> Self {
        Self { interpreter }
    }

    fn header(ctx: &SynthesisContext) -> String {
        let mut header = String::from("import sys\n");
        if let Some(dir) = &ctx.document_dir {
            header.push_str(&format!("sys.path.append({:?})\n", dir.to_string_lossy()));
        }
        header.push_str(&format!(
            "sys.path.append({:?})\n",
            ctx.workspace_root.to_string_lossy()
        ));
        header.push_str("from builtins import *\n");
        header
    }
}

impl Synthesizer for PythonSynthesizer {
    fn family(&self) -> LanguageFamily {
        LanguageFamily::Python
    }

    fn sentinel(&self) -> String {
        format!("print(\"{SENTINEL}\", flush=True)\n")
    }

    fn toolchain(&self) -> Result<Toolchain> {
        match &self.interpreter {
            Some(program) => Toolchain::locate(&[program.as_str()], &[], install_urls::PYTHON),
            None => Toolchain::for_family(self.family()),
        }
    }

    fn synthesize(&self, history: &History, ctx: &SynthesisContext) -> SynthesizedProgram {
        let mut script = Self::header(ctx);
        let mut files = Vec::new();

        for planned in history.plan() {
            script.push('\n');
            script.push_str(&self.sentinel());

            if !planned.role.contributes() {
                continue;
            }

            let content = planned.entry.content.trim();
            let processed = add_flush(content);
            let lines: Vec<&str> = processed.split('\n').collect();

            for (i, line) in lines.iter().enumerate() {
                if i == 0
                    && let Some(name) = file_directive(line)
                {
                    if name != "main.py" {
                        files.push(ScaffoldFile {
                            path: PathBuf::from(name),
                            contents: format!("{content}\n"),
                            overwrite: true,
                        });
                    }
                    continue;
                }

                script.push_str(&auto_print(line, i + 1 == lines.len()));
                script.push('\n');
            }
        }

        let mut program = SynthesizedProgram::from_history(script, history);
        program.files = files;
        program
    }

    fn launch(
        &self,
        _program: &SynthesizedProgram,
        toolchain: &Toolchain,
        ctx: &SynthesisContext,
    ) -> Launch {
        Launch::new(
            Invocation::new(toolchain.path(), ctx.working_dir())
                .arg(ctx.entry_path(self.family())),
        )
    }
}

/// `# file: name.py` on the first line writes the cell to that file.
fn file_directive(line: &str) -> Option<&str> {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    if !compact.starts_with("#file:") {
        return None;
    }
    line.split_once(':')
        .map(|(_, name)| name.trim())
        .filter(|name| !name.is_empty())
}

/// Add `flush=True` to single-line `print(...)` calls so output streams live.
fn add_flush(content: &str) -> String {
    content
        .split('\n')
        .map(|line| {
            let trimmed = line.trim_end();
            let is_print = line.trim_start().starts_with("print(") && trimmed.ends_with(')');
            if !is_print || line.contains("flush=") {
                return line.to_string();
            }

            let close = trimmed.len() - 1;
            let open = line.find("print(").map_or(close, |at| at + "print(".len());
            let args = &line[open..close];
            let flush = if args.trim().is_empty() {
                "flush=True"
            } else {
                ", flush=True"
            };
            format!("{}{}{}", &line[..close], flush, &line[close..])
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print a cell's final line when it is a bare value (`x`, `df.head`).
///
/// `!x` pretty-prints through `pprint`.
fn auto_print(line: &str, is_last: bool) -> String {
    if !is_last || !is_bare_value(line) {
        return line.to_string();
    }

    match line.strip_prefix('!') {
        Some(value) => format!("from pprint import pprint\npprint({value})\nsys.stdout.flush()"),
        None => format!("print({line}, flush=True)"),
    }
}

fn is_bare_value(line: &str) -> bool {
    let value = line.strip_prefix('!').unwrap_or(line);
    !value.is_empty()
        && !line.starts_with([' ', '\t'])
        && !line.contains('#')
        && line.trim().split(' ').count() == 1
        && !line.ends_with(')')
        && !value.contains(['=', ':', '('])
        && !STATEMENT_KEYWORDS.contains(&value)
}
