//! Shell synthesis.
//!
//! Shells keep no history: only the cell being run is written out, after a
//! single sentinel, so its output is always segment 1.

use crate::demux::SENTINEL;
use crate::family::{LanguageFamily, Shell};
use crate::history::History;
use crate::toolchain::Toolchain;

use super::{Invocation, Launch, SynthesisContext, SynthesizedProgram, Synthesizer};

pub struct ShellSynthesizer {
    shell: Shell,
}

impl ShellSynthesizer {
    /// Create a synthesizer for `shell`.
    pub fn new(shell: Shell) -> Self {
        Self { shell }
    }
}

impl Synthesizer for ShellSynthesizer {
    fn family(&self) -> LanguageFamily {
        LanguageFamily::Shell(self.shell)
    }

    fn sentinel(&self) -> String {
        match self.shell {
            Shell::Bash | Shell::Zsh | Shell::Fish => format!("echo \"{SENTINEL}\"\n"),
            Shell::Nushell => format!("print \"{SENTINEL}\"\n"),
            Shell::PowerShell => format!("Write-Host \"{SENTINEL}\"\n"),
        }
    }

    fn synthesize(&self, history: &History, _ctx: &SynthesisContext) -> SynthesizedProgram {
        let content = history
            .current()
            .map(|entry| entry.content.as_str())
            .unwrap_or_default();

        let mut source = self.sentinel();
        match self.shell {
            Shell::PowerShell => {
                source.push_str("& {");
                source.push_str(content);
                source.push_str("}\n");
            }
            _ => {
                source.push_str(content);
                source.push('\n');
            }
        }

        SynthesizedProgram {
            source,
            suppress_output: history.suppresses_output(),
            boundaries: 1,
            target_segment: 1,
            dependencies: Vec::new(),
            files: Vec::new(),
        }
    }

    fn launch(
        &self,
        _program: &SynthesizedProgram,
        toolchain: &Toolchain,
        ctx: &SynthesisContext,
    ) -> Launch {
        let script = ctx.entry_path(self.family());
        let invocation = match self.shell {
            Shell::PowerShell => Invocation::new(toolchain.path(), &ctx.workspace_root)
                .arg("-NoProfile")
                .arg("-File")
                .arg(script),
            _ => Invocation::new(toolchain.path(), ctx.working_dir()).arg(script),
        };
        Launch::new(invocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::test_support::{ctx, sentinel_count};
    use mdlab_doc::Directive;

    #[test]
    fn test_only_current_cell_runs() {
        let synth = ShellSynthesizer::new(Shell::Bash);
        let history = History::from_sources([("echo first", None), ("echo second", None)]);

        let program = synth.synthesize(&history, &ctx());
        assert_eq!(program.source, format!("echo \"{SENTINEL}\"\necho second\n"));
        assert_eq!(program.boundaries, 1);
        assert_eq!(program.target_segment, 1);
        assert_eq!(sentinel_count(&program.source), 1);
    }

    #[test]
    fn test_powershell_wraps_in_script_block() {
        let synth = ShellSynthesizer::new(Shell::PowerShell);
        let history = History::from_sources([("Get-Date", Some(Directive::Clear))]);

        let program = synth.synthesize(&history, &ctx());
        assert_eq!(
            program.source,
            format!("Write-Host \"{SENTINEL}\"\n& {{Get-Date}}\n")
        );
        assert!(program.suppress_output);

        let launch = synth.launch(&program, &Toolchain::new("pwsh", "/usr/bin/pwsh"), &ctx());
        assert_eq!(launch.main.args[..2], ["-NoProfile", "-File"]);
    }

    #[test]
    fn test_nushell_sentinel() {
        let synth = ShellSynthesizer::new(Shell::Nushell);
        assert_eq!(synth.sentinel(), format!("print \"{SENTINEL}\"\n"));
        assert_eq!(
            synth.entry_file(),
            std::path::PathBuf::from("shell/main.nu")
        );
    }
}
