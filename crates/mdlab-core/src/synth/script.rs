//! JavaScript and TypeScript synthesis: plain concatenation at module scope.

use crate::demux::SENTINEL;
use crate::family::LanguageFamily;
use crate::history::History;
use crate::toolchain::Toolchain;

use super::{Invocation, Launch, SynthesisContext, SynthesizedProgram, Synthesizer};

pub struct ScriptSynthesizer {
    family: LanguageFamily,
}

impl ScriptSynthesizer {
    /// `family` is [`LanguageFamily::JavaScript`] or
    /// [`LanguageFamily::TypeScript`].
    pub fn new(family: LanguageFamily) -> Self {
        Self { family }
    }
}

impl Synthesizer for ScriptSynthesizer {
    fn family(&self) -> LanguageFamily {
        self.family
    }

    fn sentinel(&self) -> String {
        format!("console.log(\"{SENTINEL}\");\n")
    }

    fn synthesize(&self, history: &History, _ctx: &SynthesisContext) -> SynthesizedProgram {
        let mut source = String::new();

        for planned in history.plan() {
            source.push_str(&self.sentinel());
            if planned.role.contributes() {
                source.push_str(&planned.entry.content);
                source.push('\n');
            }
        }

        SynthesizedProgram::from_history(source, history)
    }

    fn launch(
        &self,
        _program: &SynthesizedProgram,
        toolchain: &Toolchain,
        ctx: &SynthesisContext,
    ) -> Launch {
        Launch::new(
            Invocation::new(toolchain.path(), ctx.working_dir())
                .arg(ctx.entry_path(self.family)),
        )
    }
}
