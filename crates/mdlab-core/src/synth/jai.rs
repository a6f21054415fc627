//! Jai synthesis.
//!
//! `#import`/`#load` lines are hoisted and the remaining statements run
//! inside `main :: () { ... }`. The compiler builds and runs the program in
//! one process through a metaprogram plugin kept under `jai/modules/`.

use std::path::PathBuf;

use crate::demux::SENTINEL;
use crate::error::Result;
use crate::family::{LanguageFamily, install_urls};
use crate::history::{History, Role};
use crate::toolchain::Toolchain;

use super::scan::{self, JAI, Placement};
use super::{
    EntryPattern, Invocation, Launch, ScaffoldFile, SynthesisContext, SynthesizedProgram,
    Synthesizer,
};

const ENTRY: EntryPattern = EntryPattern {
    keyword: "::",
    name: "main",
    name_first: true,
};

const BASIC_IMPORT: &str = "#import \"Basic\";";

/// Plugin name passed to the compiler with `-plug`.
const PLUGIN: &str = "mdlab";

/// Runs the built executable when compilation succeeds, so compiler
/// diagnostics and program output share one stream.
const METAPROGRAM: &str = r#"// Loaded with `-plug mdlab`: runs the program after a clean build.

#import "Basic";
Compiler :: #import "Compiler";
Process  :: #import "Process";

Plugin :: Compiler.Metaprogram_Plugin;

Runner :: struct {
    #as using base: Plugin;

    failed := false;
    args: [] string;
}

get_plugin :: () -> *Plugin {
    runner := New(Runner);
    runner.init     = on_init;
    runner.message  = on_message;
    runner.shutdown = on_shutdown;
    return runner;
}

on_init :: (plugin: *Plugin, options: [] string) -> bool {
    runner := cast(*Runner) plugin;
    runner.args = options;
    return true;
}

on_message :: (plugin: *Plugin, msg: *Compiler.Message) {
    runner := cast(*Runner) plugin;
    if msg.kind == .COMPLETE {
        complete := cast(*Compiler.Message_Complete) msg;
        if complete.error_code != .NONE  runner.failed = true;
    }
}

on_shutdown :: (plugin: *Plugin) {
    runner := cast(*Runner) plugin;
    defer free(runner);

    if runner.failed {
        log_error("[mdlab] Build failed, not running.");
        return;
    }

    options := Compiler.get_build_options(runner.workspace);
    directory := options.output_path;
    if directory.count == 0  directory = ".";

    last := directory[directory.count - 1];
    separator := ifx last == #char "/" || last == #char "\\" then "" else "/";
    extension := ifx OS == .WINDOWS then ".exe" else "";
    executable := tprint("%1%2%3%4", directory, separator, options.output_executable_name, extension);

    command: [..] string;
    array_add(*command, executable);
    array_add(*command, ..runner.args);

    result := Process.run_command(..command);
    if result.exit_code != 0 {
        Compiler.compiler_report(tprint("[mdlab] Program exited with code %.", result.exit_code));
    }
}
"#;

pub struct JaiSynthesizer {
    compiler: Option<String>,
}

impl JaiSynthesizer {
    /// `compiler` overrides the PATH lookup for the Jai binary.
    pub fn new(compiler: Option<String>) -> Self {
        Self { compiler }
    }
}

impl Synthesizer for JaiSynthesizer {
    fn family(&self) -> LanguageFamily {
        LanguageFamily::Jai
    }

    fn sentinel(&self) -> String {
        format!("print(\"{SENTINEL}\\n\");\n")
    }

    fn entry_pattern(&self) -> Option<EntryPattern> {
        Some(ENTRY)
    }

    fn toolchain(&self) -> Result<Toolchain> {
        match &self.compiler {
            Some(program) => Toolchain::locate(&[program.as_str()], &[], install_urls::JAI),
            None => Toolchain::for_family(self.family()),
        }
    }

    fn synthesize(&self, history: &History, _ctx: &SynthesisContext) -> SynthesizedProgram {
        let mut imports: Vec<String> = Vec::new();
        let mut outer = String::new();
        let mut inner = String::new();

        for planned in history.plan() {
            inner.push_str("    ");
            inner.push_str(&self.sentinel());

            if !planned.role.contributes() {
                continue;
            }

            let content = &planned.entry.content;
            let cell_main = format!("mdlab_cell_main_{}", planned.entry.index);
            let (content, call) = match scan::find_constant_procedure(content, &JAI, ENTRY.name) {
                Some(entry) => {
                    let spliced = scan::splice(content, entry, &cell_main);
                    outer.push_str(&spliced.function);
                    outer.push('\n');
                    (spliced.remainder, Some(format!("    {cell_main}();\n")))
                }
                None => (content.clone(), None),
            };

            let routed = scan::route_top_level(&content, &JAI, classify);
            for import in routed.imports {
                let import = import.trim().to_string();
                if !imports.contains(&import) {
                    imports.push(import);
                }
            }

            outer.push_str(&routed.outer);
            if planned.role == Role::Global {
                outer.push_str(&routed.inner);
            } else {
                inner.push_str(&routed.inner);
            }
            if let Some(call) = call {
                inner.push_str(&call);
            }
        }

        if !imports.iter().any(|import| import == BASIC_IMPORT) {
            imports.insert(0, BASIC_IMPORT.to_string());
        }

        let mut source = imports.join("\n");
        source.push_str("\n\n");
        source.push_str(&outer);
        source.push_str("\nmain :: () {\n");
        source.push_str(&inner);
        source.push_str("}\n");

        let mut program = SynthesizedProgram::from_history(source, history);
        program.files.push(ScaffoldFile {
            path: PathBuf::from(self.family().dir_name())
                .join("modules")
                .join(format!("{PLUGIN}.jai")),
            contents: METAPROGRAM.to_string(),
            overwrite: true,
        });
        program
    }

    fn launch(
        &self,
        _program: &SynthesizedProgram,
        toolchain: &Toolchain,
        ctx: &SynthesisContext,
    ) -> Launch {
        Launch::new(
            Invocation::new(toolchain.path(), ctx.family_dir(self.family()))
                .arg(ctx.entry_path(self.family()))
                .arg("-quiet")
                .arg("-plug")
                .arg(PLUGIN),
        )
    }
}

fn classify(line: &str) -> Placement {
    // `#import "Math";`, `#load "util.jai";`, `Math :: #import "Math";`
    let directive = line
        .split_once("::")
        .map_or(line, |(_, value)| value.trim_start());
    if directive.starts_with("#import") || directive.starts_with("#load") {
        Placement::Import
    } else {
        Placement::Inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::test_support::{ctx, sentinel_count};
    use mdlab_doc::Directive;

    fn synthesize(sources: Vec<(&str, Option<Directive>)>) -> SynthesizedProgram {
        JaiSynthesizer::new(None).synthesize(&History::from_sources(sources), &ctx())
    }

    #[test]
    fn test_statements_run_inside_main() {
        let program = synthesize(vec![
            ("x := 40;", None),
            ("print(\"%\\n\", x + 2);", None),
        ]);

        assert!(program.source.starts_with(BASIC_IMPORT));
        let main_at = program.source.find("main :: () {").expect("main");
        assert!(program.source.find("x := 40;").expect("stmt") > main_at);
        assert_eq!(sentinel_count(&program.source), 2);
        assert_eq!(program.target_segment, 2);
    }

    #[test]
    fn test_imports_are_hoisted_once() {
        let program = synthesize(vec![
            ("#import \"Math\";\nr := sqrt(2.0);", None),
            ("Math :: #import \"Math\";\n#import \"Basic\";\nprint(\"%\\n\", r);", None),
            ("#import \"Math\";", None),
        ]);

        assert_eq!(program.source.matches("#import \"Basic\";").count(), 1);
        assert!(program.source.starts_with("#import \"Math\";\nMath :: #import \"Math\";\n#import \"Basic\";"));
        assert_eq!(sentinel_count(&program.source), 3);
    }

    #[test]
    fn test_global_cells_go_to_file_scope() {
        let program = synthesize(vec![
            ("Vec2 :: struct { x: float; y: float; }", Some(Directive::Global)),
            ("v := Vec2.{1, 2};", None),
        ]);

        let main_at = program.source.find("main :: () {").expect("main");
        assert!(program.source.find("Vec2 :: struct").expect("global") < main_at);
    }

    #[test]
    fn test_cell_main_is_spliced() {
        let program = synthesize(vec![
            ("greeting := \"hi\";", None),
            ("main :: () {\n    print(\"done\\n\");\n}", None),
        ]);

        let main_at = program.source.find("\nmain :: () {").expect("main");
        assert!(program.source.find("mdlab_cell_main_2 :: () {").expect("spliced") < main_at);
        assert!(program.source.contains("    mdlab_cell_main_2();\n"));
        assert_eq!(program.source.matches("main :: ()").count(), 1);
    }

    #[test]
    fn test_skipped_cells_keep_their_marker() {
        let program = synthesize(vec![
            ("a := 1;", None),
            ("assert(false);", Some(Directive::Skip)),
            ("b := 2;", Some(Directive::Once)),
            ("print(\"%\\n\", a);", None),
        ]);

        assert!(!program.source.contains("assert(false)"));
        assert!(!program.source.contains("b := 2;"));
        assert_eq!(sentinel_count(&program.source), 4);
    }

    #[test]
    fn test_metaprogram_and_launch() {
        let program = synthesize(vec![("print(\"x\\n\");", None)]);
        let file = program.files.first().expect("metaprogram");
        assert_eq!(file.path, PathBuf::from("jai/modules/mdlab.jai"));
        assert!(file.contents.contains("get_plugin :: () -> *Plugin"));

        let toolchain = Toolchain::new("jai", "/opt/jai/bin/jai-linux");
        let launch = JaiSynthesizer::new(None).launch(&program, &toolchain, &ctx());
        assert_eq!(
            launch.main.to_string(),
            "/opt/jai/bin/jai-linux /tmp/mdl/jai/main.jai -quiet -plug mdlab"
        );
        assert_eq!(launch.main.cwd, PathBuf::from("/tmp/mdl/jai"));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("#import \"Basic\";"), Placement::Import);
        assert_eq!(classify("Math :: #import \"Math\";"), Placement::Import);
        assert_eq!(classify("#load \"util.jai\";"), Placement::Import);
        assert_eq!(classify("Point :: struct {"), Placement::Inner);
        assert_eq!(classify("x := 1;"), Placement::Inner);
    }
}
