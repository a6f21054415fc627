//! Go synthesis.
//!
//! Imports are hoisted into one import block, `func` and `type` declarations
//! move to package scope, and everything else runs inside `func main`.

use std::path::PathBuf;

use crate::demux::SENTINEL;
use crate::family::LanguageFamily;
use crate::history::{History, Role};
use crate::toolchain::Toolchain;

use super::scan::{self, GO, Placement};
use super::{
    EntryPattern, Invocation, Launch, ScaffoldFile, SynthesisContext, SynthesizedProgram,
    Synthesizer,
};

const ENTRY: EntryPattern = EntryPattern {
    keyword: "func",
    name: "main",
    name_first: false,
};

const GO_MOD: &str = "module mdlab\n\ngo 1.21\n";

pub struct GoSynthesizer;

impl Synthesizer for GoSynthesizer {
    fn family(&self) -> LanguageFamily {
        LanguageFamily::Go
    }

    fn sentinel(&self) -> String {
        format!("fmt.Println(\"{SENTINEL}\")\n")
    }

    fn entry_pattern(&self) -> Option<EntryPattern> {
        Some(ENTRY)
    }

    fn synthesize(&self, history: &History, _ctx: &SynthesisContext) -> SynthesizedProgram {
        let mut imports = vec!["\"fmt\"".to_string()];
        let mut outer = String::new();
        let mut body = String::new();

        for planned in history.plan() {
            body.push('\t');
            body.push_str(&self.sentinel());

            if !planned.role.contributes() {
                continue;
            }

            let cell_main = format!("mdlabCellMain{}", planned.entry.index);
            let (content, call) = match scan::splice_entry_point(
                &planned.entry.content,
                &GO,
                ENTRY.keyword,
                ENTRY.name,
                &cell_main,
            ) {
                Some(spliced) => (
                    format!("{}\n{}", spliced.remainder, spliced.function),
                    Some(format!("\t{cell_main}()\n")),
                ),
                None => (planned.entry.content.clone(), None),
            };

            let routed = scan::route_top_level(&content, &GO, classify);
            for block in &routed.imports {
                for spec in import_specs(block) {
                    if !imports.contains(&spec) {
                        imports.push(spec);
                    }
                }
            }

            outer.push_str(&routed.outer);
            if planned.role == Role::Global {
                outer.push_str(&routed.inner);
            } else {
                body.push_str(&routed.inner);
            }
            if let Some(call) = call {
                body.push_str(&call);
            }
        }

        let mut source = String::from("package main\n\nimport (\n");
        for spec in &imports {
            source.push('\t');
            source.push_str(spec);
            source.push('\n');
        }
        source.push_str(")\n\n");
        source.push_str(&outer);
        source.push_str("\nfunc main() {\n");
        source.push_str(&body);
        source.push_str("}\n");

        let mut program = SynthesizedProgram::from_history(source, history);
        program.dependencies = imports
            .iter()
            .filter_map(|spec| import_path(spec))
            .filter(|path| is_external(path))
            .map(str::to_string)
            .collect();
        program.files.push(ScaffoldFile {
            path: PathBuf::from(LanguageFamily::Go.dir_name()).join("go.mod"),
            contents: GO_MOD.to_string(),
            overwrite: false,
        });
        program
    }

    fn launch(
        &self,
        program: &SynthesizedProgram,
        toolchain: &Toolchain,
        ctx: &SynthesisContext,
    ) -> Launch {
        let dir = ctx.family_dir(self.family());
        let mut launch = Launch::new(
            Invocation::new(toolchain.path(), &dir)
                .arg("run")
                .arg("main.go"),
        );
        if !program.dependencies.is_empty() {
            launch.preparation.push(
                Invocation::new(toolchain.path(), &dir)
                    .arg("mod")
                    .arg("tidy"),
            );
        }
        launch
    }
}

fn classify(line: &str) -> Placement {
    // String literals are masked, so `import "os"` arrives as `import`.
    if line
        .strip_prefix("import")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t', '(']))
    {
        return Placement::Import;
    }
    if let Some(rest) = line.strip_prefix("func ") {
        let rest = rest.trim_start();
        let is_main = rest
            .strip_prefix("main")
            .is_some_and(|after| after.trim_start().starts_with('('));
        return if is_main {
            Placement::Inner
        } else {
            Placement::Outer
        };
    }
    if line.starts_with("type ") {
        return Placement::Outer;
    }
    Placement::Inner
}

/// Import specs (`"os"`, `str "strings"`) of one import declaration.
fn import_specs(block: &str) -> Vec<String> {
    let body = block.trim().trim_start_matches("import").trim();
    let body = body
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(body);

    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("//"))
        .map(str::to_string)
        .collect()
}

fn import_path(spec: &str) -> Option<&str> {
    let start = spec.find('"')? + 1;
    let end = start + spec[start..].find('"')?;
    Some(&spec[start..end])
}

/// Standard library paths have no dot in their first element.
fn is_external(path: &str) -> bool {
    path.split('/').next().is_some_and(|first| first.contains('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::test_support::{ctx, sentinel_count};
    use mdlab_doc::Directive;

    fn synthesize(sources: Vec<(&str, Option<Directive>)>) -> SynthesizedProgram {
        GoSynthesizer.synthesize(&History::from_sources(sources), &ctx())
    }

    #[test]
    fn test_imports_are_hoisted_and_deduplicated() {
        let program = synthesize(vec![
            ("import \"strings\"\nx := strings.ToUpper(\"a\")", None),
            ("import (\n\t\"fmt\"\n\t\"strings\"\n\ts \"sort\"\n)\nfmt.Println(x)", None),
        ]);

        assert!(program.source.starts_with(
            "package main\n\nimport (\n\t\"fmt\"\n\t\"strings\"\n\ts \"sort\"\n)\n"
        ));
        assert!(!program.source.contains("import \"strings\""));
        assert!(program.dependencies.is_empty());
        assert_eq!(sentinel_count(&program.source), 2);
    }

    #[test]
    fn test_declarations_move_to_package_scope() {
        let program = synthesize(vec![(
            "type Pair struct {\n\tA, B int\n}\nfunc (p Pair) Sum() int {\n\treturn p.A + p.B\n}\nfmt.Println(Pair{1, 2}.Sum())",
            None,
        )]);

        let main_at = program.source.find("func main()").expect("main");
        assert!(program.source.find("type Pair").expect("type") < main_at);
        assert!(program.source.find("func (p Pair) Sum()").expect("method") < main_at);
        assert!(program.source.find("fmt.Println(Pair").expect("call") > main_at);
    }

    #[test]
    fn test_cell_main_is_spliced() {
        let program = synthesize(vec![(
            "import \"os\"\n\nfunc main() {\n\tfmt.Println(len(os.Args))\n}",
            None,
        )]);

        assert!(program.source.contains("func mdlabCellMain1() {"));
        assert!(program.source.contains("\tmdlabCellMain1()\n"));
        assert_eq!(program.source.matches("func main()").count(), 1);
    }

    #[test]
    fn test_external_imports_need_tidy() {
        let program = synthesize(vec![(
            "import \"github.com/google/uuid\"\nfmt.Println(uuid.New())",
            None,
        )]);
        assert_eq!(program.dependencies, vec!["github.com/google/uuid"]);

        let toolchain = Toolchain::new("go", "/usr/bin/go");
        let launch = GoSynthesizer.launch(&program, &toolchain, &ctx());
        assert_eq!(launch.preparation.len(), 1);
        assert_eq!(launch.preparation[0].args, vec!["mod", "tidy"]);
        assert_eq!(launch.main.args, vec!["run", "main.go"]);
        assert_eq!(launch.main.cwd, PathBuf::from("/tmp/mdl/go"));
    }

    #[test]
    fn test_go_mod_is_written_once() {
        let program = synthesize(vec![("fmt.Println(1)", None)]);
        let go_mod = &program.files[0];
        assert_eq!(go_mod.path, PathBuf::from("go/go.mod"));
        assert!(!go_mod.overwrite);
    }

    #[test]
    fn test_is_external() {
        assert!(!is_external("fmt"));
        assert!(!is_external("net/http"));
        assert!(is_external("golang.org/x/exp/slices"));
    }
}
