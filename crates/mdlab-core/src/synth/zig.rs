//! Zig synthesis.
//!
//! `@import` lines are hoisted, function and container declarations move to
//! the outer scope, and statements run inside `pub fn main() !void`.

use crate::demux::SENTINEL;
use crate::family::LanguageFamily;
use crate::history::{History, Role};
use crate::toolchain::Toolchain;

use super::scan::{self, Placement, ZIG};
use super::{EntryPattern, Invocation, Launch, SynthesisContext, SynthesizedProgram, Synthesizer};

const ENTRY: EntryPattern = EntryPattern {
    keyword: "fn",
    name: "main",
    name_first: false,
};

const STD_IMPORT: &str = "const std = @import(\"std\");";

pub struct ZigSynthesizer;

impl Synthesizer for ZigSynthesizer {
    fn family(&self) -> LanguageFamily {
        LanguageFamily::Zig
    }

    fn sentinel(&self) -> String {
        format!("std.debug.print(\"{SENTINEL}\\n\", .{{}});\n")
    }

    fn entry_pattern(&self) -> Option<EntryPattern> {
        Some(ENTRY)
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

            let cell_main = format!("mdlabCellMain{}", planned.entry.index);
            let (content, call) = match scan::splice_entry_point(
                &planned.entry.content,
                &ZIG,
                ENTRY.keyword,
                ENTRY.name,
                &cell_main,
            ) {
                Some(spliced) => {
                    let call = if spliced.returns.contains('!') {
                        format!("    try {cell_main}();\n")
                    } else {
                        format!("    {cell_main}();\n")
                    };
                    (
                        format!("{}\n{}", spliced.remainder, spliced.function),
                        Some(call),
                    )
                }
                None => (planned.entry.content.clone(), None),
            };

            let routed = scan::route_top_level(&content, &ZIG, classify);
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

        if !imports.iter().any(|import| declares_std(import)) {
            imports.insert(0, STD_IMPORT.to_string());
        }

        let mut source = imports.join("\n");
        source.push_str("\n\n");
        source.push_str(&outer);
        source.push_str("\npub fn main() !void {\n");
        source.push_str(&inner);
        source.push_str("}\n");

        SynthesizedProgram::from_history(source, history)
    }

    fn launch(
        &self,
        _program: &SynthesizedProgram,
        toolchain: &Toolchain,
        ctx: &SynthesisContext,
    ) -> Launch {
        Launch::new(
            Invocation::new(toolchain.path(), ctx.family_dir(self.family()))
                .arg("run")
                .arg(ctx.entry_path(self.family())),
        )
    }
}

fn classify(line: &str) -> Placement {
    if line.contains("@import") {
        return Placement::Import;
    }

    let decl = ["pub ", "export ", "inline "]
        .iter()
        .fold(line, |rest, prefix| rest.strip_prefix(*prefix).unwrap_or(rest));

    if decl.starts_with("fn ") && line.ends_with('{') {
        return Placement::Outer;
    }

    // `const Point = struct {`, `var table = {`
    let container = decl
        .strip_prefix("const ")
        .or_else(|| decl.strip_prefix("var "))
        .and_then(|rest| rest.split_once('='))
        .and_then(|(_, value)| value.trim().strip_suffix('{'))
        .is_some_and(|kind| {
            kind.chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c.is_whitespace())
        });
    if container {
        return Placement::Outer;
    }

    Placement::Inner
}

fn declares_std(import: &str) -> bool {
    let words: Vec<&str> = import.split_whitespace().collect();
    matches!(words.as_slice(), ["const", "std", "=", ..] | ["pub", "const", "std", "=", ..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::test_support::{ctx, sentinel_count};
    use mdlab_doc::Directive;

    fn synthesize(sources: Vec<(&str, Option<Directive>)>) -> SynthesizedProgram {
        ZigSynthesizer.synthesize(&History::from_sources(sources), &ctx())
    }

    #[test]
    fn test_std_is_imported_once() {
        let program = synthesize(vec![
            ("const std = @import(\"std\");\nconst x: i32 = 4;", None),
            ("const std = @import(\"std\");\nstd.debug.print(\"{d}\\n\", .{x});", None),
        ]);

        assert_eq!(program.source.matches("@import(\"std\")").count(), 1);
        assert!(program.source.starts_with(STD_IMPORT));
        assert_eq!(sentinel_count(&program.source), 2);
    }

    #[test]
    fn test_std_is_added_when_missing() {
        let program = synthesize(vec![("const x = 1;", None)]);
        assert!(program.source.starts_with(STD_IMPORT));
        assert!(program.source.contains("pub fn main() !void {\n"));
    }

    #[test]
    fn test_declarations_move_out_of_main() {
        let program = synthesize(vec![(
            "fn add(a: i32, b: i32) i32 {\n    return a + b;\n}\nconst Point = struct {\n    x: i32,\n};\nconst sum = add(1, 2);",
            None,
        )]);

        let main_at = program.source.find("pub fn main()").expect("main");
        assert!(program.source.find("fn add(").expect("fn") < main_at);
        assert!(program.source.find("const Point").expect("struct") < main_at);
        assert!(program.source.find("const sum").expect("stmt") > main_at);
    }

    #[test]
    fn test_cell_main_is_spliced() {
        let program = synthesize(vec![(
            "pub fn main() !void {\n    std.debug.print(\"hi\\n\", .{});\n}",
            None,
        )]);

        assert!(program.source.contains("pub fn mdlabCellMain1() !void {"));
        assert!(program.source.contains("    try mdlabCellMain1();\n"));
        assert_eq!(program.source.matches("fn main()").count(), 1);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("const std = @import(     );"), Placement::Import);
        assert_eq!(classify("pub fn helper() void {"), Placement::Outer);
        assert_eq!(classify("const Color = enum {"), Placement::Outer);
        assert_eq!(classify("const v = blk: {"), Placement::Inner);
        assert_eq!(classify("var i: usize = 0;"), Placement::Inner);
    }
}
