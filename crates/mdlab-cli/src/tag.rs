//! Tag command implementation for mdlab CLI.
//!
//! Sets, replaces or removes the directive of one code cell.

use std::path::Path;

use mdlab_doc::{Cell, Directive};

use crate::colors;

/// Directive names accepted by `mdlab tag`, with what they do.
const TAGS: &[(&str, &str)] = &[
    ("restart", "Restart execution from this cell"),
    ("global", "Place code in global scope"),
    ("skip", "Always skip this cell during execution"),
    ("once", "Only execute this cell when it is the current cell"),
    ("create=<file>", "Write this cell to a file instead of running it"),
    ("clear", "Run the cell but leave its output alone"),
];

/// Execute the tag command. `None` or `none` removes the directive.
pub fn execute(document: &Path, position: usize, tag: Option<&str>) -> anyhow::Result<()> {
    let directive = parse_tag(tag)?;
    let mut cells = mdlab_doc::read_document(document)?;

    set_directive(&mut cells, position, directive.clone())?;
    mdlab_doc::write_document(document, &cells)?;

    match directive {
        Some(directive) => println!(
            "{}Tagged{} cell {} as {}:{}{}",
            colors::GREEN,
            colors::RESET,
            position,
            colors::CYAN,
            directive,
            colors::RESET
        ),
        None => println!(
            "{}Removed{} directive from cell {}",
            colors::GREEN,
            colors::RESET,
            position
        ),
    }
    Ok(())
}

fn parse_tag(tag: Option<&str>) -> anyhow::Result<Option<Directive>> {
    let Some(tag) = tag.map(str::trim).filter(|t| !t.is_empty() && *t != "none") else {
        return Ok(None);
    };

    match Directive::parse(tag) {
        Some(Directive::Unrecognized(raw)) if raw.trim() == "create" || raw.starts_with("create=") => {
            anyhow::bail!("create needs a file name, e.g. create=helpers.py")
        }
        Some(Directive::Unrecognized(raw)) => {
            let known: Vec<&str> = TAGS.iter().map(|(name, _)| *name).collect();
            anyhow::bail!(
                "unknown directive: {} (expected one of: {}, none)",
                raw,
                known.join(", ")
            )
        }
        directive => Ok(directive),
    }
}

fn set_directive(
    cells: &mut [Cell],
    position: usize,
    directive: Option<Directive>,
) -> Result<(), mdlab_core::Error> {
    let cell = cells
        .get_mut(position)
        .ok_or(mdlab_core::Error::CellNotFound(position))?;
    if !cell.is_code() {
        return Err(mdlab_core::Error::NotACodeCell(position));
    }

    tracing::debug!("Cell {} directive {:?} -> {:?}", position, cell.directive, directive);
    cell.directive = directive;
    Ok(())
}

/// Help text listing the accepted directives.
pub fn help() -> String {
    let mut text = String::from("Directives:\n");
    for (name, description) in TAGS {
        text.push_str(&format!("  {:<15} {}\n", name, description));
    }
    text.push_str(&format!("  {:<15} {}", "none", "Remove the directive"));
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag(Some("once")).unwrap(), Some(Directive::Once));
        assert_eq!(
            parse_tag(Some("create=util.py")).unwrap(),
            Some(Directive::Create("util.py".to_string()))
        );
        assert_eq!(parse_tag(Some("none")).unwrap(), None);
        assert_eq!(parse_tag(None).unwrap(), None);

        let err = parse_tag(Some("create")).unwrap_err();
        assert!(err.to_string().contains("file name"));
        let err = parse_tag(Some("sometimes")).unwrap_err();
        assert!(err.to_string().contains("unknown directive: sometimes"));
    }

    #[test]
    fn test_set_directive_rewrites_fence() {
        let mut cells = mdlab_doc::parse("Intro\n\n```py :skip\nprint(1)\n```\n");

        set_directive(&mut cells, 1, Some(Directive::Once)).unwrap();
        assert_eq!(mdlab_doc::serialize(&cells), "Intro\n\n```py :once\nprint(1)\n```\n");

        set_directive(&mut cells, 1, None).unwrap();
        assert_eq!(mdlab_doc::serialize(&cells), "Intro\n\n```py\nprint(1)\n```\n");
    }

    #[test]
    fn test_set_directive_rejects_prose_and_missing_cells() {
        let mut cells = mdlab_doc::parse("Intro\n\n```sh\nls\n```\n");

        assert!(matches!(
            set_directive(&mut cells, 0, Some(Directive::Skip)),
            Err(mdlab_core::Error::NotACodeCell(0))
        ));
        assert!(matches!(
            set_directive(&mut cells, 5, Some(Directive::Skip)),
            Err(mdlab_core::Error::CellNotFound(5))
        ));
    }

    #[test]
    fn test_help_lists_every_directive() {
        let text = help();
        for (name, _) in TAGS {
            assert!(text.contains(name));
        }
        assert!(text.contains("none"));
    }
}
