//! Search command implementation for mdlab CLI.
//!
//! Case-insensitive text search over every `.md` file under the notes
//! directory.

use std::fs;
use std::path::{Path, PathBuf};

use mdlab_core::Config;
use regex::{Regex, RegexBuilder};

use crate::colors;

/// A matching line.
#[derive(Debug, PartialEq, Eq)]
struct Hit {
    path: PathBuf,
    line: usize,
    text: String,
}

/// Execute the search command.
pub fn execute(config: &Config, pattern: &str) -> anyhow::Result<()> {
    let base = &config.base_path;
    if !base.is_dir() {
        anyhow::bail!(
            "Notes directory not found: {} (run `mdlab init` to create it)",
            base.display()
        );
    }

    let matcher = RegexBuilder::new(&regex::escape(pattern))
        .case_insensitive(true)
        .build()?;
    let hits = search(base, &matcher)?;

    for hit in &hits {
        let relative = hit.path.strip_prefix(base).unwrap_or(&hit.path);
        println!(
            "{}{}{}:{}{}{}: {}",
            colors::CYAN,
            relative.display(),
            colors::RESET,
            colors::DIM,
            hit.line,
            colors::RESET,
            hit.text.trim()
        );
    }

    if hits.is_empty() {
        println!("{}No matches for \"{}\"{}", colors::YELLOW, pattern, colors::RESET);
    }
    Ok(())
}

fn search(base: &Path, matcher: &Regex) -> std::io::Result<Vec<Hit>> {
    let mut files = Vec::new();
    collect_markdown(base, &mut files)?;
    files.sort();

    let mut hits = Vec::new();
    for path in files {
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        for (i, line) in text.lines().enumerate() {
            if matcher.is_match(line) {
                hits.push(Hit {
                    path: path.clone(),
                    line: i + 1,
                    text: line.to_string(),
                });
            }
        }
    }
    Ok(hits)
}

/// Recursively collect `.md` files, skipping hidden directories.
fn collect_markdown(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'));

        if path.is_dir() {
            if !hidden {
                collect_markdown(&path, files)?;
            }
        } else if path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn matcher(pattern: &str) -> Regex {
        RegexBuilder::new(&regex::escape(pattern))
            .case_insensitive(true)
            .build()
            .unwrap()
    }

    #[test]
    fn test_search_is_case_insensitive_and_recursive() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("rust")).unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        fs::write(temp.path().join("index.md"), "# Index\nTokio notes\n").unwrap();
        fs::write(temp.path().join("rust/async.md"), "uses tokio::spawn\n").unwrap();
        fs::write(temp.path().join("rust/notes.txt"), "tokio\n").unwrap();
        fs::write(temp.path().join(".git/HEAD.md"), "tokio\n").unwrap();

        let hits = search(temp.path(), &matcher("TOKIO")).unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].path, temp.path().join("index.md"));
        assert_eq!(hits[0].line, 2);
        assert_eq!(hits[1].text, "uses tokio::spawn");
    }

    #[test]
    fn test_pattern_is_literal() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.md"), "a.b\naxb\n").unwrap();

        let hits = search(temp.path(), &matcher("a.b")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, 1);
    }
}
