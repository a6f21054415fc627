//! Fence tag abbreviations.

/// Short fence tags and the language identifier they stand for.
///
/// The reverse direction (identifier to abbreviation) is used when writing
/// a cell whose language has no stored tag.
pub const LANG_IDS: &[(&str, &str)] = &[
    ("js", "javascript"),
    ("ts", "typescript"),
    ("rust", "rust"),
    ("go", "go"),
    ("nu", "nushell"),
    ("sh", "bash"),
    ("fish", "fish"),
    ("zsh", "zsh"),
    ("openai", "openai"),
    ("groq", "groq"),
];

/// Map a fence tag to its canonical language identifier.
///
/// Unknown tags pass through unchanged.
pub fn canonical_language(tag: &str) -> &str {
    LANG_IDS
        .iter()
        .find(|(abbrev, _)| *abbrev == tag)
        .map(|(_, id)| *id)
        .unwrap_or(tag)
}

/// Map a language identifier back to its fence abbreviation.
pub fn abbreviation(language: &str) -> &str {
    LANG_IDS
        .iter()
        .find(|(_, id)| *id == language)
        .map(|(abbrev, _)| *abbrev)
        .unwrap_or(language)
}
