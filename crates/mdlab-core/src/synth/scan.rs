//! Best-effort lexical scanning of cell source.
//!
//! Cells are never parsed. The scanner only blanks out string literals and
//! comments so bracket depth and keywords can be read off the remaining code.
//! Every byte offset in a masked string matches the same offset in the
//! source.

use std::ops::Range;

/// Lexical rules of a language, as far as the scanner cares.
#[derive(Debug, Clone, Copy)]
pub struct Syntax {
    pub line_comment: &'static str,
    pub block_comment: Option<(&'static str, &'static str)>,
    /// Characters opening a string literal closed by the same character.
    pub quotes: &'static [char],
    /// Backtick strings take no escapes (Go raw strings).
    pub raw_backtick: bool,
    /// `r"..."` and `r#"..."#` raw strings.
    pub raw_strings: bool,
    /// `'x'` character literals. A lone `'` (a Rust lifetime) is kept.
    pub char_literals: bool,
    /// Prefix of a string literal running to the end of the line.
    pub line_string: Option<&'static str>,
}

pub const RUST: Syntax = Syntax {
    line_comment: "//",
    block_comment: Some(("/*", "*/")),
    quotes: &['"'],
    raw_backtick: false,
    raw_strings: true,
    char_literals: true,
    line_string: None,
};

pub const GO: Syntax = Syntax {
    line_comment: "//",
    block_comment: Some(("/*", "*/")),
    quotes: &['"', '`'],
    raw_backtick: true,
    raw_strings: false,
    char_literals: true,
    line_string: None,
};

pub const ZIG: Syntax = Syntax {
    line_comment: "//",
    block_comment: None,
    quotes: &['"'],
    raw_backtick: false,
    raw_strings: false,
    char_literals: true,
    line_string: Some("\\\\"),
};

pub const JAI: Syntax = Syntax {
    line_comment: "//",
    block_comment: Some(("/*", "*/")),
    quotes: &['"'],
    raw_backtick: false,
    raw_strings: false,
    char_literals: false,
    line_string: None,
};

/// Replace string literal and comment contents with spaces, keeping newlines.
pub fn mask(source: &str, syntax: &Syntax) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if starts_with_at(&chars, i, syntax.line_comment)
            || syntax
                .line_string
                .is_some_and(|open| starts_with_at(&chars, i, open))
        {
            let end = chars[i..]
                .iter()
                .position(|&ch| ch == '\n')
                .map_or(chars.len(), |n| i + n);
            blank_range(&mut out, &chars[i..end]);
            i = end;
            continue;
        }

        if let Some((open, close)) = syntax.block_comment
            && starts_with_at(&chars, i, open)
        {
            let body = i + open.chars().count();
            let end = (body..chars.len())
                .find(|&j| starts_with_at(&chars, j, close))
                .map_or(chars.len(), |j| j + close.chars().count());
            blank_range(&mut out, &chars[i..end]);
            i = end;
            continue;
        }

        if syntax.raw_strings
            && c == 'r'
            && !(i > 0 && is_ident_char(chars[i - 1]))
            && let Some(end) = raw_string_end(&chars, i)
        {
            blank_range(&mut out, &chars[i..end]);
            i = end;
            continue;
        }

        if syntax.quotes.contains(&c) {
            let escapes = !(syntax.raw_backtick && c == '`');
            let end = string_end(&chars, i, c, escapes);
            blank_range(&mut out, &chars[i..end]);
            i = end;
            continue;
        }

        if syntax.char_literals
            && c == '\''
            && let Some(end) = char_literal_end(&chars, i)
        {
            blank_range(&mut out, &chars[i..end]);
            i = end;
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}

/// Where a top-level block of a cell belongs in the synthesized program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Hoisted import declaration.
    Import,
    /// Module scope.
    Outer,
    /// Inside the entry point.
    Inner,
}

/// A cell split by [`route_top_level`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Routed {
    /// One string per import declaration, possibly multi-line.
    pub imports: Vec<String>,
    pub outer: String,
    pub inner: String,
}

/// Split a cell into imports, module-scope declarations and body statements.
///
/// `classify` sees the masked, trimmed first line of each statement at
/// bracket depth zero; the statement then runs until the depth is back to
/// zero.
pub fn route_top_level(
    source: &str,
    syntax: &Syntax,
    classify: impl Fn(&str) -> Placement,
) -> Routed {
    let masked = mask(source, syntax);
    let mut routed = Routed::default();
    let mut depth: i64 = 0;
    let mut open_block: Option<Placement> = None;
    let mut import = String::new();

    for (line, masked_line) in source.split('\n').zip(masked.split('\n')) {
        let placement = match open_block {
            Some(placement) => placement,
            None if depth == 0 => classify(masked_line.trim()),
            None => Placement::Inner,
        };

        for c in masked_line.chars() {
            match c {
                '{' | '(' | '[' => depth += 1,
                '}' | ')' | ']' => depth -= 1,
                _ => {}
            }
        }
        depth = depth.max(0);

        match placement {
            Placement::Import => push_line(&mut import, line),
            Placement::Outer => push_line(&mut routed.outer, line),
            Placement::Inner => push_line(&mut routed.inner, line),
        }

        if depth > 0 {
            if open_block.is_none() && placement != Placement::Inner {
                open_block = Some(placement);
            }
        } else {
            open_block = None;
            if !import.is_empty() {
                routed.imports.push(import.trim_end().to_string());
                import.clear();
            }
        }
    }

    if !import.is_empty() {
        routed.imports.push(import.trim_end().to_string());
    }

    routed
}

/// A user-written entry point function found in a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// Byte range of the whole declaration, including a leading `pub`.
    pub span: Range<usize>,
    /// Byte range of the function name.
    pub name: Range<usize>,
    /// Text between the parameter list and the body, trimmed.
    pub returns: String,
}

/// Find the single top-level function `keyword name(...) ... { ... }`.
///
/// Returns `None` unless exactly one declaration with a balanced body
/// exists.
pub fn find_entry_point(
    source: &str,
    syntax: &Syntax,
    keyword: &str,
    name: &str,
) -> Option<EntryPoint> {
    let label = format!("{keyword} {name}");
    find_declaration(source, syntax, &label, |masked, at| {
        if is_word_at(masked.as_bytes(), at, keyword) {
            parse_signature(source, masked, at, keyword, name)
        } else {
            Signature::NoMatch
        }
    })
}

/// Find the single top-level constant procedure `name :: (...) ... { ... }`.
///
/// Same rules as [`find_entry_point`], for languages that bind procedures
/// like constants.
pub fn find_constant_procedure(source: &str, syntax: &Syntax, name: &str) -> Option<EntryPoint> {
    let label = format!("{name} ::");
    find_declaration(source, syntax, &label, |masked, at| {
        if is_name_at(masked.as_bytes(), at, name) {
            parse_constant_procedure(source, masked, at, name)
        } else {
            Signature::NoMatch
        }
    })
}

/// Walk bracket depth zero of the masked source and collect declarations
/// recognized by `parse_at`.
fn find_declaration(
    source: &str,
    syntax: &Syntax,
    label: &str,
    parse_at: impl Fn(&str, usize) -> Signature,
) -> Option<EntryPoint> {
    let masked = mask(source, syntax);
    let bytes = masked.as_bytes();
    let mut candidates = Vec::new();
    let mut depth: i64 = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' | b'(' | b'[' => depth += 1,
            b'}' | b')' | b']' => depth -= 1,
            _ if depth == 0 => match parse_at(&masked, i) {
                Signature::Found(entry) => {
                    i = entry.span.end;
                    candidates.push(entry);
                    continue;
                }
                Signature::Unbalanced => {
                    tracing::debug!("Unbalanced `{}` body, not splicing", label);
                    return None;
                }
                Signature::NoMatch => {}
            },
            _ => {}
        }
        i += 1;
    }

    if candidates.len() > 1 {
        tracing::debug!(
            "{} `{}` declarations in one cell, not splicing",
            candidates.len(),
            label
        );
        return None;
    }
    candidates.pop()
}

/// A cell with its entry point renamed and cut out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spliced {
    /// The renamed function declaration.
    pub function: String,
    /// The rest of the cell.
    pub remainder: String,
    /// Return type text of the function.
    pub returns: String,
}

/// Rename a cell's entry point to `new_name` and separate it from the rest.
pub fn splice_entry_point(
    source: &str,
    syntax: &Syntax,
    keyword: &str,
    name: &str,
    new_name: &str,
) -> Option<Spliced> {
    let entry = find_entry_point(source, syntax, keyword, name)?;
    Some(splice(source, entry, new_name))
}

/// Rename a found declaration to `new_name` and cut it out of `source`.
pub fn splice(source: &str, entry: EntryPoint, new_name: &str) -> Spliced {
    let function = format!(
        "{}{}{}",
        &source[entry.span.start..entry.name.start],
        new_name,
        &source[entry.name.end..entry.span.end]
    );
    let remainder = format!(
        "{}{}",
        &source[..entry.span.start],
        &source[entry.span.end..]
    );

    Spliced {
        function,
        remainder,
        returns: entry.returns,
    }
}

// =============================================================================
// Helpers
// =============================================================================

enum Signature {
    Found(EntryPoint),
    Unbalanced,
    NoMatch,
}

fn parse_signature(source: &str, masked: &str, at: usize, keyword: &str, name: &str) -> Signature {
    let bytes = masked.as_bytes();

    let name_start = skip_whitespace(bytes, at + keyword.len());
    let name_end = name_start + name.len();
    if !bytes[name_start..].starts_with(name.as_bytes())
        || bytes.get(name_end).is_some_and(|&b| is_ident_byte(b))
    {
        return Signature::NoMatch;
    }

    let open_paren = skip_whitespace(bytes, name_end);
    if bytes.get(open_paren) != Some(&b'(') {
        return Signature::NoMatch;
    }
    let (close_paren, open_brace, close_brace) = match procedure_body(bytes, open_paren) {
        Ok(body) => body,
        Err(signature) => return signature,
    };

    let before = masked[..at].trim_end_matches([' ', '\t']);
    let start = match before.strip_suffix("pub") {
        Some(rest) if !rest.ends_with(is_ident_char) => rest.len(),
        _ => at,
    };

    Signature::Found(EntryPoint {
        span: start..close_brace + 1,
        name: name_start..name_end,
        returns: source[close_paren + 1..open_brace].trim().to_string(),
    })
}

fn parse_constant_procedure(source: &str, masked: &str, at: usize, name: &str) -> Signature {
    let bytes = masked.as_bytes();
    let name_end = at + name.len();

    let binding = skip_whitespace(bytes, name_end);
    if !bytes[binding..].starts_with(b"::") {
        return Signature::NoMatch;
    }
    let open_paren = skip_whitespace(bytes, binding + 2);
    if bytes.get(open_paren) != Some(&b'(') {
        return Signature::NoMatch;
    }

    match procedure_body(bytes, open_paren) {
        Ok((close_paren, open_brace, close_brace)) => Signature::Found(EntryPoint {
            span: at..close_brace + 1,
            name: at..name_end,
            returns: source[close_paren + 1..open_brace].trim().to_string(),
        }),
        Err(signature) => signature,
    }
}

/// Locate the parameter list closer and the body braces of a procedure
/// whose parameters open at `open_paren`.
fn procedure_body(bytes: &[u8], open_paren: usize) -> Result<(usize, usize, usize), Signature> {
    let close_paren =
        matching_close(bytes, open_paren, b'(', b')').ok_or(Signature::Unbalanced)?;

    let mut open_brace = close_paren + 1;
    while open_brace < bytes.len() && bytes[open_brace] != b'{' {
        if matches!(bytes[open_brace], b';' | b'}') {
            return Err(Signature::NoMatch);
        }
        open_brace += 1;
    }
    if open_brace == bytes.len() {
        return Err(Signature::NoMatch);
    }
    let close_brace =
        matching_close(bytes, open_brace, b'{', b'}').ok_or(Signature::Unbalanced)?;

    Ok((close_paren, open_brace, close_brace))
}

fn matching_close(bytes: &[u8], open_at: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, &b) in bytes[open_at..].iter().enumerate() {
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(open_at + offset);
            }
        }
    }
    None
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn is_word_at(bytes: &[u8], i: usize, word: &str) -> bool {
    bytes[i..].starts_with(word.as_bytes())
        && (i == 0 || !is_ident_byte(bytes[i - 1]))
        && bytes
            .get(i + word.len())
            .is_some_and(|b| b.is_ascii_whitespace())
}

fn is_name_at(bytes: &[u8], i: usize, name: &str) -> bool {
    bytes[i..].starts_with(name.as_bytes())
        && (i == 0 || !is_ident_byte(bytes[i - 1]))
        && !bytes.get(i + name.len()).is_some_and(|&b| is_ident_byte(b))
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn starts_with_at(chars: &[char], i: usize, pattern: &str) -> bool {
    !pattern.is_empty()
        && pattern
            .chars()
            .enumerate()
            .all(|(k, p)| chars.get(i + k) == Some(&p))
}

fn string_end(chars: &[char], start: usize, quote: char, escapes: bool) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        if escapes && chars[i] == '\\' {
            i += 2;
            continue;
        }
        if chars[i] == quote {
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

fn raw_string_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    let mut hashes = 0;
    while chars.get(i) == Some(&'#') {
        hashes += 1;
        i += 1;
    }
    if chars.get(i) != Some(&'"') {
        return None;
    }

    let mut j = i + 1;
    while j < chars.len() {
        if chars[j] == '"' && (1..=hashes).all(|k| chars.get(j + k) == Some(&'#')) {
            return Some(j + 1 + hashes);
        }
        j += 1;
    }
    Some(chars.len())
}

fn char_literal_end(chars: &[char], start: usize) -> Option<usize> {
    match chars.get(start + 1) {
        Some('\\') => (start + 3..chars.len().min(start + 12))
            .find(|&j| chars[j] == '\'')
            .map(|j| j + 1),
        Some(&c) if c != '\'' && c != '\n' => {
            (chars.get(start + 2) == Some(&'\'')).then_some(start + 3)
        }
        _ => None,
    }
}

fn blank_range(out: &mut String, chars: &[char]) {
    for &c in chars {
        if c == '\n' {
            out.push('\n');
        } else {
            out.extend(std::iter::repeat_n(' ', c.len_utf8()));
        }
    }
}

fn push_line(target: &mut String, line: &str) {
    target.push_str(line);
    target.push('\n');
}
