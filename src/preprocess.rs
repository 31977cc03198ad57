//! Comment Stripper, Function-Name Scanner, and Preprocessor.
//!
//! These three run in sequence ahead of parsing: strip comments (preserving
//! column offsets), scan for user-defined function names, then rewrite
//! paren-free calls and bare shell commands into parenthesized call syntax
//! while recording a [`LineMap`] back to the original source.
use crate::error::Error;
use std::collections::HashSet;

const COMMENT_CHAR: char = '#';

/// A monotone, non-decreasing map from post-preprocess line number to
/// original source line number. `line_map[i]` is the original line that
/// produced post-preprocess line `i` (both 1-based; index 0 is unused).
#[derive(Debug, Clone, Default)]
pub struct LineMap {
    lines: Vec<usize>,
}

impl LineMap {
    fn new() -> Self {
        LineMap { lines: vec![0] }
    }

    fn push(&mut self, original_line: usize) {
        self.lines.push(original_line);
    }

    /// Look up the original line for post-preprocess line `i`. Out-of-range
    /// lookups clamp to the last recorded line, which only happens for
    /// synthetic trailing nodes (e.g. an inserted `end` with no source line
    /// of its own).
    pub fn original_line(&self, i: usize) -> usize {
        self.lines
            .get(i)
            .copied()
            .unwrap_or_else(|| *self.lines.last().unwrap_or(&1))
    }

    pub fn len(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn is_monotone(&self) -> bool {
        self.lines.windows(2).all(|w| w[0] <= w[1])
    }
}

/// Strip `#`-prefixed line comments, replacing the comment body with spaces so
/// later line/column offsets remain valid. Comment detection is string-aware:
/// a `#` inside a quoted string is not a comment.
pub fn strip_comments(source: &str) -> Result<String, Error> {
    let mut out = String::with_capacity(source.len());
    let mut in_string: Option<char> = None;
    let mut chars = source.chars().peekable();
    let mut line = 1usize;

    while let Some(c) = chars.next() {
        match in_string {
            Some(quote) => {
                out.push(c);
                if c == '\\' {
                    if let Some(&next) = chars.peek() {
                        out.push(next);
                        chars.next();
                        continue;
                    }
                } else if c == quote {
                    in_string = None;
                } else if c == '\n' {
                    return Err(Error::Syntax(format!(
                        "unterminated string literal starting before line {line}"
                    )));
                }
            }
            None => match c {
                '"' | '\'' => {
                    in_string = Some(c);
                    out.push(c);
                }
                COMMENT_CHAR => {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            out.push('\n');
                            line += 1;
                            break;
                        }
                        out.push(' ');
                    }
                    continue;
                }
                '\n' => {
                    out.push('\n');
                    line += 1;
                }
                other => out.push(other),
            },
        }
    }

    if in_string.is_some() {
        return Err(Error::Syntax(format!(
            "unterminated string literal starting before line {line}"
        )));
    }

    Ok(out)
}

/// Harvest the names of user-defined functions: identifiers that follow `def`
/// at the start of a (trimmed) line.
pub fn scan_function_names(cleaned_source: &str) -> HashSet<String> {
    let mut names = HashSet::new();
    for line in cleaned_source.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("def ") {
            let name: String = rest
                .trim_start()
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            if !name.is_empty() {
                names.insert(name);
            }
        }
    }
    names
}

const KEYWORDS: &[&str] = &[
    "import", "require", "as", "def", "end", "test", "bench", "if", "elsif", "else", "while",
    "for", "in", "return", "true", "false", "nil", "do", "rescue", "spawn", "parallel",
];

/// Rewrites paren-free calls to parenthesized form and wraps unrecognized
/// bare commands as shell-executor calls, producing the buffer the parser
/// consumes plus a [`LineMap`] back to `cleaned_source`.
pub fn preprocess(cleaned_source: &str, known_functions: &HashSet<String>) -> (String, LineMap) {
    let mut out = String::with_capacity(cleaned_source.len());
    let mut map = LineMap::new();

    for (idx, line) in cleaned_source.lines().enumerate() {
        let original_line = idx + 1;
        let rewritten = rewrite_line(line, known_functions);
        out.push_str(&rewritten);
        out.push('\n');
        map.push(original_line);
    }

    (out, map)
}

fn rewrite_line(line: &str, known_functions: &HashSet<String>) -> String {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];

    if trimmed.is_empty() {
        return line.to_string();
    }

    let mut tokens = trimmed.splitn(2, char::is_whitespace);
    let first = tokens.next().unwrap_or_default();
    let rest = tokens.next().unwrap_or_default().trim_start();

    // Already-structured forms (keywords, assignments, calls with explicit
    // parens, or a line that's just an identifier) pass through unchanged.
    if KEYWORDS.contains(&first)
        || rest.is_empty()
        || rest.starts_with('=')
        || rest.starts_with('(')
        || !is_ident(first)
    {
        return line.to_string();
    }

    if known_functions.contains(first) {
        let args = split_args(rest);
        return format!("{indent}{first}({})", args.join(", "));
    }

    // Shell fallback: the statement-initial token isn't a known function and
    // isn't a keyword, so treat the whole line as a shell command.
    let escaped = trimmed.replace('\\', "\\\\").replace('"', "\\\"");
    format!("{indent}sh(\"{escaped}\")")
}

fn is_ident(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Split paren-free call arguments on top-level whitespace, respecting quoted
/// strings and bracket nesting so `puts "a b", [1, 2]` splits into two
/// arguments rather than four.
fn split_args(rest: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut in_string: Option<char> = None;

    for c in rest.chars() {
        match in_string {
            Some(quote) => {
                current.push(c);
                if c == quote {
                    in_string = None;
                }
            }
            None => match c {
                '"' | '\'' => {
                    in_string = Some(c);
                    current.push(c);
                }
                '[' | '(' | '{' => {
                    depth += 1;
                    current.push(c);
                }
                ']' | ')' | '}' => {
                    depth -= 1;
                    current.push(c);
                }
                ',' if depth == 0 => {
                    args.push(current.trim().to_string());
                    current.clear();
                }
                c if c.is_whitespace() && depth == 0 && in_string.is_none() => {
                    if !current.trim().is_empty() {
                        args.push(current.trim().to_string());
                        current.clear();
                    }
                }
                other => current.push(other),
            },
        }
    }
    if !current.trim().is_empty() {
        args.push(current.trim().to_string());
    }
    args
}
