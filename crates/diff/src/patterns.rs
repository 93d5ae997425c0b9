//! Compiled line patterns and the pure extraction helpers built on them.
//!
//! Everything here works on a single line of text and never fails: a shape
//! that does not match simply yields `None` or an empty collection.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::line::{Assignment, FunctionSignature};

/// Prefixes that mark a (trimmed) line as a comment.
const COMMENT_MARKERS: &[&str] = &["//", "#", "/*", "*"];

/// Prefixes that mark a (trimmed) line as an import statement.
const IMPORT_KEYWORDS: &[&str] = &[
    "import ", "from ", "require(", "include ", "using ", "use ",
];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static STRING_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|`(?:[^`\\]|\\.)*`"#).unwrap()
});
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").unwrap());
static BOOLEAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:true|false|True|False|TRUE|FALSE)\b").unwrap());
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Za-z_]\w*\b").unwrap());
static OPERATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"===|!==|==|!=|>=|<=|&&|\|\||>|<|!").unwrap());
static CONTROL_FLOW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\}\s*)?(else\s+)?(if|while|for|switch)\b").unwrap());
static TRY_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^try\b").unwrap());
static CATCH_OR_FINALLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\}\s*)?(?:catch|finally)\b").unwrap());
static OBJECT_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^["']?[A-Za-z_$][\w$-]*["']?$"#).unwrap());
static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"//.*$").unwrap());
static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\*.*?\*/").unwrap());
static SKELETON_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?P<str>"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|`(?:[^`\\]|\\.)*`)|(?P<comment>//.*$|/\*.*?\*/)|(?P<num>\b\d+(?:\.\d+)?\b)|(?P<id>\b[A-Za-z_]\w*\b)"#,
    )
    .unwrap()
});

/// Declaration shapes tried in order; group 1 is the name, group 2 the
/// parameter text.
static FUNCTION_SHAPES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // function foo(a, b) / async function foo(a) / function* gen()
        r"\bfunction(?:\s*\*\s*|\s+)(\w+)\s*\(([^)]*)\)",
        // const foo = function (a) / const foo = async function bar(a)
        r"\b(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?function\b\s*\*?\s*\w*\s*\(([^)]*)\)",
        // const foo = (a) => / const foo = async (a) =>
        r"\b(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s*)?\(([^)]*)\)\s*=>",
        // const foo = a => / const foo = async a =>
        r"\b(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?(\w+)\s*=>",
        // def foo(a): / async def foo(a):
        r"^(?:async\s+)?def\s+(\w+)\s*\(([^)]*)\)",
        // fn foo(a: u8) / pub async fn foo<T>(a: T)
        r"^(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?fn\s+(\w+)\s*(?:<[^>]*>)?\s*\(([^)]*)\)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Module path extractors tried in order; group 1 is the path.
static IMPORT_PATHS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"\bfrom\s+['"]([^'"]+)['"]"#,
        r#"^import\s+['"]([^'"]+)['"]"#,
        r#"require\(\s*['"]([^'"]+)['"]\s*\)"#,
        r"^from\s+([\w.]+)\s+import\b",
        r"^import\s+([\w.]+)(?:\s+as\s+\w+)?\s*;?\s*$",
        r"^use\s+((?:\w+::)*\w+)",
        r"^using\s+(?:static\s+)?([\w.]+)\s*;",
        r#"^include\s+['"<]?([^'">;\s]+)"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Whitespace-normalized text: trimmed, with internal runs collapsed to one space.
pub fn signature(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

pub fn is_comment(trimmed: &str) -> bool {
    COMMENT_MARKERS.iter().any(|marker| trimmed.starts_with(marker)) || trimmed.contains("<!--")
}

pub fn is_import(trimmed: &str) -> bool {
    IMPORT_KEYWORDS.iter().any(|keyword| trimmed.starts_with(keyword))
}

/// A line is substantive unless it is blank, a comment, or made only of
/// closing punctuation (or only of quotes).
pub fn is_substantive(trimmed: &str) -> bool {
    if trimmed.is_empty() || is_comment(trimmed) {
        return false;
    }
    let only_closing = trimmed
        .chars()
        .all(|c| matches!(c, '}' | ']' | ')' | ';' | ',') || c.is_whitespace());
    let only_quotes = trimmed.chars().all(|c| matches!(c, '"' | '\'' | '`'));
    !only_closing && !only_quotes
}

/// String, number and boolean literal tokens in order of appearance.
///
/// Numbers and booleans that sit inside a string literal are not reported
/// separately.
pub fn extract_literals(text: &str) -> Vec<String> {
    let strings: Vec<(usize, usize)> = STRING_LITERAL
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();
    let inside_string = |start: usize| strings.iter().any(|&(s, e)| start >= s && start < e);

    let mut found: Vec<(usize, String)> = strings
        .iter()
        .map(|&(s, e)| (s, text[s..e].to_string()))
        .collect();
    for pattern in [&*NUMBER, &*BOOLEAN] {
        found.extend(
            pattern
                .find_iter(text)
                .filter(|m| !inside_string(m.start()))
                .map(|m| (m.start(), m.as_str().to_string())),
        );
    }
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, literal)| literal).collect()
}

pub fn extract_identifiers(text: &str) -> Vec<String> {
    IDENTIFIER
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// The text inside the first balanced parenthesis group, trimmed.
pub fn extract_condition(text: &str) -> Option<String> {
    let open = text.find('(')?;
    let mut depth = 0usize;
    for (offset, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let end = open + offset;
                    return Some(text[open + 1..end].trim().to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Comparison, equality and logical operators in order of appearance.
pub fn extract_operators(condition: &str) -> Vec<String> {
    OPERATOR
        .find_iter(condition)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// The leading control-flow keyword, `else`-prefixed when present
/// (`"if"`, `"else if"`, `"while"`, ...).
pub fn control_keyword(trimmed: &str) -> Option<String> {
    let caps = CONTROL_FLOW.captures(trimmed)?;
    let keyword = caps.get(2)?.as_str();
    Some(match caps.get(1) {
        Some(_) => format!("else {}", keyword),
        None => keyword.to_string(),
    })
}

pub fn is_try_start(trimmed: &str) -> bool {
    TRY_START.is_match(trimmed)
}

/// Whether `text` opens with a `catch` or `finally` clause (optionally after
/// the closing brace of the previous clause).
pub fn starts_catch_or_finally(text: &str) -> bool {
    CATCH_OR_FINALLY.is_match(text)
}

pub fn parse_function(trimmed: &str) -> Option<FunctionSignature> {
    FUNCTION_SHAPES.iter().find_map(|shape| {
        let caps = shape.captures(trimmed)?;
        let params = caps.get(2);
        let rest = match params {
            Some(m) => format!("{}{}", &trimmed[..m.start()], &trimmed[m.end()..]),
            None => trimmed.to_string(),
        };
        Some(FunctionSignature {
            name: caps.get(1)?.as_str().to_string(),
            params: params.map(|m| m.as_str().trim()).unwrap_or("").to_string(),
            rest,
        })
    })
}

pub fn import_path(trimmed: &str) -> Option<String> {
    IMPORT_PATHS
        .iter()
        .find_map(|pattern| pattern.captures(trimmed))
        .and_then(|caps| caps.get(1).map(|m| m.as_str().to_string()))
}

/// Split a line at its assignment operator.
///
/// Plain `=` wins (skipping `==`, `!=`, `<=`, `>=` and `=>`); otherwise an
/// object-style `key: value` split is tried. Operators inside quotes are
/// ignored.
pub fn split_assignment(trimmed: &str) -> Option<Assignment> {
    let bytes = trimmed.as_bytes();
    let mut quote: Option<u8> = None;
    let mut colon: Option<usize> = None;

    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if b == q && (i == 0 || bytes[i - 1] != b'\\') {
                quote = None;
            }
            continue;
        }
        let prev = if i > 0 { bytes[i - 1] } else { 0 };
        let next = bytes.get(i + 1).copied().unwrap_or(0);
        match b {
            b'"' | b'\'' | b'`' => quote = Some(b),
            b'=' => {
                if matches!(prev, b'=' | b'!' | b'<' | b'>') || matches!(next, b'=' | b'>') {
                    continue;
                }
                return Assignment::from_parts(&trimmed[..i], &trimmed[i + 1..]);
            }
            b':' if colon.is_none() && prev != b':' && next != b':' => colon = Some(i),
            _ => {}
        }
    }

    let i = colon?;
    let key = trimmed[..i].trim();
    if !OBJECT_KEY.is_match(key) {
        return None;
    }
    Assignment::from_parts(key, &trimmed[i + 1..])
}

/// Line shape with literals, comments and identifiers replaced by placeholders.
pub fn skeleton(text: &str) -> String {
    let replaced = SKELETON_TOKEN.replace_all(text, |caps: &Captures| {
        if caps.name("str").is_some() {
            "STR"
        } else if caps.name("comment").is_some() {
            "COMMENT"
        } else if caps.name("num").is_some() {
            "NUM"
        } else {
            "ID"
        }
    });
    signature(&replaced)
}

/// Drop `//` and `/* */` comments from a line.
pub fn strip_comments(text: &str) -> String {
    let without_blocks = BLOCK_COMMENT.replace_all(text, " ");
    LINE_COMMENT.replace_all(&without_blocks, "").into_owned()
}

/// Character-position similarity: the share of positions holding the same
/// character, relative to the longer text. Two empty texts are identical.
pub fn char_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    let same = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    same as f64 / longest as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn signature_collapses_whitespace() {
        assert_eq!(signature("   let   x =\t5;  "), "let x = 5;");
        assert_eq!(signature("   "), "");
    }

    #[test]
    fn comment_markers() {
        assert!(is_comment("// note"));
        assert!(is_comment("# note"));
        assert!(is_comment("/* note */"));
        assert!(is_comment("* continued"));
        assert!(is_comment("<div><!-- note -->"));
        assert!(!is_comment("let x = 1; // trailing"));
    }

    #[test]
    fn substantive_lines() {
        assert!(is_substantive("foo();"));
        assert!(!is_substantive(""));
        assert!(!is_substantive("});"));
        assert!(!is_substantive("]"));
        assert!(!is_substantive("\"\""));
        assert!(!is_substantive("// comment"));
    }

    #[test]
    fn literals_in_order_without_nested_numbers() {
        assert_eq!(
            extract_literals(r#"call("v 2", 10, true)"#),
            vec![r#""v 2""#.to_string(), "10".to_string(), "true".to_string()]
        );
        assert!(extract_literals("a = b + c").is_empty());
    }

    #[test]
    fn identifiers_keep_duplicates() {
        assert_eq!(
            extract_identifiers("x = x + y1"),
            vec!["x".to_string(), "x".to_string(), "y1".to_string()]
        );
    }

    #[test]
    fn condition_tracks_nesting() {
        assert_eq!(
            extract_condition("if (a && (b || c)) {").as_deref(),
            Some("a && (b || c)")
        );
        assert_eq!(extract_condition("if (a && (b {"), None);
        assert_eq!(extract_condition("return x;"), None);
    }

    #[test]
    fn operators_keep_order() {
        assert_eq!(
            extract_operators("a >= 1 && b !== c || !d"),
            vec![">=", "&&", "!==", "||", "!"]
        );
    }

    #[test]
    fn control_keywords() {
        assert_eq!(control_keyword("if (x) {").as_deref(), Some("if"));
        assert_eq!(control_keyword("} else if (x) {").as_deref(), Some("else if"));
        assert_eq!(control_keyword("while(true)").as_deref(), Some("while"));
        assert_eq!(control_keyword("iffy(x)"), None);
    }

    #[test]
    fn function_shapes() {
        let named = parse_function("async function load(url, opts) {").unwrap();
        assert_eq!(named.name, "load");
        assert_eq!(named.params, "url, opts");

        let arrow = parse_function("const add = (a, b) => a + b;").unwrap();
        assert_eq!(arrow.name, "add");
        assert_eq!(arrow.params, "a, b");
        assert_eq!(arrow.rest, "const add = () => a + b;");

        let bare = parse_function("let double = x => x * 2;").unwrap();
        assert_eq!(bare.params, "x");

        let rust = parse_function("pub fn parse<T>(input: &str) -> T {").unwrap();
        assert_eq!(rust.name, "parse");
        assert_eq!(rust.params, "input: &str");

        assert!(parse_function("foo(a, b);").is_none());
        assert!(parse_function("functionality(a)").is_none());
    }

    #[test]
    fn import_paths() {
        assert_eq!(import_path("import a from 'x';").as_deref(), Some("x"));
        assert_eq!(import_path("import './styles.css';").as_deref(), Some("./styles.css"));
        assert_eq!(import_path("from os.path import join").as_deref(), Some("os.path"));
        assert_eq!(import_path("import os").as_deref(), Some("os"));
        assert_eq!(import_path("use std::io::{Read, Write};").as_deref(), Some("std::io"));
        assert_eq!(import_path("import { a }"), None);
    }

    #[test]
    fn assignment_split() {
        let plain = split_assignment("let y = 1;").unwrap();
        assert_eq!(plain.lhs, "let y");
        assert_eq!(plain.rhs, "1;");

        let object = split_assignment("timeout: 30,").unwrap();
        assert_eq!(object.lhs, "timeout");
        assert_eq!(object.rhs, "30,");

        assert!(split_assignment("if (a == b) {").is_none());
        assert!(split_assignment("x => x + 1").is_none());
        assert!(split_assignment("a ? b : c;").is_none());
        assert_eq!(split_assignment(r#"s = "a=b""#).unwrap().rhs, r#""a=b""#);
    }

    #[test]
    fn skeleton_masks_names_and_values() {
        assert_eq!(skeleton("let total = count + 5; // sum"), "ID ID = ID + NUM; COMMENT");
        assert_eq!(skeleton(r#"log("x", y)"#), "ID(STR, ID)");
    }

    #[test]
    fn similarity_by_position() {
        assert_eq!(char_similarity("", ""), 1.0);
        assert_eq!(char_similarity("abcd", "abcd"), 1.0);
        assert_eq!(char_similarity("abcd", "abXY"), 0.5);
        assert_eq!(char_similarity("ab", "abcd"), 0.5);
    }
}
