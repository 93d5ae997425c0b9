//! Line feature extraction.
//!
//! A [`Line`] wraps one line of text together with its derived features. The
//! cheap features (signature, comment/import/substantive flags) are computed
//! up front; the rest are computed on first access and kept for the life of
//! the line. [`LineCache`] memoizes whole `Line`s by their raw text, so a line
//! that recurs across a file (or across files) is analysed once.

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;
use once_cell::sync::OnceCell;

use crate::patterns;

/// A parsed function declaration: its name and raw parameter text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub params: String,
    /// The whole line with the parameter text cut out.
    pub rest: String,
}

/// The two sides of an assignment (`=` or object-style `:`), whitespace-normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub lhs: String,
    pub rhs: String,
}

impl Assignment {
    pub(crate) fn from_parts(lhs: &str, rhs: &str) -> Option<Self> {
        let lhs = patterns::signature(lhs);
        let rhs = patterns::signature(rhs);
        if lhs.is_empty() || rhs.is_empty() {
            return None;
        }
        Some(Self { lhs, rhs })
    }

    /// The name being assigned: the last identifier of the left-hand side.
    pub fn target_name(&self) -> String {
        patterns::extract_identifiers(&self.lhs)
            .pop()
            .unwrap_or_else(|| self.lhs.clone())
    }
}

/// One line of text plus its cached features. Never mutated once built.
#[derive(Debug)]
pub struct Line {
    text: String,
    signature: String,
    is_comment: bool,
    is_import: bool,
    is_substantive: bool,
    identifiers: OnceCell<Vec<String>>,
    literals: OnceCell<Vec<String>>,
    skeleton: OnceCell<String>,
    function: OnceCell<Option<FunctionSignature>>,
    condition: OnceCell<Option<String>>,
    operators: OnceCell<Vec<String>>,
    import_path: OnceCell<Option<String>>,
    assignment: OnceCell<Option<Assignment>>,
}

impl Line {
    pub fn new(text: &str) -> Self {
        let signature = patterns::signature(text);
        let is_comment = patterns::is_comment(&signature);
        let is_import = patterns::is_import(&signature);
        let is_substantive = patterns::is_substantive(&signature);
        Self {
            text: text.to_string(),
            signature,
            is_comment,
            is_import,
            is_substantive,
            identifiers: OnceCell::new(),
            literals: OnceCell::new(),
            skeleton: OnceCell::new(),
            function: OnceCell::new(),
            condition: OnceCell::new(),
            operators: OnceCell::new(),
            import_path: OnceCell::new(),
            assignment: OnceCell::new(),
        }
    }

    /// The raw line text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whitespace-normalized text; the exact-match key.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn is_blank(&self) -> bool {
        self.signature.is_empty()
    }

    pub fn is_comment(&self) -> bool {
        self.is_comment
    }

    pub fn is_import(&self) -> bool {
        self.is_import
    }

    pub fn is_substantive(&self) -> bool {
        self.is_substantive
    }

    /// Blank and comment lines may sit inside a merged block's gap.
    pub fn is_gap_filler(&self) -> bool {
        self.is_blank() || self.is_comment
    }

    pub fn identifiers(&self) -> &[String] {
        self.identifiers
            .get_or_init(|| patterns::extract_identifiers(&self.text))
    }

    pub fn literals(&self) -> &[String] {
        self.literals
            .get_or_init(|| patterns::extract_literals(&self.text))
    }

    pub fn skeleton(&self) -> &str {
        self.skeleton.get_or_init(|| patterns::skeleton(&self.text))
    }

    pub fn function_signature(&self) -> Option<&FunctionSignature> {
        self.function
            .get_or_init(|| patterns::parse_function(&self.signature))
            .as_ref()
    }

    pub fn condition(&self) -> Option<&str> {
        self.condition
            .get_or_init(|| patterns::extract_condition(&self.text))
            .as_deref()
    }

    /// Operators found inside [`Line::condition`]; empty without a condition.
    pub fn operators(&self) -> &[String] {
        self.operators.get_or_init(|| {
            self.condition()
                .map(patterns::extract_operators)
                .unwrap_or_default()
        })
    }

    pub fn import_path(&self) -> Option<&str> {
        self.import_path
            .get_or_init(|| {
                if self.is_import {
                    patterns::import_path(&self.signature)
                } else {
                    None
                }
            })
            .as_deref()
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        self.assignment
            .get_or_init(|| patterns::split_assignment(&self.signature))
            .as_ref()
    }

    pub fn control_keyword(&self) -> Option<String> {
        patterns::control_keyword(&self.signature)
    }
}

/// Hit/miss counters for a [`LineCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Memoizes [`Line`]s by raw text.
///
/// The cache is a pure optimization: clearing it (or letting the optional
/// limit evict it) only costs recomputation.
#[derive(Debug, Default)]
pub struct LineCache {
    lines: HashMap<String, Arc<Line>>,
    limit: Option<usize>,
    hits: u64,
    misses: u64,
}

impl LineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache that is emptied whenever it would grow past `limit` entries.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Get the features for `text`, computing them on first sight.
    pub fn line(&mut self, text: &str) -> Arc<Line> {
        if let Some(line) = self.lines.get(text) {
            self.hits += 1;
            return Arc::clone(line);
        }
        self.misses += 1;
        if let Some(limit) = self.limit {
            if self.lines.len() >= limit {
                warn!("line cache reached {} entries, evicting", limit);
                self.lines.clear();
            }
        }
        let line = Arc::new(Line::new(text));
        self.lines.insert(text.to_string(), Arc::clone(&line));
        line
    }

    /// Features for every line of `text`.
    pub fn lines_of(&mut self, text: &str) -> Vec<Arc<Line>> {
        text.lines().map(|l| self.line(l)).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.lines.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn features_of_an_assignment() {
        let line = Line::new("    let   count = 5;");
        assert_eq!(line.signature(), "let count = 5;");
        assert!(line.is_substantive());
        assert!(!line.is_comment());
        assert_eq!(line.literals(), ["5".to_string()]);
        let assignment = line.assignment().unwrap();
        assert_eq!(assignment.lhs, "let count");
        assert_eq!(assignment.target_name(), "count");
    }

    #[test]
    fn import_path_needs_import_line() {
        assert_eq!(Line::new("import a from 'x';").import_path(), Some("x"));
        assert_eq!(Line::new("const a = 'x';").import_path(), None);
    }

    #[test]
    fn operators_come_from_the_condition() {
        let line = Line::new("if (a > 1 && b) {");
        assert_eq!(line.condition(), Some("a > 1 && b"));
        assert_eq!(line.operators(), [">".to_string(), "&&".to_string()]);
        assert!(Line::new("return a > b;").operators().is_empty());
    }

    #[test]
    fn cache_reuses_lines() {
        let mut cache = LineCache::new();
        let lines = cache.lines_of("a();\nb();\na();\n");
        assert_eq!(lines.len(), 3);
        assert!(Arc::ptr_eq(&lines[0], &lines[2]));
        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 2,
                hits: 1,
                misses: 2
            }
        );
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_limit_evicts() {
        let mut cache = LineCache::with_limit(2);
        cache.line("a");
        cache.line("b");
        cache.line("c");
        assert_eq!(cache.len(), 1);
    }
}
