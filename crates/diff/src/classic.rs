use std::time::Duration;

use anyhow::Result;
use derive_more::Display;
use ropey::Rope;
use similar::{Algorithm, ChangeTag, TextDiff};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a row of the classic listing relates the two texts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum RowKind {
    /// Only in the changed text
    #[display(fmt = "added")]
    Added,

    /// Only in the source text
    #[display(fmt = "deleted")]
    Deleted,

    /// In both texts
    #[display(fmt = "unchanged")]
    Unchanged,
}

impl RowKind {
    /// The unified-diff prefix for this kind
    pub fn sign(&self) -> char {
        match self {
            RowKind::Added => '+',
            RowKind::Deleted => '-',
            RowKind::Unchanged => ' ',
        }
    }
}

/// One line of the classic listing. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ClassicRow {
    pub kind: RowKind,

    /// Line number in the source, absent for added rows
    pub source_line: Option<usize>,

    /// Line number in the changed text, absent for deleted rows
    pub changed_line: Option<usize>,

    /// The line without its terminator
    pub content: String,
}

/// Row counts of a classic listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassicStats {
    pub additions: usize,
    pub deletions: usize,
    pub unchanged: usize,
}

/// The plain line diff of two texts, as a git-style listing
#[derive(Debug, Clone)]
pub struct ClassicDiff {
    /// The source text
    source: Rope,

    /// The changed text
    changed: Rope,

    /// Every line of both texts in diff order
    rows: Vec<ClassicRow>,
}

impl ClassicDiff {
    /// Compute the listing between two texts
    pub fn new(source: &str, changed: &str) -> Result<Self> {
        let mut diff = Self {
            source: Rope::from_str(source),
            changed: Rope::from_str(changed),
            rows: Vec::new(),
        };
        diff.compute_rows()?;
        Ok(diff)
    }

    fn compute_rows(&mut self) -> Result<()> {
        let source = self.source.to_string();
        let changed = self.changed.to_string();

        let diff = TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .timeout(Duration::from_secs(5))
            .diff_lines(&source, &changed);

        self.rows = diff
            .iter_all_changes()
            .map(|change| ClassicRow {
                kind: match change.tag() {
                    ChangeTag::Insert => RowKind::Added,
                    ChangeTag::Delete => RowKind::Deleted,
                    ChangeTag::Equal => RowKind::Unchanged,
                },
                source_line: change.old_index().map(|i| i + 1),
                changed_line: change.new_index().map(|i| i + 1),
                content: change
                    .value()
                    .trim_end_matches(&['\n', '\r'][..])
                    .to_string(),
            })
            .collect();

        Ok(())
    }

    pub fn rows(&self) -> &[ClassicRow] {
        &self.rows
    }

    pub fn stats(&self) -> ClassicStats {
        let mut stats = ClassicStats::default();
        for row in &self.rows {
            match row.kind {
                RowKind::Added => stats.additions += 1,
                RowKind::Deleted => stats.deletions += 1,
                RowKind::Unchanged => stats.unchanged += 1,
            }
        }
        stats
    }

    pub fn has_changes(&self) -> bool {
        self.rows.iter().any(|row| row.kind != RowKind::Unchanged)
    }

    /// Number of lines in the source text
    pub fn source_line_count(&self) -> usize {
        line_count(&self.source)
    }

    /// Number of lines in the changed text
    pub fn changed_line_count(&self) -> usize {
        line_count(&self.changed)
    }

    /// Every row prefixed with its sign, one per line
    pub fn unified(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            out.push(row.kind.sign());
            out.push_str(&row.content);
            out.push('\n');
        }
        out
    }
}

/// Lines in a rope, not counting the empty segment after a final newline.
fn line_count(rope: &Rope) -> usize {
    let lines = rope.len_lines();
    if rope.len_chars() == 0 {
        0
    } else if rope.line(lines - 1).len_chars() == 0 {
        lines - 1
    } else {
        lines
    }
}
