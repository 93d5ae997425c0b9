//! Output formats for an analysis.

use std::fmt::Write;
use std::ops::RangeInclusive;

use anyhow::{Context, Result};
use intent_diff::{CategorizedChanges, Change, ClassicDiff, TryCatchChange};

/// Category by category, one finding per line with its line numbers.
pub fn text(result: &CategorizedChanges) -> Result<String> {
    if result.is_empty() {
        return Ok("No changes\n".to_string());
    }

    let mut out = String::new();
    for (i, category) in result.populated().into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        writeln!(out, "{} ({})", category.title(), category)?;
        for change in result.changes_in(category) {
            writeln!(
                out,
                "  {:>7} {:>7}  {}",
                span(change.source_span()),
                span(change.changed_span()),
                describe(&change)
            )?;
        }
    }
    Ok(out)
}

/// The full result map, keyed by category.
pub fn json(result: &CategorizedChanges) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize analysis result")
}

/// The plain line diff with line numbers and a summary.
pub fn classic(diff: &ClassicDiff) -> Result<String> {
    let mut out = String::new();
    for row in diff.rows() {
        writeln!(
            out,
            "{:>4} {:>4} {}{}",
            number(row.source_line),
            number(row.changed_line),
            row.kind.sign(),
            row.content
        )?;
    }
    let stats = diff.stats();
    writeln!(
        out,
        "{} added, {} deleted, {} unchanged",
        stats.additions, stats.deletions, stats.unchanged
    )?;
    Ok(out)
}

fn number(line: Option<usize>) -> String {
    line.map(|l| l.to_string()).unwrap_or_default()
}

fn span(range: Option<RangeInclusive<usize>>) -> String {
    match range {
        None => "-".to_string(),
        Some(r) if r.start() == r.end() => r.start().to_string(),
        Some(r) => format!("{}-{}", r.start(), r.end()),
    }
}

fn describe(change: &Change) -> String {
    match change {
        Change::Move(m) => format!("moved {} lines", m.size),
        Change::TryCatch(TryCatchChange::Replaced { similarity, .. }) => {
            format!("replaced try/catch (body similarity {:.2})", similarity)
        }
        Change::TryCatch(t) => format!("{} try/catch", t.kind()),
        Change::Import(c) => format!(
            "{}: {} => {}",
            c.module_path,
            c.pair.source_text.trim(),
            c.pair.changed_text.trim()
        ),
        Change::Comment(c) => format!("{} => {} comment lines", c.source.len(), c.changed.len()),
        Change::FunctionParams(c) => format!(
            "{}({}) => {}({})",
            c.name, c.source_params, c.name, c.changed_params
        ),
        Change::Literal(c) => format!("{}: {} => {}", c.target, c.source_value, c.changed_value),
        Change::Condition(c) => format!(
            "{} ({}) => ({})",
            c.keyword, c.source_condition, c.changed_condition
        ),
        Change::Rename(c) => format!("{} {} => {}", c.kind, c.source_name, c.changed_name),
        Change::Deletion(b) => format!("{} lines removed", b.len()),
        Change::Addition(b) => format!("{} lines added", b.len()),
        Change::Replace(r) => format!(
            "{} lines => {} lines (context {:.2})",
            r.deleted.len(),
            r.added.len(),
            r.score
        ),
        Change::Other(p) => format!("{} => {}", p.source_text.trim(), p.changed_text.trim()),
    }
}
