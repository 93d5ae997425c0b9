//! Change detectors.
//!
//! Each detector looks at both line sequences through [`Sides`], consults the
//! shared [`ClaimTracker`](crate::claims::ClaimTracker) so it never touches a
//! line an earlier phase already attributed, and claims the lines behind every
//! change it reports.

pub mod exact;
pub mod line_rules;
pub mod merge;
pub mod moves;
pub mod replace;
pub mod try_catch;

use std::sync::Arc;

use crate::change::LineBlock;
use crate::claims::Side;
use crate::index::LineIndex;
use crate::line::Line;

pub use exact::exclusive_lines;
pub use line_rules::{classify_pair, LineRule, PairedChange, LINE_RULES};
pub use merge::{merge_comment_changes, merge_runs, Run};
pub use moves::detect_moves;
pub use replace::{context_score, detect_replacements};
pub use try_catch::{detect_try_catch, find_try_block, TryBlock};

/// Both line sequences of one analysis with their indices.
#[derive(Debug, Clone, Copy)]
pub struct Sides<'a> {
    pub source: &'a [Arc<Line>],
    pub changed: &'a [Arc<Line>],
    pub source_index: &'a LineIndex,
    pub changed_index: &'a LineIndex,
}

impl<'a> Sides<'a> {
    pub fn lines(&self, side: Side) -> &'a [Arc<Line>] {
        match side {
            Side::Source => self.source,
            Side::Changed => self.changed,
        }
    }

    pub fn index(&self, side: Side) -> &'a LineIndex {
        match side {
            Side::Source => self.source_index,
            Side::Changed => self.changed_index,
        }
    }
}

/// Build a block from 0-based inclusive positions; the block itself is 1-based.
pub(crate) fn line_block(lines: &[Arc<Line>], start: usize, end: usize) -> LineBlock {
    let covered = &lines[start..=end];
    LineBlock {
        start: start + 1,
        end: end + 1,
        lines: covered.iter().map(|line| line.text().to_string()).collect(),
        substantive_count: covered.iter().filter(|line| line.is_substantive()).count(),
    }
}
