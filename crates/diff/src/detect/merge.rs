use std::sync::Arc;

use super::{line_block, Sides};
use crate::change::{CommentChange, LinePair};
use crate::claims::{ClaimTracker, Side};
use crate::line::Line;

/// A merged run of positions on one side, 0-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: usize,
    pub end: usize,
}

impl Run {
    /// Number of covered lines, gap lines included.
    pub fn size(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn span(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// Whether the lines strictly between `prev` and `next` may be absorbed into
/// one block: no gap at all, or a short gap of unclaimed blank/comment lines.
fn bridgeable(
    lines: &[Arc<Line>],
    side: Side,
    claims: &ClaimTracker,
    prev: usize,
    next: usize,
    max_gap: usize,
) -> bool {
    let gap = next - prev - 1;
    if gap == 0 {
        return true;
    }
    gap <= max_gap
        && (prev + 1..next).all(|pos| lines[pos].is_gap_filler() && !claims.is_claimed(side, pos))
}

/// Merge sorted candidate positions into runs.
///
/// Consecutive candidates join when [`bridgeable`]; anything else starts a new
/// run. Nothing is claimed.
pub fn merge_runs(
    positions: &[usize],
    lines: &[Arc<Line>],
    side: Side,
    claims: &ClaimTracker,
    max_gap: usize,
) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for &pos in positions {
        match runs.last_mut() {
            Some(run) if pos > run.end && bridgeable(lines, side, claims, run.end, pos, max_gap) => {
                run.end = pos;
            }
            _ => runs.push(Run {
                start: pos,
                end: pos,
            }),
        }
    }
    runs
}

/// Fold comment pairs into blocks.
///
/// Two pairs merge when both their source lines and their changed lines are
/// bridgeable. Absorbed gap lines are claimed. `pairs` are 0-based positions
/// sorted by source line.
pub fn merge_comment_changes(
    sides: &Sides<'_>,
    claims: &mut ClaimTracker,
    pairs: &[(usize, usize)],
    max_gap: usize,
) -> Vec<CommentChange> {
    let mut groups: Vec<(Run, Run)> = Vec::new();

    for &(s, c) in pairs {
        if let Some((source, changed)) = groups.last_mut() {
            let joins = s > source.end
                && c > changed.end
                && bridgeable(sides.source, Side::Source, claims, source.end, s, max_gap)
                && bridgeable(sides.changed, Side::Changed, claims, changed.end, c, max_gap);
            if joins {
                claims.claim_range(Side::Source, source.end + 1..=s - 1);
                claims.claim_range(Side::Changed, changed.end + 1..=c - 1);
                source.end = s;
                changed.end = c;
                continue;
            }
        }
        groups.push((Run { start: s, end: s }, Run { start: c, end: c }));
    }

    groups
        .into_iter()
        .map(|(source, changed)| CommentChange {
            source: line_block(sides.source, source.start, source.end),
            changed: line_block(sides.changed, changed.start, changed.end),
        })
        .collect()
}

/// 0-based positions of a 1-based line pair.
pub(crate) fn pair_positions(pair: &LinePair) -> (usize, usize) {
    (pair.source_line - 1, pair.changed_line - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::LineCache;
    use pretty_assertions::assert_eq;

    fn lines(text: &str) -> Vec<Arc<Line>> {
        LineCache::new().lines_of(text)
    }

    #[test]
    fn bridges_blank_and_comment_gaps() {
        let src = lines("a();\n\n// note\nb();\nc();\nd();");
        let claims = ClaimTracker::new();
        let runs = merge_runs(&[0, 3, 5], &src, Side::Source, &claims, 10);
        assert_eq!(runs, vec![Run { start: 0, end: 3 }, Run { start: 5, end: 5 }]);
    }

    #[test]
    fn respects_gap_width_and_claims() {
        let src = lines("a();\n\n\nb();");
        let mut claims = ClaimTracker::new();
        assert_eq!(merge_runs(&[0, 3], &src, Side::Source, &claims, 1).len(), 2);
        assert_eq!(merge_runs(&[0, 3], &src, Side::Source, &claims, 2).len(), 1);
        claims.claim_source(1);
        assert_eq!(merge_runs(&[0, 3], &src, Side::Source, &claims, 2).len(), 2);
    }
}
