use super::Sides;
use crate::claims::{ClaimTracker, Side};

/// Unclaimed, non-blank positions on `side` whose signature never occurs on
/// the other side: pure deletions for the source, pure additions for the
/// changed text. Nothing is claimed here; the candidates are only seeds.
pub fn exclusive_lines(sides: &Sides<'_>, claims: &ClaimTracker, side: Side) -> Vec<usize> {
    let other_index = sides.index(side.other());
    sides
        .lines(side)
        .iter()
        .enumerate()
        .filter(|(pos, line)| {
            !claims.is_claimed(side, *pos)
                && !line.is_blank()
                && !other_index.contains(line.signature())
        })
        .map(|(pos, _)| pos)
        .collect()
}
