use log::trace;

use super::Sides;
use crate::change::MoveBlock;
use crate::claims::{ClaimTracker, Side};
use crate::config::AnalyzerConfig;

/// Find blocks of identical lines that changed position.
///
/// Scans the source top to bottom. At each unclaimed position the largest
/// block (up to `move_max_block` lines) whose lines reappear, in order and
/// unclaimed, more than `move_min_distance` lines away in the changed text is
/// taken; the scan then resumes after it. Blocks with fewer than
/// `move_min_substantive` substantive lines are never reported.
pub fn detect_moves(
    sides: &Sides<'_>,
    claims: &mut ClaimTracker,
    config: &AnalyzerConfig,
) -> Vec<MoveBlock> {
    let mut moves = Vec::new();
    let mut i = 0;

    while i < sides.source.len() {
        if claims.is_source_claimed(i) {
            i += 1;
            continue;
        }

        let Some((j, size)) = largest_block_at(sides, claims, config, i) else {
            i += 1;
            continue;
        };

        claims.claim_range(Side::Source, i..=i + size - 1);
        claims.claim_range(Side::Changed, j..=j + size - 1);

        let block = &sides.source[i..i + size];
        trace!("move: {} lines from {} to {}", size, i + 1, j + 1);
        moves.push(MoveBlock {
            source_start: i + 1,
            changed_start: j + 1,
            size,
            substantive_count: block.iter().filter(|l| l.is_substantive()).count(),
            content: block.iter().map(|l| l.text().to_string()).collect(),
        });
        i += size;
    }

    moves
}

/// The changed-side start and size of the largest movable block at `i`.
fn largest_block_at(
    sides: &Sides<'_>,
    claims: &ClaimTracker,
    config: &AnalyzerConfig,
    i: usize,
) -> Option<(usize, usize)> {
    let candidates = sides.changed_index.positions(sides.source[i].signature());
    if candidates.is_empty() {
        return None;
    }

    let smallest = config.move_min_substantive.max(1);
    let largest = config.move_max_block.min(sides.source.len() - i);

    for size in (smallest..=largest).rev() {
        let substantive = sides.source[i..i + size]
            .iter()
            .filter(|l| l.is_substantive())
            .count();
        if substantive < config.move_min_substantive {
            continue;
        }

        for &j in candidates {
            if i.abs_diff(j) <= config.move_min_distance || j + size > sides.changed.len() {
                continue;
            }
            let matches = (0..size).all(|k| {
                !claims.is_source_claimed(i + k)
                    && !claims.is_changed_claimed(j + k)
                    && sides.source[i + k].signature() == sides.changed[j + k].signature()
            });
            if matches {
                return Some((j, size));
            }
        }
    }

    None
}
