use log::trace;

use super::{line_block, Run, Sides};
use crate::change::ReplaceBlock;
use crate::claims::{ClaimTracker, Side};
use crate::config::AnalyzerConfig;

/// How alike the surroundings of a deleted and an added run are, in `[0, 1]`.
///
/// Compares up to `radius` signatures before the two starts and after the two
/// ends. Each window scores the share of its offsets (counting only offsets
/// where at least one side still has a line) whose signatures match; the
/// result is the mean over windows that had any such offset, or 0.
pub fn context_score(sides: &Sides<'_>, deleted: Run, added: Run, radius: usize) -> f64 {
    let signature_at = |side: Side, pos: Option<usize>| {
        pos.and_then(|p| sides.lines(side).get(p))
            .map(|line| line.signature())
    };

    let window = |source_at: &dyn Fn(usize) -> Option<usize>,
                  changed_at: &dyn Fn(usize) -> Option<usize>| {
        let mut counted = 0usize;
        let mut matched = 0usize;
        for k in 1..=radius {
            let source = signature_at(Side::Source, source_at(k));
            let changed = signature_at(Side::Changed, changed_at(k));
            match (source, changed) {
                (None, None) => {}
                (Some(a), Some(b)) => {
                    counted += 1;
                    if a == b {
                        matched += 1;
                    }
                }
                _ => counted += 1,
            }
        }
        (counted > 0).then(|| matched as f64 / counted as f64)
    };

    let before = window(
        &|k| deleted.start.checked_sub(k),
        &|k| added.start.checked_sub(k),
    );
    let after = window(&|k| Some(deleted.end + k), &|k| Some(added.end + k));

    let scores: Vec<f64> = [before, after].into_iter().flatten().collect();
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Pair deleted runs with added runs that sit in the same surroundings.
///
/// Each deleted run, in order, takes the best-scoring added run still free
/// that passes the size-ratio, distance and context filters; ties go to the
/// earlier added run. Paired runs are claimed whole.
pub fn detect_replacements(
    sides: &Sides<'_>,
    claims: &mut ClaimTracker,
    config: &AnalyzerConfig,
    deleted: &[Run],
    added: &[Run],
) -> Vec<ReplaceBlock> {
    let mut taken = vec![false; added.len()];
    let mut replacements = Vec::new();

    for &deletion in deleted {
        if claims.any_claimed(Side::Source, deletion.span()) {
            continue;
        }

        let mut best: Option<(usize, f64)> = None;
        for (a, &addition) in added.iter().enumerate() {
            if taken[a] || claims.any_claimed(Side::Changed, addition.span()) {
                continue;
            }
            let (small, large) = if deletion.size() <= addition.size() {
                (deletion.size(), addition.size())
            } else {
                (addition.size(), deletion.size())
            };
            if large as f64 / small as f64 > config.replace_max_size_ratio {
                continue;
            }
            if deletion.start.abs_diff(addition.start) > config.replace_max_distance {
                continue;
            }
            let score = context_score(sides, deletion, addition, config.replace_context_radius);
            if score < config.replace_min_context_score {
                trace!(
                    "replace rejected: {} vs {} (context {:.2})",
                    deletion.start + 1,
                    addition.start + 1,
                    score
                );
                continue;
            }
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((a, score));
            }
        }

        if let Some((a, score)) = best {
            let addition = added[a];
            taken[a] = true;
            claims.claim_range(Side::Source, deletion.span());
            claims.claim_range(Side::Changed, addition.span());
            trace!(
                "replace: {}..{} -> {}..{} ({:.2})",
                deletion.start + 1,
                deletion.end + 1,
                addition.start + 1,
                addition.end + 1,
                score
            );
            replacements.push(ReplaceBlock {
                deleted: line_block(sides.source, deletion.start, deletion.end),
                added: line_block(sides.changed, addition.start, addition.end),
                score,
            });
        }
    }

    replacements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::LineIndex;
    use crate::line::LineCache;

    #[test]
    fn context_counts_only_offsets_with_lines() {
        let mut cache = LineCache::new();
        let source = cache.lines_of("import a from 'x';\nlet y = 1;\nfoo();");
        let changed = cache.lines_of("import a from 'z';\nlet y = 2;\nfoo();");
        let source_index = LineIndex::build(&source);
        let changed_index = LineIndex::build(&changed);
        let sides = Sides {
            source: &source,
            changed: &changed,
            source_index: &source_index,
            changed_index: &changed_index,
        };

        let first = Run { start: 0, end: 0 };
        assert_eq!(context_score(&sides, first, first, 5), 0.5);

        let middle = Run { start: 1, end: 1 };
        assert_eq!(context_score(&sides, middle, middle, 5), 0.5);

        let last = Run { start: 2, end: 2 };
        assert_eq!(context_score(&sides, last, last, 5), 0.0);
    }

    #[test]
    fn best_context_wins() {
        let mut cache = LineCache::new();
        let fence = |n: usize| vec!["}"; n].join("\n");
        let source = cache.lines_of(&format!("{}\nold();\n{}", fence(5), fence(5)));
        // A weaker candidate right in place, a better one further down
        let changed = cache.lines_of(&format!(
            "{}\nworse();\nx();\ny();\n{}\nbetter();\n{}",
            fence(5),
            fence(5),
            fence(5)
        ));
        let source_index = LineIndex::build(&source);
        let changed_index = LineIndex::build(&changed);
        let sides = Sides {
            source: &source,
            changed: &changed,
            source_index: &source_index,
            changed_index: &changed_index,
        };

        let deleted = Run { start: 5, end: 5 };
        let worse = Run { start: 5, end: 5 };
        let better = Run { start: 13, end: 13 };
        assert!((context_score(&sides, deleted, worse, 5) - 0.8).abs() < 1e-9);
        assert_eq!(context_score(&sides, deleted, better, 5), 1.0);

        let mut claims = ClaimTracker::new();
        let found = detect_replacements(
            &sides,
            &mut claims,
            &AnalyzerConfig::default(),
            &[deleted],
            &[worse, better],
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].added.lines, vec!["better();"]);
        assert_eq!(found[0].score, 1.0);
        assert!(claims.is_changed_claimed(13));
        assert!(!claims.is_changed_claimed(5));
    }

    #[test]
    fn no_context_scores_zero() {
        let mut cache = LineCache::new();
        let source = cache.lines_of("a();");
        let changed = cache.lines_of("b();");
        let index = LineIndex::default();
        let sides = Sides {
            source: &source,
            changed: &changed,
            source_index: &index,
            changed_index: &index,
        };
        let only = Run { start: 0, end: 0 };
        assert_eq!(context_score(&sides, only, only, 5), 0.0);
    }
}
