//! The analysis pipeline.
//!
//! An [`Analyzer`] runs the detectors over two texts in a fixed order. Each
//! phase sees exactly the claims left by the phases before it:
//!
//! 1. line features and the two signature indices
//! 2. moved blocks
//! 3. added, removed and replaced try/catch wrappers
//! 4. single-line pairing of pure deletions against pure additions
//! 5. replacement pairing of the remaining deletion and addition runs
//! 6. a positional sweep over whatever is still unexplained
//! 7. deletion and addition blocks from the leftovers
//! 8. merging of adjacent comment changes

use anyhow::{Context, Result};
use log::{debug, trace};
use rayon::prelude::*;

use crate::change::{CategorizedChanges, LinePair};
use crate::claims::{ClaimTracker, Side};
use crate::config::AnalyzerConfig;
use crate::detect::{
    self, classify_pair, detect_moves, detect_replacements, detect_try_catch, exclusive_lines,
    merge_comment_changes, merge_runs, PairedChange, Sides,
};
use crate::index::LineIndex;
use crate::line::LineCache;

/// Runs analyses with one configuration and a line cache shared across calls.
#[derive(Debug)]
pub struct Analyzer {
    config: AnalyzerConfig,
    cache: LineCache,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::with_valid_config(AnalyzerConfig::default())
    }
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config
            .validate()
            .context("invalid analyzer configuration")?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: AnalyzerConfig) -> Self {
        let cache = match config.cache_limit {
            Some(limit) => LineCache::with_limit(limit),
            None => LineCache::new(),
        };
        Self { config, cache }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn cache(&self) -> &LineCache {
        &self.cache
    }

    /// Drop every cached line. Only costs recomputation.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Categorize every difference between `source` and `changed`.
    pub fn analyze(&mut self, source: &str, changed: &str) -> CategorizedChanges {
        let source_lines = self.cache.lines_of(source);
        let changed_lines = self.cache.lines_of(changed);
        let (source_index, changed_index) = rayon::join(
            || LineIndex::build(&source_lines),
            || LineIndex::build(&changed_lines),
        );
        debug!(
            "analyzing {} source and {} changed lines",
            source_lines.len(),
            changed_lines.len()
        );

        let sides = Sides {
            source: &source_lines,
            changed: &changed_lines,
            source_index: &source_index,
            changed_index: &changed_index,
        };
        Pass::new(sides, &self.config).run()
    }
}

/// Analyze with the default configuration and a throwaway cache.
pub fn analyze(source: &str, changed: &str) -> CategorizedChanges {
    Analyzer::default().analyze(source, changed)
}

/// Analyze independent `(source, changed)` pairs in parallel.
///
/// Analyzers (and their caches) are created per rayon work split and never
/// shared between threads. Results keep the order of `pairs`. `num_threads`
/// of `None` uses rayon's default pool size.
pub fn analyze_batch(
    pairs: &[(String, String)],
    config: &AnalyzerConfig,
    num_threads: Option<usize>,
) -> Result<Vec<CategorizedChanges>> {
    config
        .validate()
        .context("invalid analyzer configuration")?;

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = num_threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder
        .build()
        .context("failed to build analysis thread pool")?;

    debug!("analyzing {} pairs", pairs.len());
    let results = pool.install(|| {
        pairs
            .par_iter()
            .map_init(
                || Analyzer::with_valid_config(config.clone()),
                |analyzer, (source, changed)| analyzer.analyze(source, changed),
            )
            .collect()
    });
    Ok(results)
}

/// State of one analysis run.
struct Pass<'a> {
    sides: Sides<'a>,
    config: &'a AnalyzerConfig,
    claims: ClaimTracker,
    result: CategorizedChanges,
    comment_pairs: Vec<(usize, usize)>,
}

impl<'a> Pass<'a> {
    fn new(sides: Sides<'a>, config: &'a AnalyzerConfig) -> Self {
        Self {
            sides,
            config,
            claims: ClaimTracker::new(),
            result: CategorizedChanges::new(),
            comment_pairs: Vec::new(),
        }
    }

    fn run(mut self) -> CategorizedChanges {
        self.result.move_code_block = detect_moves(&self.sides, &mut self.claims, self.config);
        debug!("moves: {}", self.result.move_code_block.len());

        self.result.update_try_catch = detect_try_catch(&self.sides, &mut self.claims, self.config);
        debug!("try/catch changes: {}", self.result.update_try_catch.len());

        let deletions = exclusive_lines(&self.sides, &self.claims, Side::Source);
        let additions = exclusive_lines(&self.sides, &self.claims, Side::Changed);
        debug!(
            "pure deletions: {}, pure additions: {}",
            deletions.len(),
            additions.len()
        );

        self.pair_single_lines(&deletions, &additions);
        self.pair_blocks(&deletions, &additions);
        self.sweep(&deletions, &additions);
        self.finish_blocks(&deletions, &additions);
        self.merge_comments();

        self.result.sort();
        debug!(
            "analysis done: {} findings in {} categories",
            self.result.len(),
            self.result.populated().len()
        );
        self.result
    }

    fn line_pair(&self, source: usize, changed: usize) -> LinePair {
        LinePair {
            source_line: source + 1,
            changed_line: changed + 1,
            source_text: self.sides.source[source].text().to_string(),
            changed_text: self.sides.changed[changed].text().to_string(),
        }
    }

    fn unclaimed(&self, positions: &[usize], side: Side) -> Vec<usize> {
        positions
            .iter()
            .copied()
            .filter(|&pos| !self.claims.is_claimed(side, pos))
            .collect()
    }

    /// Try the rule chain on a pair and record the result. Claims the pair on
    /// success.
    fn try_rules(&mut self, source: usize, changed: usize) -> bool {
        let pair = self.line_pair(source, changed);
        let Some(change) = classify_pair(
            &self.sides.source[source],
            &self.sides.changed[changed],
            &pair,
        ) else {
            return false;
        };
        trace!(
            "{}: {} -> {}",
            change.category(),
            pair.source_line,
            pair.changed_line
        );
        self.claims.claim_pair(source, changed);
        self.record(change);
        true
    }

    fn record(&mut self, change: PairedChange) {
        match change {
            PairedChange::Import(c) => self.result.update_import.push(c),
            PairedChange::Comment(pair) => {
                self.comment_pairs
                    .push(detect::merge::pair_positions(&pair));
            }
            PairedChange::Condition(c) => self.result.update_condition.push(c),
            PairedChange::FunctionParams(c) => self.result.update_function_params.push(c),
            PairedChange::Literal(c) => self.result.update_literal.push(c),
            PairedChange::Rename(c) => self.result.rename_variable.push(c),
        }
    }

    /// Each deletion tries the nearest unpaired additions, up to the
    /// candidate limit, and keeps the first that a rule explains.
    fn pair_single_lines(&mut self, deletions: &[usize], additions: &[usize]) {
        for &d in deletions {
            if self.claims.is_source_claimed(d) {
                continue;
            }
            let candidates = nearest_unclaimed(
                additions,
                d,
                self.config.pair_candidate_limit,
                &self.claims,
            );
            for a in candidates {
                if self.try_rules(d, a) {
                    break;
                }
            }
        }
        debug!(
            "single-line pairs: {} source lines claimed",
            self.claims.source_count()
        );
    }

    fn pair_blocks(&mut self, deletions: &[usize], additions: &[usize]) {
        let max_gap = self.config.merge_max_gap;
        let deleted_runs = merge_runs(
            &self.unclaimed(deletions, Side::Source),
            self.sides.source,
            Side::Source,
            &self.claims,
            max_gap,
        );
        let added_runs = merge_runs(
            &self.unclaimed(additions, Side::Changed),
            self.sides.changed,
            Side::Changed,
            &self.claims,
            max_gap,
        );
        self.result.replace_code = detect_replacements(
            &self.sides,
            &mut self.claims,
            self.config,
            &deleted_runs,
            &added_runs,
        );
        debug!("replacements: {}", self.result.replace_code.len());
    }

    /// Pair leftover lines that share an index.
    ///
    /// When both texts have the same length every differing, non-blank pair is
    /// considered; otherwise only deletion and addition candidates are, so an
    /// insertion does not misalign everything after it.
    fn sweep(&mut self, deletions: &[usize], additions: &[usize]) {
        let positions: Vec<usize> = if self.sides.source.len() == self.sides.changed.len() {
            (0..self.sides.source.len()).collect()
        } else {
            let is_addition = membership(additions, self.sides.changed.len());
            deletions
                .iter()
                .copied()
                .filter(|&i| is_addition.get(i).copied().unwrap_or(false))
                .collect()
        };
        let mut others = 0;

        for i in positions {
            if self.claims.is_source_claimed(i) || self.claims.is_changed_claimed(i) {
                continue;
            }
            let (source, changed) = (&self.sides.source[i], &self.sides.changed[i]);
            if source.is_blank() || changed.is_blank() || source.signature() == changed.signature()
            {
                continue;
            }
            if self.try_rules(i, i) {
                continue;
            }
            let pair = self.line_pair(i, i);
            trace!("other: {}", pair.source_line);
            self.claims.claim_pair(i, i);
            self.result.other.push(pair);
            others += 1;
        }
        debug!("sweep: {} other", others);
    }

    fn finish_blocks(&mut self, deletions: &[usize], additions: &[usize]) {
        let max_gap = self.config.merge_max_gap;
        for side in [Side::Source, Side::Changed] {
            let seeds = match side {
                Side::Source => deletions,
                Side::Changed => additions,
            };
            let lines = self.sides.lines(side);
            let runs = merge_runs(
                &self.unclaimed(seeds, side),
                lines,
                side,
                &self.claims,
                max_gap,
            );
            for run in runs {
                self.claims.claim_range(side, run.span());
                let block = detect::line_block(lines, run.start, run.end);
                match side {
                    Side::Source => self.result.delete_code.push(block),
                    Side::Changed => self.result.add_code.push(block),
                }
            }
        }
        debug!(
            "blocks: {} deleted, {} added",
            self.result.delete_code.len(),
            self.result.add_code.len()
        );
    }

    fn merge_comments(&mut self) {
        let mut pairs = std::mem::take(&mut self.comment_pairs);
        pairs.sort_unstable();
        self.result.update_comment = merge_comment_changes(
            &self.sides,
            &mut self.claims,
            &pairs,
            self.config.merge_max_gap,
        );
        debug!("comment changes: {}", self.result.update_comment.len());
    }
}

/// Up to `limit` unclaimed entries of the sorted `additions`, nearest to `d`
/// first; equally distant entries keep their order.
fn nearest_unclaimed(
    additions: &[usize],
    d: usize,
    limit: usize,
    claims: &ClaimTracker,
) -> Vec<usize> {
    let split = additions.partition_point(|&a| a < d);
    let (mut left, mut right) = (split, split);
    let mut nearest = Vec::with_capacity(limit.min(additions.len()));

    while nearest.len() < limit {
        let below = left.checked_sub(1).map(|l| additions[l]);
        let above = additions.get(right).copied();
        let next = match (below, above) {
            (Some(b), Some(a)) if d - b <= a - d => {
                left -= 1;
                b
            }
            (_, Some(a)) => {
                right += 1;
                a
            }
            (Some(b), None) => {
                left -= 1;
                b
            }
            (None, None) => break,
        };
        if !claims.is_changed_claimed(next) {
            nearest.push(next);
        }
    }
    nearest
}

fn membership(positions: &[usize], len: usize) -> Vec<bool> {
    let mut members = vec![false; len];
    for &pos in positions {
        members[pos] = true;
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::Category;

    #[test]
    fn rejects_invalid_config() {
        let err = Analyzer::new(AnalyzerConfig::default().move_max_block(0)).unwrap_err();
        assert!(format!("{:#}", err).contains("move_max_block"));
    }

    #[test]
    fn cache_survives_between_calls() {
        let mut analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
        analyzer.analyze("a();\nb();", "a();\nc();");
        let entries = analyzer.cache().len();
        analyzer.analyze("a();\nb();", "a();\nc();");
        assert_eq!(analyzer.cache().len(), entries);
        assert!(analyzer.cache().stats().hits > 0);

        analyzer.clear_cache();
        assert!(analyzer.cache().is_empty());
    }

    #[test]
    fn identical_texts_have_no_changes() {
        let text = "fn main() {\n    run();\n}\n";
        assert!(analyze(text, text).is_empty());
        assert!(analyze("", "").is_empty());
    }

    #[test]
    fn nearest_candidates_expand_outward() {
        let additions = [1, 4, 6, 7, 12, 30];
        let mut claims = ClaimTracker::new();
        assert_eq!(nearest_unclaimed(&additions, 5, 4, &claims), vec![4, 6, 7, 1]);
        assert_eq!(nearest_unclaimed(&additions, 0, 2, &claims), vec![1, 4]);
        assert_eq!(nearest_unclaimed(&additions, 40, 10, &claims), vec![30, 12, 7, 6, 4, 1]);

        claims.claim_changed(4);
        claims.claim_changed(6);
        assert_eq!(nearest_unclaimed(&additions, 5, 2, &claims), vec![7, 1]);
        assert!(nearest_unclaimed(&[], 5, 2, &claims).is_empty());
    }

    #[test]
    fn batch_keeps_input_order() {
        let pairs = vec![
            ("x = 5;".to_string(), "x = 6;".to_string()),
            ("x = 5;".to_string(), "y = 5;".to_string()),
        ];
        let results = analyze_batch(&pairs, &AnalyzerConfig::default(), Some(2)).unwrap();
        assert_eq!(results[0].populated(), vec![Category::UpdateLiteral]);
        assert_eq!(results[1].populated(), vec![Category::RenameVariable]);
    }
}
