use anyhow::{bail, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tunable thresholds for an analysis.
///
/// Built with [`AnalyzerConfig::default`] and adjusted through the builder
/// methods; call [`AnalyzerConfig::validate`] before use when the values come
/// from outside.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalyzerConfig {
    /// Largest block size tried by move detection
    pub move_max_block: usize,

    /// Substantive lines a block needs to count as a move
    pub move_min_substantive: usize,

    /// A block must travel strictly further than this to count as a move
    pub move_min_distance: usize,

    /// Lines scanned from a `try` line before the candidate is abandoned
    pub try_catch_lookahead: usize,

    /// Body similarity needed to pair a removed and an added wrapper
    pub try_catch_similarity: f64,

    /// Widest gap of blank/comment lines bridged when merging blocks
    pub merge_max_gap: usize,

    /// Additions examined per deletion in single-line pairing
    pub pair_candidate_limit: usize,

    /// Largest allowed ratio between the sizes of paired blocks
    pub replace_max_size_ratio: f64,

    /// Largest allowed distance between the starts of paired blocks
    pub replace_max_distance: usize,

    /// Radius of the context windows around a block
    pub replace_context_radius: usize,

    /// Context score a block pair needs to count as a replacement
    pub replace_min_context_score: f64,

    /// Cap on distinct lines kept in the feature cache
    pub cache_limit: Option<usize>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            move_max_block: 20,
            move_min_substantive: 3,
            move_min_distance: 2,
            try_catch_lookahead: 200,
            try_catch_similarity: 0.5,
            merge_max_gap: 10,
            pair_candidate_limit: 50,
            replace_max_size_ratio: 7.0,
            replace_max_distance: 100,
            replace_context_radius: 5,
            replace_min_context_score: 0.6,
            cache_limit: None,
        }
    }
}

impl AnalyzerConfig {
    pub fn move_max_block(mut self, size: usize) -> Self {
        self.move_max_block = size;
        self
    }

    pub fn move_min_substantive(mut self, count: usize) -> Self {
        self.move_min_substantive = count;
        self
    }

    pub fn move_min_distance(mut self, distance: usize) -> Self {
        self.move_min_distance = distance;
        self
    }

    pub fn try_catch_lookahead(mut self, lines: usize) -> Self {
        self.try_catch_lookahead = lines;
        self
    }

    pub fn try_catch_similarity(mut self, similarity: f64) -> Self {
        self.try_catch_similarity = similarity;
        self
    }

    pub fn merge_max_gap(mut self, gap: usize) -> Self {
        self.merge_max_gap = gap;
        self
    }

    pub fn pair_candidate_limit(mut self, limit: usize) -> Self {
        self.pair_candidate_limit = limit;
        self
    }

    pub fn replace_max_size_ratio(mut self, ratio: f64) -> Self {
        self.replace_max_size_ratio = ratio;
        self
    }

    pub fn replace_max_distance(mut self, distance: usize) -> Self {
        self.replace_max_distance = distance;
        self
    }

    pub fn replace_context_radius(mut self, radius: usize) -> Self {
        self.replace_context_radius = radius;
        self
    }

    pub fn replace_min_context_score(mut self, score: f64) -> Self {
        self.replace_min_context_score = score;
        self
    }

    pub fn cache_limit(mut self, limit: Option<usize>) -> Self {
        self.cache_limit = limit;
        self
    }

    /// Reject settings that would make a detector meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.move_max_block == 0 {
            bail!("move_max_block must be at least 1");
        }
        if self.move_min_substantive > self.move_max_block {
            bail!(
                "move_min_substantive ({}) exceeds move_max_block ({})",
                self.move_min_substantive,
                self.move_max_block
            );
        }
        for (name, value) in [
            ("try_catch_similarity", self.try_catch_similarity),
            ("replace_min_context_score", self.replace_min_context_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{} must be between 0.0 and 1.0, got {}", name, value);
            }
        }
        if !(self.replace_max_size_ratio >= 1.0) {
            bail!(
                "replace_max_size_ratio must be at least 1.0, got {}",
                self.replace_max_size_ratio
            );
        }
        if self.pair_candidate_limit == 0 {
            bail!("pair_candidate_limit must be at least 1");
        }
        if self.replace_context_radius == 0 {
            bail!("replace_context_radius must be at least 1");
        }
        if self.try_catch_lookahead == 0 {
            bail!("try_catch_lookahead must be at least 1");
        }
        if self.cache_limit == Some(0) {
            bail!("cache_limit must be at least 1 when set");
        }
        Ok(())
    }
}
