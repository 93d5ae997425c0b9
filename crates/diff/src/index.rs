use std::collections::HashMap;
use std::sync::Arc;

use crate::line::Line;
use crate::patterns;

/// Maps each line signature to the ascending positions sharing it.
///
/// Blank lines are left out so they never seed move or exact-match candidates.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    positions: HashMap<String, Vec<usize>>,
}

impl LineIndex {
    pub fn build(lines: &[Arc<Line>]) -> Self {
        Self::from_signatures(lines.iter().map(|line| line.signature().to_string()))
    }

    /// Build directly from raw line texts.
    pub fn from_texts<'a, I>(texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self::from_signatures(texts.into_iter().map(patterns::signature))
    }

    fn from_signatures<I: IntoIterator<Item = String>>(signatures: I) -> Self {
        let mut positions: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, signature) in signatures.into_iter().enumerate() {
            if !signature.is_empty() {
                positions.entry(signature).or_default().push(i);
            }
        }
        Self { positions }
    }

    /// Positions holding `signature`, ascending; empty when absent.
    pub fn positions(&self, signature: &str) -> &[usize] {
        self.positions
            .get(signature)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.positions.contains_key(signature)
    }

    /// Number of distinct signatures.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_positions_by_signature() {
        let index = LineIndex::from_texts(["a();", "  a();", "", "b();", "a();"]);
        assert_eq!(index.positions("a();"), &[0, 1, 4]);
        assert_eq!(index.positions("b();"), &[3]);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn skips_blank_lines() {
        let index = LineIndex::from_texts(["", "   ", "\t"]);
        assert!(index.is_empty());
        assert!(!index.contains(""));
        assert!(index.positions("").is_empty());
    }
}
