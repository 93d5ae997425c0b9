// Intent-level diff analysis
// Sorts the differences between two versions of a text into categories that
// say what kind of edit was made, plus a plain line diff for comparison.

pub mod analyzer;
pub mod change;
pub mod claims;
pub mod classic;
pub mod config;
pub mod detect;
pub mod index;
pub mod line;
pub mod patterns;

pub use analyzer::{analyze, analyze_batch, Analyzer};
pub use change::{
    CategorizedChanges, Category, Change, CommentChange, ConditionChange, FunctionParamChange,
    ImportChange, LineAnchor, LineBlock, LinePair, LiteralChange, MoveBlock, RenameChange,
    RenameKind, ReplaceBlock, TryCatchChange, TryCatchKind,
};
pub use claims::{ClaimTracker, Side};
pub use classic::{ClassicDiff, ClassicRow, ClassicStats, RowKind};
pub use config::AnalyzerConfig;
pub use index::LineIndex;
pub use line::{Assignment, CacheStats, FunctionSignature, Line, LineCache};
