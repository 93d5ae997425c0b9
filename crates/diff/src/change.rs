use derive_more::Display;
use std::ops::RangeInclusive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The semantic categories a difference can be sorted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum Category {
    /// Three or more substantive lines relocated unchanged
    #[display(fmt = "moveCodeBlock")]
    MoveCodeBlock,

    /// An exception-handling wrapper added, removed or replaced
    #[display(fmt = "updateTryCatch")]
    UpdateTryCatch,

    /// An import of the same module rewritten
    #[display(fmt = "updateImport")]
    UpdateImport,

    /// Comment text changed
    #[display(fmt = "updateComment")]
    UpdateComment,

    /// A function's parameter list changed
    #[display(fmt = "updateFunctionParams")]
    UpdateFunctionParams,

    /// The literal value assigned to an unchanged target changed
    #[display(fmt = "updateLiteral")]
    UpdateLiteral,

    /// The predicate of a control-flow statement changed
    #[display(fmt = "updateCondition")]
    UpdateCondition,

    /// A variable or function renamed
    #[display(fmt = "renameVariable")]
    RenameVariable,

    /// Lines present only in the source
    #[display(fmt = "deleteCode")]
    DeleteCode,

    /// Lines present only in the changed text
    #[display(fmt = "addCode")]
    AddCode,

    /// A deleted block and an added block judged related by their context
    #[display(fmt = "replaceCode")]
    ReplaceCode,

    /// Differing lines matched by position only
    #[display(fmt = "other")]
    Other,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::MoveCodeBlock,
        Category::UpdateTryCatch,
        Category::UpdateImport,
        Category::UpdateComment,
        Category::UpdateFunctionParams,
        Category::UpdateLiteral,
        Category::UpdateCondition,
        Category::RenameVariable,
        Category::DeleteCode,
        Category::AddCode,
        Category::ReplaceCode,
        Category::Other,
    ];

    /// Human-readable heading for the category
    pub fn title(&self) -> &'static str {
        match self {
            Category::MoveCodeBlock => "Move Code Block",
            Category::UpdateTryCatch => "Update Try-Catch",
            Category::UpdateImport => "Update Import",
            Category::UpdateComment => "Update Comment",
            Category::UpdateFunctionParams => "Update Function Parameters",
            Category::UpdateLiteral => "Update Literal/Constant",
            Category::UpdateCondition => "Update Condition",
            Category::RenameVariable => "Rename Variable/Function",
            Category::DeleteCode => "Delete Code",
            Category::AddCode => "Add Code",
            Category::ReplaceCode => "Replace Code",
            Category::Other => "Other",
        }
    }
}

/// A contiguous run of lines on one side. Line numbers are 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LineBlock {
    /// First line of the block
    pub start: usize,

    /// Last line of the block
    pub end: usize,

    /// Raw text of every covered line, gap lines included
    pub lines: Vec<String>,

    /// Number of substantive lines in the block
    pub substantive_count: usize,
}

impl LineBlock {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn span(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    pub fn contains(&self, line: usize) -> bool {
        self.span().contains(&line)
    }
}

/// Identical lines relocated by more than the minimum distance
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct MoveBlock {
    pub source_start: usize,
    pub changed_start: usize,
    pub size: usize,
    pub substantive_count: usize,
    pub content: Vec<String>,
}

impl MoveBlock {
    pub fn source_span(&self) -> RangeInclusive<usize> {
        self.source_start..=self.source_start + self.size - 1
    }

    pub fn changed_span(&self) -> RangeInclusive<usize> {
        self.changed_start..=self.changed_start + self.size - 1
    }
}

/// A deletion block paired with the addition block that replaced it
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ReplaceBlock {
    pub deleted: LineBlock,
    pub added: LineBlock,
    /// Context similarity that justified the pairing, in `[0, 1]`
    pub score: f64,
}

/// One source line paired with one changed line
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LinePair {
    pub source_line: usize,
    pub changed_line: usize,
    pub source_text: String,
    pub changed_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ImportChange {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub pair: LinePair,
    pub module_path: String,
}

/// Comment lines rewritten; adjacent comment edits are merged into one block
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CommentChange {
    pub source: LineBlock,
    pub changed: LineBlock,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ConditionChange {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub pair: LinePair,
    /// Leading keyword shared by both lines, e.g. `if` or `else if`
    pub keyword: String,
    pub source_condition: String,
    pub changed_condition: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FunctionParamChange {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub pair: LinePair,
    pub name: String,
    pub source_params: String,
    pub changed_params: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LiteralChange {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub pair: LinePair,
    /// The unchanged left-hand side
    pub target: String,
    pub source_value: String,
    pub changed_value: String,
}

/// What kind of name a rename touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum RenameKind {
    #[display(fmt = "variable")]
    Variable,

    #[display(fmt = "function")]
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RenameChange {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub pair: LinePair,
    pub kind: RenameKind,
    pub source_name: String,
    pub changed_name: String,
}

/// The kind of a try/catch change, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TryCatchKind {
    #[display(fmt = "added")]
    Added,

    #[display(fmt = "deleted")]
    Deleted,

    #[display(fmt = "replaced")]
    Replaced,
}

/// A structural change to an exception-handling wrapper
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "camelCase"))]
pub enum TryCatchChange {
    /// A wrapper that exists only in the changed text. `preserved` is the
    /// source code it now wraps, when found.
    Added {
        wrapper: LineBlock,
        preserved: Option<LineBlock>,
    },

    /// A wrapper that exists only in the source. `preserved` is the changed
    /// code that used to be wrapped, when found.
    Deleted {
        wrapper: LineBlock,
        preserved: Option<LineBlock>,
    },

    /// A wrapper removed in one place and added in another around similar code
    Replaced {
        deleted: LineBlock,
        added: LineBlock,
        similarity: f64,
    },
}

impl TryCatchChange {
    pub fn kind(&self) -> TryCatchKind {
        match self {
            TryCatchChange::Added { .. } => TryCatchKind::Added,
            TryCatchChange::Deleted { .. } => TryCatchKind::Deleted,
            TryCatchChange::Replaced { .. } => TryCatchKind::Replaced,
        }
    }

    /// The block on the source side, if any
    pub fn source_block(&self) -> Option<&LineBlock> {
        match self {
            TryCatchChange::Added { preserved, .. } => preserved.as_ref(),
            TryCatchChange::Deleted { wrapper, .. } => Some(wrapper),
            TryCatchChange::Replaced { deleted, .. } => Some(deleted),
        }
    }

    /// The block on the changed side, if any
    pub fn changed_block(&self) -> Option<&LineBlock> {
        match self {
            TryCatchChange::Added { wrapper, .. } => Some(wrapper),
            TryCatchChange::Deleted { preserved, .. } => preserved.as_ref(),
            TryCatchChange::Replaced { added, .. } => Some(added),
        }
    }
}

/// Where the lines backing one change start, on either side (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAnchor {
    pub source_line: Option<usize>,
    pub changed_line: Option<usize>,
}

/// Any single finding, tagged with its category
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Move(MoveBlock),
    TryCatch(TryCatchChange),
    Import(ImportChange),
    Comment(CommentChange),
    FunctionParams(FunctionParamChange),
    Literal(LiteralChange),
    Condition(ConditionChange),
    Rename(RenameChange),
    Deletion(LineBlock),
    Addition(LineBlock),
    Replace(ReplaceBlock),
    Other(LinePair),
}

fn single(line: usize) -> Option<RangeInclusive<usize>> {
    Some(line..=line)
}

impl Change {
    pub fn category(&self) -> Category {
        match self {
            Change::Move(_) => Category::MoveCodeBlock,
            Change::TryCatch(_) => Category::UpdateTryCatch,
            Change::Import(_) => Category::UpdateImport,
            Change::Comment(_) => Category::UpdateComment,
            Change::FunctionParams(_) => Category::UpdateFunctionParams,
            Change::Literal(_) => Category::UpdateLiteral,
            Change::Condition(_) => Category::UpdateCondition,
            Change::Rename(_) => Category::RenameVariable,
            Change::Deletion(_) => Category::DeleteCode,
            Change::Addition(_) => Category::AddCode,
            Change::Replace(_) => Category::ReplaceCode,
            Change::Other(_) => Category::Other,
        }
    }

    /// Source lines covered by this change (1-based, inclusive)
    pub fn source_span(&self) -> Option<RangeInclusive<usize>> {
        match self {
            Change::Move(m) => Some(m.source_span()),
            Change::TryCatch(t) => t.source_block().map(LineBlock::span),
            Change::Import(c) => single(c.pair.source_line),
            Change::Comment(c) => Some(c.source.span()),
            Change::FunctionParams(c) => single(c.pair.source_line),
            Change::Literal(c) => single(c.pair.source_line),
            Change::Condition(c) => single(c.pair.source_line),
            Change::Rename(c) => single(c.pair.source_line),
            Change::Deletion(b) => Some(b.span()),
            Change::Addition(_) => None,
            Change::Replace(r) => Some(r.deleted.span()),
            Change::Other(p) => single(p.source_line),
        }
    }

    /// Changed lines covered by this change (1-based, inclusive)
    pub fn changed_span(&self) -> Option<RangeInclusive<usize>> {
        match self {
            Change::Move(m) => Some(m.changed_span()),
            Change::TryCatch(t) => t.changed_block().map(LineBlock::span),
            Change::Import(c) => single(c.pair.changed_line),
            Change::Comment(c) => Some(c.changed.span()),
            Change::FunctionParams(c) => single(c.pair.changed_line),
            Change::Literal(c) => single(c.pair.changed_line),
            Change::Condition(c) => single(c.pair.changed_line),
            Change::Rename(c) => single(c.pair.changed_line),
            Change::Deletion(_) => None,
            Change::Addition(b) => Some(b.span()),
            Change::Replace(r) => Some(r.added.span()),
            Change::Other(p) => single(p.changed_line),
        }
    }

    /// The pair of lines a viewer should jump to for this change
    pub fn anchor(&self) -> LineAnchor {
        LineAnchor {
            source_line: self.source_span().map(|span| *span.start()),
            changed_line: self.changed_span().map(|span| *span.start()),
        }
    }
}

/// The result of one analysis: every category, each with its ordered findings.
///
/// All categories are always present; a category without findings is empty.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CategorizedChanges {
    pub move_code_block: Vec<MoveBlock>,
    pub update_try_catch: Vec<TryCatchChange>,
    pub update_import: Vec<ImportChange>,
    pub update_comment: Vec<CommentChange>,
    pub update_function_params: Vec<FunctionParamChange>,
    pub update_literal: Vec<LiteralChange>,
    pub update_condition: Vec<ConditionChange>,
    pub rename_variable: Vec<RenameChange>,
    pub delete_code: Vec<LineBlock>,
    pub add_code: Vec<LineBlock>,
    pub replace_code: Vec<ReplaceBlock>,
    pub other: Vec<LinePair>,
}

impl CategorizedChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of findings in one category
    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::MoveCodeBlock => self.move_code_block.len(),
            Category::UpdateTryCatch => self.update_try_catch.len(),
            Category::UpdateImport => self.update_import.len(),
            Category::UpdateComment => self.update_comment.len(),
            Category::UpdateFunctionParams => self.update_function_params.len(),
            Category::UpdateLiteral => self.update_literal.len(),
            Category::UpdateCondition => self.update_condition.len(),
            Category::RenameVariable => self.rename_variable.len(),
            Category::DeleteCode => self.delete_code.len(),
            Category::AddCode => self.add_code.len(),
            Category::ReplaceCode => self.replace_code.len(),
            Category::Other => self.other.len(),
        }
    }

    /// Total number of findings
    pub fn len(&self) -> usize {
        Category::ALL.iter().map(|&c| self.count(c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Categories that have at least one finding
    pub fn populated(&self) -> Vec<Category> {
        Category::ALL
            .iter()
            .copied()
            .filter(|&c| self.count(c) > 0)
            .collect()
    }

    /// Every finding as a tagged [`Change`], in category order
    pub fn changes(&self) -> Vec<Change> {
        let mut changes = Vec::with_capacity(self.len());
        changes.extend(self.move_code_block.iter().cloned().map(Change::Move));
        changes.extend(self.update_try_catch.iter().cloned().map(Change::TryCatch));
        changes.extend(self.update_import.iter().cloned().map(Change::Import));
        changes.extend(self.update_comment.iter().cloned().map(Change::Comment));
        changes.extend(
            self.update_function_params
                .iter()
                .cloned()
                .map(Change::FunctionParams),
        );
        changes.extend(self.update_literal.iter().cloned().map(Change::Literal));
        changes.extend(self.update_condition.iter().cloned().map(Change::Condition));
        changes.extend(self.rename_variable.iter().cloned().map(Change::Rename));
        changes.extend(self.delete_code.iter().cloned().map(Change::Deletion));
        changes.extend(self.add_code.iter().cloned().map(Change::Addition));
        changes.extend(self.replace_code.iter().cloned().map(Change::Replace));
        changes.extend(self.other.iter().cloned().map(Change::Other));
        changes
    }

    /// Findings of one category as tagged [`Change`]s
    pub fn changes_in(&self, category: Category) -> Vec<Change> {
        self.changes()
            .into_iter()
            .filter(|change| change.category() == category)
            .collect()
    }

    /// Order every category by line number.
    pub(crate) fn sort(&mut self) {
        self.move_code_block.sort_by_key(|m| (m.source_start, m.changed_start));
        self.update_try_catch.sort_by_key(|c| {
            (
                c.source_block().map(|b| b.start),
                c.changed_block().map(|b| b.start),
            )
        });
        self.update_import.sort_by_key(|c| pair_key(&c.pair));
        self.update_comment
            .sort_by_key(|c| (c.source.start, c.changed.start));
        self.update_function_params.sort_by_key(|c| pair_key(&c.pair));
        self.update_literal.sort_by_key(|c| pair_key(&c.pair));
        self.update_condition.sort_by_key(|c| pair_key(&c.pair));
        self.rename_variable.sort_by_key(|c| pair_key(&c.pair));
        self.delete_code.sort_by_key(|b| b.start);
        self.add_code.sort_by_key(|b| b.start);
        self.replace_code
            .sort_by_key(|r| (r.deleted.start, r.added.start));
        self.other.sort_by_key(pair_key);
    }
}

fn pair_key(pair: &LinePair) -> (usize, usize) {
    (pair.source_line, pair.changed_line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(start: usize, lines: &[&str]) -> LineBlock {
        LineBlock {
            start,
            end: start + lines.len() - 1,
            lines: lines.iter().map(|l| l.to_string()).collect(),
            substantive_count: lines.len(),
        }
    }

    #[test]
    fn category_keys_and_titles() {
        assert_eq!(Category::MoveCodeBlock.to_string(), "moveCodeBlock");
        assert_eq!(Category::UpdateFunctionParams.to_string(), "updateFunctionParams");
        assert_eq!(Category::UpdateLiteral.title(), "Update Literal/Constant");
        assert_eq!(Category::ALL.len(), 12);
    }

    #[test]
    fn empty_result_has_every_category() {
        let result = CategorizedChanges::new();
        assert!(result.is_empty());
        assert!(Category::ALL.iter().all(|&c| result.count(c) == 0));
        assert!(result.populated().is_empty());
    }

    #[test]
    fn try_catch_sides() {
        let added = TryCatchChange::Added {
            wrapper: block(4, &["try {", "run();", "} catch (e) {}"]),
            preserved: Some(block(2, &["run();"])),
        };
        let change = Change::TryCatch(added);
        assert_eq!(change.source_span(), Some(2..=2));
        assert_eq!(change.changed_span(), Some(4..=6));
        assert_eq!(
            change.anchor(),
            LineAnchor {
                source_line: Some(2),
                changed_line: Some(4)
            }
        );
    }

    #[test]
    fn one_sided_blocks_anchor_one_side() {
        let change = Change::Deletion(block(7, &["gone();"]));
        assert_eq!(change.category(), Category::DeleteCode);
        assert_eq!(change.changed_span(), None);
        assert_eq!(change.anchor().source_line, Some(7));
    }

    #[test]
    fn changes_flatten_in_category_order() {
        let mut result = CategorizedChanges::new();
        result.other.push(LinePair {
            source_line: 1,
            changed_line: 1,
            source_text: "a".into(),
            changed_text: "b".into(),
        });
        result.add_code.push(block(3, &["c();"]));
        let categories: Vec<Category> = result.changes().iter().map(Change::category).collect();
        assert_eq!(categories, vec![Category::AddCode, Category::Other]);
        assert_eq!(result.len(), 2);
        assert_eq!(result.changes_in(Category::Other).len(), 1);
    }
}
