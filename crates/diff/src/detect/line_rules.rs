//! Single-line semantic rules.
//!
//! A rule looks at one source line and one changed line and either explains
//! the difference or declines. [`LINE_RULES`] lists them in priority order and
//! [`classify_pair`] returns the first explanation.

use std::collections::HashSet;

use crate::change::{
    Category, ConditionChange, FunctionParamChange, ImportChange, LinePair, LiteralChange,
    RenameChange, RenameKind,
};
use crate::line::Line;
use crate::patterns;

/// The explanation a rule found for a line pair.
#[derive(Debug, Clone, PartialEq)]
pub enum PairedChange {
    Import(ImportChange),
    /// Comment pairs are merged into blocks later, so only the pair is kept.
    Comment(LinePair),
    Condition(ConditionChange),
    FunctionParams(FunctionParamChange),
    Literal(LiteralChange),
    Rename(RenameChange),
}

impl PairedChange {
    pub fn category(&self) -> Category {
        match self {
            PairedChange::Import(_) => Category::UpdateImport,
            PairedChange::Comment(_) => Category::UpdateComment,
            PairedChange::Condition(_) => Category::UpdateCondition,
            PairedChange::FunctionParams(_) => Category::UpdateFunctionParams,
            PairedChange::Literal(_) => Category::UpdateLiteral,
            PairedChange::Rename(_) => Category::RenameVariable,
        }
    }

    pub fn pair(&self) -> &LinePair {
        match self {
            PairedChange::Import(c) => &c.pair,
            PairedChange::Comment(pair) => pair,
            PairedChange::Condition(c) => &c.pair,
            PairedChange::FunctionParams(c) => &c.pair,
            PairedChange::Literal(c) => &c.pair,
            PairedChange::Rename(c) => &c.pair,
        }
    }
}

/// One entry of the rule chain.
pub struct LineRule {
    pub category: Category,
    pub detect: fn(&Line, &Line, &LinePair) -> Option<PairedChange>,
}

impl std::fmt::Debug for LineRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineRule")
            .field("category", &self.category)
            .finish()
    }
}

/// The rules in the order they are tried.
pub const LINE_RULES: &[LineRule] = &[
    LineRule {
        category: Category::UpdateImport,
        detect: import_change,
    },
    LineRule {
        category: Category::UpdateComment,
        detect: comment_change,
    },
    LineRule {
        category: Category::UpdateCondition,
        detect: condition_change,
    },
    LineRule {
        category: Category::UpdateFunctionParams,
        detect: function_params_change,
    },
    LineRule {
        category: Category::UpdateLiteral,
        detect: literal_change,
    },
    LineRule {
        category: Category::RenameVariable,
        detect: rename_change,
    },
];

/// Explain the difference between two lines with the first matching rule.
/// `pair` carries the 1-based line numbers and the raw texts.
pub fn classify_pair(source: &Line, changed: &Line, pair: &LinePair) -> Option<PairedChange> {
    if source.signature() == changed.signature() {
        return None;
    }
    LINE_RULES
        .iter()
        .find_map(|rule| (rule.detect)(source, changed, pair))
}

/// Both imports of the same module. A changed module path is not an import
/// update.
fn import_change(source: &Line, changed: &Line, pair: &LinePair) -> Option<PairedChange> {
    if !source.is_import() || !changed.is_import() {
        return None;
    }
    let path = source.import_path()?;
    if changed.import_path()? != path {
        return None;
    }
    Some(PairedChange::Import(ImportChange {
        pair: pair.clone(),
        module_path: path.to_string(),
    }))
}

fn comment_change(source: &Line, changed: &Line, pair: &LinePair) -> Option<PairedChange> {
    (source.is_comment() && changed.is_comment()).then(|| PairedChange::Comment(pair.clone()))
}

/// Same control keyword, different operators, and identifiers that are equal
/// or nested.
fn condition_change(source: &Line, changed: &Line, pair: &LinePair) -> Option<PairedChange> {
    let keyword = source.control_keyword()?;
    if changed.control_keyword()? != keyword {
        return None;
    }
    let source_condition = source.condition()?;
    let changed_condition = changed.condition()?;
    if source.operators() == changed.operators() {
        return None;
    }

    let source_ids: HashSet<String> = patterns::extract_identifiers(source_condition)
        .into_iter()
        .collect();
    let changed_ids: HashSet<String> = patterns::extract_identifiers(changed_condition)
        .into_iter()
        .collect();
    let related = source_ids == changed_ids
        || source_ids.is_subset(&changed_ids)
        || changed_ids.is_subset(&source_ids);
    if !related {
        return None;
    }

    Some(PairedChange::Condition(ConditionChange {
        pair: pair.clone(),
        keyword,
        source_condition: source_condition.to_string(),
        changed_condition: changed_condition.to_string(),
    }))
}

/// Same declaration with only the parameter text changed.
fn function_params_change(
    source: &Line,
    changed: &Line,
    pair: &LinePair,
) -> Option<PairedChange> {
    let before = source.function_signature()?;
    let after = changed.function_signature()?;
    if before.name != after.name || before.params == after.params || before.rest != after.rest
    {
        return None;
    }
    Some(PairedChange::FunctionParams(FunctionParamChange {
        pair: pair.clone(),
        name: before.name.clone(),
        source_params: before.params.clone(),
        changed_params: after.params.clone(),
    }))
}

/// Same assignment target, a different value, and a literal on either side.
/// A function whose parameters changed is not a literal update.
fn literal_change(source: &Line, changed: &Line, pair: &LinePair) -> Option<PairedChange> {
    let before = source.assignment()?;
    let after = changed.assignment()?;
    if before.lhs != after.lhs || before.rhs == after.rhs {
        return None;
    }
    if let (Some(f), Some(g)) = (source.function_signature(), changed.function_signature()) {
        if f.params != g.params {
            return None;
        }
    }
    let has_literal = !patterns::extract_literals(&before.rhs).is_empty()
        || !patterns::extract_literals(&after.rhs).is_empty();
    if !has_literal {
        return None;
    }
    Some(PairedChange::Literal(LiteralChange {
        pair: pair.clone(),
        target: before.lhs.clone(),
        source_value: before.rhs.clone(),
        changed_value: after.rhs.clone(),
    }))
}

/// A function renamed with the same parameters, or a different target
/// assigned the same value. Both lines must keep the same shape.
fn rename_change(source: &Line, changed: &Line, pair: &LinePair) -> Option<PairedChange> {
    if source.skeleton() != changed.skeleton() {
        return None;
    }

    if let (Some(before), Some(after)) = (source.function_signature(), changed.function_signature())
    {
        if before.name != after.name && before.params == after.params {
            return Some(PairedChange::Rename(RenameChange {
                pair: pair.clone(),
                kind: RenameKind::Function,
                source_name: before.name.clone(),
                changed_name: after.name.clone(),
            }));
        }
    }

    let before = source.assignment()?;
    let after = changed.assignment()?;
    if before.lhs == after.lhs || before.rhs != after.rhs {
        return None;
    }
    let source_name = before.target_name();
    let changed_name = after.target_name();
    // `let a` to `const a` keeps the name
    if source_name == changed_name {
        return None;
    }
    Some(PairedChange::Rename(RenameChange {
        pair: pair.clone(),
        kind: RenameKind::Variable,
        source_name,
        changed_name,
    }))
}
