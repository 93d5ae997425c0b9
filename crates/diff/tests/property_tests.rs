use std::collections::HashSet;

use intent_diff::{analyze, CategorizedChanges, Line, LineIndex};
use proptest::prelude::*;

/// Small vocabulary so generated texts share lines and trigger every detector.
const VOCABULARY: &[&str] = &[
    "",
    "foo();",
    "bar();",
    "baz(a, b);",
    "x = 1;",
    "x = 2;",
    "y = 1;",
    "let total = 0;",
    "return total;",
    "// note",
    "// another note",
    "if (a > b) {",
    "if (a >= b && c) {",
    "}",
    "import a from 'x';",
    "import { a } from 'x';",
    "function run(a) {",
    "function run(a, b) {",
    "try {",
    "} catch (e) {}",
    "} finally {",
];

fn text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(VOCABULARY), 0..24)
        .prop_map(|lines| lines.join("\n"))
}

fn source_lines(result: &CategorizedChanges) -> Vec<usize> {
    result
        .changes()
        .iter()
        .filter_map(|c| c.source_span())
        .flatten()
        .collect()
}

fn changed_lines(result: &CategorizedChanges) -> Vec<usize> {
    result
        .changes()
        .iter()
        .filter_map(|c| c.changed_span())
        .flatten()
        .collect()
}

fn has_duplicates(lines: &[usize]) -> bool {
    let mut seen = HashSet::new();
    !lines.iter().all(|line| seen.insert(*line))
}

proptest! {
    #[test]
    fn no_line_is_reported_twice(source in text(), changed in text()) {
        let result = analyze(&source, &changed);
        prop_assert!(!has_duplicates(&source_lines(&result)));
        prop_assert!(!has_duplicates(&changed_lines(&result)));
    }

    #[test]
    fn analysis_is_deterministic(source in text(), changed in text()) {
        prop_assert_eq!(analyze(&source, &changed), analyze(&source, &changed));
    }

    #[test]
    fn exclusive_source_lines_are_always_reported(source in text(), changed in text()) {
        let result = analyze(&source, &changed);
        let changed_index = LineIndex::from_texts(changed.lines());
        let covered: HashSet<usize> = source_lines(&result).into_iter().collect();

        for (i, text) in source.lines().enumerate() {
            let line = Line::new(text);
            if !line.is_blank() && !changed_index.contains(line.signature()) {
                prop_assert!(covered.contains(&(i + 1)), "source line {} unreported", i + 1);
            }
        }
    }

    #[test]
    fn deleted_blocks_hold_only_exclusive_lines(source in text(), changed in text()) {
        let result = analyze(&source, &changed);
        let changed_index = LineIndex::from_texts(changed.lines());

        for block in &result.delete_code {
            for text in &block.lines {
                let line = Line::new(text);
                prop_assert!(
                    line.is_gap_filler() || !changed_index.contains(line.signature()),
                    "{:?} also exists in the changed text",
                    text
                );
            }
        }
    }

    #[test]
    fn empty_changed_text_deletes_everything(source in text()) {
        let result = analyze(&source, "");
        let wrapped: usize = result
            .update_try_catch
            .iter()
            .filter_map(|c| c.source_block())
            .map(|b| b.substantive_count)
            .sum();
        let deleted: usize = result.delete_code.iter().map(|b| b.substantive_count).sum();
        let reported = wrapped + deleted;
        let expected = source.lines().filter(|l| Line::new(l).is_substantive()).count();
        prop_assert_eq!(reported, expected);
    }
}
