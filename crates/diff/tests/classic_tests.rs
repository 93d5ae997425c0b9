use intent_diff::{ClassicDiff, ClassicRow, ClassicStats, RowKind};
use pretty_assertions::assert_eq;

#[test]
fn test_modified_line() {
    // One line swapped for another between two unchanged lines
    let diff = ClassicDiff::new("a\nb\nc\n", "a\nx\nc\n").unwrap();

    assert!(diff.has_changes());
    assert_eq!(
        diff.stats(),
        ClassicStats {
            additions: 1,
            deletions: 1,
            unchanged: 2
        }
    );
    insta::assert_snapshot!(diff.unified(), @r###"
     a
    -b
    +x
     c
    "###);
}

#[test]
fn test_rows_carry_line_numbers() {
    let diff = ClassicDiff::new("keep\ndrop\n", "keep\nnew\nmore\n").unwrap();

    assert_eq!(
        diff.rows(),
        &[
            ClassicRow {
                kind: RowKind::Unchanged,
                source_line: Some(1),
                changed_line: Some(1),
                content: "keep".to_string(),
            },
            ClassicRow {
                kind: RowKind::Deleted,
                source_line: Some(2),
                changed_line: None,
                content: "drop".to_string(),
            },
            ClassicRow {
                kind: RowKind::Added,
                source_line: None,
                changed_line: Some(2),
                content: "new".to_string(),
            },
            ClassicRow {
                kind: RowKind::Added,
                source_line: None,
                changed_line: Some(3),
                content: "more".to_string(),
            },
        ]
    );
    assert_eq!(diff.source_line_count(), 2);
    assert_eq!(diff.changed_line_count(), 3);
}

#[test]
fn test_added_and_deleted_files() {
    let added = ClassicDiff::new("", "one\ntwo\n").unwrap();
    assert_eq!(added.stats().additions, 2);
    assert_eq!(added.stats().deletions, 0);

    let deleted = ClassicDiff::new("one\ntwo\n", "").unwrap();
    assert_eq!(deleted.stats().deletions, 2);
    assert!(deleted.rows().iter().all(|r| r.kind == RowKind::Deleted));
}

#[test]
fn test_row_kind_display() {
    assert_eq!(RowKind::Added.to_string(), "added");
    assert_eq!(RowKind::Deleted.sign(), '-');
    assert_eq!(RowKind::Unchanged.sign(), ' ');
}
