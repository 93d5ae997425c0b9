use anyhow::Result;
use intent_diff::{ClassicDiff, RowKind};

fn main() -> Result<()> {
    // Two sample texts to compare
    let text1 = "This is the first line.\nHere is the second line.\nAnd the third line.\n";
    let text2 = "This is the first line.\nThis is a completely different second line.\nAnd the third line.\nPlus a new fourth line.\n";

    let diff = ClassicDiff::new(text1, text2)?;

    println!("Unified diff:");
    print!("{}", diff.unified());

    let stats = diff.stats();
    println!("\nDiff statistics:");
    println!("  Added lines: {}", stats.additions);
    println!("  Deleted lines: {}", stats.deletions);
    println!("  Unchanged lines: {}", stats.unchanged);

    println!("\nRows:");
    for row in diff.rows() {
        let number = |line: Option<usize>| line.map_or(String::new(), |l| l.to_string());
        let color = match row.kind {
            RowKind::Deleted => "\x1b[31m",
            RowKind::Added => "\x1b[32m",
            RowKind::Unchanged => "\x1b[37m",
        };
        println!(
            "{:>4} {:>4} {}{}{}\x1b[0m",
            number(row.source_line),
            number(row.changed_line),
            color,
            row.kind.sign(),
            row.content
        );
    }

    Ok(())
}
