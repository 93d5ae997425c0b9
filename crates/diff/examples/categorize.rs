use anyhow::Result;
use intent_diff::{Analyzer, AnalyzerConfig, Change};

fn main() -> Result<()> {
    // Two versions of a small module
    let source = "import { load } from './io';\n\
                  // read settings\n\
                  function init(path) {\n\
                  \x20 let retries = 3;\n\
                  \x20 if (path != null) {\n\
                  \x20   load(path);\n\
                  \x20 }\n\
                  }\n";
    let changed = "import { load, save } from './io';\n\
                   // read and cache settings\n\
                   function init(path, cache) {\n\
                   \x20 let retries = 5;\n\
                   \x20 if (path != null && cache) {\n\
                   \x20   try {\n\
                   \x20     load(path);\n\
                   \x20   } catch (e) {}\n\
                   \x20 }\n\
                   }\n";

    let mut analyzer = Analyzer::new(AnalyzerConfig::default())?;
    let result = analyzer.analyze(source, changed);

    println!("Categories:");
    for category in result.populated() {
        println!("  {} ({}): {}", category.title(), category, result.count(category));
    }

    println!("\nChanges:");
    for change in result.changes() {
        let anchor = change.anchor();
        let describe = |line: Option<usize>| line.map_or("-".to_string(), |l| l.to_string());
        println!(
            "  {:<22} source {:>3}  changed {:>3}",
            change.category().to_string(),
            describe(anchor.source_line),
            describe(anchor.changed_line)
        );
        if let Change::Literal(literal) = &change {
            println!(
                "    {}: {} -> {}",
                literal.target, literal.source_value, literal.changed_value
            );
        }
    }

    let stats = analyzer.cache().stats();
    println!(
        "\nLine cache: {} entries, {} hits, {} misses",
        stats.entries, stats.hits, stats.misses
    );

    Ok(())
}
