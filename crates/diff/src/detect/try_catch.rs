use std::ops::Range;
use std::sync::Arc;

use log::trace;

use super::{line_block, Sides};
use crate::change::{LineBlock, TryCatchChange};
use crate::claims::{ClaimTracker, Side};
use crate::config::AnalyzerConfig;
use crate::line::Line;
use crate::patterns;

/// A `try` construct found on one side. Positions are 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryBlock {
    /// The `try` line
    pub start: usize,
    /// Last line of the final handler
    pub end: usize,
    /// Lines wrapped by the `try` body, braces excluded
    pub body: Range<usize>,
    /// The `try` line and every line opening a `catch` or `finally` clause
    pub markers: Vec<usize>,
}

impl TryBlock {
    fn span(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }

    /// Body text with comments dropped and whitespace collapsed.
    fn normalized_body(&self, lines: &[Arc<Line>]) -> String {
        lines[self.body.clone()]
            .iter()
            .map(|line| patterns::signature(&patterns::strip_comments(line.text())))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Locate the `try` construct starting at `start`, if the line opens one.
///
/// Braces are counted outside of string literals and `//` comments. The
/// construct ends at the first line where the depth returns to zero and the
/// next non-blank line does not continue with `catch`/`finally`. A `try`
/// without any handler, an unbalanced closing brace, or a construct that does
/// not close within `lookahead` lines yields `None`.
pub fn find_try_block(lines: &[Arc<Line>], start: usize, lookahead: usize) -> Option<TryBlock> {
    if !patterns::is_try_start(lines.get(start)?.signature()) {
        return None;
    }

    let last = start.saturating_add(lookahead).min(lines.len() - 1);
    let mut depth = 0usize;
    let mut open_line: Option<usize> = None;
    let mut close_line: Option<usize> = None;
    let mut markers = vec![start];
    let mut has_handler = false;

    for idx in start..=last {
        let text = lines[idx].text();

        if idx > start && depth == 0 && open_line.is_some() && patterns::starts_catch_or_finally(text)
        {
            push_marker(&mut markers, idx);
            has_handler = true;
        }

        for (offset, c) in code_braces(text) {
            if c == '{' {
                open_line.get_or_insert(idx);
                depth += 1;
                continue;
            }
            if depth == 0 {
                return None;
            }
            depth -= 1;
            if depth == 0 {
                close_line.get_or_insert(idx);
                if patterns::starts_catch_or_finally(&text[offset + 1..]) {
                    push_marker(&mut markers, idx);
                    has_handler = true;
                }
            }
        }

        if open_line.is_some() && depth == 0 {
            let continues = lines[idx + 1..]
                .iter()
                .find(|line| !line.is_blank())
                .map_or(false, |line| patterns::starts_catch_or_finally(line.text()));
            if continues {
                continue;
            }
            if !has_handler {
                return None;
            }
            let open = open_line?;
            let close = close_line?;
            return Some(TryBlock {
                start,
                end: idx,
                body: (open + 1)..close.max(open + 1),
                markers,
            });
        }
    }

    None
}

fn push_marker(markers: &mut Vec<usize>, idx: usize) {
    if markers.last() != Some(&idx) {
        markers.push(idx);
    }
}

/// Byte offsets of `{` and `}` outside of quotes and line comments.
fn code_braces(text: &str) -> Vec<(usize, char)> {
    let mut braces = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev = '\0';

    for (offset, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '/' if prev == '/' => break,
            '{' | '}' => braces.push((offset, c)),
            _ => {}
        }
        prev = c;
    }

    braces
}

/// Wrappers on `side` whose markers appear nowhere on the other side.
fn new_wrappers(
    sides: &Sides<'_>,
    claims: &ClaimTracker,
    config: &AnalyzerConfig,
    side: Side,
) -> Vec<TryBlock> {
    let lines = sides.lines(side);
    let other_index = sides.index(side.other());

    (0..lines.len())
        .filter_map(|pos| find_try_block(lines, pos, config.try_catch_lookahead))
        .filter(|block| !claims.any_claimed(side, block.span()))
        .filter(|block| {
            block
                .markers
                .iter()
                .all(|&m| !other_index.contains(lines[m].signature()))
        })
        .collect()
}

/// Detect exception-handling wrappers that were added, removed or replaced.
///
/// A removed and an added wrapper pair up as `Replaced` when their bodies are
/// at least `try_catch_similarity` alike, best pairs first. Every other new
/// wrapper is reported alone together with the code it wraps as found on the
/// other side.
pub fn detect_try_catch(
    sides: &Sides<'_>,
    claims: &mut ClaimTracker,
    config: &AnalyzerConfig,
) -> Vec<TryCatchChange> {
    let deleted = new_wrappers(sides, claims, config, Side::Source);
    let added = new_wrappers(sides, claims, config, Side::Changed);
    if deleted.is_empty() && added.is_empty() {
        return Vec::new();
    }

    let deleted_bodies: Vec<String> = deleted
        .iter()
        .map(|b| b.normalized_body(sides.source))
        .collect();
    let added_bodies: Vec<String> = added
        .iter()
        .map(|b| b.normalized_body(sides.changed))
        .collect();

    let mut candidates = Vec::new();
    for (d, deleted_body) in deleted_bodies.iter().enumerate() {
        for (a, added_body) in added_bodies.iter().enumerate() {
            let similarity = patterns::char_similarity(deleted_body, added_body);
            if similarity >= config.try_catch_similarity {
                candidates.push((similarity, d, a));
            }
        }
    }
    candidates.sort_by(|x, y| {
        y.0.partial_cmp(&x.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then((x.1, x.2).cmp(&(y.1, y.2)))
    });

    let mut changes = Vec::new();
    let mut deleted_used = vec![false; deleted.len()];
    let mut added_used = vec![false; added.len()];

    for (similarity, d, a) in candidates {
        if deleted_used[d] || added_used[a] {
            continue;
        }
        let (source_block, changed_block) = (&deleted[d], &added[a]);
        if claims.any_claimed(Side::Source, source_block.span())
            || claims.any_claimed(Side::Changed, changed_block.span())
        {
            continue;
        }
        deleted_used[d] = true;
        added_used[a] = true;
        claims.claim_range(Side::Source, source_block.span());
        claims.claim_range(Side::Changed, changed_block.span());
        trace!(
            "try/catch replaced: {} -> {} ({:.2})",
            source_block.start + 1,
            changed_block.start + 1,
            similarity
        );
        changes.push(TryCatchChange::Replaced {
            deleted: line_block(sides.source, source_block.start, source_block.end),
            added: line_block(sides.changed, changed_block.start, changed_block.end),
            similarity,
        });
    }

    for (block, _) in deleted.iter().zip(&deleted_used).filter(|(_, used)| !**used) {
        if let Some((wrapper, preserved)) = claim_single(sides, claims, block, Side::Source) {
            trace!("try/catch deleted at {}", wrapper.start);
            changes.push(TryCatchChange::Deleted { wrapper, preserved });
        }
    }
    for (block, _) in added.iter().zip(&added_used).filter(|(_, used)| !**used) {
        if let Some((wrapper, preserved)) = claim_single(sides, claims, block, Side::Changed) {
            trace!("try/catch added at {}", wrapper.start);
            changes.push(TryCatchChange::Added { wrapper, preserved });
        }
    }

    changes
}

/// Claim a lone wrapper and the code it wraps on the other side.
fn claim_single(
    sides: &Sides<'_>,
    claims: &mut ClaimTracker,
    block: &TryBlock,
    side: Side,
) -> Option<(LineBlock, Option<LineBlock>)> {
    if claims.any_claimed(side, block.span()) {
        return None;
    }
    claims.claim_range(side, block.span());
    let wrapper = line_block(sides.lines(side), block.start, block.end);

    let preserved = preserved_run(sides, claims, block, side).map(|(start, end)| {
        claims.claim_range(side.other(), start..=end);
        line_block(sides.lines(side.other()), start, end)
    });

    Some((wrapper, preserved))
}

/// The longest unclaimed run on the other side that repeats the wrapper body
/// from its first non-blank line on. Ties go to the earliest run.
fn preserved_run(
    sides: &Sides<'_>,
    claims: &ClaimTracker,
    block: &TryBlock,
    side: Side,
) -> Option<(usize, usize)> {
    let lines = sides.lines(side);
    let other = side.other();
    let other_lines = sides.lines(other);

    let first = block.body.clone().find(|&pos| !lines[pos].is_blank())?;
    let body = &lines[first..block.body.end];

    let mut best: Option<(usize, usize)> = None;
    for &p in sides.index(other).positions(body[0].signature()) {
        let run = body
            .iter()
            .zip(p..other_lines.len())
            .take_while(|(line, q)| {
                !claims.is_claimed(other, *q) && line.signature() == other_lines[*q].signature()
            })
            .count();
        if run > 0 && best.map_or(true, |(_, len)| run > len) {
            best = Some((p, run));
        }
    }

    best.map(|(start, len)| (start, start + len - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::LineCache;

    fn lines(text: &str) -> Vec<Arc<Line>> {
        LineCache::new().lines_of(text)
    }

    #[test]
    fn finds_block_with_handler() {
        let src = lines("try {\n  run();\n} catch (e) {\n  log(e);\n}\nnext();");
        let block = find_try_block(&src, 0, 200).unwrap();
        assert_eq!(block.end, 4);
        assert_eq!(block.body, 1..2);
        assert_eq!(block.markers, vec![0, 2]);
    }

    #[test]
    fn follows_catch_and_finally_on_separate_lines() {
        let src = lines("try {\n  run();\n}\ncatch (e) {\n}\nfinally {\n  done();\n}");
        let block = find_try_block(&src, 0, 200).unwrap();
        assert_eq!(block.end, 7);
        assert_eq!(block.markers, vec![0, 3, 5]);
    }

    #[test]
    fn ignores_braces_in_strings_and_comments() {
        let src = lines("try {\n  say(\"}\"); // }\n} catch (e) {}");
        let block = find_try_block(&src, 0, 200).unwrap();
        assert_eq!(block.end, 2);
        assert_eq!(block.body, 1..2);
    }

    #[test]
    fn rejects_missing_handler_and_imbalance() {
        assert!(find_try_block(&lines("try {\n  run();\n}\nnext();"), 0, 200).is_none());
        assert!(find_try_block(&lines("try }\n{"), 0, 200).is_none());
        assert!(find_try_block(&lines("try {\n  run();\n  more();\n} catch (e) {}"), 0, 2).is_none());
        assert!(find_try_block(&lines("retry();"), 0, 200).is_none());
    }
}
