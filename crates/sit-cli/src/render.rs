//! Line-level rendering of content changes for `sit diff`.
//!
//! Hunks are computed with `similar` (Myers) over whole lines, three lines
//! of context, in unified-diff shape.

use colored::Colorize;
use similar::{ChangeTag, TextDiff};

/// One hunk of a line diff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hunk {
    /// 1-based start line in the old content.
    pub old_start: usize,
    pub old_count: usize,
    /// 1-based start line in the new content.
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<Line>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Line {
    Context(String),
    Added(String),
    Removed(String),
}

/// Line diff between two blobs, or `None` if either side is not UTF-8.
pub fn line_hunks(old: &[u8], new: &[u8]) -> Option<Vec<Hunk>> {
    let old = std::str::from_utf8(old).ok()?;
    let new = std::str::from_utf8(new).ok()?;
    let diff = TextDiff::from_lines(old, new);

    let mut hunks = Vec::new();
    for group in diff.grouped_ops(3) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_range = first.old_range().start..last.old_range().end;
        let new_range = first.new_range().start..last.new_range().end;

        let mut lines = Vec::new();
        for op in &group {
            for change in diff.iter_changes(op) {
                let text = change.value().trim_end_matches('\n').to_string();
                lines.push(match change.tag() {
                    ChangeTag::Equal => Line::Context(text),
                    ChangeTag::Insert => Line::Added(text),
                    ChangeTag::Delete => Line::Removed(text),
                });
            }
        }

        hunks.push(Hunk {
            old_start: old_range.start + 1,
            old_count: old_range.len(),
            new_start: new_range.start + 1,
            new_count: new_range.len(),
            lines,
        });
    }
    Some(hunks)
}

/// Print a unified diff for one path to stdout.
pub fn print_unified(path: &str, old: Option<&[u8]>, new: Option<&[u8]>) {
    let old_label = if old.is_some() { format!("a/{path}") } else { "/dev/null".into() };
    let new_label = if new.is_some() { format!("b/{path}") } else { "/dev/null".into() };
    println!("{}", format!("diff --sit a/{path} b/{path}").bold());
    println!("{}", format!("--- {old_label}").bold());
    println!("{}", format!("+++ {new_label}").bold());

    let Some(hunks) = line_hunks(old.unwrap_or_default(), new.unwrap_or_default()) else {
        println!("Binary files differ");
        return;
    };
    for hunk in hunks {
        println!(
            "{}",
            format!(
                "@@ -{},{} +{},{} @@",
                hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
            )
            .cyan()
        );
        for line in hunk.lines {
            match line {
                Line::Context(text) => println!(" {text}"),
                Line::Added(text) => println!("{}", format!("+{text}").green()),
                Line::Removed(text) => println!("{}", format!("-{text}").red()),
            }
        }
    }
}
