//! Line diff of the aligned broker state against the definitions.
//!
//! Lines are compared with all whitespace removed, so column padding that
//! differs between the two renderings is not reported as a change.

use colored::Colorize;
use similar::{DiffTag, TextDiff};

/// One line of a unified diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Removed(String),
    Added(String),
}

impl DiffLine {
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Context(_))
    }
}

fn squash(line: &str) -> String {
    line.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Diff `current` against `desired`, ignoring whitespace within lines.
pub fn diff_lines(current: &str, desired: &str) -> Vec<DiffLine> {
    let old: Vec<&str> = current.lines().collect();
    let new: Vec<&str> = desired.lines().collect();
    let old_squashed: Vec<String> = old.iter().map(|l| squash(l)).collect();
    let new_squashed: Vec<String> = new.iter().map(|l| squash(l)).collect();
    let old_refs: Vec<&str> = old_squashed.iter().map(String::as_str).collect();
    let new_refs: Vec<&str> = new_squashed.iter().map(String::as_str).collect();

    let diff = TextDiff::from_slices(&old_refs, &new_refs);
    let mut lines = Vec::new();

    for op in diff.ops() {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                lines.extend(old[old_range].iter().map(|l| DiffLine::Context((*l).to_string())));
            }
            DiffTag::Delete => {
                lines.extend(old[old_range].iter().map(|l| DiffLine::Removed((*l).to_string())));
            }
            DiffTag::Insert => {
                lines.extend(new[new_range].iter().map(|l| DiffLine::Added((*l).to_string())));
            }
            DiffTag::Replace => {
                lines.extend(old[old_range].iter().map(|l| DiffLine::Removed((*l).to_string())));
                lines.extend(new[new_range].iter().map(|l| DiffLine::Added((*l).to_string())));
            }
        }
    }

    lines
}

/// Print a colored unified diff with `broker` and `definitions` labels
pub fn display_diff(current: &str, desired: &str) {
    let lines = diff_lines(current, desired);

    println!("{}", "--- broker".red());
    println!("{}", "+++ definitions".green());

    for line in &lines {
        match line {
            DiffLine::Context(text) => println!(" {text}"),
            DiffLine::Removed(text) => println!("{}", format!("-{text}").red()),
            DiffLine::Added(text) => println!("{}", format!("+{text}").green()),
        }
    }

    if !lines.iter().any(DiffLine::is_change) {
        println!("  {}", "(no differences)".dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_is_not_a_change() {
        let current = "name, num_partitions\nt1  , 3\n";
        let desired = "name    , num_partitions\nt1      , 3\n";

        let lines = diff_lines(current, desired);
        assert!(lines.iter().all(|l| !l.is_change()));
        assert_eq!(lines[0], DiffLine::Context("name, num_partitions".into()));
    }

    #[test]
    fn test_changed_row() {
        let current = "name, num_partitions\nt1, 3\nt3, 1\n";
        let desired = "name, num_partitions\nt1, 3\nt2, 1\n";

        let lines = diff_lines(current, desired);
        assert_eq!(
            lines,
            vec![
                DiffLine::Context("name, num_partitions".into()),
                DiffLine::Context("t1, 3".into()),
                DiffLine::Removed("t3, 1".into()),
                DiffLine::Added("t2, 1".into()),
            ]
        );
    }
}
