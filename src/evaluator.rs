use std::collections::HashSet;

use crate::puzzle::{Group, PuzzleDay, Word, GROUP_SIZE};

/// Verdict on one four-word submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Match(Group),
    /// Three of four words belong to one unsolved group
    NearMiss,
    Incorrect,
}

/// Judge `selection` against the puzzle's unsolved groups.
///
/// An exact match wins over a near miss. Groups whose category is in
/// `solved` take part in neither check.
pub fn classify(
    selection: &[Word],
    puzzle: &PuzzleDay,
    solved: &HashSet<String>,
) -> Classification {
    let unsolved = puzzle
        .groups()
        .iter()
        .filter(|g| !solved.contains(&g.category));

    let mut near_miss = false;
    for group in unsolved {
        match group.shared_with(selection) {
            GROUP_SIZE if selection.len() == GROUP_SIZE => {
                return Classification::Match(group.clone());
            }
            n if n == GROUP_SIZE - 1 => near_miss = true,
            _ => {}
        }
    }

    if near_miss {
        Classification::NearMiss
    } else {
        Classification::Incorrect
    }
}
