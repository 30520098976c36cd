use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::puzzle::{Group, Word, GROUP_COUNT, GROUP_SIZE};

pub const STARTING_ATTEMPTS: u32 = 4;
pub const MAX_SELECTED: usize = GROUP_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum RoundStatus {
    Active,
    Won,
    Lost,
}

impl RoundStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RoundStatus::Active)
    }
}

/// Order-independent identity of a submitted selection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GuessRecord(Vec<Word>);

impl GuessRecord {
    pub fn from_selection(words: &[Word]) -> Self {
        Self(words.iter().cloned().sorted().collect())
    }
}

impl fmt::Display for GuessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join(","))
    }
}

/// Words the player has picked, in the order they were picked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    words: Vec<Word>,
}

impl Selection {
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.words.len() == MAX_SELECTED
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    /// Remove `word` if picked, else pick it when there is room.
    /// Returns whether the selection changed.
    pub(crate) fn toggle(&mut self, word: &str) -> bool {
        if let Some(pos) = self.words.iter().position(|w| w == word) {
            self.words.remove(pos);
            true
        } else if !self.is_full() {
            self.words.push(word.to_string());
            true
        } else {
            false
        }
    }

    pub(crate) fn clear(&mut self) {
        self.words.clear();
    }
}

/// Everything about a round in progress. Only the controller mutates it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundState {
    remaining_attempts: u32,
    starting_attempts: u32,
    mistakes_made: u32,
    solved_groups: Vec<Group>,
    rejected_guesses: BTreeSet<GuessRecord>,
    selection: Selection,
    board: Vec<Word>,
    status: RoundStatus,
    elapsed_seconds: Option<u64>,
}

impl RoundState {
    pub(crate) fn new(board: Vec<Word>) -> Self {
        Self {
            remaining_attempts: STARTING_ATTEMPTS,
            starting_attempts: STARTING_ATTEMPTS,
            mistakes_made: 0,
            solved_groups: Vec::new(),
            rejected_guesses: BTreeSet::new(),
            selection: Selection::default(),
            board,
            status: RoundStatus::Active,
            elapsed_seconds: None,
        }
    }

    pub fn remaining_attempts(&self) -> u32 {
        self.remaining_attempts
    }

    pub fn starting_attempts(&self) -> u32 {
        self.starting_attempts
    }

    pub fn mistakes_made(&self) -> u32 {
        self.mistakes_made
    }

    pub fn solved_groups(&self) -> &[Group] {
        &self.solved_groups
    }

    pub fn solved_count(&self) -> usize {
        self.solved_groups.len()
    }

    pub fn solved_categories(&self) -> HashSet<String> {
        self.solved_groups
            .iter()
            .map(|g| g.category.clone())
            .collect()
    }

    pub fn rejected_guesses(&self) -> &BTreeSet<GuessRecord> {
        &self.rejected_guesses
    }

    pub fn was_rejected(&self, guess: &GuessRecord) -> bool {
        self.rejected_guesses.contains(guess)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Words still in play, in display order
    pub fn board(&self) -> &[Word] {
        &self.board
    }

    pub fn on_board(&self, word: &str) -> bool {
        self.board.iter().any(|w| w == word)
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    /// Set once the round is over.
    pub fn elapsed_seconds(&self) -> Option<u64> {
        self.elapsed_seconds
    }

    pub(crate) fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub(crate) fn board_mut(&mut self) -> &mut Vec<Word> {
        &mut self.board
    }

    pub(crate) fn record_solved(&mut self, group: Group) {
        self.board.retain(|w| !group.contains(w));
        self.selection.clear();
        self.solved_groups.push(group);
    }

    pub(crate) fn record_mistake(&mut self, guess: GuessRecord) {
        self.remaining_attempts = self.remaining_attempts.saturating_sub(1);
        self.mistakes_made = self.starting_attempts - self.remaining_attempts;
        self.rejected_guesses.insert(guess);
    }

    pub(crate) fn is_won(&self) -> bool {
        self.solved_groups.len() == GROUP_COUNT
    }

    pub(crate) fn is_lost(&self) -> bool {
        self.remaining_attempts == 0 && self.solved_groups.len() < GROUP_COUNT
    }

    /// Terminal transition; the last submission's selection goes with it.
    pub(crate) fn finish(&mut self, status: RoundStatus, elapsed_seconds: u64) {
        self.selection.clear();
        self.status = status;
        self.elapsed_seconds = Some(elapsed_seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::fixtures::numbered;

    fn w(s: &str) -> Word {
        s.to_string()
    }

    #[test]
    fn test_guess_record_is_order_independent() {
        let a = GuessRecord::from_selection(&[w("b"), w("a"), w("d"), w("c")]);
        let b = GuessRecord::from_selection(&[w("c"), w("d"), w("a"), w("b")]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "a,b,c,d");
    }

    #[test]
    fn test_selection_toggle_caps_at_four() {
        let mut sel = Selection::default();
        for word in ["1", "2", "3", "4"] {
            assert!(sel.toggle(word));
        }
        assert!(sel.is_full());
        assert!(!sel.toggle("5"));
        assert_eq!(sel.len(), 4);
        assert!(!sel.contains("5"));
    }

    #[test]
    fn test_selection_toggle_removes_existing() {
        let mut sel = Selection::default();
        sel.toggle("1");
        sel.toggle("2");
        assert!(sel.toggle("1"));
        assert_eq!(sel.words(), &[w("2")]);
        sel.clear();
        assert!(sel.is_empty());
    }

    #[test]
    fn test_new_state_is_active_with_full_attempts() {
        let state = RoundState::new(numbered().all_words());
        assert_eq!(state.status(), RoundStatus::Active);
        assert_eq!(state.remaining_attempts(), STARTING_ATTEMPTS);
        assert_eq!(state.mistakes_made(), 0);
        assert_eq!(state.board().len(), 16);
        assert!(state.solved_groups().is_empty());
        assert!(state.rejected_guesses().is_empty());
        assert_eq!(state.elapsed_seconds(), None);
    }

    #[test]
    fn test_record_solved_removes_words_from_board() {
        let puzzle = numbered();
        let mut state = RoundState::new(puzzle.all_words());
        state.selection_mut().toggle("1");
        state.record_solved(puzzle.group("A").unwrap().clone());
        assert_eq!(state.board().len(), 12);
        assert!(!state.on_board("1"));
        assert!(state.selection().is_empty());
        assert!(state.solved_categories().contains("A"));
    }

    #[test]
    fn test_record_mistake_keeps_attempt_invariant() {
        let mut state = RoundState::new(numbered().all_words());
        for i in 0..STARTING_ATTEMPTS {
            let guess = GuessRecord::from_selection(&[w("1"), w("2"), w("5"), w(&i.to_string())]);
            state.record_mistake(guess);
            assert_eq!(
                state.remaining_attempts() + state.mistakes_made(),
                STARTING_ATTEMPTS
            );
        }
        assert!(state.is_lost());
        assert!(!state.is_won());
    }

    #[test]
    fn test_status_terminal() {
        assert!(!RoundStatus::Active.is_terminal());
        assert!(RoundStatus::Won.is_terminal());
        assert!(RoundStatus::Lost.is_terminal());
        assert_eq!(RoundStatus::Won.to_string(), "Won");
    }
}
