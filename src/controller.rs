use log::{debug, info};
use rand::Rng;
use thiserror::Error;

use crate::evaluator::{classify, Classification};
use crate::medal::Medal;
use crate::puzzle::{Group, PuzzleDay, Word};
use crate::round::{GuessRecord, RoundState, RoundStatus};
use crate::shuffle::{shuffle_in_place, shuffled};
use crate::timer::{Clock, Timer};

/// A command that was refused. State is untouched whenever one is returned.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("the last guess is still resolving")]
    Locked,
    #[error("the round is over")]
    RoundOver,
    #[error("select exactly four words first")]
    SelectionIncomplete,
    #[error("that word is not on the board")]
    NotOnBoard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChanged {
    pub selection: Vec<Word>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    /// Same four words were already rejected this round; costs nothing
    DuplicateGuess,
    Correct {
        group: Group,
        solved_count: usize,
    },
    /// One word away from an unsolved group
    NearMiss,
    Incorrect,
    RoundWon {
        group: Group,
        elapsed_seconds: u64,
        mistakes_made: u32,
        medal: Medal,
    },
    RoundLost {
        elapsed_seconds: u64,
        mistakes_made: u32,
    },
}

impl GuessOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GuessOutcome::RoundWon { .. } | GuessOutcome::RoundLost { .. }
        )
    }
}

/// Owns one round: `Active` until four groups are solved (`Won`) or the
/// attempts run out (`Lost`). Terminal states accept no further commands.
#[derive(Debug)]
pub struct RoundController {
    puzzle: PuzzleDay,
    state: RoundState,
    timer: Timer,
    resolving: bool,
}

impl RoundController {
    /// Shuffle the puzzle's words onto a fresh board and start the timer.
    pub fn start<R: Rng + ?Sized>(puzzle: PuzzleDay, clock: Box<dyn Clock>, rng: &mut R) -> Self {
        let board = shuffled(&puzzle.all_words(), rng);
        let mut timer = Timer::new(clock);
        timer.start();
        info!("round started for {}", puzzle.date());

        Self {
            state: RoundState::new(board),
            puzzle,
            timer,
            resolving: false,
        }
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn puzzle(&self) -> &PuzzleDay {
        &self.puzzle
    }

    pub fn is_resolving(&self) -> bool {
        self.resolving
    }

    /// Live timer reading, for display only.
    pub fn elapsed_seconds(&self) -> u64 {
        self.timer.elapsed_seconds()
    }

    /// Medal for a won round, derived from the final state
    pub fn medal(&self) -> Option<Medal> {
        match (self.state.status(), self.state.elapsed_seconds()) {
            (RoundStatus::Won, Some(secs)) => Some(Medal::classify(secs, self.state.mistakes_made())),
            _ => None,
        }
    }

    /// Unsolved groups, easiest first.
    pub fn remaining_groups(&self) -> Vec<&Group> {
        let solved = self.state.solved_categories();
        let mut groups: Vec<&Group> = self
            .puzzle
            .groups()
            .iter()
            .filter(|g| !solved.contains(&g.category))
            .collect();
        groups.sort_by_key(|g| g.difficulty);
        groups
    }

    fn ensure_accepting(&self) -> Result<(), Rejection> {
        if self.state.status().is_terminal() {
            Err(Rejection::RoundOver)
        } else if self.resolving {
            Err(Rejection::Locked)
        } else {
            Ok(())
        }
    }

    fn selection_changed(&self) -> SelectionChanged {
        SelectionChanged {
            selection: self.state.selection().words().to_vec(),
        }
    }

    /// Pick or unpick `word`. A fifth pick is ignored.
    pub fn toggle_select(&mut self, word: &str) -> Result<SelectionChanged, Rejection> {
        self.ensure_accepting()?;
        if !self.state.on_board(word) {
            return Err(Rejection::NotOnBoard);
        }
        self.state.selection_mut().toggle(word);
        Ok(self.selection_changed())
    }

    pub fn deselect_all(&mut self) -> Result<SelectionChanged, Rejection> {
        self.ensure_accepting()?;
        self.state.selection_mut().clear();
        Ok(self.selection_changed())
    }

    /// Reorder the words still on the board.
    pub fn shuffle_board<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), Rejection> {
        self.ensure_accepting()?;
        shuffle_in_place(self.state.board_mut(), rng);
        Ok(())
    }

    /// Evaluate the current four-word selection.
    ///
    /// Any evaluated guess leaves the controller locked until
    /// [`finish_resolution`](Self::finish_resolution) is called. Duplicates
    /// are answered immediately and take no lock.
    pub fn submit_guess(&mut self) -> Result<GuessOutcome, Rejection> {
        self.ensure_accepting()?;
        if !self.state.selection().is_full() {
            return Err(Rejection::SelectionIncomplete);
        }

        let selection = self.state.selection().words().to_vec();
        let guess_id = GuessRecord::from_selection(&selection);
        if self.state.was_rejected(&guess_id) {
            debug!("duplicate guess {guess_id}");
            return Ok(GuessOutcome::DuplicateGuess);
        }

        self.resolving = true;
        let solved = self.state.solved_categories();
        let outcome = match classify(&selection, &self.puzzle, &solved) {
            Classification::Match(group) => {
                debug!("solved '{}' with {guess_id}", group.category);
                self.state.record_solved(group.clone());
                if self.state.is_won() {
                    let elapsed_seconds = self.timer.stop();
                    self.state.finish(RoundStatus::Won, elapsed_seconds);
                    let mistakes_made = self.state.mistakes_made();
                    let medal = Medal::classify(elapsed_seconds, mistakes_made);
                    info!("round won in {elapsed_seconds}s with {mistakes_made} mistakes: {medal}");
                    GuessOutcome::RoundWon {
                        group,
                        elapsed_seconds,
                        mistakes_made,
                        medal,
                    }
                } else {
                    GuessOutcome::Correct {
                        group,
                        solved_count: self.state.solved_count(),
                    }
                }
            }
            verdict @ (Classification::NearMiss | Classification::Incorrect) => {
                debug!("rejected guess {guess_id} ({verdict:?})");
                self.state.record_mistake(guess_id);
                if self.state.is_lost() {
                    let elapsed_seconds = self.timer.stop();
                    self.state.finish(RoundStatus::Lost, elapsed_seconds);
                    let mistakes_made = self.state.mistakes_made();
                    info!("round lost after {elapsed_seconds}s");
                    GuessOutcome::RoundLost {
                        elapsed_seconds,
                        mistakes_made,
                    }
                } else if verdict == Classification::NearMiss {
                    GuessOutcome::NearMiss
                } else {
                    GuessOutcome::Incorrect
                }
            }
        };

        Ok(outcome)
    }

    /// The UI has finished reacting to the last guess.
    pub fn finish_resolution(&mut self) {
        self.resolving = false;
    }
}
