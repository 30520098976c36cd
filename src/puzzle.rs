use chrono::NaiveDate;
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::util::date_key;

static PUZZLE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/puzzles");
const BUNDLED_BOOK: &str = "puzzles.json";

pub const GROUP_COUNT: usize = 4;
pub const GROUP_SIZE: usize = 4;
pub const MAX_DIFFICULTY: u8 = 4;

pub type Word = String;

#[derive(Debug, Error)]
pub enum PuzzleError {
    #[error("no puzzle found for {0}")]
    NoPuzzle(NaiveDate),
    #[error("expected 4 groups, found {0}")]
    WrongGroupCount(usize),
    #[error("group '{category}' has {found} words, expected 4")]
    WrongGroupSize { category: String, found: usize },
    #[error("group '{category}' has difficulty {difficulty}, expected 0..=4")]
    DifficultyOutOfRange { category: String, difficulty: u8 },
    #[error("a group has an empty category")]
    EmptyCategory,
    #[error("group '{0}' contains an empty word")]
    EmptyWord(String),
    #[error("category '{0}' appears more than once")]
    DuplicateCategory(String),
    #[error("word '{0}' appears more than once")]
    DuplicateWord(Word),
    #[error("bundled puzzle book is missing")]
    MissingBundle,
    #[error("unreadable puzzle book: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("puzzle book io: {0}")]
    Io(#[from] std::io::Error),
}

/// A group as it appears in a puzzle book, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub category: String,
    pub difficulty: u8,
    pub words: Vec<Word>,
}

impl GroupSpec {
    pub fn new(category: &str, difficulty: u8, words: [&str; GROUP_SIZE]) -> Self {
        Self {
            category: category.to_string(),
            difficulty,
            words: words.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// One answer group. The category is the group's identity within a puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Group {
    pub category: String,
    pub difficulty: u8,
    pub words: [Word; GROUP_SIZE],
}

impl Group {
    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    /// Number of this group's words present in `selection`.
    pub fn shared_with(&self, selection: &[Word]) -> usize {
        self.words.iter().filter(|w| selection.contains(w)).count()
    }
}

impl TryFrom<GroupSpec> for Group {
    type Error = PuzzleError;

    fn try_from(raw: GroupSpec) -> Result<Self, Self::Error> {
        if raw.category.trim().is_empty() {
            return Err(PuzzleError::EmptyCategory);
        }
        if raw.difficulty > MAX_DIFFICULTY {
            return Err(PuzzleError::DifficultyOutOfRange {
                category: raw.category,
                difficulty: raw.difficulty,
            });
        }
        if raw.words.iter().any(|w| w.trim().is_empty()) {
            return Err(PuzzleError::EmptyWord(raw.category));
        }
        let found = raw.words.len();
        let words: [Word; GROUP_SIZE] =
            raw.words
                .try_into()
                .map_err(|_| PuzzleError::WrongGroupSize {
                    category: raw.category.clone(),
                    found,
                })?;
        Ok(Group {
            category: raw.category,
            difficulty: raw.difficulty,
            words,
        })
    }
}

/// A validated day's puzzle: four groups, sixteen distinct words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PuzzleDay {
    date: NaiveDate,
    groups: Vec<Group>,
}

impl PuzzleDay {
    pub fn new(date: NaiveDate, specs: Vec<GroupSpec>) -> Result<Self, PuzzleError> {
        if specs.len() != GROUP_COUNT {
            return Err(PuzzleError::WrongGroupCount(specs.len()));
        }

        let groups = specs
            .into_iter()
            .map(Group::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut categories = HashSet::new();
        let mut words = HashSet::new();
        for group in &groups {
            if !categories.insert(group.category.as_str()) {
                return Err(PuzzleError::DuplicateCategory(group.category.clone()));
            }
            for word in &group.words {
                if !words.insert(word.as_str()) {
                    return Err(PuzzleError::DuplicateWord(word.clone()));
                }
            }
        }

        Ok(Self { date, groups })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, category: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.category == category)
    }

    /// All sixteen words, group by group.
    pub fn all_words(&self) -> Vec<Word> {
        self.groups
            .iter()
            .flat_map(|g| g.words.iter().cloned())
            .collect()
    }
}

/// Dated lookup of puzzles, keyed by `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PuzzleBook {
    days: BTreeMap<String, Vec<GroupSpec>>,
}

impl PuzzleBook {
    /// The puzzle book compiled into the binary
    pub fn bundled() -> Result<Self, PuzzleError> {
        let file = PUZZLE_DIR
            .get_file(BUNDLED_BOOK)
            .ok_or(PuzzleError::MissingBundle)?;
        let text = file.contents_utf8().ok_or(PuzzleError::MissingBundle)?;
        Self::from_json(text)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PuzzleError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, PuzzleError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.days.keys().map(String::as_str)
    }

    pub fn puzzle_for(&self, date: NaiveDate) -> Result<PuzzleDay, PuzzleError> {
        let specs = self
            .days
            .get(&date_key(date))
            .cloned()
            .ok_or(PuzzleError::NoPuzzle(date))?;
        PuzzleDay::new(date, specs)
    }
}
