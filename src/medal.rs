use serde::{Deserialize, Serialize};

pub const GOLD_TIME_SECS: u64 = 60;
pub const GOLD_MISTAKES: u32 = 1;
pub const SILVER_TIME_SECS: u64 = 180;
pub const SILVER_MISTAKES: u32 = 2;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    /// Medal for a won round. Both bounds are inclusive.
    pub fn classify(elapsed_secs: u64, mistakes_made: u32) -> Self {
        if elapsed_secs <= GOLD_TIME_SECS && mistakes_made <= GOLD_MISTAKES {
            Medal::Gold
        } else if elapsed_secs <= SILVER_TIME_SECS && mistakes_made <= SILVER_MISTAKES {
            Medal::Silver
        } else {
            Medal::Bronze
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gold" => Some(Medal::Gold),
            "silver" => Some(Medal::Silver),
            "bronze" => Some(Medal::Bronze),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Medal::Gold => "Gold",
            Medal::Silver => "Silver",
            Medal::Bronze => "Bronze",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Medal::Gold => "🥇",
            Medal::Silver => "🥈",
            Medal::Bronze => "🥉",
        }
    }
}
