use chrono::{DateTime, Local, NaiveDate};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::app_dirs::AppDirs;
use crate::config::Identity;
use crate::medal::Medal;
use crate::util::{date_key, first_name, format_clock};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not prepare database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("no profile for user {0}")]
    UnknownUser(String),
    #[error("malformed stored value: {0}")]
    BadValue(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalCounts {
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
}

impl MedalCounts {
    pub fn get(&self, medal: Medal) -> u32 {
        match medal {
            Medal::Gold => self.gold,
            Medal::Silver => self.silver,
            Medal::Bronze => self.bronze,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub nickname: String,
    pub email: Option<String>,
    pub medals: MedalCounts,
    pub last_updated: DateTime<Local>,
}

/// One leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub uid: String,
    pub nickname: String,
    pub time_in_seconds: u64,
    pub time_string: String,
    pub mistakes: u32,
    pub date: NaiveDate,
    pub medal: Medal,
    pub timestamp: DateTime<Local>,
}

impl ScoreRecord {
    pub fn new(
        uid: &str,
        nickname: &str,
        time_in_seconds: u64,
        mistakes: u32,
        date: NaiveDate,
        medal: Medal,
    ) -> Self {
        let nickname = nickname.trim();
        Self {
            uid: uid.to_string(),
            nickname: if nickname.is_empty() {
                "Anonymous".to_string()
            } else {
                nickname.to_string()
            },
            time_in_seconds,
            time_string: format_clock(time_in_seconds),
            mistakes,
            date,
            medal,
            timestamp: Local::now(),
        }
    }
}

/// Document store for profiles, medal totals and daily scores
pub trait ScoreStore {
    fn get_user_profile(&self, uid: &str) -> Result<Option<UserProfile>, StoreError>;
    /// Create or merge: nickname, email and timestamp are updated, medals kept.
    fn save_user_profile(&self, uid: &str, profile: &UserProfile) -> Result<(), StoreError>;
    fn increment_medal_count(&self, uid: &str, medal: Medal) -> Result<MedalCounts, StoreError>;
    fn submit_score(&self, record: &ScoreRecord) -> Result<(), StoreError>;
    /// Fastest scores for `date`; ties go to fewer mistakes, then to the
    /// earlier submission.
    fn query_top_scores(&self, date: NaiveDate, limit: usize)
        -> Result<Vec<ScoreRecord>, StoreError>;
}

/// Fetch a profile, creating the first-run default if there is none.
pub fn ensure_profile<S: ScoreStore + ?Sized>(
    store: &S,
    identity: &Identity,
) -> Result<UserProfile, StoreError> {
    if let Some(profile) = store.get_user_profile(&identity.uid)? {
        return Ok(profile);
    }
    let profile = UserProfile {
        nickname: first_name(&identity.display_name),
        email: identity.email.clone(),
        medals: MedalCounts::default(),
        last_updated: Local::now(),
    };
    store.save_user_profile(&identity.uid, &profile)?;
    info!("created profile for {}", identity.uid);
    Ok(profile)
}

/// Change the public nickname; blank names become "Anonymous".
pub fn set_nickname<S: ScoreStore + ?Sized>(
    store: &S,
    identity: &Identity,
    nickname: &str,
) -> Result<UserProfile, StoreError> {
    let mut profile = ensure_profile(store, identity)?;
    let trimmed = nickname.trim();
    profile.nickname = if trimmed.is_empty() {
        "Anonymous".to_string()
    } else {
        trimmed.to_string()
    };
    profile.last_updated = Local::now();
    store.save_user_profile(&identity.uid, &profile)?;
    Ok(profile)
}

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the store at its default location under the state dir
    pub fn open_default() -> Result<Self, StoreError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("bennections_scores.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!("opened score store at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                uid TEXT PRIMARY KEY,
                nickname TEXT NOT NULL,
                email TEXT,
                gold INTEGER NOT NULL DEFAULT 0,
                silver INTEGER NOT NULL DEFAULT 0,
                bronze INTEGER NOT NULL DEFAULT 0,
                last_updated TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uid TEXT NOT NULL,
                nickname TEXT NOT NULL,
                time_in_seconds INTEGER NOT NULL,
                time_string TEXT NOT NULL,
                mistakes INTEGER NOT NULL,
                date TEXT NOT NULL,
                medal TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_scores_date_time ON scores(date, time_in_seconds)",
            [],
        )?;

        Ok(Self { conn })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Local>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Local))
        .map_err(|_| StoreError::BadValue(format!("timestamp '{s}'")))
}

struct RawScore {
    uid: String,
    nickname: String,
    time_in_seconds: u64,
    time_string: String,
    mistakes: u32,
    date: String,
    medal: String,
    timestamp: String,
}

impl RawScore {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uid: row.get(0)?,
            nickname: row.get(1)?,
            time_in_seconds: row.get(2)?,
            time_string: row.get(3)?,
            mistakes: row.get(4)?,
            date: row.get(5)?,
            medal: row.get(6)?,
            timestamp: row.get(7)?,
        })
    }

    fn into_record(self) -> Result<ScoreRecord, StoreError> {
        let date = crate::util::parse_date(&self.date)
            .map_err(|_| StoreError::BadValue(format!("date '{}'", self.date)))?;
        let medal = Medal::parse(&self.medal)
            .ok_or_else(|| StoreError::BadValue(format!("medal '{}'", self.medal)))?;
        Ok(ScoreRecord {
            uid: self.uid,
            nickname: self.nickname,
            time_in_seconds: self.time_in_seconds,
            time_string: self.time_string,
            mistakes: self.mistakes,
            date,
            medal,
            timestamp: parse_timestamp(&self.timestamp)?,
        })
    }
}

impl ScoreStore for SqliteStore {
    fn get_user_profile(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT nickname, email, gold, silver, bronze, last_updated FROM users WHERE uid = ?1",
                [uid],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        MedalCounts {
                            gold: row.get(2)?,
                            silver: row.get(3)?,
                            bronze: row.get(4)?,
                        },
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((nickname, email, medals, last_updated)) => Ok(Some(UserProfile {
                nickname,
                email,
                medals,
                last_updated: parse_timestamp(&last_updated)?,
            })),
            None => Ok(None),
        }
    }

    fn save_user_profile(&self, uid: &str, profile: &UserProfile) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO users (uid, nickname, email, gold, silver, bronze, last_updated)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(uid) DO UPDATE SET
                nickname = excluded.nickname,
                email = COALESCE(excluded.email, users.email),
                last_updated = excluded.last_updated
            "#,
            params![
                uid,
                profile.nickname,
                profile.email,
                profile.medals.gold,
                profile.medals.silver,
                profile.medals.bronze,
                profile.last_updated.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn increment_medal_count(&self, uid: &str, medal: Medal) -> Result<MedalCounts, StoreError> {
        let sql = match medal {
            Medal::Gold => "UPDATE users SET gold = gold + 1 WHERE uid = ?1",
            Medal::Silver => "UPDATE users SET silver = silver + 1 WHERE uid = ?1",
            Medal::Bronze => "UPDATE users SET bronze = bronze + 1 WHERE uid = ?1",
        };
        if self.conn.execute(sql, [uid])? == 0 {
            return Err(StoreError::UnknownUser(uid.to_string()));
        }
        let profile = self
            .get_user_profile(uid)?
            .ok_or_else(|| StoreError::UnknownUser(uid.to_string()))?;
        Ok(profile.medals)
    }

    fn submit_score(&self, record: &ScoreRecord) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO scores
            (uid, nickname, time_in_seconds, time_string, mistakes, date, medal, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.uid,
                record.nickname,
                record.time_in_seconds,
                record.time_string,
                record.mistakes,
                date_key(record.date),
                record.medal.to_string(),
                record.timestamp.to_rfc3339(),
            ],
        )?;
        info!(
            "score submitted for {}: {} {}",
            record.date, record.time_string, record.medal
        );
        Ok(())
    }

    fn query_top_scores(
        &self,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<ScoreRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT uid, nickname, time_in_seconds, time_string, mistakes, date, medal, timestamp
            FROM scores
            WHERE date = ?1
            ORDER BY time_in_seconds ASC, mistakes ASC, id ASC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![date_key(date), limit as i64], RawScore::from_row)?;

        let mut scores = Vec::new();
        for row in rows {
            scores.push(row?.into_record()?);
        }
        Ok(scores)
    }
}
