use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

const PLAYER_ID_LEN: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Stable local identity, generated on first run
    pub player_id: Option<String>,
    pub nickname: Option<String>,
    /// Recorded on the profile at first-time setup
    pub email: Option<String>,
    pub puzzle_file: Option<PathBuf>,
    /// Lock window after an evaluated guess
    pub resolve_delay_ms: u64,
    pub message_clear_ms: u64,
    /// Pause on a lost round before the first group is revealed
    pub lose_face_ms: u64,
    /// Gap between groups revealed after a loss
    pub reveal_stagger_ms: u64,
    pub leaderboard_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player_id: None,
            nickname: None,
            email: None,
            puzzle_file: None,
            resolve_delay_ms: 700,
            message_clear_ms: 1800,
            lose_face_ms: 1800,
            reveal_stagger_ms: 250,
            leaderboard_limit: 20,
        }
    }
}

/// Who is playing: the persisted id plus a display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub display_name: String,
    pub email: Option<String>,
}

impl Config {
    /// Returns the player id, generating one if this is the first run.
    /// The second value is true when the config changed and should be saved.
    pub fn ensure_player_id<R: Rng + ?Sized>(&mut self, rng: &mut R) -> (String, bool) {
        if let Some(id) = self.player_id.as_ref().filter(|id| !id.is_empty()) {
            return (id.clone(), false);
        }
        let id: String = rng
            .sample_iter(&Alphanumeric)
            .take(PLAYER_ID_LEN)
            .map(char::from)
            .collect();
        self.player_id = Some(id.clone());
        (id, true)
    }

    pub fn identity(&self, uid: String) -> Identity {
        let display_name = self
            .nickname
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .unwrap_or_else(|| "Anonymous".to_string());
        let email = self.email.clone().filter(|e| !e.trim().is_empty());
        Identity {
            uid,
            display_name,
            email,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("bennections_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!("ignoring unreadable config {}: {e}", self.path.display()),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            player_id: Some("abc123".into()),
            nickname: Some("Ada".into()),
            email: Some("ada@example.com".into()),
            puzzle_file: Some(PathBuf::from("/tmp/puzzles.json")),
            resolve_delay_ms: 10,
            message_clear_ms: 20,
            lose_face_ms: 25,
            reveal_stagger_ms: 30,
            leaderboard_limit: 5,
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"nickname": "Grace"}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.nickname.as_deref(), Some("Grace"));
        assert_eq!(cfg.resolve_delay_ms, 700);
        assert_eq!(cfg.lose_face_ms, 1800);
        assert_eq!(cfg.leaderboard_limit, 20);
    }

    #[test]
    fn corrupt_config_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{{{").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn player_id_generated_once() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut cfg = Config::default();
        let (id, changed) = cfg.ensure_player_id(&mut rng);
        assert!(changed);
        assert_eq!(id.len(), PLAYER_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));

        let (again, changed) = cfg.ensure_player_id(&mut rng);
        assert!(!changed);
        assert_eq!(again, id);
    }

    #[test]
    fn identity_prefers_nickname() {
        let cfg = Config {
            nickname: Some("Ada".into()),
            ..Config::default()
        };
        let identity = cfg.identity("uid".into());
        assert_eq!(identity.display_name, "Ada");
        assert_eq!(identity.uid, "uid");
        assert_eq!(identity.email, None);
    }

    #[test]
    fn identity_carries_configured_email() {
        let cfg = Config {
            email: Some("ada@example.com".into()),
            ..Config::default()
        };
        assert_eq!(
            cfg.identity("uid".into()).email.as_deref(),
            Some("ada@example.com")
        );
        let blank = Config {
            email: Some("  ".into()),
            ..Config::default()
        };
        assert_eq!(blank.identity("uid".into()).email, None);
    }
}
