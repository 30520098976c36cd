use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "bennections";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/bennections`, falling back to the platform data dir
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|pd| pd.config_dir().join("config.json"))
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("scores.db"))
    }

    pub fn results_log_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("results.csv"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join(format!("{APP_NAME}.log")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_files_share_a_directory() {
        if let (Some(db), Some(log)) = (AppDirs::db_path(), AppDirs::log_path()) {
            assert_eq!(db.parent(), log.parent());
            assert!(db.ends_with("scores.db"));
            assert!(log.ends_with("bennections.log"));
        }
    }
}
