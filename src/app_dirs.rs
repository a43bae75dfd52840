use directories::ProjectDirs;
use std::path::PathBuf;

/// Overrides the log file location.
pub const LOG_PATH_ENV: &str = "SPELL_RACE_LOG";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "spell-race")
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("spell_race_config.json"))
    }

    pub fn log_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(LOG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("spell-race");
            Some(state_dir.join("spell-race.log"))
        } else {
            ProjectDirs::from("", "", "spell-race")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("spell-race.log"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_json() {
        assert_eq!(
            AppDirs::config_path().extension().and_then(|e| e.to_str()),
            Some("json")
        );
    }
}
