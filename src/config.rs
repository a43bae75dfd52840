use crate::actor::Motion;
use crate::app_dirs::AppDirs;
use crate::game::Timings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub color: String,
    pub words_file: Option<PathBuf>,
    /// `None` keeps the game silent.
    pub speech_command: Option<String>,
    pub fps: u32,
    pub animation_speed: f64,
    pub step_multiplier: f64,
    pub step_secs: f64,
    pub kick_secs: f64,
    pub forward_step: i32,
    pub first_word_delay_secs: f64,
    pub clock_interval_secs: f64,
    pub next_word_delay_secs: f64,
    pub celebrate_interval_secs: f64,
    /// How long a key counts as held on terminals that never report releases.
    pub key_hold_secs: f64,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            color: "blue".to_string(),
            words_file: None,
            speech_command: Some("espeak".to_string()),
            fps: 60,
            animation_speed: 2.0,
            step_multiplier: 5.0,
            step_secs: 0.1,
            kick_secs: 1.0,
            forward_step: 5,
            first_word_delay_secs: 1.0,
            clock_interval_secs: 1.0,
            next_word_delay_secs: 0.5,
            celebrate_interval_secs: 1.0,
            key_hold_secs: 0.3,
            seed: None,
        }
    }
}

impl Config {
    pub fn fps(&self) -> u32 {
        self.fps.max(1)
    }

    /// Whole frames covering `secs`, never less than one.
    pub fn secs_to_frames(&self, secs: f64) -> u64 {
        ((secs * f64::from(self.fps())).round() as u64).max(1)
    }

    pub fn motion(&self) -> Motion {
        Motion {
            fps: self.fps(),
            animation_speed: self.animation_speed,
            step_multiplier: self.step_multiplier,
            step_frames: self.secs_to_frames(self.step_secs),
            kick_frames: self.secs_to_frames(self.kick_secs),
        }
    }

    pub fn timings(&self) -> Timings {
        Timings {
            fps: self.fps(),
            first_word_delay: self.first_word_delay_secs,
            clock_interval: self.clock_interval_secs,
            next_word_delay: self.next_word_delay_secs,
            celebrate_interval: self.celebrate_interval_secs,
            forward_step: self.forward_step,
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
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
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
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(path = %self.path.display(), %err, "no config file, using defaults");
                return Config::default();
            }
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable config file");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));
        let cfg = Config {
            color: "green".into(),
            words_file: Some(PathBuf::from("/tmp/words.txt")),
            speech_command: None,
            fps: 30,
            seed: Some(9),
            ..Config::default()
        };
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "color": "green", "step_multiplier": 8.0 }"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.color, "green");
        assert_eq!(cfg.step_multiplier, 8.0);
        assert_eq!(cfg.fps, 60);
    }

    #[test]
    fn motion_converts_seconds_to_frames() {
        let motion = Config::default().motion();
        assert_eq!(motion.step_frames, 6);
        assert_eq!(motion.kick_frames, 60);

        let slow = Config {
            fps: 30,
            step_secs: 0.001,
            ..Config::default()
        };
        assert_eq!(slow.motion().step_frames, 1);
        assert_eq!(slow.motion().kick_frames, 30);
    }
}
