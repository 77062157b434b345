use crate::models::{QUICK_SEND_SLOT_COUNT, QuickSendSlots, UserConfig};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use thiserror::Error;

/// File holding the user settings
pub const USER_CONFIG_FILE: &str = "QuickSerial Config.yaml";

/// File holding the quick-send slots
pub const QUICK_SEND_FILE: &str = "saved_commands.json";

/// Prefix for environment overrides, e.g. `QUICKSERIAL__SERIAL__BAUD_RATE=9600`
pub const ENV_PREFIX: &str = "QUICKSERIAL";

/// Errors from reading or writing persisted user data
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed quick-send file {path}: {source}")]
    Malformed {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize quick-send slots: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Configuration manager for the settings file and the quick-send file.
///
/// Both files live in one data directory:
/// - User config (`QuickSerial Config.yaml`): last port, baud rate, view and logging options
/// - Quick-send slots (`saved_commands.json`): JSON array of up to 20 strings
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    user_config_path: Utf8PathBuf,
    quick_send_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            user_config_path: config_dir.join(USER_CONFIG_FILE),
            quick_send_path: config_dir.join(QUICK_SEND_FILE),
            config_dir,
        })
    }

    /// Load the user configuration.
    ///
    /// Layers the YAML file (optional) under `QUICKSERIAL__*` environment
    /// variables. A missing file yields defaults.
    pub fn load_user_config(&self) -> Result<UserConfig> {
        if !self.user_config_path.exists() {
            tracing::warn!(
                "User config file not found at {}, using defaults",
                self.user_config_path
            );
        }

        let settings = config::Config::builder()
            .add_source(
                config::File::new(self.user_config_path.as_str(), config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read user config: {}", self.user_config_path))?;

        let config: UserConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse user config: {}", self.user_config_path))?;

        tracing::info!("Loaded user config from {}", self.user_config_path);
        Ok(config)
    }

    /// Load the user configuration, falling back to defaults when the file or
    /// an environment override cannot be parsed.
    ///
    /// The load error is handed back instead of logged because this runs
    /// before the log subscriber (configured by these settings) exists.
    pub fn load_user_config_or_default(&self) -> (UserConfig, Option<anyhow::Error>) {
        match self.load_user_config() {
            Ok(config) => (config, None),
            Err(e) => (UserConfig::default(), Some(e)),
        }
    }

    /// Save the user configuration file.
    pub fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize user config to YAML")?;

        fs::write(&self.user_config_path, yaml_string)
            .with_context(|| format!("Failed to write user config: {}", self.user_config_path))?;

        tracing::info!("Saved user config to {}", self.user_config_path);
        Ok(())
    }

    /// Read the quick-send file.
    ///
    /// Returns `Ok(None)` when the file does not exist. Entries past the
    /// twentieth are ignored.
    pub fn try_load_quick_sends(&self) -> Result<Option<QuickSendSlots>, PersistenceError> {
        if !self.quick_send_path.exists() {
            return Ok(None);
        }

        let contents =
            fs::read_to_string(&self.quick_send_path).map_err(|source| PersistenceError::Read {
                path: self.quick_send_path.clone(),
                source,
            })?;

        let entries: Vec<String> =
            serde_json::from_str(&contents).map_err(|source| PersistenceError::Malformed {
                path: self.quick_send_path.clone(),
                source,
            })?;

        if entries.len() > QUICK_SEND_SLOT_COUNT {
            tracing::warn!(
                "Quick-send file has {} entries, keeping the first {}",
                entries.len(),
                QUICK_SEND_SLOT_COUNT
            );
        }

        Ok(Some(QuickSendSlots::from_entries(entries)))
    }

    /// Load the quick-send slots, degrading to empty slots on any failure.
    pub fn load_quick_sends(&self) -> QuickSendSlots {
        match self.try_load_quick_sends() {
            Ok(Some(slots)) => {
                tracing::info!("Loaded quick-send slots from {}", self.quick_send_path);
                slots
            }
            Ok(None) => {
                tracing::info!(
                    "Quick-send file not found at {}, starting empty",
                    self.quick_send_path
                );
                QuickSendSlots::new()
            }
            Err(e) => {
                tracing::error!("{}", e);
                QuickSendSlots::new()
            }
        }
    }

    /// Write all slots, replacing the previous file.
    pub fn save_quick_sends(&self, slots: &QuickSendSlots) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(slots.as_slice())
            .map_err(PersistenceError::Serialize)?;

        fs::write(&self.quick_send_path, json).map_err(|source| PersistenceError::Write {
            path: self.quick_send_path.clone(),
            source,
        })?;

        tracing::info!("Saved quick-send slots to {}", self.quick_send_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn user_config_path(&self) -> &Utf8Path {
        &self.user_config_path
    }

    pub fn quick_send_path(&self) -> &Utf8Path {
        &self.quick_send_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BaudRate;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_create_config_manager_creates_dir() {
        let temp_dir = TempDir::new().unwrap();
        let nested = Utf8PathBuf::try_from(temp_dir.path().join("data")).unwrap();

        let manager = ConfigManager::new(&nested).unwrap();
        assert!(nested.exists());
        assert_eq!(manager.quick_send_path(), nested.join(QUICK_SEND_FILE));
    }

    #[test]
    fn test_load_save_user_config() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut config = UserConfig::default();
        config.serial.baud_rate = BaudRate::B4800;
        config.serial.last_port = "COM7".to_string();
        manager.save_user_config(&config).unwrap();

        let loaded = manager.load_user_config().unwrap();
        assert_eq!(loaded.serial.baud_rate, BaudRate::B4800);
        assert_eq!(loaded.serial.last_port, "COM7");
    }

    #[test]
    fn test_quick_sends_missing_file() {
        let (manager, _temp_dir) = create_test_config_manager();

        assert!(manager.try_load_quick_sends().unwrap().is_none());
        assert!(manager.load_quick_sends().is_empty());
    }

    #[test]
    fn test_quick_sends_written_pretty() {
        let (manager, _temp_dir) = create_test_config_manager();

        let slots = QuickSendSlots::from_entries(vec!["AT".to_string()]);
        manager.save_quick_sends(&slots).unwrap();

        let text = fs::read_to_string(manager.quick_send_path()).unwrap();
        assert!(text.starts_with("[\n  \"AT\",\n  \"\","));
        let parsed: Vec<String> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), QUICK_SEND_SLOT_COUNT);
    }

    #[test]
    fn test_quick_sends_malformed() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(manager.quick_send_path(), "{ not json").unwrap();

        assert!(matches!(
            manager.try_load_quick_sends(),
            Err(PersistenceError::Malformed { .. })
        ));
        assert!(manager.load_quick_sends().is_empty());
    }
}
