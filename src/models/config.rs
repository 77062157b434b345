use crate::models::{BaudRate, LineEnding};
use serde::{Deserialize, Serialize};

/// User configuration from QuickSerial Config.yaml
///
/// Every section falls back to its defaults when missing, so a partial or
/// empty file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub serial: SerialSettings,

    #[serde(default)]
    pub interface: InterfaceSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerialSettings {
    /// Device selected when the application last closed
    #[serde(default)]
    pub last_port: String,

    #[serde(default)]
    pub baud_rate: BaudRate,

    #[serde(default)]
    pub line_ending: LineEnding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceSettings {
    #[serde(default = "default_auto_scroll")]
    pub auto_scroll: bool,
}

impl Default for InterfaceSettings {
    fn default() -> Self {
        Self {
            auto_scroll: default_auto_scroll(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub debug_mode: bool,

    #[serde(default = "default_console_output")]
    pub console_output: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            debug_mode: false,
            console_output: default_console_output(),
            log_dir: default_log_dir(),
        }
    }
}

fn default_auto_scroll() -> bool {
    true
}

fn default_console_output() -> bool {
    true
}

fn default_log_dir() -> String {
    "logs".to_string()
}
