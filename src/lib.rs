// QuickSerial - A graphical terminal for serial ports
//
// This is the library crate containing the serial link services, state and
// persistence. The binary crate (main.rs) provides the GUI entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::{ConfigManager, PersistenceError};
pub use metrics::LinkMetrics;
pub use models::{AppState, BaudRate, LogEntry, QuickSendSlots, UserConfig};
pub use services::{SerialConnector, SerialError};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
