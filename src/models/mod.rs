//! Data models for the QuickSerial application.
//!
//! This module contains all the core data structures used throughout the application:
//! - [`AppState`]: The central state container (ports, connection, quick-send slots, log)
//! - [`UserConfig`]: User preferences loaded from `QuickSerial Config.yaml`
//! - [`QuickSendSlots`]: The 20 persisted quick-send strings
//! - [`SessionLog`]: The in-memory log shown in the window
//! - [`BaudRate`], [`LineEnding`], [`LinkInfo`], [`PortEntry`]: Serial link values
//!
//! # Architecture Note
//!
//! The models are plain data with no I/O. Loading and saving lives in
//! [`crate::config`], link handling in [`crate::services`].

pub mod app_state;
pub mod config;
pub mod log;
pub mod quick_send;
pub mod serial;

pub use app_state::AppState;
pub use config::{InterfaceSettings, LoggingSettings, SerialSettings, UserConfig};
pub use log::{LogDirection, LogEntry, SessionLog};
pub use quick_send::{QUICK_SEND_SLOT_COUNT, QuickSendSlots};
pub use serial::{BaudRate, LineEnding, LinkInfo, PortEntry, UnsupportedBaudRate};
