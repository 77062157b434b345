// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for GUI updates.

use crate::models::{
    AppState, BaudRate, LineEnding, LinkInfo, LogEntry, PortEntry, QuickSendSlots, UserConfig,
};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

/// Buffered events per subscriber before it starts lagging
pub const STATE_CHANNEL_CAPACITY: usize = 1024;

/// Change events emitted when state is modified
///
/// These events are emitted to notify interested parties (primarily the GUI)
/// about state changes without requiring them to poll the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The port list was replaced
    PortsRefreshed { count: usize },

    /// A link was opened (`Some`) or closed (`None`)
    ConnectionChanged { connection: Option<LinkInfo> },

    /// One line was added to the session log at position `index`
    LogAppended { index: usize, entry: LogEntry },

    /// The session log was emptied
    LogCleared,

    /// A quick-send slot's text changed
    QuickSendEdited { index: usize },

    /// Port, baud, line ending or auto-scroll selection changed
    SettingsChanged,
}

/// The fields compared by `detect_changes`; avoids cloning the whole log
#[derive(Clone, Debug, PartialEq)]
struct Fingerprint {
    ports: Vec<PortEntry>,
    connection: Option<LinkInfo>,
    log_len: usize,
    log_generation: u64,
    selected_port: Option<String>,
    baud_rate: BaudRate,
    line_ending: LineEnding,
    auto_scroll: bool,
}

impl Fingerprint {
    fn of(state: &AppState) -> Self {
        Self {
            ports: state.ports.clone(),
            connection: state.connection.clone(),
            log_len: state.log.len(),
            log_generation: state.log.generation(),
            selected_port: state.selected_port.clone(),
            baud_rate: state.baud_rate,
            line_ending: state.line_ending,
            auto_scroll: state.auto_scroll,
        }
    }
}

/// Thread-safe state manager with event emission
///
/// This is the application context shared by the UI thread and the serial
/// reader thread. It:
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// # Usage
///
/// Always use `StateManager` instead of accessing [`AppState`] directly:
/// - [`read()`](Self::read) for reading state
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
///
/// # Related Types
///
/// - [`crate::models::AppState`]: The underlying state structure
/// - [`StateChange`]: Event types emitted on state mutations
/// - [`crate::ui::controller::GuiController`]: Primary consumer of state events
pub struct StateManager {
    /// The application state protected by RwLock for thread-safe access
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(STATE_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, AppState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a clone of the current state
    ///
    /// This clones the entire state including the log. For checking
    /// individual fields, prefer `read()` with a closure.
    pub fn snapshot(&self) -> AppState {
        self.read_guard().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let connected = state_manager.read(|state| state.is_connected());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.read_guard();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// Events are sent while the write lock is held, so subscribers see them
    /// in the same order the updates were applied.
    ///
    /// # Returns
    /// A vector of StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.write_guard();
        let before = Fingerprint::of(&state);

        update_fn(&mut state);

        let changes = Self::detect_changes(&before, &state);
        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(old: &Fingerprint, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.ports != new.ports {
            changes.push(StateChange::PortsRefreshed {
                count: new.ports.len(),
            });
        }

        if old.connection != new.connection {
            changes.push(StateChange::ConnectionChanged {
                connection: new.connection.clone(),
            });
        }

        let entries = new.log.entries();
        let first_new = if old.log_generation != new.log.generation() {
            changes.push(StateChange::LogCleared);
            0
        } else {
            old.log_len.min(entries.len())
        };
        changes.extend(
            entries
                .iter()
                .enumerate()
                .skip(first_new)
                .map(|(index, entry)| StateChange::LogAppended {
                    index,
                    entry: entry.clone(),
                }),
        );

        if old.selected_port != new.selected_port
            || old.baud_rate != new.baud_rate
            || old.line_ending != new.line_ending
            || old.auto_scroll != new.auto_scroll
        {
            changes.push(StateChange::SettingsChanged);
        }

        changes
    }

    // Convenience methods for common state updates

    /// Replace the port list, keeping the selection if the device is still present
    pub fn set_ports(&self, ports: Vec<PortEntry>) -> Vec<StateChange> {
        self.update(|state| {
            let keep = state
                .selected_port
                .as_ref()
                .is_some_and(|sel| ports.iter().any(|p| &p.device == sel));
            if !keep {
                state.selected_port = ports.first().map(|p| p.device.clone());
            }
            state.ports = ports;
        })
    }

    pub fn select_port(&self, device: Option<String>) -> Vec<StateChange> {
        self.update(|state| state.selected_port = device)
    }

    pub fn select_baud(&self, baud_rate: BaudRate) -> Vec<StateChange> {
        self.update(|state| state.baud_rate = baud_rate)
    }

    pub fn set_auto_scroll(&self, enabled: bool) -> Vec<StateChange> {
        self.update(|state| state.auto_scroll = enabled)
    }

    pub fn set_connected(&self, info: LinkInfo) -> Vec<StateChange> {
        self.update(|state| state.connection = Some(info))
    }

    pub fn set_disconnected(&self) -> Vec<StateChange> {
        self.update(|state| state.connection = None)
    }

    pub fn append_log(&self, entry: LogEntry) -> Vec<StateChange> {
        self.update(|state| state.log.push(entry))
    }

    pub fn clear_log(&self) -> Vec<StateChange> {
        self.update(|state| state.log.clear())
    }

    /// Replace one quick-send slot
    pub fn set_quick_send(&self, index: usize, text: String) -> Vec<StateChange> {
        let mut edited = false;
        let mut changes = self.update(|state| {
            edited = state.quick_sends.set(index, text);
        });

        if edited {
            let event = StateChange::QuickSendEdited { index };
            let _ = self.state_tx.send(event.clone());
            changes.push(event);
        }

        changes
    }

    /// Install slots read from storage
    pub fn load_quick_sends(&self, slots: QuickSendSlots) -> Vec<StateChange> {
        self.update(|state| state.quick_sends = slots)
    }

    /// Populate selector values from the user configuration
    pub fn load_from_user_config(&self, user_config: &UserConfig) -> Vec<StateChange> {
        self.update(|state| {
            let serial = &user_config.serial;
            if !serial.last_port.is_empty() {
                state.selected_port = Some(serial.last_port.clone());
            }
            state.baud_rate = serial.baud_rate;
            state.line_ending = serial.line_ending;
            state.auto_scroll = user_config.interface.auto_scroll;

            tracing::info!(
                "Loaded user config: last_port={:?}, baud={}, line_ending={:?}, auto_scroll={}",
                state.selected_port,
                state.baud_rate,
                state.line_ending,
                state.auto_scroll
            );
        })
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across threads
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
