// GUI Controller - Bridges the Slint UI with the serial connector and state
//
// This module contains the GuiController which coordinates between:
// - Slint UI (MainWindow)
// - StateManager (application state)
// - SerialConnector (the single open link and its reader)
// - EventLoopBridge (thread/GUI coordination)
//
// It handles:
// - Setting up UI callbacks → connector and state calls
// - Subscribing to state changes → UI updates
// - The save-log dialog and async export
// - Persisting quick-send slots and settings at shutdown

use crate::config::ConfigManager;
use crate::metrics::LinkMetrics;
use crate::models::{AppState, BaudRate, LogDirection, LogEntry, UserConfig};
use crate::services::{
    DEFAULT_LOG_FILE_NAME, ReaderEvent, SerialConnector, SerialError, export_log, list_ports,
};
use crate::state::{StateChange, StateManager};
use crate::ui::bridge::{EventLoopBridge, EventLoopBridgeHandle};
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use slint::{Model, ModelRc, SharedString, VecModel};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::broadcast::error::RecvError;

// Include the generated Slint code
slint::include_modules!();

type SharedConnector = Arc<Mutex<SerialConnector>>;

fn lock_connector(connector: &Mutex<SerialConnector>) -> MutexGuard<'_, SerialConnector> {
    connector.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Convert a Slint row index into a slot or list index
fn row_index(index: i32) -> Option<usize> {
    usize::try_from(index).ok()
}

/// Convert an optional list index into a Slint selector index (`-1` = none)
fn selector_index(index: Option<usize>) -> i32 {
    index
        .and_then(|i| i32::try_from(i).ok())
        .unwrap_or(-1)
}

fn status_text(state: &AppState) -> String {
    match &state.connection {
        Some(info) => format!("Connected: {}", info),
        None => "Disconnected".to_string(),
    }
}

fn baud_labels() -> Vec<SharedString> {
    BaudRate::ALL
        .iter()
        .map(|baud| SharedString::from(baud.to_string()))
        .collect()
}

fn string_model(items: impl IntoIterator<Item = impl Into<SharedString>>) -> ModelRc<SharedString> {
    let items: Vec<SharedString> = items.into_iter().map(Into::into).collect();
    ModelRc::new(VecModel::from(items))
}

/// Outcome of placing an indexed log row into the view model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowPlacement {
    Appended,
    /// Replayed after a resync; the row is already shown
    AlreadyPresent,
    /// Rows before `index` are missing
    Gap,
}

/// Append `line` only if it is the next row of `lines`
fn place_row(lines: &VecModel<LogLine>, index: usize, line: LogLine) -> RowPlacement {
    let count = lines.row_count();
    if index < count {
        RowPlacement::AlreadyPresent
    } else if index > count {
        RowPlacement::Gap
    } else {
        lines.push(line);
        RowPlacement::Appended
    }
}

/// Validate the path chosen in the save dialog; the error is shown to the user
fn export_path(chosen: PathBuf) -> Result<Utf8PathBuf, String> {
    Utf8PathBuf::try_from(chosen).map_err(|e| {
        format!(
            "The chosen path is not valid UTF-8: {}",
            e.as_path().display()
        )
    })
}

fn log_line(entry: &LogEntry) -> LogLine {
    LogLine {
        text: entry.to_string().into(),
        kind: match entry.direction {
            LogDirection::Received => LogKind::Received,
            LogDirection::Sent => LogKind::Sent,
            LogDirection::Error => LogKind::Error,
        },
    }
}

/// GUI Controller that wires up the Slint UI with application state and the serial link
///
/// This is the main coordinator for the GUI layer. It:
/// - Creates and manages the EventLoopBridge for thread/Slint coordination
/// - Owns the [`SerialConnector`] shared with UI callbacks
/// - Subscribes to StateManager events and updates UI accordingly
/// - Handles the save-log dialog using the `rfd` crate
///
/// # Example
/// ```ignore
/// let state_manager = Arc::new(StateManager::new());
/// let config_manager = Arc::new(ConfigManager::new("QuickSerial Data")?);
/// let user_config = config_manager.load_user_config()?;
/// let runtime = tokio::runtime::Runtime::new()?;
///
/// let controller = GuiController::new(
///     state_manager,
///     config_manager,
///     user_config,
///     Arc::new(LinkMetrics::new()),
///     runtime.handle().clone(),
/// )?;
/// controller.run()?;  // Blocks until window is closed
/// controller.shutdown();
/// ```
pub struct GuiController {
    /// The Slint UI window
    ui: MainWindow,

    /// Event loop bridge for coordinating between threads and Slint
    _bridge: EventLoopBridge<MainWindow>,

    /// Shared state manager
    state_manager: Arc<StateManager>,

    /// Configuration manager for the settings and quick-send files
    config_manager: Arc<ConfigManager>,

    /// Settings as loaded at startup; fields not tracked in state are saved back unchanged
    user_config: UserConfig,

    /// The single serial connection, shared with UI callbacks
    connector: SharedConnector,

    metrics: Arc<LinkMetrics>,
}

impl GuiController {
    /// Create a new GUI controller
    ///
    /// # Arguments
    /// * `state_manager` - Shared application state manager
    /// * `config_manager` - Configuration manager used at shutdown
    /// * `user_config` - Settings loaded at startup
    /// * `metrics` - Link counters shared with the connector and reader
    /// * `tokio_handle` - Handle to the tokio runtime for spawning async tasks
    pub fn new(
        state_manager: Arc<StateManager>,
        config_manager: Arc<ConfigManager>,
        user_config: UserConfig,
        metrics: Arc<LinkMetrics>,
        tokio_handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        // Create the Slint UI
        let ui = MainWindow::new().context("Failed to create Slint UI")?;

        // Create the event loop bridge
        let bridge = EventLoopBridge::new(&ui, tokio_handle);

        let connector = Arc::new(Mutex::new(SerialConnector::new(Arc::clone(&metrics))));

        // Initialize UI with current state
        Self::sync_ui_with_state(&ui, &state_manager.snapshot());

        Self::setup_callbacks(&ui, &bridge, &state_manager, &connector);

        // Subscribe to state changes and update UI
        Self::setup_state_subscription(&bridge, &state_manager);

        tracing::info!("GUI controller initialized");

        Ok(Self {
            ui,
            _bridge: bridge,
            state_manager,
            config_manager,
            user_config,
            connector,
            metrics,
        })
    }

    /// Run the GUI (blocks until window is closed)
    pub fn run(&self) -> Result<(), slint::PlatformError> {
        tracing::info!("Starting GUI event loop");
        self.ui.run()
    }

    /// Close the link and persist quick-send slots and settings
    ///
    /// Persistence failures are logged; shutdown always completes.
    pub fn shutdown(&self) {
        if lock_connector(&self.connector).disconnect() {
            self.state_manager.set_disconnected();
        }

        let (quick_sends, user_config) = self.state_manager.read(|s| {
            (s.quick_sends.clone(), s.to_user_config(&self.user_config))
        });

        if let Err(e) = self.config_manager.save_quick_sends(&quick_sends) {
            tracing::error!("Failed to save quick-send slots: {}", e);
        }

        if let Err(e) = self.config_manager.save_user_config(&user_config) {
            tracing::error!("Failed to save user config: {:#}", e);
        }

        self.metrics.log_summary();
    }

    /// Push the whole state into the UI
    ///
    /// Called at startup and whenever the subscription falls behind.
    fn sync_ui_with_state(ui: &MainWindow, state: &AppState) {
        ui.set_port_labels(string_model(state.port_labels()));
        ui.set_selected_port_index(selector_index(state.selected_port_index()));
        ui.set_baud_labels(string_model(baud_labels()));
        ui.set_selected_baud_index(selector_index(Some(state.baud_rate.selector_index())));
        ui.set_is_connected(state.is_connected());
        ui.set_status_text(status_text(state).into());
        ui.set_auto_scroll(state.auto_scroll);

        ui.set_quick_send_texts(string_model(state.quick_sends.iter().map(str::to_string)));

        let lines: Vec<LogLine> = state.log.entries().iter().map(log_line).collect();
        ui.set_log_lines(ModelRc::new(VecModel::from(lines)));
        if state.auto_scroll {
            ui.invoke_scroll_log_to_end();
        }

        tracing::debug!("UI synchronized with state");
    }

    /// Set up Slint UI callbacks
    ///
    /// This connects Slint UI events (button clicks, edits) to the connector and state.
    fn setup_callbacks(
        ui: &MainWindow,
        bridge: &EventLoopBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
        connector: &SharedConnector,
    ) {
        let state = Arc::clone(state_manager);

        // Refresh port list
        ui.on_refresh_ports(move || {
            tracing::debug!("Refresh ports clicked");
            let ports = list_ports();
            tracing::info!("Found {} serial ports", ports.len());
            state.set_ports(ports);
        });

        let state = Arc::clone(state_manager);

        ui.on_port_selected(move |index| {
            let device = state.read(|s| {
                row_index(index)
                    .and_then(|i| s.ports.get(i))
                    .map(|p| p.device.clone())
            });
            tracing::debug!("Port selected: {:?}", device);
            state.select_port(device);
        });

        let state = Arc::clone(state_manager);

        ui.on_baud_selected(move |index| {
            match row_index(index).and_then(BaudRate::from_selector_index) {
                Some(baud_rate) => {
                    tracing::debug!("Baud rate selected: {}", baud_rate);
                    state.select_baud(baud_rate);
                }
                None => tracing::warn!("Ignoring unknown baud selector index {}", index),
            }
        });

        let state = Arc::clone(state_manager);
        let connector_clone = Arc::clone(connector);
        let bridge_handle = bridge.clone_handle();
        let ui_weak = ui.as_weak();

        // Connect / Disconnect toggle
        ui.on_toggle_connection(move || {
            let mut connector = lock_connector(&connector_clone);

            if connector.is_connected() {
                tracing::info!("Disconnect clicked");
                connector.disconnect();
                state.set_disconnected();
                return;
            }

            let (device, baud_rate) = state.read(|s| (s.selected_port.clone(), s.baud_rate));
            let Some(device) = device else {
                Self::show_error_dialog(
                    &ui_weak,
                    "No Port Selected",
                    "Select a serial port before connecting.",
                );
                return;
            };

            tracing::info!("Connect clicked: {} @ {}", device, baud_rate);

            let reader_state = Arc::clone(&state);
            let reader_bridge = bridge_handle.clone();
            let result = connector.connect(&device, baud_rate, move |event| {
                Self::handle_reader_event(&reader_state, &reader_bridge, event);
            });

            match result {
                Ok(info) => {
                    state.set_connected(info);
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    state.set_disconnected();
                    state.append_log(LogEntry::error(e.to_string()));
                }
            }
        });

        let state = Arc::clone(state_manager);
        let connector_clone = Arc::clone(connector);

        // Raised on the event loop by the reader thread's LinkLost event
        ui.on_link_lost(move |reason| {
            if !lock_connector(&connector_clone).close_if_reader_stopped() {
                tracing::debug!("Ignoring stale link-lost notification: {}", reason);
                return;
            }

            state.set_disconnected();
            state.append_log(LogEntry::error(format!("Connection lost: {}", reason)));
        });

        let state = Arc::clone(state_manager);
        let connector_clone = Arc::clone(connector);
        let ui_weak = ui.as_weak();

        // Send N
        ui.on_send_quick(move |index| {
            let Some((text, line_ending)) = state.read(|s| {
                row_index(index)
                    .and_then(|i| s.quick_sends.get(i))
                    .map(|text| (text.to_string(), s.line_ending))
            }) else {
                tracing::warn!("Ignoring send for unknown slot {}", index);
                return;
            };

            let payload = if text.is_empty() {
                String::new()
            } else {
                line_ending.apply(&text)
            };

            let result = lock_connector(&connector_clone).send(&payload);
            match result {
                Ok(0) => {}
                Ok(_) => {
                    state.append_log(LogEntry::sent(text));
                }
                Err(SerialError::NotConnected) => {
                    tracing::warn!("Send requested while disconnected");
                    Self::show_message_dialog(
                        &ui_weak,
                        "Not Connected",
                        "Connect to a serial port before sending.",
                    );
                }
                Err(e) => {
                    tracing::error!("Send failed: {}", e);
                    state.append_log(LogEntry::error(e.to_string()));
                }
            }
        });

        let state = Arc::clone(state_manager);

        ui.on_quick_send_edited(move |index, text| {
            if let Some(i) = row_index(index) {
                state.set_quick_send(i, text.to_string());
            }
        });

        let state = Arc::clone(state_manager);

        ui.on_auto_scroll_toggled(move |enabled| {
            tracing::debug!("Auto scroll toggled: {}", enabled);
            state.set_auto_scroll(enabled);
        });

        let state = Arc::clone(state_manager);

        ui.on_clear_log(move || {
            tracing::info!("Clear log clicked");
            state.clear_log();
        });

        let state = Arc::clone(state_manager);
        let bridge_handle = bridge.clone_handle();
        let ui_weak = ui.as_weak();

        // Save log → native save dialog → async write
        ui.on_save_log(move || {
            tracing::debug!("Save log clicked");

            let Some(chosen) = Self::show_save_dialog() else {
                tracing::debug!("Save log cancelled");
                return;
            };

            let path = match export_path(chosen) {
                Ok(path) => path,
                Err(message) => {
                    tracing::error!("{}", message);
                    Self::show_error_dialog(&ui_weak, "Save Failed", message);
                    return;
                }
            };

            let contents = state.read(|s| s.log.to_plain_text());
            let bridge = bridge_handle.clone();

            bridge_handle.spawn_async(move || async move {
                let result = export_log(&path, &contents).await;
                bridge.update_ui(move |ui| {
                    let ui_weak = ui.as_weak();
                    match result {
                        Ok(()) => Self::show_message_dialog(
                            &ui_weak,
                            "Log Saved",
                            format!("Log saved to {}", path),
                        ),
                        Err(e) => {
                            tracing::error!("{}", e);
                            Self::show_error_dialog(&ui_weak, "Save Failed", e.to_string());
                        }
                    }
                });
            });
        });

        let ui_weak = ui.as_weak();

        // Error dialog dismissed
        ui.on_error_dialog_dismissed(move || {
            tracing::debug!("Error dialog dismissed");
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_show_error_dialog(false);
            }
        });

        let ui_weak = ui.as_weak();

        // Message dialog dismissed
        ui.on_message_dialog_dismissed(move || {
            tracing::debug!("Message dialog dismissed");
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_show_message_dialog(false);
            }
        });

        tracing::debug!("UI callbacks configured");
    }

    /// Runs on the reader thread
    fn handle_reader_event(
        state: &StateManager,
        bridge: &EventLoopBridgeHandle<MainWindow>,
        event: ReaderEvent,
    ) {
        match event {
            ReaderEvent::Line(line) => {
                state.append_log(LogEntry::received(line));
            }
            ReaderEvent::LinkLost(reason) => {
                bridge.update_ui(move |ui| ui.invoke_link_lost(reason.into()));
            }
        }
    }

    /// Subscribe to state changes and update UI accordingly
    ///
    /// This spawns a background thread that listens for state change events
    /// and updates the Slint UI via the EventLoopBridge. The thread holds the
    /// StateManager weakly, so it exits once the last owner drops it and the
    /// broadcast channel closes.
    fn setup_state_subscription(
        bridge: &EventLoopBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
    ) {
        let bridge_handle = bridge.clone_handle();
        let state = Arc::downgrade(state_manager);
        let mut rx = state_manager.subscribe();

        let spawned = std::thread::Builder::new()
            .name("state-subscription".to_string())
            .spawn(move || {
                tracing::debug!("State subscription thread started");

                loop {
                    match rx.blocking_recv() {
                        Ok(change) => {
                            tracing::trace!("State change received: {:?}", change);
                            let Some(state) = state.upgrade() else {
                                break;
                            };
                            Self::apply_change(&bridge_handle, &state, change);
                        }
                        Err(RecvError::Closed) => {
                            tracing::info!(
                                "State broadcast channel closed - shutting down subscription thread"
                            );
                            break;
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(
                                "State subscription lagged - {} events were skipped, resyncing UI",
                                skipped
                            );
                            let Some(state) = state.upgrade() else {
                                break;
                            };
                            Self::resync(&bridge_handle, &state);
                        }
                    }
                }

                tracing::debug!("State subscription thread terminated");
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to start state subscription thread: {}", e);
        }
    }

    fn resync(bridge: &EventLoopBridgeHandle<MainWindow>, state: &StateManager) {
        let snapshot = state.snapshot();
        bridge.update_ui(move |ui| Self::sync_ui_with_state(ui, &snapshot));
    }

    fn apply_change(
        bridge: &EventLoopBridgeHandle<MainWindow>,
        state: &Arc<StateManager>,
        change: StateChange,
    ) {
        match change {
            StateChange::PortsRefreshed { count } => {
                tracing::debug!("Port list refreshed: {} ports", count);
                let (labels, selected) =
                    state.read(|s| (s.port_labels(), s.selected_port_index()));
                bridge.update_ui(move |ui| {
                    ui.set_port_labels(string_model(labels));
                    ui.set_selected_port_index(selector_index(selected));
                });
            }

            StateChange::ConnectionChanged { connection } => {
                let connected = connection.is_some();
                let status = state.read(status_text);
                bridge.update_ui(move |ui| {
                    ui.set_is_connected(connected);
                    ui.set_status_text(status.into());
                });
            }

            StateChange::LogAppended { index, entry } => {
                let line = log_line(&entry);
                let state = Arc::clone(state);
                let bridge_clone = bridge.clone();
                bridge.update_ui(move |ui| {
                    if !Self::append_log_line(ui, index, line) {
                        Self::resync(&bridge_clone, &state);
                    }
                });
            }

            StateChange::LogCleared => {
                bridge.update_ui(|ui| {
                    ui.set_log_lines(ModelRc::new(VecModel::<LogLine>::default()));
                });
            }

            StateChange::QuickSendEdited { index } => {
                // The edited field already shows the new text
                tracing::trace!("Quick-send slot {} edited", index);
            }

            StateChange::SettingsChanged => {
                let (selected_port, baud_index, auto_scroll) = state.read(|s| {
                    (
                        s.selected_port_index(),
                        s.baud_rate.selector_index(),
                        s.auto_scroll,
                    )
                });
                bridge.update_ui(move |ui| {
                    ui.set_selected_port_index(selector_index(selected_port));
                    ui.set_selected_baud_index(selector_index(Some(baud_index)));
                    ui.set_auto_scroll(auto_scroll);
                });
            }
        }
    }

    /// Place `line` at row `index` of the log view and scroll if enabled.
    ///
    /// Returns `false` when the view needs a full resync.
    fn append_log_line(ui: &MainWindow, index: usize, line: LogLine) -> bool {
        let model = ui.get_log_lines();
        let Some(lines) = model.as_any().downcast_ref::<VecModel<LogLine>>() else {
            return false;
        };

        match place_row(lines, index, line) {
            RowPlacement::Appended => {
                if ui.get_auto_scroll() {
                    ui.invoke_scroll_log_to_end();
                }
                true
            }
            RowPlacement::AlreadyPresent => true,
            RowPlacement::Gap => false,
        }
    }

    /// Show an error dialog
    fn show_error_dialog(
        ui_weak: &slint::Weak<MainWindow>,
        title: impl Into<SharedString>,
        message: impl Into<SharedString>,
    ) {
        if let Some(ui) = ui_weak.upgrade() {
            ui.set_error_title(title.into());
            ui.set_error_message(message.into());
            ui.set_show_error_dialog(true);
        }
    }

    /// Show an informational message dialog
    fn show_message_dialog(
        ui_weak: &slint::Weak<MainWindow>,
        title: impl Into<SharedString>,
        message: impl Into<SharedString>,
    ) {
        if let Some(ui) = ui_weak.upgrade() {
            ui.set_message_title(title.into());
            ui.set_message_text(message.into());
            ui.set_show_message_dialog(true);
        }
    }

    /// Show a native save dialog for the log export
    ///
    /// # Returns
    /// The chosen file path, or None if cancelled
    fn show_save_dialog() -> Option<PathBuf> {
        use rfd::FileDialog;

        FileDialog::new()
            .set_title("Save Log")
            .set_file_name(DEFAULT_LOG_FILE_NAME)
            .add_filter("Text Files", &["txt"])
            .add_filter("All Files", &["*"])
            .save_file()
    }
}
