//! QuickSerial - A graphical terminal for serial ports
//!
//! Main entry point for the GUI application.
//!
//! # Overview
//!
//! This binary crate provides the Slint GUI frontend for QuickSerial. It initializes:
//! - Configuration loading ([`ConfigManager`])
//! - Logging infrastructure (file rotation + optional console output)
//! - Tokio async runtime (2 worker threads for file export)
//! - State management ([`StateManager`])
//! - GUI controller ([`GuiController`] - bridges Slint UI with the serial connector)
//!
//! The application uses a hybrid threading model:
//! - **Main thread**: Runs the Slint event loop and performs serial writes
//! - **Serial reader**: One std::thread per open link, polling for lines
//! - **State listener**: Background std::thread for reactive UI updates
//! - **Tokio workers**: Async file I/O started from UI callbacks
//!
//! # Execution Flow
//!
//! 1. Load `QuickSerial Data/QuickSerial Config.yaml` (with `QUICKSERIAL__*` overrides)
//! 2. Initialize logging → logs/quickserial.<date>
//! 3. Create tokio runtime with 2 worker threads
//! 4. Create StateManager, then load settings, quick-send slots and the port list
//! 5. Create GuiController and run the Slint event loop (blocks until window closed)
//! 6. Disconnect, save quick-send slots and settings
//! 7. Shutdown tokio runtime with 5s timeout

use anyhow::Result;
use quickserial::services::list_ports;
use quickserial::ui::GuiController;
use quickserial::{APP_NAME, ConfigManager, LinkMetrics, StateManager, VERSION};
use std::sync::Arc;
use std::time::Duration;

/// Directory holding the settings and quick-send files
const DATA_DIR: &str = "QuickSerial Data";

const WORKER_THREADS: usize = 2;

fn main() -> Result<()> {
    let config_manager = Arc::new(ConfigManager::new(DATA_DIR)?);
    let (user_config, config_error) = config_manager.load_user_config_or_default();

    // Held until exit so buffered log lines are flushed
    let _log_guard = quickserial::logging::setup_logging(&user_config.logging, "quickserial")?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    if let Some(e) = config_error {
        tracing::error!("Invalid user config, continuing with defaults: {:#}", e);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(WORKER_THREADS)
        .thread_name("quickserial-worker")
        .build()?;

    tracing::info!(
        "Tokio runtime initialized with {} worker threads",
        WORKER_THREADS
    );

    let state_manager = Arc::new(StateManager::new());
    state_manager.load_from_user_config(&user_config);
    state_manager.load_quick_sends(config_manager.load_quick_sends());

    let ports = list_ports();
    tracing::info!("Found {} serial ports", ports.len());
    state_manager.set_ports(ports);

    let metrics = Arc::new(LinkMetrics::new());

    let gui_controller = GuiController::new(
        Arc::clone(&state_manager),
        Arc::clone(&config_manager),
        user_config,
        metrics,
        runtime.handle().clone(),
    )?;

    tracing::info!("GUI controller initialized, launching window");

    // Blocks until the window is closed
    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");
    gui_controller.shutdown();

    runtime.shutdown_timeout(Duration::from_secs(5));

    tracing::info!("Application shutdown complete");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}
