use crate::models::{
    BaudRate, LineEnding, LinkInfo, PortEntry, QuickSendSlots, SessionLog, UserConfig,
};

/// Single source of truth for all application state.
///
/// Holds the port list, selector values, connection status, quick-send slots
/// and the session log.
///
/// # Thread Safety
///
/// `AppState` is wrapped in `Arc<RwLock<AppState>>` by [`crate::state::StateManager`]
/// to provide thread-safe access from both the UI thread and the serial
/// reader thread. Never access `AppState` directly - always use
/// [`StateManager`](crate::state::StateManager) methods:
/// - [`read()`](crate::state::StateManager::read) for read-only access
/// - [`update()`](crate::state::StateManager::update) for mutations with automatic change events
#[derive(Clone, Debug)]
pub struct AppState {
    // Port selection
    pub ports: Vec<PortEntry>,
    pub selected_port: Option<String>,
    pub baud_rate: BaudRate,
    pub line_ending: LineEnding,

    // Open link, if any
    pub connection: Option<LinkInfo>,

    // Quick-send rows
    pub quick_sends: QuickSendSlots,

    // Log view
    pub log: SessionLog,
    pub auto_scroll: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            ports: Vec::new(),
            selected_port: None,
            baud_rate: BaudRate::default(),
            line_ending: LineEnding::default(),
            connection: None,
            quick_sends: QuickSendSlots::new(),
            log: SessionLog::new(),
            auto_scroll: true,
        }
    }
}

impl AppState {
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Index of the selected device in `ports`
    pub fn selected_port_index(&self) -> Option<usize> {
        let selected = self.selected_port.as_deref()?;
        self.ports.iter().position(|p| p.device == selected)
    }

    /// Labels for the port selector, in `ports` order
    pub fn port_labels(&self) -> Vec<String> {
        self.ports.iter().map(ToString::to_string).collect()
    }

    /// Copy the persisted fields back into a user configuration
    pub fn to_user_config(&self, base: &UserConfig) -> UserConfig {
        let mut config = base.clone();
        config.serial.last_port = self.selected_port.clone().unwrap_or_default();
        config.serial.baud_rate = self.baud_rate;
        config.serial.line_ending = self.line_ending;
        config.interface.auto_scroll = self.auto_scroll;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(device: &str) -> PortEntry {
        PortEntry {
            device: device.to_string(),
            description: "n/a".to_string(),
        }
    }

    #[test]
    fn test_default_state() {
        let state = AppState::default();
        assert!(!state.is_connected());
        assert!(state.ports.is_empty());
        assert!(state.quick_sends.is_empty());
        assert!(state.log.is_empty());
        assert_eq!(state.baud_rate, BaudRate::B115200);
        assert!(state.auto_scroll);
    }

    #[test]
    fn test_selected_port_index() {
        let mut state = AppState {
            ports: vec![port("/dev/ttyACM0"), port("/dev/ttyUSB0")],
            ..AppState::default()
        };
        assert_eq!(state.selected_port_index(), None);

        state.selected_port = Some("/dev/ttyUSB0".to_string());
        assert_eq!(state.selected_port_index(), Some(1));

        state.selected_port = Some("/dev/ttyS9".to_string());
        assert_eq!(state.selected_port_index(), None);
    }

    #[test]
    fn test_port_labels() {
        let state = AppState {
            ports: vec![port("COM1")],
            ..AppState::default()
        };
        assert_eq!(state.port_labels(), vec!["COM1 - n/a".to_string()]);
    }

    #[test]
    fn test_to_user_config_keeps_logging_settings() {
        let mut base = UserConfig::default();
        base.logging.debug_mode = true;

        let state = AppState {
            selected_port: Some("COM4".to_string()),
            baud_rate: BaudRate::B38400,
            auto_scroll: false,
            ..AppState::default()
        };

        let config = state.to_user_config(&base);
        assert_eq!(config.serial.last_port, "COM4");
        assert_eq!(config.serial.baud_rate, BaudRate::B38400);
        assert!(!config.interface.auto_scroll);
        assert!(config.logging.debug_mode);
    }
}
