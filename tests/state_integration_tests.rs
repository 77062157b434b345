//! Integration tests for StateManager with state change events
//!
//! These tests verify that the StateManager correctly:
//! - Emits state change events on mutations
//! - Supports multiple subscribers
//! - Handles concurrent appends from the reader and UI threads
//! - Replays the log in order after a clear

mod common;

use common::MemoryOpener;
use quickserial::models::{LinkInfo, LogEntry, PortEntry};
use quickserial::services::ReaderEvent;
use quickserial::{BaudRate, LinkMetrics, SerialConnector, StateChange, StateManager};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

async fn next_event(rx: &mut broadcast::Receiver<StateChange>) -> StateChange {
    timeout(Duration::from_millis(500), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed")
}

fn link(device: &str, baud_rate: BaudRate) -> LinkInfo {
    LinkInfo {
        device: device.to_string(),
        baud_rate,
    }
}

#[tokio::test]
async fn test_connection_change_events_emitted() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    state.set_connected(link("COM3", BaudRate::B9600));
    state.set_disconnected();

    assert_eq!(
        next_event(&mut rx).await,
        StateChange::ConnectionChanged {
            connection: Some(link("COM3", BaudRate::B9600))
        }
    );
    assert_eq!(
        next_event(&mut rx).await,
        StateChange::ConnectionChanged { connection: None }
    );
}

#[tokio::test]
async fn test_multiple_subscribers_receive_events() {
    let state = Arc::new(StateManager::new());
    let mut rx1 = state.subscribe();
    let mut rx2 = state.subscribe();

    state.append_log(LogEntry::sent("AT"));

    let expected = StateChange::LogAppended {
        index: 0,
        entry: LogEntry::sent("AT"),
    };
    assert_eq!(next_event(&mut rx1).await, expected);
    assert_eq!(next_event(&mut rx2).await, expected);
}

#[tokio::test]
async fn test_log_cleared_then_appends_restart_at_zero() {
    let state = Arc::new(StateManager::new());
    state.append_log(LogEntry::received("one"));
    state.append_log(LogEntry::received("two"));

    let mut rx = state.subscribe();
    state.clear_log();
    state.append_log(LogEntry::received("three"));

    assert_eq!(next_event(&mut rx).await, StateChange::LogCleared);
    assert_eq!(
        next_event(&mut rx).await,
        StateChange::LogAppended {
            index: 0,
            entry: LogEntry::received("three")
        }
    );
    assert_eq!(state.read(|s| s.log.to_plain_text()), ">> three");
}

#[tokio::test]
async fn test_quick_send_edit_events() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    state.set_quick_send(0, "AT".to_string());
    state.set_quick_send(19, "AT+RST".to_string());

    assert_eq!(
        next_event(&mut rx).await,
        StateChange::QuickSendEdited { index: 0 }
    );
    assert_eq!(
        next_event(&mut rx).await,
        StateChange::QuickSendEdited { index: 19 }
    );
    assert_eq!(state.read(|s| s.quick_sends.get(19).map(str::to_string)), Some("AT+RST".to_string()));
}

#[tokio::test]
async fn test_port_refresh_events() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    state.set_ports(vec![
        PortEntry {
            device: "/dev/ttyACM0".to_string(),
            description: "Arduino Uno".to_string(),
        },
        PortEntry {
            device: "/dev/ttyUSB0".to_string(),
            description: "CP2102 USB to UART".to_string(),
        },
    ]);

    assert_eq!(
        next_event(&mut rx).await,
        StateChange::PortsRefreshed { count: 2 }
    );
    // First port is selected when nothing was selected before
    assert_eq!(next_event(&mut rx).await, StateChange::SettingsChanged);
    assert_eq!(
        state.read(|s| s.port_labels()),
        vec![
            "/dev/ttyACM0 - Arduino Uno".to_string(),
            "/dev/ttyUSB0 - CP2102 USB to UART".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_concurrent_appends_keep_every_line() {
    let state = Arc::new(StateManager::new());
    let mut handles = vec![];

    for worker in 0..4 {
        let state_clone = Arc::clone(&state);
        handles.push(tokio::spawn(async move {
            for i in 0..50 {
                state_clone.append_log(LogEntry::received(format!("{}-{}", worker, i)));
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(state.read(|s| s.log.len()), 200);
}

#[tokio::test]
async fn test_appended_indices_are_sequential() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    for i in 0..10 {
        state.append_log(LogEntry::received(i.to_string()));
    }

    for expected in 0..10 {
        match next_event(&mut rx).await {
            StateChange::LogAppended { index, .. } => assert_eq!(index, expected),
            other => panic!("Expected LogAppended, got: {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_reader_lines_flow_into_log() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    let opener = MemoryOpener::default();
    opener.link.feed(b"READY\r\n");
    opener.link.feed(b"temp=21.5\n");

    let mut connector = SerialConnector::with_opener(opener, Arc::new(LinkMetrics::new()));
    let reader_state = Arc::clone(&state);
    let info = connector
        .connect("COM1", BaudRate::B115200, move |event| {
            if let ReaderEvent::Line(line) = event {
                reader_state.append_log(LogEntry::received(line));
            }
        })
        .unwrap();
    state.set_connected(info);

    let mut received = Vec::new();
    while received.len() < 2 {
        if let StateChange::LogAppended { entry, .. } = next_event(&mut rx).await {
            received.push(entry);
        }
    }
    connector.disconnect();
    state.set_disconnected();

    assert_eq!(
        received,
        vec![LogEntry::received("READY"), LogEntry::received("temp=21.5")]
    );
    assert!(!state.read(|s| s.is_connected()));
}
