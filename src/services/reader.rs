//! Background reader thread.
//!
//! Polls an open [`Link`] for incoming bytes, decodes each line and hands it
//! to a callback. The callback runs on the reader thread; the GUI passes one
//! that records into the [`StateManager`](crate::state::StateManager), whose
//! subscription marshals the update onto the Slint event loop.

use crate::metrics::LinkMetrics;
use crate::services::error::SerialError;
use crate::services::link::Link;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Sleep between polls while no bytes are waiting
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Notifications emitted by the reader thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    /// One decoded line, terminators stripped
    Line(String),

    /// The transport failed; the reader has stopped polling
    LinkLost(String),
}

/// Decode a raw line as UTF-8 and strip trailing `\r` / `\n`
pub fn decode_line(raw: &[u8]) -> Result<String, SerialError> {
    let text = std::str::from_utf8(raw)?;
    Ok(text.trim_end_matches(['\r', '\n']).to_string())
}

fn is_transient(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Handle to a running reader thread.
///
/// Stopping (explicitly or on drop) clears the running flag and joins the
/// thread, so no event is emitted once [`stop`](Self::stop) has returned.
pub struct SerialReader {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SerialReader {
    /// Start polling `link` on a new thread
    pub fn spawn<F>(link: Box<dyn Link>, metrics: Arc<LinkMetrics>, on_event: F) -> io::Result<Self>
    where
        F: FnMut(ReaderEvent) + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let running_in_thread = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("serial-reader".to_string())
            .spawn(move || {
                run_read_loop(link, &running_in_thread, &metrics, on_event);
            })?;

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Whether the poll loop is still active
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Request the loop to exit and wait for the thread
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Serial reader thread panicked");
            }
        }
    }
}

impl Drop for SerialReader {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_read_loop<F>(mut link: Box<dyn Link>, running: &AtomicBool, metrics: &LinkMetrics, mut on_event: F)
where
    F: FnMut(ReaderEvent),
{
    tracing::debug!("Serial reader thread started");

    while running.load(Ordering::Acquire) {
        let available = match link.bytes_available() {
            Ok(count) => count,
            Err(e) if is_transient(&e) => 0,
            Err(e) => {
                report_link_lost(e, running, metrics, &mut on_event);
                break;
            }
        };

        if available == 0 {
            thread::sleep(POLL_INTERVAL);
            continue;
        }

        let raw = match link.read_line() {
            Ok(raw) => raw,
            Err(e) if is_transient(&e) => continue,
            Err(e) => {
                report_link_lost(e, running, metrics, &mut on_event);
                break;
            }
        };

        if raw.is_empty() {
            continue;
        }

        match decode_line(&raw) {
            Ok(line) => {
                metrics.record_line_received();
                on_event(ReaderEvent::Line(line));
            }
            Err(e) => {
                metrics.record_line_discarded();
                tracing::debug!("Discarding {} undecodable bytes: {}", raw.len(), e);
            }
        }
    }

    running.store(false, Ordering::Release);
    tracing::debug!("Serial reader thread terminated");
}

/// Clears `running` before notifying so the receiver sees a stopped reader
fn report_link_lost<F>(error: io::Error, running: &AtomicBool, metrics: &LinkMetrics, on_event: &mut F)
where
    F: FnMut(ReaderEvent),
{
    running.store(false, Ordering::Release);
    metrics.record_link_failure();
    tracing::warn!("Serial link lost: {}", error);
    on_event(ReaderEvent::LinkLost(error.to_string()));
}
