// Link metrics module
//
// Lightweight counters for the serial link, logged on shutdown

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters for traffic over the serial link
///
/// Uses atomic operations so the reader thread and the UI thread can record
/// without locks.
#[derive(Debug)]
pub struct LinkMetrics {
    /// Lines decoded and forwarded to the log
    pub lines_received: AtomicU64,

    /// Lines dropped because they were not valid UTF-8
    pub lines_discarded: AtomicU64,

    /// Bytes written to the link
    pub bytes_sent: AtomicU64,

    /// Successful connects
    pub connections_opened: AtomicU64,

    /// Reader loops ended by a transport error
    pub link_failures: AtomicU64,

    /// Application start time
    start_time: Instant,
}

impl LinkMetrics {
    pub fn new() -> Self {
        Self {
            lines_received: AtomicU64::new(0),
            lines_discarded: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            connections_opened: AtomicU64::new(0),
            link_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_line_received(&self) {
        self.lines_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_line_discarded(&self) {
        self.lines_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bytes_sent(&self, count: usize) {
        self.bytes_sent.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_link_failure(&self) {
        self.link_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log a summary of all counters
    pub fn log_summary(&self) {
        tracing::info!(
            "Link metrics: uptime={:.1}s, connections={}, lines_received={}, lines_discarded={}, bytes_sent={}, link_failures={}",
            self.uptime().as_secs_f64(),
            self.connections_opened.load(Ordering::Relaxed),
            self.lines_received.load(Ordering::Relaxed),
            self.lines_discarded.load(Ordering::Relaxed),
            self.bytes_sent.load(Ordering::Relaxed),
            self.link_failures.load(Ordering::Relaxed),
        );
    }
}

impl Default for LinkMetrics {
    fn default() -> Self {
        Self::new()
    }
}
