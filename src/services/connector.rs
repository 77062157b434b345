use crate::metrics::LinkMetrics;
use crate::models::{BaudRate, LinkInfo};
use crate::services::error::SerialError;
use crate::services::link::{Link, LinkOpener, SerialPortOpener};
use crate::services::reader::{ReaderEvent, SerialReader};
use std::sync::Arc;

/// An open link together with its reader.
///
/// `reader` is declared first so it is stopped before the write handle closes.
struct ActiveLink {
    reader: SerialReader,
    link: Box<dyn Link>,
    info: LinkInfo,
}

/// Owns the single serial link and its background reader.
///
/// States: **Disconnected** (no link) and **Connected** (link open, reader
/// running). [`connect`](Self::connect) always passes through Disconnected
/// first, so a failed reconnect leaves the connector disconnected.
pub struct SerialConnector<O: LinkOpener = SerialPortOpener> {
    opener: O,
    active: Option<ActiveLink>,
    metrics: Arc<LinkMetrics>,
}

impl SerialConnector<SerialPortOpener> {
    /// Connector for OS serial ports
    pub fn new(metrics: Arc<LinkMetrics>) -> Self {
        Self::with_opener(SerialPortOpener, metrics)
    }
}

impl<O: LinkOpener> SerialConnector<O> {
    pub fn with_opener(opener: O, metrics: Arc<LinkMetrics>) -> Self {
        Self {
            opener,
            active: None,
            metrics,
        }
    }

    /// Open `device` and start a reader that forwards events to `on_event`.
    ///
    /// Any link already open is disconnected first.
    pub fn connect<F>(
        &mut self,
        device: &str,
        baud_rate: BaudRate,
        on_event: F,
    ) -> Result<LinkInfo, SerialError>
    where
        F: FnMut(ReaderEvent) + Send + 'static,
    {
        self.disconnect();

        tracing::info!("Connecting to {} at {} baud", device, baud_rate);

        let link = self
            .opener
            .open(device, baud_rate)
            .map_err(|e| SerialError::connection(device, e))?;

        let reader_link = link
            .try_clone()
            .map_err(|e| SerialError::connection(device, e))?;

        let reader = SerialReader::spawn(reader_link, Arc::clone(&self.metrics), on_event)
            .map_err(|e| SerialError::connection(device, e))?;

        let info = LinkInfo {
            device: device.to_string(),
            baud_rate,
        };

        self.metrics.record_connection_opened();
        tracing::info!("Connected to {}", info);

        self.active = Some(ActiveLink {
            reader,
            link,
            info: info.clone(),
        });

        Ok(info)
    }

    /// Stop the reader (waiting for its thread) and close the link.
    ///
    /// Returns `false` when nothing was open.
    pub fn disconnect(&mut self) -> bool {
        let Some(mut active) = self.active.take() else {
            return false;
        };

        active.reader.stop();
        let info = active.info.clone();
        drop(active);

        tracing::info!("Disconnected from {}", info);
        true
    }

    /// Close the link if its reader has stopped on a transport failure.
    ///
    /// Returns `false`, leaving the connector untouched, when nothing is open
    /// or the reader is still polling. A link-lost notification that arrives
    /// after a reconnect therefore cannot close the newer link.
    pub fn close_if_reader_stopped(&mut self) -> bool {
        if !self.is_connected() || self.is_reading() {
            return false;
        }
        self.disconnect()
    }

    /// Write `text` as UTF-8.
    ///
    /// Returns the number of bytes written.
    pub fn send(&mut self, text: &str) -> Result<usize, SerialError> {
        let active = self.active.as_mut().ok_or(SerialError::NotConnected)?;

        let bytes = text.as_bytes();
        if bytes.is_empty() {
            return Ok(0);
        }

        active.link.write_all(bytes)?;
        self.metrics.record_bytes_sent(bytes.len());
        tracing::debug!("Sent {} bytes to {}", bytes.len(), active.info.device);

        Ok(bytes.len())
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    pub fn link_info(&self) -> Option<&LinkInfo> {
        self.active.as_ref().map(|a| &a.info)
    }

    /// Whether the reader of the open link is still polling
    pub fn is_reading(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.reader.is_running())
    }
}

impl<O: LinkOpener> Drop for SerialConnector<O> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
