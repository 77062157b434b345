use std::io;
use thiserror::Error;

/// Errors raised by the serial link services
#[derive(Error, Debug)]
pub enum SerialError {
    /// The device could not be opened (busy, missing, permission denied)
    #[error("Failed to open {device}: {source}")]
    Connection {
        device: String,
        #[source]
        source: io::Error,
    },

    #[error("Not connected to a serial port")]
    NotConnected,

    #[error("Received bytes are not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),

    #[error("Serial I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SerialError {
    pub(crate) fn connection(device: &str, source: io::Error) -> Self {
        SerialError::Connection {
            device: device.to_string(),
            source,
        }
    }
}
