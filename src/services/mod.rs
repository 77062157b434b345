//! Services module - serial link handling with no UI dependencies.
//!
//! # Components
//!
//! - [`ports`]: Enumerates attached serial devices as [`PortEntry`](crate::models::PortEntry) values
//! - [`link`]: The [`Link`] / [`LinkOpener`] seam and its `serialport` implementation
//! - [`SerialConnector`]: Owns the single open link; connect, disconnect and send
//! - [`SerialReader`]: Background thread turning incoming bytes into [`ReaderEvent`]s
//! - [`log_export`]: Writes the session log to a text file
//!
//! # Threading
//!
//! The connector is driven from the UI thread and writes synchronously. Each
//! open link has exactly one reader thread holding a cloned port handle, so
//! reads and writes never contend for a lock.
//!
//! # Usage Example
//!
//! ```ignore
//! use quickserial::services::{ReaderEvent, SerialConnector};
//!
//! let mut connector = SerialConnector::new(metrics);
//! connector.connect("/dev/ttyUSB0", BaudRate::B115200, |event| match event {
//!     ReaderEvent::Line(line) => println!(">> {line}"),
//!     ReaderEvent::LinkLost(reason) => eprintln!("lost: {reason}"),
//! })?;
//! connector.send("AT\r\n")?;
//! connector.disconnect();
//! ```

pub mod connector;
pub mod error;
pub mod link;
pub mod log_export;
pub mod ports;
pub mod reader;

pub use connector::SerialConnector;
pub use error::SerialError;
pub use link::{Link, LinkOpener, READ_TIMEOUT, SerialPortLink, SerialPortOpener};
pub use log_export::{DEFAULT_LOG_FILE_NAME, export_log};
pub use ports::list_ports;
pub use reader::{ReaderEvent, SerialReader, decode_line};
