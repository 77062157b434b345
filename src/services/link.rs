//! Byte-stream link abstraction.
//!
//! [`Link`] is the narrow surface the connector and reader need from an open
//! port. [`SerialPortLink`] implements it on top of the `serialport` crate;
//! tests substitute in-memory links.

use crate::models::BaudRate;
use serialport::SerialPort;
use std::io::{self, BufRead, BufReader, Write};
use std::time::Duration;

/// Read timeout applied to every opened port
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// An open, bidirectional byte link
pub trait Link: Send {
    /// Number of bytes that can be read without waiting
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read up to and including the next `\n`.
    ///
    /// If the read timeout expires first, returns whatever arrived before it
    /// (possibly nothing).
    fn read_line(&mut self) -> io::Result<Vec<u8>>;

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Open a second handle to the same device
    fn try_clone(&self) -> io::Result<Box<dyn Link>>;
}

/// Opens links by device name
#[cfg_attr(test, mockall::automock)]
pub trait LinkOpener: Send {
    fn open(&self, device: &str, baud_rate: BaudRate) -> io::Result<Box<dyn Link>>;
}

/// [`Link`] backed by a `serialport` handle
pub struct SerialPortLink {
    port: BufReader<Box<dyn SerialPort>>,
}

impl SerialPortLink {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self {
            port: BufReader::new(port),
        }
    }
}

impl Link for SerialPortLink {
    fn bytes_available(&mut self) -> io::Result<usize> {
        let buffered = self.port.buffer().len();
        let pending = self.port.get_ref().bytes_to_read()?;
        Ok(buffered + pending as usize)
    }

    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let mut line = Vec::new();
        match self.port.read_until(b'\n', &mut line) {
            Ok(_) => Ok(line),
            // read_until keeps the bytes it consumed before the error
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(line),
            Err(e) => Err(e),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let port = self.port.get_mut();
        port.write_all(bytes)?;
        port.flush()
    }

    fn try_clone(&self) -> io::Result<Box<dyn Link>> {
        let port = self.port.get_ref().try_clone()?;
        Ok(Box::new(SerialPortLink::new(port)))
    }
}

/// Opens OS serial ports with [`READ_TIMEOUT`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialPortOpener;

impl LinkOpener for SerialPortOpener {
    fn open(&self, device: &str, baud_rate: BaudRate) -> io::Result<Box<dyn Link>> {
        let port = serialport::new(device, baud_rate.as_u32())
            .timeout(READ_TIMEOUT)
            .open()?;
        Ok(Box::new(SerialPortLink::new(port)))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    pub(crate) enum Step {
        Chunk(Vec<u8>),
        Fail(io::ErrorKind),
    }

    #[derive(Default)]
    pub(crate) struct Script {
        pub steps: VecDeque<Step>,
        pub written: Vec<u8>,
        pub fail_clone: bool,
    }

    /// In-memory link that replays scripted reads and records writes.
    /// Clones share the same script.
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedLink {
        pub script: Arc<Mutex<Script>>,
    }

    impl ScriptedLink {
        pub fn with_chunks(chunks: &[&[u8]]) -> Self {
            let link = Self::default();
            {
                let mut script = link.script.lock().unwrap();
                for chunk in chunks {
                    script.steps.push_back(Step::Chunk(chunk.to_vec()));
                }
            }
            link
        }

        pub fn push(&self, step: Step) {
            self.script.lock().unwrap().steps.push_back(step);
        }

        pub fn written(&self) -> Vec<u8> {
            self.script.lock().unwrap().written.clone()
        }
    }

    impl Link for ScriptedLink {
        fn bytes_available(&mut self) -> io::Result<usize> {
            let script = self.script.lock().unwrap();
            Ok(match script.steps.front() {
                Some(Step::Chunk(bytes)) => bytes.len(),
                Some(Step::Fail(_)) => 1,
                None => 0,
            })
        }

        fn read_line(&mut self) -> io::Result<Vec<u8>> {
            let mut script = self.script.lock().unwrap();
            match script.steps.pop_front() {
                Some(Step::Chunk(bytes)) => Ok(bytes),
                Some(Step::Fail(kind)) => Err(io::Error::new(kind, "scripted failure")),
                None => Ok(Vec::new()),
            }
        }

        fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
            self.script.lock().unwrap().written.extend_from_slice(bytes);
            Ok(())
        }

        fn try_clone(&self) -> io::Result<Box<dyn Link>> {
            if self.script.lock().unwrap().fail_clone {
                return Err(io::Error::other("clone refused"));
            }
            Ok(Box::new(self.clone()))
        }
    }
}
