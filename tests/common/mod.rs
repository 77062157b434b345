//! In-memory serial links shared by the integration tests

#![allow(dead_code)]

use quickserial::BaudRate;
use quickserial::services::{Link, LinkOpener};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Wire {
    incoming: VecDeque<Vec<u8>>,
    outgoing: Vec<u8>,
    fail_next_read: Option<io::ErrorKind>,
}

/// Link whose incoming chunks are queued by the test. Clones share one wire,
/// like two handles to the same port.
#[derive(Clone, Default)]
pub struct MemoryLink {
    wire: Arc<Mutex<Wire>>,
}

impl MemoryLink {
    pub fn feed(&self, chunk: &[u8]) {
        self.wire.lock().unwrap().incoming.push_back(chunk.to_vec());
    }

    pub fn fail_next_read(&self, kind: io::ErrorKind) {
        self.wire.lock().unwrap().fail_next_read = Some(kind);
    }

    pub fn written(&self) -> Vec<u8> {
        self.wire.lock().unwrap().outgoing.clone()
    }
}

impl Link for MemoryLink {
    fn bytes_available(&mut self) -> io::Result<usize> {
        let wire = self.wire.lock().unwrap();
        if wire.fail_next_read.is_some() {
            return Ok(1);
        }
        Ok(wire.incoming.front().map_or(0, Vec::len))
    }

    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let mut wire = self.wire.lock().unwrap();
        if let Some(kind) = wire.fail_next_read.take() {
            return Err(io::Error::new(kind, "device unplugged"));
        }
        Ok(wire.incoming.pop_front().unwrap_or_default())
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.wire.lock().unwrap().outgoing.extend_from_slice(bytes);
        Ok(())
    }

    fn try_clone(&self) -> io::Result<Box<dyn Link>> {
        Ok(Box::new(self.clone()))
    }
}

/// Opener that hands out one shared [`MemoryLink`] for known devices and
/// records every open request.
#[derive(Clone, Default)]
pub struct MemoryOpener {
    pub link: MemoryLink,
    pub missing: Vec<String>,
    pub opened: Arc<Mutex<Vec<(String, BaudRate)>>>,
}

impl MemoryOpener {
    pub fn with_missing(device: &str) -> Self {
        Self {
            missing: vec![device.to_string()],
            ..Self::default()
        }
    }

    pub fn opened(&self) -> Vec<(String, BaudRate)> {
        self.opened.lock().unwrap().clone()
    }
}

impl LinkOpener for MemoryOpener {
    fn open(&self, device: &str, baud_rate: BaudRate) -> io::Result<Box<dyn Link>> {
        self.opened
            .lock()
            .unwrap()
            .push((device.to_string(), baud_rate));

        if self.missing.iter().any(|m| m == device) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such device"));
        }
        Ok(Box::new(self.link.clone()))
    }
}
