//! Serial port transport.
//!
//! The amplifier talks at 115200 baud, 8N1. One handle reads; a cloned
//! handle writes commands, so the reader and the controller's sink can be
//! owned separately.

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use serialport::SerialPort;

use super::{ChunkSource, SourceError};
use crate::link::{CommandSink, LinkError};

pub const DEFAULT_BAUD_RATE: u32 = 115_200;
const READ_BUFFER_SIZE: usize = 256;

pub struct SerialLink {
    port: Box<dyn SerialPort>,
    buffer: [u8; READ_BUFFER_SIZE],
}

impl SerialLink {
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self, SourceError> {
        let port = serialport::new(path, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| SourceError::Serial {
                context: "serial port open",
                message: e.to_string(),
            })?;
        Ok(Self {
            port,
            buffer: [0u8; READ_BUFFER_SIZE],
        })
    }

    /// Independent write handle on the same port.
    pub fn writer(&self) -> Result<SerialWriter, SourceError> {
        let port = self.port.try_clone().map_err(|e| SourceError::Serial {
            context: "serial port clone",
            message: e.to_string(),
        })?;
        Ok(SerialWriter { port })
    }
}

impl ChunkSource for SerialLink {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        match self.port.read(&mut self.buffer) {
            Ok(0) => Ok(None),
            Ok(read) => Ok(Some(self.buffer[..read].to_vec())),
            Err(err) if err.kind() == ErrorKind::TimedOut => Ok(Some(Vec::new())),
            Err(err) => Err(SourceError::Io(err)),
        }
    }
}

pub struct SerialWriter {
    port: Box<dyn SerialPort>,
}

impl CommandSink for SerialWriter {
    fn write(&mut self, wire: &str) -> Result<(), LinkError> {
        self.port.write_all(wire.as_bytes())?;
        self.port.flush()?;
        Ok(())
    }
}
