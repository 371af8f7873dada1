mod capture;
mod serial;

pub use capture::CaptureFileSource;
pub use serial::{DEFAULT_BAUD_RATE, SerialLink, SerialWriter};

use thiserror::Error;

/// Inbound half of the transport: raw chunks as they arrive.
pub trait ChunkSource {
    /// Next chunk, `None` at end of stream. An empty chunk means nothing
    /// arrived before the source's read timeout.
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error ({context}): {message}")]
    Serial {
        context: &'static str,
        message: String,
    },
    #[error("invalid chunk size: {size}")]
    InvalidChunkSize { size: usize },
}
