//! Raw byte captures replayed from disk.
//!
//! A capture is the amplifier's output stream saved verbatim. Chunks are cut
//! at a fixed size, which lets a replay exercise token fragmentation.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::{ChunkSource, SourceError};

pub struct CaptureFileSource {
    file: File,
    chunk_size: usize,
}

impl CaptureFileSource {
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self, SourceError> {
        if chunk_size == 0 {
            return Err(SourceError::InvalidChunkSize { size: chunk_size });
        }
        let file = File::open(path)?;
        Ok(Self { file, chunk_size })
    }
}

impl ChunkSource for CaptureFileSource {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        let mut chunk = Vec::with_capacity(self.chunk_size);
        (&mut self.file)
            .take(self.chunk_size as u64)
            .read_to_end(&mut chunk)?;
        if chunk.is_empty() {
            Ok(None)
        } else {
            Ok(Some(chunk))
        }
    }
}
