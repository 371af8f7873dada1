use std::collections::VecDeque;
use std::collections::vec_deque::Drain;

use tracing::debug;

use super::error::ProtocolError;
use super::layout;
use super::reader::{lossy_string, read_display_length, split_token};
use super::{DecodedEvent, Field};

/// Malformed tokens kept until [`FrameDecoder::take_issues`]; older ones are
/// dropped and counted.
pub const MAX_PENDING_ISSUES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Collecting a terminator-delimited token.
    Accumulating,
    /// Header seen; the payload is taken by count, `!` included.
    ReadingDisplay { declared: usize },
}

/// Incremental decoder for the amplifier byte stream.
///
/// Bytes may arrive in any chunking, down to one byte per call; the decoded
/// sequence is the same. Completed events queue up in arrival order until
/// drained.
///
/// # Examples
/// ```
/// use rotel_core::{DecodedEvent, Field, FrameDecoder};
///
/// let mut decoder = FrameDecoder::new();
/// let events: Vec<_> = decoder.feed(b"source=coax2!fr").collect();
/// assert_eq!(events, vec![DecodedEvent::new(Field::Source, "coax2")]);
///
/// let events: Vec<_> = decoder.feed(b"eq=44.1!").collect();
/// assert_eq!(events, vec![DecodedEvent::new(Field::Frequency, "44.1")]);
/// ```
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    mode: Mode,
    events: VecDeque<DecodedEvent>,
    issues: VecDeque<ProtocolError>,
    dropped_issues: u64,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(64),
            mode: Mode::Accumulating,
            events: VecDeque::new(),
            issues: VecDeque::new(),
            dropped_issues: 0,
        }
    }

    /// Decode `chunk` and drain every event completed so far.
    pub fn feed(&mut self, chunk: &[u8]) -> Drain<'_, DecodedEvent> {
        self.push(chunk);
        self.drain()
    }

    /// Decode `chunk`, leaving completed events queued.
    pub fn push(&mut self, chunk: &[u8]) {
        for &byte in chunk {
            self.step(byte);
        }
    }

    pub fn drain(&mut self) -> Drain<'_, DecodedEvent> {
        self.events.drain(..)
    }

    pub fn next_event(&mut self) -> Option<DecodedEvent> {
        self.events.pop_front()
    }

    /// Bytes collected since the last completed token.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    pub fn is_reading_display(&self) -> bool {
        matches!(self.mode, Mode::ReadingDisplay { .. })
    }

    /// Malformed tokens absorbed since the last call, at most
    /// [`MAX_PENDING_ISSUES`] of the most recent.
    pub fn take_issues(&mut self) -> Vec<ProtocolError> {
        self.issues.drain(..).collect()
    }

    /// Malformed tokens discarded because nobody took them in time.
    pub fn dropped_issues(&self) -> u64 {
        self.dropped_issues
    }

    /// Close the stream, reporting a token left incomplete.
    ///
    /// The decoder is reset either way and can be reused.
    ///
    /// # Errors
    /// Returns [`ProtocolError::TruncatedDisplay`] when a display payload was
    /// still short of its declared length, and
    /// [`ProtocolError::UnterminatedToken`] for any other pending bytes.
    pub fn finish(&mut self) -> Result<(), ProtocolError> {
        let mode = std::mem::replace(&mut self.mode, Mode::Accumulating);
        let result = match mode {
            Mode::ReadingDisplay { declared } => Err(ProtocolError::TruncatedDisplay {
                declared,
                received: self
                    .buffer
                    .len()
                    .saturating_sub(layout::DISPLAY_PAYLOAD_OFFSET),
            }),
            Mode::Accumulating if self.buffer.is_empty() => Ok(()),
            Mode::Accumulating => Err(ProtocolError::UnterminatedToken {
                pending: lossy_string(&self.buffer),
            }),
        };
        self.buffer.clear();
        result
    }

    fn step(&mut self, byte: u8) {
        match self.mode {
            Mode::ReadingDisplay { declared } => {
                self.buffer.push(byte);
                let received = self
                    .buffer
                    .len()
                    .saturating_sub(layout::DISPLAY_PAYLOAD_OFFSET);
                if received >= declared {
                    let start = layout::DISPLAY_PAYLOAD_OFFSET;
                    let value = lossy_string(&self.buffer[start..start + declared]);
                    self.buffer.clear();
                    self.mode = Mode::Accumulating;
                    self.emit(DecodedEvent::new(Field::Display, value));
                }
            }
            Mode::Accumulating if byte == layout::TERMINATOR => {
                self.complete_token();
                self.buffer.clear();
            }
            Mode::Accumulating => {
                self.buffer.push(byte);
                // Only the exact header length can open a display field; past
                // it the prefix and digits no longer change.
                if self.buffer.len() == layout::DISPLAY_HEADER_LEN {
                    if let Some(declared) = read_display_length(&self.buffer) {
                        self.mode = Mode::ReadingDisplay { declared };
                    }
                }
            }
        }
    }

    fn complete_token(&mut self) {
        match split_token(&self.buffer) {
            (key, Some(value)) => {
                let field = Field::from_key(&lossy_string(key));
                let event = DecodedEvent::new(field, lossy_string(value));
                self.emit(event);
            }
            (token, None) => {
                let token = lossy_string(token);
                debug!(%token, "dropping token without separator");
                if self.issues.len() == MAX_PENDING_ISSUES {
                    self.issues.pop_front();
                    self.dropped_issues += 1;
                }
                self.issues.push_back(ProtocolError::MalformedToken { token });
            }
        }
    }

    fn emit(&mut self, event: DecodedEvent) {
        debug!(field = %event.field, value = %event.value, "decoded token");
        self.events.push_back(event);
    }
}
