use thiserror::Error;

/// Conditions reported by the frame decoder.
///
/// None of these stop decoding. Malformed tokens are collected while the
/// stream is running; the two end-of-stream variants come from
/// `FrameDecoder::finish`.
///
/// # Examples
/// ```
/// use rotel_core::ProtocolError;
///
/// let err = ProtocolError::TruncatedDisplay { declared: 5, received: 2 };
/// assert!(err.to_string().contains("display field truncated"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("malformed token '{token}': missing '=' separator")]
    MalformedToken { token: String },
    #[error("display field truncated: declared {declared} bytes, received {received}")]
    TruncatedDisplay { declared: usize, received: usize },
    #[error("unterminated token at end of stream: '{pending}'")]
    UnterminatedToken { pending: String },
}
