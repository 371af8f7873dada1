use thiserror::Error;

/// Errors raised while building outbound commands.
///
/// # Examples
/// ```
/// use rotel_core::SessionError;
///
/// let err = SessionError::UnknownSourceName { name: "Vinyl".to_string() };
/// assert!(err.to_string().contains("unknown source"));
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("unknown source '{name}'")]
    UnknownSourceName { name: String },
    #[error("volume level out of range: {level} (expected 0.0..=1.0)")]
    VolumeOutOfRange { level: f64 },
}
