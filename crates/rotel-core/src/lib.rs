//! Rotel amplifier serial control core.
//!
//! This crate decodes the amplifier's ASCII control protocol and drives the
//! small request/response loop that turns its replies into concrete state:
//! chunk sources feed the frame decoder (layout/reader/parser), decoded
//! events are reduced by the session controller, and follow-up commands go
//! back out through a [`CommandSink`]. Decoding is byte-oriented and side
//! effect free; all I/O is isolated in `source` modules.
//!
//! Invariants:
//! - Decoded events are identical however the byte stream is chunked.
//! - A display value always has exactly its declared length.
//! - Ambiguous power/mute replies never reach the state; they trigger a
//!   follow-up query instead.
//!
//! Version française (résumé):
//! Cette crate fournit le cœur de pilotage série : sources -> décodeur de
//! trames -> contrôleur de session -> commandes sortantes. Les E/S restent dans
//! `source`. Garanties : résultat indépendant du découpage du flux, champ
//! `display` de longueur exacte, réponses ambiguës résolues par une requête.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use rotel_core::{ReplayOptions, replay_capture_file};
//!
//! let report = replay_capture_file(Path::new("capture.bin"), &ReplayOptions::default())?;
//! println!("final source: {}", report.state.source_name());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod diagnostics;
mod link;
mod protocol;
mod replay;
mod session;
mod source;

pub use diagnostics::Diagnostic;
pub use link::{CommandSink, Controller, LinkError, MAX_RETAINED_DIAGNOSTICS, RecordingSink};
pub use protocol::{DecodedEvent, Field, FrameDecoder, MAX_PENDING_ISSUES, ProtocolError};
pub use replay::{
    DEFAULT_CHUNK_SIZE, ReplayError, ReplayOptions, replay_capture_file, replay_source,
};
pub use session::{
    AMBIGUOUS_MUTE, AMBIGUOUS_POWER, AmplifierState, Command, DEFAULT_DEVICE_NAME, DeviceState,
    MAX_PENDING_DIAGNOSTICS, MuteState, PowerState, Session, SessionConfig, SessionError, Source,
};
pub use source::{
    CaptureFileSource, ChunkSource, DEFAULT_BAUD_RATE, SerialLink, SerialWriter, SourceError,
};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;

/// Outcome of replaying a byte stream through a session.
///
/// # Examples
/// ```
/// use rotel_core::make_stub_report;
///
/// let report = make_stub_report("capture.bin", 42, "ROTEL");
/// assert_eq!(report.report_version, rotel_core::REPORT_VERSION);
/// assert!(report.events.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// Configured device name.
    pub device: String,
    /// Input capture metadata.
    pub input: InputInfo,
    /// Decoded events in arrival order.
    pub events: Vec<DecodedEvent>,
    /// Wire strings written to the transport, in order.
    pub commands: Vec<String>,
    /// Amplifier state at end of stream.
    pub state: AmplifierState,
    /// Host-facing title derived from the final state.
    pub media_title: String,
    /// Diagnostics aggregated by id, errors first.
    pub diagnostics: Vec<DiagnosticSummary>,
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use rotel_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "rotel".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "rotel");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input capture metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the replay.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
    /// Number of deliveries the input was cut into.
    pub chunks: u64,
}

/// Diagnostics sharing one id.
///
/// # Examples
/// ```
/// use rotel_core::DiagnosticSummary;
///
/// let summary = DiagnosticSummary {
///     id: "RS-UNKNOWN-SOURCE".to_string(),
///     severity: "warning".to_string(),
///     message: "Source outside the known input table".to_string(),
///     count: 1,
///     examples: vec!["unknown source 'vinyl'".to_string()],
/// };
/// assert_eq!(summary.count, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticSummary {
    /// Stable diagnostic identifier (e.g., `RS-UNKNOWN-SOURCE`).
    pub id: String,
    /// Severity label (`error` or `warning`).
    pub severity: String,
    pub message: String,
    pub count: u64,
    /// At most three concrete occurrences.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// Build a report with base fields filled and an initial session state.
pub fn make_stub_report(input_path: &str, input_bytes: u64, device: &str) -> SessionReport {
    let state = AmplifierState::default();
    SessionReport {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "rotel".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        device: device.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
            chunks: 0,
        },
        events: vec![],
        commands: vec![],
        media_title: state.media_title(),
        state,
        diagnostics: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_omits_empty_examples() {
        let mut report = make_stub_report("capture.bin", 1, DEFAULT_DEVICE_NAME);
        report.diagnostics.push(DiagnosticSummary {
            id: "RS-UNKNOWN-FIELD".to_string(),
            severity: "warning".to_string(),
            message: "Unrecognized field key".to_string(),
            count: 1,
            examples: Vec::new(),
        });

        let value = serde_json::to_value(&report).expect("report json");
        assert!(value["diagnostics"][0].get("examples").is_none());
        assert_eq!(value["state"]["power"], "unknown");
        assert_eq!(value["state"]["source"], "phono");
        assert_eq!(value["media_title"], "0 🔊  Phono");
    }
}
