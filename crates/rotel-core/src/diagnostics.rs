//! Protocol-level observations collected while a session runs.
//!
//! Nothing here stops the stream. Each diagnostic has a stable id so replay
//! reports can aggregate them.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::DiagnosticSummary;
use crate::protocol::ProtocolError;

pub const SEVERITY_ERROR: &str = "error";
pub const SEVERITY_WARNING: &str = "warning";

const MAX_EXAMPLES: usize = 3;

/// A single diagnostic raised by the decoder or the session.
///
/// # Examples
/// ```
/// use rotel_core::Diagnostic;
///
/// let diag = Diagnostic::UnknownSource { value: "vinyl".to_string() };
/// assert_eq!(diag.id(), "RS-UNKNOWN-SOURCE");
/// assert_eq!(diag.to_string(), "unknown source 'vinyl'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("malformed token '{token}': missing '=' separator")]
    MalformedToken { token: String },
    #[error("unknown field '{key}' with value '{value}'")]
    UnknownField { key: String, value: String },
    #[error("unknown source '{value}'")]
    UnknownSource { value: String },
    #[error("unrecognized power state '{value}'")]
    UnknownPower { value: String },
    #[error("unrecognized mute state '{value}'")]
    UnknownMute { value: String },
    #[error("display field truncated: declared {declared} bytes, received {received}")]
    TruncatedDisplay { declared: usize, received: usize },
    #[error("unterminated token at end of stream: '{pending}'")]
    UnterminatedToken { pending: String },
}

impl Diagnostic {
    pub fn id(&self) -> &'static str {
        match self {
            Diagnostic::MalformedToken { .. } => "RS-MALFORMED-TOKEN",
            Diagnostic::UnknownField { .. } => "RS-UNKNOWN-FIELD",
            Diagnostic::UnknownSource { .. } => "RS-UNKNOWN-SOURCE",
            Diagnostic::UnknownPower { .. } => "RS-UNKNOWN-POWER",
            Diagnostic::UnknownMute { .. } => "RS-UNKNOWN-MUTE",
            Diagnostic::TruncatedDisplay { .. } => "RS-TRUNCATED-DISPLAY",
            Diagnostic::UnterminatedToken { .. } => "RS-UNTERMINATED-TOKEN",
        }
    }

    pub fn severity(&self) -> &'static str {
        match self {
            Diagnostic::MalformedToken { .. } | Diagnostic::TruncatedDisplay { .. } => {
                SEVERITY_ERROR
            }
            _ => SEVERITY_WARNING,
        }
    }

    /// Description shared by every diagnostic with the same id.
    pub fn summary(&self) -> &'static str {
        match self {
            Diagnostic::MalformedToken { .. } => "Token without '=' separator",
            Diagnostic::UnknownField { .. } => "Unrecognized field key",
            Diagnostic::UnknownSource { .. } => "Source outside the known input table",
            Diagnostic::UnknownPower { .. } => "Unrecognized power state",
            Diagnostic::UnknownMute { .. } => "Unrecognized mute state",
            Diagnostic::TruncatedDisplay { .. } => {
                "Display field ended before its declared length"
            }
            Diagnostic::UnterminatedToken { .. } => "Token left unterminated at end of stream",
        }
    }
}

impl From<ProtocolError> for Diagnostic {
    fn from(value: ProtocolError) -> Self {
        match value {
            ProtocolError::MalformedToken { token } => Diagnostic::MalformedToken { token },
            ProtocolError::TruncatedDisplay { declared, received } => {
                Diagnostic::TruncatedDisplay { declared, received }
            }
            ProtocolError::UnterminatedToken { pending } => {
                Diagnostic::UnterminatedToken { pending }
            }
        }
    }
}

/// Running per-id counts with a few examples each.
///
/// Memory is bounded by the number of diagnostic ids, however long the
/// stream runs.
#[derive(Debug, Default, Clone)]
pub(crate) struct DiagnosticTally {
    by_id: BTreeMap<&'static str, DiagnosticSummary>,
}

impl DiagnosticTally {
    pub(crate) fn record(&mut self, diagnostic: &Diagnostic) {
        let entry = self
            .by_id
            .entry(diagnostic.id())
            .or_insert_with(|| DiagnosticSummary {
                id: diagnostic.id().to_string(),
                severity: diagnostic.severity().to_string(),
                message: diagnostic.summary().to_string(),
                count: 0,
                examples: Vec::new(),
            });
        entry.count += 1;
        if entry.examples.len() < MAX_EXAMPLES {
            entry.examples.push(diagnostic.to_string());
        }
    }

    pub(crate) fn total(&self) -> u64 {
        self.by_id.values().map(|summary| summary.count).sum()
    }

    /// Summaries ordered errors first, then by id.
    pub(crate) fn summaries(&self) -> Vec<DiagnosticSummary> {
        let mut summaries: Vec<_> = self.by_id.values().cloned().collect();
        summaries.sort_by(|a, b| {
            severity_rank(&a.severity)
                .cmp(&severity_rank(&b.severity))
                .then_with(|| a.id.cmp(&b.id))
        });
        summaries
    }
}

fn severity_rank(severity: &str) -> u8 {
    if severity == SEVERITY_ERROR { 0 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::{Diagnostic, DiagnosticTally, SEVERITY_ERROR, SEVERITY_WARNING};
    use crate::protocol::ProtocolError;

    fn unknown_source(value: &str) -> Diagnostic {
        Diagnostic::UnknownSource {
            value: value.to_string(),
        }
    }

    #[test]
    fn tally_counts_and_caps_examples() {
        let mut tally = DiagnosticTally::default();
        for value in ["a", "b", "c", "d"] {
            tally.record(&unknown_source(value));
        }
        let summaries = tally.summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].count, 4);
        assert_eq!(
            summaries[0].examples,
            vec![
                "unknown source 'a'",
                "unknown source 'b'",
                "unknown source 'c'"
            ]
        );
        assert_eq!(tally.total(), 4);
    }

    #[test]
    fn tally_sorts_errors_before_warnings() {
        let mut tally = DiagnosticTally::default();
        tally.record(&unknown_source("vinyl"));
        tally.record(&Diagnostic::UnknownField {
            key: "tone".to_string(),
            value: "1".to_string(),
        });
        tally.record(&Diagnostic::TruncatedDisplay {
            declared: 3,
            received: 1,
        });
        let ids: Vec<_> = tally
            .summaries()
            .into_iter()
            .map(|summary| summary.id)
            .collect();
        assert_eq!(
            ids,
            vec!["RS-TRUNCATED-DISPLAY", "RS-UNKNOWN-FIELD", "RS-UNKNOWN-SOURCE"]
        );
    }

    #[test]
    fn protocol_errors_keep_their_message() {
        let err = ProtocolError::TruncatedDisplay {
            declared: 5,
            received: 2,
        };
        let message = err.to_string();
        let diag = Diagnostic::from(err);
        assert_eq!(diag.to_string(), message);
        assert_eq!(diag.id(), "RS-TRUNCATED-DISPLAY");
        assert_eq!(diag.severity(), SEVERITY_ERROR);
    }

    #[test]
    fn unknown_values_are_warnings() {
        let diag = Diagnostic::UnknownMute {
            value: "half".to_string(),
        };
        assert_eq!(diag.severity(), SEVERITY_WARNING);
    }
}
