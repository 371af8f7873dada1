//! Binding between the decoder, the session and the transport.
//!
//! The transport is a collaborator: it hands raw chunks to
//! [`Controller::on_bytes`] and accepts wire strings through [`CommandSink`].
//! Writes are fire-and-forget. A write before a transport is attached, or one
//! that fails, is logged and dropped; it never propagates out of the
//! controller.

use std::collections::VecDeque;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::DiagnosticSummary;
use crate::diagnostics::{Diagnostic, DiagnosticTally};
use crate::protocol::parser::MAX_PENDING_ISSUES;
use crate::protocol::{DecodedEvent, FrameDecoder};
use crate::session::{AmplifierState, Command, Session, SessionConfig, SessionError};

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("transport not ready")]
    NotReady,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outbound half of the transport.
pub trait CommandSink {
    fn write(&mut self, wire: &str) -> Result<(), LinkError>;
}

impl<S: CommandSink + ?Sized> CommandSink for &mut S {
    fn write(&mut self, wire: &str) -> Result<(), LinkError> {
        (**self).write(wire)
    }
}

impl<S: CommandSink + ?Sized> CommandSink for Box<S> {
    fn write(&mut self, wire: &str) -> Result<(), LinkError> {
        (**self).write(wire)
    }
}

/// Sink keeping every written command in memory.
///
/// # Examples
/// ```
/// use rotel_core::{CommandSink, RecordingSink};
///
/// let mut sink = RecordingSink::default();
/// sink.write("mute!")?;
/// assert_eq!(sink.written(), ["mute!"]);
/// # Ok::<(), rotel_core::LinkError>(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    written: Vec<String>,
}

impl RecordingSink {
    pub fn written(&self) -> &[String] {
        &self.written
    }

    pub fn into_written(self) -> Vec<String> {
        self.written
    }
}

impl CommandSink for RecordingSink {
    fn write(&mut self, wire: &str) -> Result<(), LinkError> {
        self.written.push(wire.to_string());
        Ok(())
    }
}

/// Diagnostics kept for [`Controller::take_diagnostics`]; older ones are
/// dropped but still counted in [`Controller::diagnostic_summaries`].
pub const MAX_RETAINED_DIAGNOSTICS: usize = 64;

/// Decoder + session + transport.
///
/// # Examples
/// ```
/// use rotel_core::{Controller, PowerState, RecordingSink, SessionConfig};
///
/// let mut controller = Controller::new(SessionConfig::default());
/// controller.attach(RecordingSink::default());
/// controller.on_bytes(b"power=on/standby!");
/// controller.on_bytes(b"power=on!");
///
/// assert_eq!(controller.snapshot().power, PowerState::On);
/// let written = controller.sink().map(|sink| sink.written().to_vec()).unwrap_or_default();
/// assert_eq!(written.last().map(String::as_str), Some("get_power!"));
/// ```
#[derive(Debug)]
pub struct Controller<S> {
    decoder: FrameDecoder,
    session: Session,
    sink: Option<S>,
    recent: VecDeque<Diagnostic>,
    tally: DiagnosticTally,
}

impl<S: CommandSink> Controller<S> {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            decoder: FrameDecoder::new(),
            session: Session::new(config),
            sink: None,
            recent: VecDeque::new(),
            tally: DiagnosticTally::default(),
        }
    }

    /// Attach the transport and send the baseline queries.
    pub fn attach(&mut self, sink: S) {
        self.sink = Some(sink);
        info!(device = %self.session.name(), "transport attached");
        for command in self.session.start() {
            self.send(command);
        }
    }

    pub fn detach(&mut self) -> Option<S> {
        self.sink.take()
    }

    pub fn is_attached(&self) -> bool {
        self.sink.is_some()
    }

    pub fn sink(&self) -> Option<&S> {
        self.sink.as_ref()
    }

    /// Decode a chunk, apply every completed event and write follow-ups.
    ///
    /// Returns the events applied, in arrival order.
    pub fn on_bytes(&mut self, chunk: &[u8]) -> Vec<DecodedEvent> {
        let mut applied = Vec::new();
        // Every issue or diagnostic consumes at least one byte, so a piece
        // this size cannot overflow the decoder or session queues.
        for piece in chunk.chunks(MAX_PENDING_ISSUES) {
            self.decoder.push(piece);
            while let Some(event) = self.decoder.next_event() {
                for command in self.session.apply(&event) {
                    self.send(command);
                }
                applied.push(event);
            }
            self.collect_diagnostics();
        }
        applied
    }

    /// Write one command. Failures are logged, not returned.
    pub fn send(&mut self, command: Command) {
        let wire = command.wire();
        let device = self.session.name();
        match self.sink.as_mut() {
            None => warn!(device = %device, command = %wire, "transport not ready, dropping command"),
            Some(sink) => match sink.write(&wire) {
                Ok(()) => debug!(device = %device, command = %wire, "command sent"),
                Err(err) => warn!(device = %device, command = %wire, error = %err, "command write failed"),
            },
        }
    }

    /// Select an input by front-panel name.
    ///
    /// # Errors
    /// Returns [`SessionError::UnknownSourceName`] when the name is not in
    /// the input table; nothing is written in that case.
    pub fn select_source(&mut self, name: &str) -> Result<(), SessionError> {
        let command = Command::select_source(name)?;
        self.send(command);
        Ok(())
    }

    /// Set volume from a fraction of full scale.
    ///
    /// # Errors
    /// Returns [`SessionError::VolumeOutOfRange`] for levels outside
    /// `0.0..=1.0`; nothing is written in that case.
    pub fn set_volume_level(&mut self, level: f64) -> Result<(), SessionError> {
        let command = Command::set_volume_level(level)?;
        self.send(command);
        Ok(())
    }

    /// Close the inbound stream, recording a token left incomplete.
    pub fn finish(&mut self) {
        if let Err(err) = self.decoder.finish() {
            warn!(device = %self.session.name(), error = %err, "stream ended mid-token");
            self.record(err.into());
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> AmplifierState {
        self.session.snapshot()
    }

    /// Diagnostics raised since the last call, at most
    /// [`MAX_RETAINED_DIAGNOSTICS`] of the most recent.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.collect_diagnostics();
        self.recent.drain(..).collect()
    }

    /// Every diagnostic raised so far, aggregated by id, errors first.
    pub fn diagnostic_summaries(&mut self) -> Vec<DiagnosticSummary> {
        self.collect_diagnostics();
        self.tally.summaries()
    }

    pub fn diagnostic_count(&self) -> u64 {
        self.tally.total()
    }

    fn collect_diagnostics(&mut self) {
        for issue in self.decoder.take_issues() {
            warn!(device = %self.session.name(), error = %issue, "malformed token");
            self.record(issue.into());
        }
        for diagnostic in self.session.take_diagnostics() {
            self.record(diagnostic);
        }
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        self.tally.record(&diagnostic);
        if self.recent.len() == MAX_RETAINED_DIAGNOSTICS {
            self.recent.pop_front();
        }
        self.recent.push_back(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandSink, Controller, LinkError, MAX_RETAINED_DIAGNOSTICS, RecordingSink};
    use crate::diagnostics::Diagnostic;
    use crate::session::{PowerState, SessionConfig, SessionError, Source};

    struct FailingSink;

    impl CommandSink for FailingSink {
        fn write(&mut self, _wire: &str) -> Result<(), LinkError> {
            Err(LinkError::NotReady)
        }
    }

    fn written(controller: &Controller<RecordingSink>) -> Vec<String> {
        controller
            .sink()
            .map(|sink| sink.written().to_vec())
            .unwrap_or_default()
    }

    #[test]
    fn attach_sends_initial_burst() {
        let mut controller = Controller::new(SessionConfig::default());
        controller.attach(RecordingSink::default());
        assert_eq!(
            written(&controller),
            vec![
                "get_current_power!",
                "get_volume!",
                "get_current_source!",
                "get_current_freq!"
            ]
        );
    }

    #[test]
    fn send_before_attach_is_a_no_op() {
        let mut controller: Controller<RecordingSink> = Controller::new(SessionConfig::default());
        controller.on_bytes(b"power=on/standby!");
        assert!(!controller.is_attached());
        controller.attach(RecordingSink::default());
        assert_eq!(written(&controller).len(), 4);
    }

    #[test]
    fn follow_ups_written_in_emission_order() {
        let mut controller = Controller::new(SessionConfig::default());
        controller.attach(RecordingSink::default());
        controller.on_bytes(b"mute=on/off!power=on/standby!");
        let written = written(&controller);
        assert_eq!(&written[4..], ["get_volume!", "get_power!"]);
    }

    #[test]
    fn failing_transport_does_not_panic() {
        let mut controller = Controller::new(SessionConfig::default());
        controller.attach(FailingSink);
        controller.on_bytes(b"power=on/standby!power=standby!");
        assert_eq!(controller.snapshot().power, PowerState::Standby);
    }

    #[test]
    fn actions_write_wire_strings() {
        let mut controller = Controller::new(SessionConfig::default());
        controller.attach(RecordingSink::default());
        controller.select_source("Optical 1").unwrap();
        controller.set_volume_level(0.42).unwrap();
        assert_eq!(&written(&controller)[4..], ["opt1!", "volume_42!"]);
    }

    #[test]
    fn rejected_actions_write_nothing() {
        let mut controller = Controller::new(SessionConfig::default());
        controller.attach(RecordingSink::default());
        assert!(matches!(
            controller.select_source("Vinyl"),
            Err(SessionError::UnknownSourceName { .. })
        ));
        assert!(controller.set_volume_level(2.0).is_err());
        assert_eq!(written(&controller).len(), 4);
    }

    #[test]
    fn diagnostics_from_decoder_and_session_are_collected() {
        let mut controller = Controller::new(SessionConfig::default());
        controller.attach(RecordingSink::default());
        controller.on_bytes(b"hello!source=vinyl!source=cd!display=004,ab");
        controller.finish();
        assert_eq!(controller.snapshot().source, Source::Cd);

        let ids: Vec<_> = controller
            .take_diagnostics()
            .iter()
            .map(Diagnostic::id)
            .collect();
        assert_eq!(
            ids,
            vec![
                "RS-MALFORMED-TOKEN",
                "RS-UNKNOWN-SOURCE",
                "RS-TRUNCATED-DISPLAY"
            ]
        );
        assert!(controller.take_diagnostics().is_empty());
    }

    #[test]
    fn noisy_stream_keeps_diagnostics_bounded() {
        let mut controller = Controller::new(SessionConfig::default());
        controller.attach(RecordingSink::default());
        for _ in 0..10_000 {
            assert_eq!(controller.on_bytes(b"noise!tone=1!").len(), 1);
        }

        let summaries = controller.diagnostic_summaries();
        let counts: Vec<_> = summaries
            .iter()
            .map(|summary| (summary.id.as_str(), summary.count, summary.examples.len()))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("RS-MALFORMED-TOKEN", 10_000, 3),
                ("RS-UNKNOWN-FIELD", 10_000, 3)
            ]
        );
        assert_eq!(controller.diagnostic_count(), 20_000);
        assert_eq!(controller.take_diagnostics().len(), MAX_RETAINED_DIAGNOSTICS);
        assert!(controller.take_diagnostics().is_empty());
    }

    #[test]
    fn large_chunk_counts_every_malformed_token() {
        let mut controller = Controller::new(SessionConfig::default());
        controller.attach(RecordingSink::default());
        controller.on_bytes(&[b'!'; 1000]);
        assert_eq!(controller.diagnostic_count(), 1000);
    }
}
