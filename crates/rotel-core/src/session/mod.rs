//! Session controller.
//!
//! Reduces the decoded event stream into an [`AmplifierState`]. Push
//! notifications and query replies share one token shape, so both go through
//! [`Session::apply`]. When the amplifier reports a transition marker instead
//! of a concrete power or mute state, the session leaves the state alone and
//! asks for a follow-up query.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::diagnostics::Diagnostic;
use crate::protocol::{DecodedEvent, Field};

pub mod command;
pub mod error;
pub mod state;

pub use command::Command;
pub use error::SessionError;
pub use state::{AmplifierState, DeviceState, MuteState, PowerState, Source};

/// Power reply naming a transition rather than a state.
pub const AMBIGUOUS_POWER: &str = "on/standby";
/// Mute reply naming a transition rather than a state.
pub const AMBIGUOUS_MUTE: &str = "on/off";

pub const DEFAULT_DEVICE_NAME: &str = "ROTEL";

/// Diagnostics kept until [`Session::take_diagnostics`]; older ones are
/// dropped.
pub const MAX_PENDING_DIAGNOSTICS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Device name carried into reports and logs.
    pub name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DEVICE_NAME.to_string(),
        }
    }
}

/// Stateful reducer over decoded events.
///
/// # Examples
/// ```
/// use rotel_core::{Command, DecodedEvent, Field, PowerState, Session, SessionConfig};
///
/// let mut session = Session::new(SessionConfig::default());
/// let follow_up = session.apply(&DecodedEvent::new(Field::Power, "on/standby"));
/// assert_eq!(follow_up, vec![Command::GetPower]);
/// assert_eq!(session.snapshot().power, PowerState::Unknown);
///
/// assert!(session.apply(&DecodedEvent::new(Field::Power, "on")).is_empty());
/// assert_eq!(session.snapshot().power, PowerState::On);
/// ```
#[derive(Debug, Default)]
pub struct Session {
    config: SessionConfig,
    state: AmplifierState,
    diagnostics: VecDeque<Diagnostic>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: AmplifierState::default(),
            diagnostics: VecDeque::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Queries establishing a baseline once the transport is ready.
    pub fn start(&self) -> Vec<Command> {
        Command::INITIAL_QUERIES.to_vec()
    }

    /// Fold one event into the state, returning follow-up commands in the
    /// order they must be written.
    pub fn apply(&mut self, event: &DecodedEvent) -> Vec<Command> {
        let value = event.value.as_str();
        match &event.field {
            Field::Volume => self.state.volume = value.to_string(),
            Field::Power if value == AMBIGUOUS_POWER => {
                debug!(device = %self.config.name, "ambiguous power reply, querying");
                return vec![Command::GetPower];
            }
            Field::Power => match PowerState::from_wire(value) {
                Some(power) => self.state.power = power,
                None => {
                    warn!(device = %self.config.name, value, "unrecognized power state");
                    self.state.power = PowerState::Unknown;
                    self.record(Diagnostic::UnknownPower {
                        value: value.to_string(),
                    });
                }
            },
            // A mute transition is resolved by refreshing the volume reply.
            Field::Mute if value == AMBIGUOUS_MUTE => {
                debug!(device = %self.config.name, "ambiguous mute reply, querying");
                return vec![Command::GetVolume];
            }
            Field::Mute => match MuteState::from_wire(value) {
                Some(mute) => self.state.mute = mute,
                None => {
                    warn!(device = %self.config.name, value, "unrecognized mute state");
                    self.state.mute = MuteState::Unknown;
                    self.record(Diagnostic::UnknownMute {
                        value: value.to_string(),
                    });
                }
            },
            Field::Source => match Source::from_wire(value) {
                Some(source) => self.state.source = source,
                None => {
                    warn!(
                        device = %self.config.name,
                        value,
                        kept = self.state.source.wire_id(),
                        "unknown source, keeping previous"
                    );
                    self.record(Diagnostic::UnknownSource {
                        value: value.to_string(),
                    });
                }
            },
            Field::Frequency => self.state.frequency = value.to_string(),
            Field::Display => self.state.display = value.to_string(),
            Field::Unknown(key) => {
                debug!(device = %self.config.name, key = %key, value, "ignoring unknown field");
                self.record(Diagnostic::UnknownField {
                    key: key.clone(),
                    value: value.to_string(),
                });
            }
        }
        Vec::new()
    }

    pub fn state(&self) -> &AmplifierState {
        &self.state
    }

    pub fn snapshot(&self) -> AmplifierState {
        self.state.clone()
    }

    pub fn encode(&self, command: Command) -> String {
        command.wire()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain(..).collect()
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        if self.diagnostics.len() == MAX_PENDING_DIAGNOSTICS {
            self.diagnostics.pop_front();
        }
        self.diagnostics.push_back(diagnostic);
    }
}
