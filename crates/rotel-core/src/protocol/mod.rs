//! Amplifier wire protocol decoding.
//!
//! The stream mixes two framings: `key=value!` tokens closed by a terminator,
//! and a single length-prefixed field, `display=LLL,<payload>`, whose payload
//! is taken by count and may itself contain `!`. The decoder is purely
//! syntactic and knows nothing about amplifier semantics.
//!
//! Layering follows the other decoders in this crate:
//! - `layout`: literal prefixes, offsets and wire keys
//! - `reader`: header and token conventions
//! - `parser`: the incremental state machine
//! - `error`: conditions reported without stopping the stream
//!
//! Version française (résumé):
//! Le décodeur découpe le flux en jetons `clé=valeur!` et en champ `display`
//! à longueur fixe. Il conserve son état entre deux appels, de sorte que le
//! découpage des octets reçus n'influe pas sur le résultat.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::ProtocolError;
pub use parser::{FrameDecoder, MAX_PENDING_ISSUES};

/// Quantity named by a decoded token.
///
/// Serialized as its wire key (`freq` for [`Field::Frequency`]); unknown keys
/// round-trip verbatim.
///
/// # Examples
/// ```
/// use rotel_core::Field;
///
/// assert_eq!(Field::from_key("freq"), Field::Frequency);
/// assert_eq!(Field::from_key("tone"), Field::Unknown("tone".to_string()));
/// assert_eq!(Field::Frequency.key(), "freq");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Field {
    Volume,
    Power,
    Mute,
    Source,
    Frequency,
    Display,
    Unknown(String),
}

impl Field {
    pub fn from_key(key: &str) -> Self {
        match key {
            layout::KEY_VOLUME => Field::Volume,
            layout::KEY_POWER => Field::Power,
            layout::KEY_MUTE => Field::Mute,
            layout::KEY_SOURCE => Field::Source,
            layout::KEY_FREQUENCY => Field::Frequency,
            layout::KEY_DISPLAY => Field::Display,
            other => Field::Unknown(other.to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Field::Volume => layout::KEY_VOLUME,
            Field::Power => layout::KEY_POWER,
            Field::Mute => layout::KEY_MUTE,
            Field::Source => layout::KEY_SOURCE,
            Field::Frequency => layout::KEY_FREQUENCY,
            Field::Display => layout::KEY_DISPLAY,
            Field::Unknown(key) => key,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl From<Field> for String {
    fn from(field: Field) -> Self {
        match field {
            Field::Unknown(key) => key,
            known => known.key().to_string(),
        }
    }
}

impl From<String> for Field {
    fn from(key: String) -> Self {
        Field::from_key(&key)
    }
}

/// One decoded token, in arrival order.
///
/// # Examples
/// ```
/// use rotel_core::{DecodedEvent, Field};
///
/// let event = DecodedEvent::new(Field::Source, "coax2");
/// assert_eq!(event.field, Field::Source);
/// assert_eq!(event.value, "coax2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedEvent {
    pub field: Field,
    pub value: String,
}

impl DecodedEvent {
    pub fn new(field: Field, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}
