pub const TERMINATOR: u8 = b'!';
pub const SEPARATOR: u8 = b'=';

pub const DISPLAY_PREFIX: &[u8; 8] = b"display=";
pub const DISPLAY_LENGTH_RANGE: std::ops::Range<usize> = 8..11;
/// `display=` plus the three length digits.
pub const DISPLAY_HEADER_LEN: usize = 11;
/// Header plus the comma at index 11.
pub const DISPLAY_PAYLOAD_OFFSET: usize = 12;

pub const KEY_VOLUME: &str = "volume";
pub const KEY_POWER: &str = "power";
pub const KEY_MUTE: &str = "mute";
pub const KEY_SOURCE: &str = "source";
pub const KEY_FREQUENCY: &str = "freq";
pub const KEY_DISPLAY: &str = "display";
