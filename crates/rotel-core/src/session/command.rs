use std::fmt;

use super::error::SessionError;
use super::state::Source;

const TERMINATOR: char = '!';
pub(crate) const MAX_VOLUME: u8 = 100;

/// Outbound request, encoded as a literal wire string.
///
/// # Examples
/// ```
/// use rotel_core::Command;
///
/// assert_eq!(Command::GetPower.wire(), "get_power!");
/// assert_eq!(Command::select_source("Optical 1")?.wire(), "opt1!");
/// assert_eq!(Command::set_volume_level(0.42)?.wire(), "volume_42!");
/// # Ok::<(), rotel_core::SessionError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GetCurrentPower,
    GetVolume,
    GetCurrentSource,
    GetCurrentFreq,
    GetPower,
    PowerOn,
    PowerOff,
    Mute,
    VolumeUp,
    VolumeDown,
    /// Absolute volume, 0 to 100. Larger values encode as 100.
    SetVolume(u8),
    SelectSource(Source),
}

impl Command {
    /// Queries sent once the link is up, in order.
    pub const INITIAL_QUERIES: [Command; 4] = [
        Command::GetCurrentPower,
        Command::GetVolume,
        Command::GetCurrentSource,
        Command::GetCurrentFreq,
    ];

    pub fn wire(&self) -> String {
        match self {
            Command::SetVolume(level) => {
                format!("volume_{:02}{TERMINATOR}", (*level).min(MAX_VOLUME))
            }
            Command::SelectSource(source) => format!("{}{TERMINATOR}", source.wire_id()),
            other => format!("{}{TERMINATOR}", other.keyword()),
        }
    }

    /// Select an input by its front-panel name (`"Optical 1"`, `"CD"`, ...).
    ///
    /// # Errors
    /// Returns [`SessionError::UnknownSourceName`] for names outside the
    /// input table.
    pub fn select_source(name: &str) -> Result<Self, SessionError> {
        Source::from_display_name(name)
            .map(Command::SelectSource)
            .ok_or_else(|| SessionError::UnknownSourceName {
                name: name.to_string(),
            })
    }

    /// Set volume from a fraction of full scale, rounded to the nearest step.
    ///
    /// # Errors
    /// Returns [`SessionError::VolumeOutOfRange`] unless `level` is within
    /// `0.0..=1.0`.
    pub fn set_volume_level(level: f64) -> Result<Self, SessionError> {
        if !(0.0..=1.0).contains(&level) {
            return Err(SessionError::VolumeOutOfRange { level });
        }
        let step = (level * f64::from(MAX_VOLUME)).round() as u8;
        Ok(Command::SetVolume(step.min(MAX_VOLUME)))
    }

    fn keyword(&self) -> &'static str {
        match self {
            Command::GetCurrentPower => "get_current_power",
            Command::GetVolume => "get_volume",
            Command::GetCurrentSource => "get_current_source",
            Command::GetCurrentFreq => "get_current_freq",
            Command::GetPower => "get_power",
            Command::PowerOn => "power_on",
            Command::PowerOff => "power_off",
            Command::Mute => "mute",
            Command::VolumeUp => "volume_up",
            Command::VolumeDown => "volume_down",
            Command::SetVolume(_) => "volume",
            Command::SelectSource(source) => source.wire_id(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire())
    }
}

#[cfg(test)]
mod tests {
    use super::Command;
    use crate::session::error::SessionError;
    use crate::session::state::Source;

    #[test]
    fn set_volume_clamps_to_full_scale() {
        assert_eq!(Command::SetVolume(200).wire(), "volume_100!");
        assert_eq!(Command::SetVolume(7).wire(), "volume_07!");
    }

    #[test]
    fn queries_and_actions_encode_literally() {
        let cases = [
            (Command::GetCurrentPower, "get_current_power!"),
            (Command::GetVolume, "get_volume!"),
            (Command::GetCurrentSource, "get_current_source!"),
            (Command::GetCurrentFreq, "get_current_freq!"),
            (Command::GetPower, "get_power!"),
            (Command::PowerOn, "power_on!"),
            (Command::PowerOff, "power_off!"),
            (Command::Mute, "mute!"),
            (Command::VolumeUp, "volume_up!"),
            (Command::VolumeDown, "volume_down!"),
        ];
        for (command, wire) in cases {
            assert_eq!(command.wire(), wire);
        }
    }

    #[test]
    fn every_source_encodes_its_wire_id() {
        for source in Source::ALL {
            let command = Command::select_source(source.display_name()).unwrap();
            assert_eq!(command.wire(), format!("{}!", source.wire_id()));
        }
    }

    #[test]
    fn volume_is_zero_padded() {
        assert_eq!(Command::set_volume_level(0.0).unwrap().wire(), "volume_00!");
        assert_eq!(Command::set_volume_level(0.05).unwrap().wire(), "volume_05!");
        assert_eq!(Command::set_volume_level(0.42).unwrap().wire(), "volume_42!");
        assert_eq!(Command::set_volume_level(1.0).unwrap().wire(), "volume_100!");
    }

    #[test]
    fn volume_out_of_range_is_rejected() {
        assert!(matches!(
            Command::set_volume_level(1.5),
            Err(SessionError::VolumeOutOfRange { .. })
        ));
        assert!(Command::set_volume_level(-0.1).is_err());
        assert!(Command::set_volume_level(f64::NAN).is_err());
    }

    #[test]
    fn unknown_source_name_is_rejected() {
        let err = Command::select_source("Vinyl").unwrap_err();
        assert_eq!(
            err,
            SessionError::UnknownSourceName {
                name: "Vinyl".to_string()
            }
        );
    }
}
