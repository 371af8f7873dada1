use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerState {
    On,
    Standby,
    #[default]
    Unknown,
}

impl PowerState {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "on" => Some(PowerState::On),
            "standby" => Some(PowerState::Standby),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuteState {
    On,
    Off,
    #[default]
    Unknown,
}

impl MuteState {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "on" => Some(MuteState::On),
            "off" => Some(MuteState::Off),
            _ => None,
        }
    }
}

/// Host-facing on/off view of the power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    On,
    Off,
    Unknown,
}

/// Amplifier input, serialized as its wire identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Phono,
    Cd,
    Tuner,
    Usb,
    Opt1,
    Opt2,
    Coax1,
    Coax2,
    Bluetooth,
    Aux1,
    Aux2,
}

impl Source {
    /// Every input, in front-panel order.
    pub const ALL: [Source; 11] = [
        Source::Phono,
        Source::Cd,
        Source::Tuner,
        Source::Usb,
        Source::Opt1,
        Source::Opt2,
        Source::Coax1,
        Source::Coax2,
        Source::Bluetooth,
        Source::Aux1,
        Source::Aux2,
    ];

    pub fn wire_id(self) -> &'static str {
        match self {
            Source::Phono => "phono",
            Source::Cd => "cd",
            Source::Tuner => "tuner",
            Source::Usb => "usb",
            Source::Opt1 => "opt1",
            Source::Opt2 => "opt2",
            Source::Coax1 => "coax1",
            Source::Coax2 => "coax2",
            Source::Bluetooth => "bluetooth",
            Source::Aux1 => "aux1",
            Source::Aux2 => "aux2",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Source::Phono => "Phono",
            Source::Cd => "CD",
            Source::Tuner => "Tuner",
            Source::Usb => "USB",
            Source::Opt1 => "Optical 1",
            Source::Opt2 => "Optical 2",
            Source::Coax1 => "Coax 1",
            Source::Coax2 => "Coax 2",
            Source::Bluetooth => "Bluetooth",
            Source::Aux1 => "Aux 1",
            Source::Aux2 => "Aux 2",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|source| source.wire_id() == value)
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|source| source.display_name() == name)
    }

    fn reports_frequency(self) -> bool {
        matches!(self, Source::Opt1 | Source::Opt2)
    }
}

/// Last known amplifier state.
///
/// Values the amplifier sends as text (volume, frequency, display) are kept
/// verbatim; helpers derive what a host shows.
///
/// # Examples
/// ```
/// use rotel_core::{AmplifierState, DeviceState, Source};
///
/// let mut state = AmplifierState::default();
/// assert_eq!(state.device_state(), DeviceState::Unknown);
/// assert_eq!(state.source, Source::Phono);
///
/// state.volume = "42".to_string();
/// state.source = Source::Opt1;
/// state.frequency = "44.1".to_string();
/// assert_eq!(state.volume_level(), Some(0.42));
/// assert_eq!(state.media_title(), "42 🔊  Optical 1 @ 44.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmplifierState {
    pub power: PowerState,
    /// Volume as sent by the amplifier, 0 to 100.
    pub volume: String,
    pub mute: MuteState,
    pub source: Source,
    pub frequency: String,
    pub display: String,
}

impl Default for AmplifierState {
    fn default() -> Self {
        Self {
            power: PowerState::Unknown,
            volume: "0".to_string(),
            mute: MuteState::Unknown,
            source: Source::default(),
            frequency: String::new(),
            display: String::new(),
        }
    }
}

impl AmplifierState {
    /// Volume as a fraction of full scale, when the stored value is numeric.
    pub fn volume_level(&self) -> Option<f64> {
        self.volume
            .trim()
            .parse::<u32>()
            .ok()
            .map(|volume| f64::from(volume) / 100.0)
    }

    pub fn is_muted(&self) -> bool {
        self.mute == MuteState::On
    }

    pub fn device_state(&self) -> DeviceState {
        match self.power {
            PowerState::On => DeviceState::On,
            PowerState::Standby => DeviceState::Off,
            PowerState::Unknown => DeviceState::Unknown,
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.display_name()
    }

    pub fn source_list() -> Vec<&'static str> {
        Source::ALL.iter().map(|source| source.display_name()).collect()
    }

    pub fn media_title(&self) -> String {
        if self.source.reports_frequency() {
            format!(
                "{} 🔊  {} @ {}",
                self.volume,
                self.source_name(),
                self.frequency
            )
        } else {
            format!("{} 🔊  {}", self.volume, self.source_name())
        }
    }
}
