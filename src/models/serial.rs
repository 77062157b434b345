use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Baud rates offered by the connection selector.
///
/// Only these five rates are accepted; anything else is rejected at parse
/// time so an invalid value in the settings file cannot reach the port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BaudRate {
    B4800,
    B9600,
    B19200,
    B38400,
    #[default]
    B115200,
}

/// Error returned when a number is not one of the supported baud rates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported baud rate: {0} (expected one of 4800, 9600, 19200, 38400, 115200)")]
pub struct UnsupportedBaudRate(pub u32);

impl BaudRate {
    /// All supported rates, in the order the selector lists them
    pub const ALL: [BaudRate; 5] = [
        BaudRate::B115200,
        BaudRate::B38400,
        BaudRate::B19200,
        BaudRate::B9600,
        BaudRate::B4800,
    ];

    pub fn as_u32(self) -> u32 {
        match self {
            BaudRate::B4800 => 4800,
            BaudRate::B9600 => 9600,
            BaudRate::B19200 => 19200,
            BaudRate::B38400 => 38400,
            BaudRate::B115200 => 115200,
        }
    }

    /// Position of this rate in [`BaudRate::ALL`]
    pub fn selector_index(self) -> usize {
        Self::ALL.iter().position(|b| *b == self).unwrap_or(0)
    }

    /// Rate at a selector position, if it is in range
    pub fn from_selector_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = UnsupportedBaudRate;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|b| b.as_u32() == value)
            .ok_or(UnsupportedBaudRate(value))
    }
}

impl From<BaudRate> for u32 {
    fn from(baud: BaudRate) -> Self {
        baud.as_u32()
    }
}

impl FromStr for BaudRate {
    type Err = UnsupportedBaudRate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<u32>().map_err(|_| UnsupportedBaudRate(0))?;
        Self::try_from(value)
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// Terminator appended to quick-send text before it is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// Send the text exactly as typed
    #[default]
    None,
    Cr,
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::None => "",
            LineEnding::Cr => "\r",
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// Append this terminator to `text`
    pub fn apply(self, text: &str) -> String {
        let mut payload = String::with_capacity(text.len() + 2);
        payload.push_str(text);
        payload.push_str(self.as_str());
        payload
    }
}

/// Identity of an open link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    pub device: String,
    pub baud_rate: BaudRate,
}

impl fmt::Display for LinkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.device, self.baud_rate)
    }
}

/// A serial device found during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortEntry {
    /// Path or name used to open the device (e.g. "/dev/ttyUSB0" or "COM3")
    pub device: String,

    /// Human-readable description
    pub description: String,
}

/// Selector label: `"<device> - <description>"`
impl fmt::Display for PortEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.device, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_entry_label() {
        let entry = PortEntry {
            device: "COM3".to_string(),
            description: "USB-SERIAL CH340".to_string(),
        };
        assert_eq!(entry.to_string(), "COM3 - USB-SERIAL CH340");
    }

    #[test]
    fn test_baud_rate_values() {
        let values: Vec<u32> = BaudRate::ALL.iter().map(|b| b.as_u32()).collect();
        assert_eq!(values, vec![115200, 38400, 19200, 9600, 4800]);
    }

    #[test]
    fn test_baud_rate_rejects_unknown() {
        assert_eq!(BaudRate::try_from(57600), Err(UnsupportedBaudRate(57600)));
        assert!("abc".parse::<BaudRate>().is_err());
        assert_eq!(" 9600 ".parse::<BaudRate>(), Ok(BaudRate::B9600));
    }

    #[test]
    fn test_baud_rate_selector_index() {
        for baud in BaudRate::ALL {
            assert_eq!(
                BaudRate::from_selector_index(baud.selector_index()),
                Some(baud)
            );
        }
        assert_eq!(BaudRate::from_selector_index(5), None);
        assert_eq!(BaudRate::default().selector_index(), 0);
    }

    #[test]
    fn test_baud_rate_yaml() {
        let yaml = serde_yaml_ng::to_string(&BaudRate::B19200).unwrap();
        assert_eq!(yaml.trim(), "19200");

        let parsed: Result<BaudRate, _> = serde_yaml_ng::from_str("1200");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_line_ending_apply() {
        assert_eq!(LineEnding::None.apply("AT"), "AT");
        assert_eq!(LineEnding::CrLf.apply("AT"), "AT\r\n");
        assert_eq!(LineEnding::Lf.apply(""), "\n");
    }

    #[test]
    fn test_link_info_display() {
        let info = LinkInfo {
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: BaudRate::B9600,
        };
        assert_eq!(info.to_string(), "/dev/ttyUSB0 @ 9600");
    }
}
