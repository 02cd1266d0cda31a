//! Command frames sent to the fireplace controller.
//!
//! This module is the encoding half of the frame codec. Each [`CommandFrame`]
//! is built fresh for one outbound operation and discarded after it is sent.
//!
//! # Command Types
//!
//! | Command | Code | Sub-code | Parameter |
//! |---------|------|----------|-----------|
//! | [`Command::StatusQuery`] | `0x31` | `0x00` | `0x00` |
//! | [`Command::PowerOn`] | `0x39` | `0x00` | `0x00` |
//! | [`Command::PowerOff`] | `0x3A` | `0x00` | `0x00` |
//! | [`Command::SetTemperature`] | `0x57` | `0x01` | target °C |
//!
//! # Example
//!
//! ```
//! use escea_fire::CommandFrame;
//!
//! let frame = CommandFrame::set_temperature(22.0).unwrap();
//! assert_eq!(
//!     frame.to_bytes(),
//!     [0x47, 0x57, 0x01, 0x16, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x31, 0x46]
//! );
//!
//! // Out of range values never reach the wire
//! assert!(CommandFrame::set_temperature(35.0).is_err());
//! ```

use std::fmt;

use crate::error::{FireError, Result};
use crate::frame::{self, FRAME_SIZE, OFFSET_COMMAND, OFFSET_PARAMETER, OFFSET_SUB_CODE};

/// Status query command code.
pub(crate) const CODE_STATUS_QUERY: u8 = 0x31;
/// Power on command code.
pub(crate) const CODE_POWER_ON: u8 = 0x39;
/// Power off command code.
pub(crate) const CODE_POWER_OFF: u8 = 0x3A;
/// Set temperature command code.
pub(crate) const CODE_SET_TEMPERATURE: u8 = 0x57;
/// Sub-code carried only by the set temperature command.
pub(crate) const SUB_CODE_SET_TEMPERATURE: u8 = 0x01;

/// A target temperature the controller accepts, in whole degrees Celsius.
///
/// The protocol has no fractional resolution, so fractional input is rounded
/// up: the commanded temperature is never below what was asked for.
///
/// # Example
///
/// ```
/// use escea_fire::Temperature;
///
/// assert_eq!(Temperature::from_celsius(21.2).unwrap().get(), 22);
/// assert_eq!(Temperature::new(10).unwrap().get(), 10);
/// assert!(Temperature::new(32).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Temperature(u8);

impl Temperature {
    /// Lowest settable temperature.
    pub const MIN: u8 = 10;
    /// Highest settable temperature.
    pub const MAX: u8 = 31;

    /// Creates a temperature from a whole number of degrees.
    ///
    /// # Errors
    ///
    /// Returns `FireError::Validation` if `celsius` is outside `MIN..=MAX`.
    pub fn new(celsius: u8) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&celsius) {
            return Err(out_of_range(celsius));
        }
        Ok(Self(celsius))
    }

    /// Creates a temperature from a possibly fractional value, rounding up.
    ///
    /// # Errors
    ///
    /// Returns `FireError::Validation` if the value is not finite or if the
    /// rounded value is outside `MIN..=MAX`.
    pub fn from_celsius(celsius: f64) -> Result<Self> {
        if !celsius.is_finite() {
            return Err(FireError::validation(
                "celsius",
                format!("{} is not a finite temperature", celsius),
            ));
        }

        let rounded = celsius.ceil();
        if rounded < f64::from(Self::MIN) || rounded > f64::from(Self::MAX) {
            return Err(out_of_range(rounded));
        }

        Ok(Self(rounded as u8))
    }

    /// Returns the temperature in degrees Celsius.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Temperature {
    type Error = FireError;

    fn try_from(celsius: u8) -> Result<Self> {
        Self::new(celsius)
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°C", self.0)
    }
}

fn out_of_range(value: impl fmt::Display) -> FireError {
    FireError::validation(
        "celsius",
        format!(
            "{} is outside {}..={}",
            value,
            Temperature::MIN,
            Temperature::MAX
        ),
    )
}

/// Logical commands understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Ask the controller for its current status.
    StatusQuery,
    /// Light the burner.
    PowerOn,
    /// Turn the burner off.
    PowerOff,
    /// Change the target temperature.
    SetTemperature(Temperature),
}

impl Command {
    /// Returns the command code written at byte 1.
    ///
    /// # Example
    ///
    /// ```
    /// use escea_fire::Command;
    ///
    /// assert_eq!(Command::StatusQuery.code(), 0x31);
    /// assert_eq!(Command::PowerOff.code(), 0x3A);
    /// ```
    pub fn code(self) -> u8 {
        match self {
            Command::StatusQuery => CODE_STATUS_QUERY,
            Command::PowerOn => CODE_POWER_ON,
            Command::PowerOff => CODE_POWER_OFF,
            Command::SetTemperature(_) => CODE_SET_TEMPERATURE,
        }
    }

    pub(crate) fn sub_code(self) -> u8 {
        match self {
            Command::SetTemperature(_) => SUB_CODE_SET_TEMPERATURE,
            _ => 0x00,
        }
    }

    pub(crate) fn parameter(self) -> u8 {
        match self {
            Command::SetTemperature(temperature) => temperature.get(),
            _ => 0x00,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::StatusQuery => write!(f, "status query"),
            Command::PowerOn => write!(f, "power on"),
            Command::PowerOff => write!(f, "power off"),
            Command::SetTemperature(temperature) => write!(f, "set temperature {}", temperature),
        }
    }
}

/// A 16-byte command frame ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    command: Command,
    bytes: [u8; FRAME_SIZE],
}

impl CommandFrame {
    /// Encodes a command into its frame.
    ///
    /// # Example
    ///
    /// ```
    /// use escea_fire::{Command, CommandFrame};
    ///
    /// let frame = CommandFrame::new(Command::PowerOn);
    /// assert_eq!(frame.as_bytes()[1], 0x39);
    /// ```
    pub fn new(command: Command) -> Self {
        let mut bytes = frame::blank();
        bytes[OFFSET_COMMAND] = command.code();
        bytes[OFFSET_SUB_CODE] = command.sub_code();
        bytes[OFFSET_PARAMETER] = command.parameter();
        Self { command, bytes }
    }

    /// Creates a status query frame.
    pub fn status_query() -> Self {
        Self::new(Command::StatusQuery)
    }

    /// Creates a power on or power off frame.
    pub fn power(on: bool) -> Self {
        if on {
            Self::power_on()
        } else {
            Self::power_off()
        }
    }

    /// Creates a power on frame.
    pub fn power_on() -> Self {
        Self::new(Command::PowerOn)
    }

    /// Creates a power off frame.
    pub fn power_off() -> Self {
        Self::new(Command::PowerOff)
    }

    /// Creates a set temperature frame, rounding `celsius` up to a whole degree.
    ///
    /// # Errors
    ///
    /// Returns `FireError::Validation` if the rounded value is outside 10..=31.
    /// The value is never clamped.
    pub fn set_temperature(celsius: f64) -> Result<Self> {
        Ok(Self::new(Command::SetTemperature(Temperature::from_celsius(
            celsius,
        )?)))
    }

    /// Returns the command this frame carries.
    pub fn command(&self) -> Command {
        self.command
    }

    /// Returns the frame bytes.
    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.bytes
    }

    /// Returns a copy of the frame bytes.
    pub fn to_bytes(&self) -> [u8; FRAME_SIZE] {
        self.bytes
    }
}
