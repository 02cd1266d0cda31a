//! Reply frame parsing.
//!
//! This module is the decoding half of the frame codec. The controller answers
//! every command with a 16-byte frame; only the status fields are interpreted.
//!
//! # Status Fields
//!
//! | Byte | Field | Meaning |
//! |------|-------|---------|
//! | 4 | power | `1` = burner on |
//! | 5 | fan boost | `1` = engaged |
//! | 6 | flame effect | `1` = engaged |
//! | 7 | desired temperature | raw byte, °C |
//! | 8 | room temperature | raw byte, °C |
//!
//! All other bytes, the start marker and trailer included, are reserved and
//! never validated: once a frame of the right length arrives from the device
//! it is trusted.
//!
//! # Example
//!
//! ```
//! use escea_fire::DeviceStatus;
//!
//! let bytes = [
//!     0x47, 0x31, 0x00, 0x00, // marker, reserved
//!     0x01, 0x00, 0x01,       // power, fan boost, flame effect
//!     0x15, 0x12,             // desired 21°C, room 18°C
//!     0x00, 0x00, 0x00, 0x00, 0x00,
//!     0x31, 0x46,             // trailer
//! ];
//!
//! let status = DeviceStatus::from_bytes(&bytes).unwrap();
//! assert!(status.power);
//! assert!(!status.fan_boost);
//! assert_eq!(status.room_temp, 18);
//! ```

use crate::error::{FireError, Result};
use crate::frame::{
    self, FRAME_SIZE, OFFSET_DESIRED_TEMP, OFFSET_FAN_BOOST, OFFSET_FLAME_EFFECT, OFFSET_POWER,
    OFFSET_ROOM_TEMP, OFFSET_START,
};

/// A reply frame received from the controller.
///
/// Only exists transiently between the transport and the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyFrame {
    bytes: [u8; FRAME_SIZE],
}

impl ReplyFrame {
    /// Wraps a received datagram.
    ///
    /// # Errors
    ///
    /// Returns `FireError::MalformedReply` if `data` is not exactly 16 bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use escea_fire::ReplyFrame;
    ///
    /// assert!(ReplyFrame::from_bytes(&[0u8; 16]).is_ok());
    /// assert!(ReplyFrame::from_bytes(&[0u8; 15]).is_err());
    /// ```
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let bytes: [u8; FRAME_SIZE] = data.try_into().map_err(|_| {
            FireError::malformed_reply(format!(
                "expected {} bytes, got {}",
                FRAME_SIZE,
                data.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Returns the start marker byte as received.
    pub fn start_marker(&self) -> u8 {
        self.bytes[OFFSET_START]
    }

    /// Returns the raw frame bytes.
    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.bytes
    }

    /// Decodes the status fields of this reply.
    pub fn status(&self) -> DeviceStatus {
        DeviceStatus {
            power: frame::read_flag(&self.bytes, OFFSET_POWER),
            fan_boost: frame::read_flag(&self.bytes, OFFSET_FAN_BOOST),
            flame_effect: frame::read_flag(&self.bytes, OFFSET_FLAME_EFFECT),
            desired_temp: self.bytes[OFFSET_DESIRED_TEMP],
            room_temp: self.bytes[OFFSET_ROOM_TEMP],
        }
    }
}

/// Status reported by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceStatus {
    /// Burner on.
    pub power: bool,
    /// Boost fan engaged.
    pub fan_boost: bool,
    /// Decorative flame-only mode engaged.
    pub flame_effect: bool,
    /// Target temperature in °C.
    pub desired_temp: u8,
    /// Measured room temperature in °C.
    pub room_temp: u8,
}

impl DeviceStatus {
    /// Decodes a status from a raw reply datagram.
    ///
    /// # Errors
    ///
    /// Returns `FireError::MalformedReply` if `data` is not exactly 16 bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(ReplyFrame::from_bytes(data)?.status())
    }
}

impl From<ReplyFrame> for DeviceStatus {
    fn from(reply: ReplyFrame) -> Self {
        reply.status()
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let on_off = |v: bool| if v { "on" } else { "off" };
        write!(
            f,
            "power {}, fan boost {}, flame effect {}, desired {}°C, room {}°C",
            on_off(self.power),
            on_off(self.fan_boost),
            on_off(self.flame_effect),
            self.desired_temp,
            self.room_temp
        )
    }
}
