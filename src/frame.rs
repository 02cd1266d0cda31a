//! Wire layout shared by command and reply frames.
//!
//! Every frame exchanged with the controller is exactly [`FRAME_SIZE`] bytes:
//!
//! | Byte | Command frame | Reply frame |
//! |------|---------------|-------------|
//! | 0 | Start marker (`0x47`) | Start marker (not validated) |
//! | 1 | Command code | reserved |
//! | 2 | Sub-code | reserved |
//! | 3 | Parameter | reserved |
//! | 4 | padding | Power (`1` = on) |
//! | 5 | padding | Fan boost (`1` = on) |
//! | 6 | padding | Flame effect (`1` = on) |
//! | 7 | padding | Desired temperature |
//! | 8 | padding | Room temperature |
//! | 9-13 | padding | reserved |
//! | 14-15 | Trailer (`0x31 0x46`) | Trailer (not validated) |
//!
//! # Example
//!
//! ```
//! use escea_fire::{FRAME_SIZE, START_MARKER, TRAILER};
//!
//! assert_eq!(FRAME_SIZE, 16);
//! assert_eq!(START_MARKER, 0x47);
//! assert_eq!(TRAILER, [0x31, 0x46]);
//! ```

/// Size of every frame on the wire, in bytes.
pub const FRAME_SIZE: usize = 16;

/// First byte of every frame.
pub const START_MARKER: u8 = 0x47;

/// Two-byte suffix of every frame.
pub const TRAILER: [u8; 2] = [0x31, 0x46];

pub(crate) const OFFSET_START: usize = 0;
pub(crate) const OFFSET_COMMAND: usize = 1;
pub(crate) const OFFSET_SUB_CODE: usize = 2;
pub(crate) const OFFSET_PARAMETER: usize = 3;
pub(crate) const OFFSET_TRAILER: usize = FRAME_SIZE - TRAILER.len();

pub(crate) const OFFSET_POWER: usize = 4;
pub(crate) const OFFSET_FAN_BOOST: usize = 5;
pub(crate) const OFFSET_FLAME_EFFECT: usize = 6;
pub(crate) const OFFSET_DESIRED_TEMP: usize = 7;
pub(crate) const OFFSET_ROOM_TEMP: usize = 8;

/// Returns an all-zero frame carrying the start marker and trailer.
pub(crate) fn blank() -> [u8; FRAME_SIZE] {
    let mut frame = [0u8; FRAME_SIZE];
    frame[OFFSET_START] = START_MARKER;
    frame[OFFSET_TRAILER..].copy_from_slice(&TRAILER);
    frame
}

/// Reads a flag byte: only the value `1` means "on".
#[inline]
pub(crate) fn read_flag(frame: &[u8; FRAME_SIZE], offset: usize) -> bool {
    frame[offset] == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_frame() {
        let frame = blank();
        assert_eq!(frame.len(), FRAME_SIZE);
        assert_eq!(frame[0], 0x47);
        assert!(frame[1..14].iter().all(|&b| b == 0));
        assert_eq!(&frame[14..], &[0x31, 0x46]);
    }

    #[test]
    fn test_trailer_offset() {
        assert_eq!(OFFSET_TRAILER, 14);
    }

    #[test]
    fn test_read_flag() {
        let mut frame = blank();
        frame[OFFSET_POWER] = 1;
        frame[OFFSET_FAN_BOOST] = 2;
        assert!(read_flag(&frame, OFFSET_POWER));
        assert!(!read_flag(&frame, OFFSET_FAN_BOOST));
        assert!(!read_flag(&frame, OFFSET_FLAME_EFFECT));
    }
}
