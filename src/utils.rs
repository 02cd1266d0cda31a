//! Helpers for displaying frames.
//!
//! Frames are logged and compared as space-separated uppercase hex, the same
//! way they are listed in protocol captures.
//!
//! # Example
//!
//! ```
//! use escea_fire::CommandFrame;
//! use escea_fire::utils::format_frame;
//!
//! let frame = CommandFrame::power_on();
//! assert_eq!(
//!     format_frame(frame.as_bytes()),
//!     "47 39 00 00 00 00 00 00 00 00 00 00 00 00 31 46"
//! );
//! ```

use std::fmt::Write;

/// Formats bytes as space-separated uppercase hex pairs.
///
/// # Example
///
/// ```
/// use escea_fire::utils::format_frame;
///
/// assert_eq!(format_frame(&[0x47, 0x3A]), "47 3A");
/// assert_eq!(format_frame(&[]), "");
/// ```
pub fn format_frame(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:02X}", byte);
    }
    out
}
