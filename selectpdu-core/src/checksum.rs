//! Select protocol checksum
//!
//! The checksum is the running sum of every byte that precedes it in the
//! frame, HEAD included, masked to seven bits. It sits immediately before
//! the tail byte.

use tracing::trace;

use crate::constants::{CHECKSUM_MASK, offsets::TRAILER};

/// Calculate the checksum for the bytes preceding the checksum position
///
/// # Examples
///
/// ```
/// use selectpdu_core::checksum;
///
/// // Ping request: FE 03 00 01 10
/// assert_eq!(checksum::calculate(&[0xFE, 0x03, 0x00, 0x01, 0x10]), 0x12);
/// ```
pub fn calculate(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    let checksum = sum & CHECKSUM_MASK;

    trace!(
        len = bytes.len(),
        checksum = format!("0x{:02X}", checksum),
        "Calculated checksum"
    );

    checksum
}

/// Verify the checksum of a complete frame (checksum byte followed by tail)
///
/// Returns `false` for buffers too short to hold a checksum and tail.
pub fn verify(frame: &[u8]) -> bool {
    if frame.len() < TRAILER + 1 {
        return false;
    }
    let position = frame.len() - TRAILER;
    calculate(&frame[..position]) == frame[position]
}
