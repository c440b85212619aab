//! # ARCOS Command Packets
//!
//! Encodes client commands for ARCOS-based differential-drive controllers.
//!
//! ## Packet Layout
//!
//! ```text
//! ┌──────┬──────┬───────┬─────────┬──────────┬───────────┬──────────────┐
//! │ 0xFA │ 0xFB │ count │ command │ arg type │ arg LE16  │ checksum BE16│
//! └──────┴──────┴───────┴─────────┴──────────┴───────────┴──────────────┘
//! ```
//!
//! - `count` is the number of bytes that follow it, checksum included.
//! - Integer arguments carry their magnitude; the sign lives in the argument
//!   type byte (`0x3B` positive or zero, `0x1B` negative).
//! - Commands without argument stop after the command byte.
//!
//! ## Checksum
//!
//! Sum of the big-endian 16-bit words over command and argument bytes,
//! truncated to 16 bits. An odd trailing byte is XORed into the low byte.

use bytes::{BufMut, Bytes, BytesMut};

/// Packet header bytes.
pub const ARCOS_HEADER: [u8; 2] = [0xFA, 0xFB];

/// Argument type byte: positive integer or zero.
pub const ARG_POSITIVE: u8 = 0x3B;

/// Argument type byte: negative integer (magnitude follows).
pub const ARG_NEGATIVE: u8 = 0x1B;

/// Largest magnitude an integer argument can carry.
pub const ARG_MAX: i32 = i16::MAX as i32;

/// Client command numbers.
pub mod command {
    /// Keep-alive
    pub const PULSE: u8 = 0;
    /// Enable (1) or disable (0) the motors
    pub const ENABLE: u8 = 4;
    /// Translational velocity, mm/s
    pub const VEL: u8 = 11;
    /// Relative heading change, degrees
    pub const DHEAD: u8 = 13;
    /// Rotational velocity, deg/s
    pub const RVEL: u8 = 21;
    /// Stop the rover, motors stay enabled
    pub const STOP: u8 = 29;
}

/// Computes the packet checksum over command and argument bytes.
///
/// # Examples
///
/// ```
/// use rover_pad::actuator::arcos::checksum;
///
/// // ENABLE 1
/// assert_eq!(checksum(&[0x04, 0x3B, 0x01, 0x00]), 0x053B);
/// ```
#[must_use]
pub fn checksum(body: &[u8]) -> u16 {
    let mut words = body.chunks_exact(2);
    let mut sum = words
        .by_ref()
        .fold(0u16, |acc, pair| acc.wrapping_add(u16::from_be_bytes([pair[0], pair[1]])));

    if let [last] = words.remainder() {
        sum ^= u16::from(*last);
    }

    sum
}

/// Encodes a command without argument.
///
/// # Examples
///
/// ```
/// use rover_pad::actuator::arcos::{encode_command, command};
///
/// let packet = encode_command(command::PULSE);
/// assert_eq!(&packet[..], &[0xFA, 0xFB, 0x03, 0x00, 0x00, 0x00]);
/// ```
#[must_use]
pub fn encode_command(command: u8) -> Bytes {
    frame(&[command])
}

/// Encodes a command with a signed integer argument.
///
/// The argument saturates at ±32767.
#[must_use]
pub fn encode_int_command(command: u8, argument: i32) -> Bytes {
    let clamped = argument.clamp(-ARG_MAX, ARG_MAX);
    let arg_type = if clamped < 0 { ARG_NEGATIVE } else { ARG_POSITIVE };
    let magnitude = clamped.unsigned_abs() as u16;
    let [lo, hi] = magnitude.to_le_bytes();

    frame(&[command, arg_type, lo, hi])
}

/// Wraps a body (command + arguments) into a complete packet.
fn frame(body: &[u8]) -> Bytes {
    let mut packet = BytesMut::with_capacity(ARCOS_HEADER.len() + 1 + body.len() + 2);
    packet.put_slice(&ARCOS_HEADER);
    packet.put_u8((body.len() + 2) as u8);
    packet.put_slice(body);
    packet.put_u16(checksum(body));
    packet.freeze()
}
