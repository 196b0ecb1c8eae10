//! Wire encoding for controller commands.
//!
//! A command is a short fixed-length byte sequence. The frame put on the wire
//! is the command followed by one checksum byte, the low byte of the sum of
//! every preceding byte. There is no length prefix and no reply.

use std::fmt;

use crate::types::{Color, PowerMode, ProgramMode, Speed, White};

/// Low byte of the sum of `bytes`.
///
/// # Examples
///
/// ```
/// assert_eq!(ld382::checksum(&[0x71, 0x23, 0x0f]), 0xa3);
/// ```
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

/// An encoded controller operation, without its checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    bytes: Vec<u8>,
}

impl Command {
    /// Wrap raw operation bytes.
    pub fn raw(bytes: impl Into<Vec<u8>>) -> Self {
        Command {
            bytes: bytes.into(),
        }
    }

    pub fn power_on() -> Self {
        Self::raw([0x71, 0x23, 0x0f])
    }

    pub fn power_off() -> Self {
        Self::raw([0x71, 0x24, 0x0f])
    }

    pub fn power(mode: PowerMode) -> Self {
        match mode {
            PowerMode::On => Self::power_on(),
            PowerMode::Off => Self::power_off(),
        }
    }

    /// Full RGB with the white channel at `level`.
    pub fn white(level: White) -> Self {
        Self::raw([0x31, 0xff, 0xff, 0xff, level.value(), 0x00, 0x0f])
    }

    pub fn rgb(color: Color) -> Self {
        Self::raw([
            0x31,
            color.red(),
            color.green(),
            color.blue(),
            0x00,
            0x00,
            0x00,
            0x30,
        ])
    }

    /// Run the firmware program `code` at `speed`.
    pub fn program(code: u8, speed: Speed) -> Self {
        Self::raw([0x61, code, speed.value()])
    }

    pub fn builtin_program(program: ProgramMode, speed: Speed) -> Self {
        Self::program(program.code(), speed)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn checksum(&self) -> u8 {
        checksum(&self.bytes)
    }

    /// The bytes written to the socket: the command plus its checksum.
    pub fn frame(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(self.bytes.len() + 1);
        frame.extend_from_slice(&self.bytes);
        frame.push(self.checksum());
        frame
    }
}

/// Renders as `0x71 0x23 0x0f`.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex_bytes(&self.bytes))
    }
}

pub(crate) fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:#04x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_checksummed(frame: &[u8]) {
        let (last, body) = frame.split_last().unwrap();
        let sum: u32 = body.iter().map(|b| *b as u32).sum();
        assert_eq!(*last as u32, sum % 256);
    }

    #[test]
    fn test_power_frames() {
        assert_eq!(Command::power_on().frame(), vec![0x71, 0x23, 0x0f, 0xa3]);
        assert_eq!(Command::power_off().frame(), vec![0x71, 0x24, 0x0f, 0xa4]);
        assert_eq!(Command::power(PowerMode::On), Command::power_on());
    }

    #[test]
    fn test_white_full() {
        assert_eq!(
            Command::white(White::full()).frame(),
            vec![0x31, 0xff, 0xff, 0xff, 0xff, 0x00, 0x0f, 0x3c]
        );
    }

    #[test]
    fn test_rgb_red() {
        assert_eq!(
            Command::rgb(Color::rgb(255, 0, 0)).frame(),
            vec![0x31, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x30, 0x60]
        );
    }

    #[test]
    fn test_program() {
        let cmd = Command::builtin_program(ProgramMode::SevenColorCrossFade, Speed::new(0x10));
        assert_eq!(cmd.bytes(), &[0x61, 0x25, 0x10]);
        assert_eq!(cmd.frame(), vec![0x61, 0x25, 0x10, 0x96]);
    }

    #[test]
    fn test_checksum_wraps() {
        let commands = [
            Command::white(White::new(0)),
            Command::white(White::new(0x80)),
            Command::rgb(Color::rgb(255, 255, 255)),
            Command::rgb(Color::rgb(1, 2, 3)),
            Command::program(0xff, Speed::new(0xff)),
            Command::raw(Vec::new()),
        ];
        for cmd in &commands {
            assert_checksummed(&cmd.frame());
        }
        assert_eq!(Command::raw(Vec::new()).frame(), vec![0x00]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::power_on().to_string(), "0x71 0x23 0x0f");
    }
}
