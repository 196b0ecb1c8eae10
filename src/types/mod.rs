//! Validated value types for controller operations.
//!
//! Every byte the protocol carries is `0..=255`. The constructors taking wide
//! integers or strings report anything outside that range as
//! [`Error::OutOfRange`](crate::Error::OutOfRange) instead of clamping it.

mod color;
mod power;
mod program;
mod speed;
mod white;

pub use color::Color;
pub use power::PowerMode;
pub use program::ProgramMode;
pub use speed::Speed;
pub use white::White;

use crate::errors::Error;

pub(crate) fn byte(field: &'static str, value: i64) -> Result<u8, Error> {
    u8::try_from(value).map_err(|_| Error::out_of_range(field, value))
}

pub(crate) fn parse_byte(field: &'static str, input: &str) -> Result<u8, Error> {
    let value: i64 = input.trim().parse().map_err(|_| Error::InvalidNumber {
        field,
        input: input.to_string(),
    })?;
    byte(field, value)
}
