//! White channel level.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{byte, parse_byte};
use crate::errors::Error;

/// Brightness of the dedicated white LED channel, from 0 (dark) to 255.
///
/// Setting white switches the RGB channels to full and drives the white
/// channel at this level.
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct White {
    pub(crate) value: u8,
}

impl White {
    const FIELD: &'static str = "white level";

    pub fn new(value: u8) -> Self {
        White { value }
    }

    /// Full brightness (255).
    pub fn full() -> Self {
        White { value: u8::MAX }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Create a white level from any integer.
    ///
    /// # Examples
    ///
    /// ```
    /// use ld382::White;
    ///
    /// assert_eq!(White::create(255).unwrap().value(), 255);
    /// assert!(White::create(256).is_err());
    /// assert!(White::create(-1).is_err());
    /// ```
    pub fn create(value: i64) -> Result<Self, Error> {
        byte(Self::FIELD, value).map(White::new)
    }
}

impl From<u8> for White {
    fn from(value: u8) -> Self {
        White::new(value)
    }
}

impl FromStr for White {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        parse_byte(Self::FIELD, s).map(White::new)
    }
}
