//! Built-in program speed.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{byte, parse_byte};
use crate::errors::Error;

/// Playback speed byte for a built-in program, sent to the controller as-is.
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Speed {
    pub(crate) value: u8,
}

impl Speed {
    const FIELD: &'static str = "speed";

    pub fn new(value: u8) -> Self {
        Speed { value }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Create a speed from any integer.
    ///
    /// # Examples
    ///
    /// ```
    /// use ld382::Speed;
    ///
    /// assert!(Speed::create(0).is_ok());
    /// assert!(Speed::create(255).is_ok());
    /// assert!(Speed::create(300).is_err());
    /// ```
    pub fn create(value: i64) -> Result<Self, Error> {
        byte(Self::FIELD, value).map(Speed::new)
    }
}

impl From<u8> for Speed {
    fn from(value: u8) -> Self {
        Speed::new(value)
    }
}

impl FromStr for Speed {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        parse_byte(Self::FIELD, s).map(Speed::new)
    }
}
