//! RGB color representation.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::byte;
use crate::errors::Error;

/// An RGB color with red, green, and blue components (0-255 each).
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub(crate) red: u8,
    pub(crate) green: u8,
    pub(crate) blue: u8,
}

impl Color {
    /// Create a color with the given RGB values.
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Create a color from wide integers, rejecting components outside 0-255.
    ///
    /// # Examples
    ///
    /// ```
    /// use ld382::Color;
    ///
    /// assert_eq!(Color::try_rgb(255, 0, 0).unwrap(), Color::rgb(255, 0, 0));
    /// assert!(Color::try_rgb(0, 256, 0).is_err());
    /// ```
    pub fn try_rgb(red: i64, green: i64, blue: i64) -> Result<Self, Error> {
        Ok(Self::rgb(
            byte("red", red)?,
            byte("green", green)?,
            byte("blue", blue)?,
        ))
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Parse from a comma-separated string (e.g., "255,128,0").
    ///
    /// Each component is one to three decimal digits no greater than 255.
    fn from_str(s: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidColorString(s.to_string());

        let mut parts = [0u8; 3];
        let mut count = 0;
        for part in s.split(',') {
            if count == 3
                || part.is_empty()
                || part.len() > 3
                || !part.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(invalid());
            }
            let value: u16 = part.parse().map_err(|_| invalid())?;
            parts[count] = u8::try_from(value).map_err(|_| invalid())?;
            count += 1;
        }

        if count == 3 {
            Ok(Self::rgb(parts[0], parts[1], parts[2]))
        } else {
            Err(invalid())
        }
    }
}
