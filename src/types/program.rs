//! Built-in effect programs.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::errors::Error;

/// Effect programs stored in the controller firmware.
///
/// Names parse from snake_case, e.g. `"seven_color_cross_fade"`.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProgramMode {
    SevenColorCrossFade = 0x25,
    RedGradualChange = 0x26,
    GreenGradualChange = 0x27,
    BlueGradualChange = 0x28,
    YellowGradualChange = 0x29,
    CyanGradualChange = 0x2a,
    PurpleGradualChange = 0x2b,
    WhiteGradualChange = 0x2c,
    RedGreenCrossFade = 0x2d,
    RedBlueCrossFade = 0x2e,
    GreenBlueCrossFade = 0x2f,
    SevenColorStrobeFlash = 0x30,
    RedStrobeFlash = 0x31,
    GreenStrobeFlash = 0x32,
    BlueStrobeFlash = 0x33,
    YellowStrobeFlash = 0x34,
    CyanStrobeFlash = 0x35,
    PurpleStrobeFlash = 0x36,
    WhiteStrobeFlash = 0x37,
    SevenColorJumping = 0x38,
}

impl ProgramMode {
    pub fn create(code: u8) -> Option<Self> {
        ProgramMode::iter().find(|program| program.code() == code)
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Look a program up by its snake_case name.
    ///
    /// # Examples
    ///
    /// ```
    /// use ld382::ProgramMode;
    ///
    /// assert_eq!(ProgramMode::from_name("red_strobe_flash").unwrap().code(), 0x31);
    /// assert!(ProgramMode::from_name("disco").is_err());
    /// ```
    pub fn from_name(name: &str) -> Result<Self, Error> {
        name.trim()
            .to_lowercase()
            .parse()
            .map_err(|_| Error::UnknownProgram(name.to_string()))
    }
}
