//! Power mode for controller output.

use serde::{Deserialize, Serialize};

/// Power state for a controller's output.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PowerMode {
    /// Turn the output on
    On,
    /// Turn the output off
    Off,
}
