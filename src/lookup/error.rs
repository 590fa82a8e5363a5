//! Color lookup errors.

use thiserror::Error;

/// Errors building a [`ColorLookup`](super::ColorLookup) from hex strings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    /// A palette entry was not valid hexadecimal.
    #[error("invalid hex color {value:?}: {reason}")]
    InvalidColor { value: String, reason: String },

    /// A palette side exceeded the 256-entry index space.
    #[error("palette has {0} entries, maximum is 256")]
    PaletteTooLong(usize),
}
