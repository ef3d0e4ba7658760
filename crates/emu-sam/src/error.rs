//! Machine construction errors.

use std::fmt;

/// Errors from building a machine.
#[derive(Debug)]
pub enum SamError {
    /// ROM image is not exactly 32 KiB.
    RomSize(usize),
    /// Internal RAM must be 16 or 32 pages.
    RamSize(u8),
    /// External memory is limited to 64 pages.
    ExternalSize(u8),
    /// Frame timing does not describe a usable frame.
    Timing(String),
    /// Register pair halves are not laid out as expected.
    RegisterLayout(String),
    /// Configuration block could not be parsed.
    Config(serde_json::Error),
}

impl fmt::Display for SamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RomSize(len) => write!(f, "ROM image must be 32768 bytes, got {len}"),
            Self::RamSize(pages) => {
                write!(f, "internal RAM must be 16 or 32 pages, got {pages}")
            }
            Self::ExternalSize(pages) => {
                write!(f, "external memory is limited to 64 pages, got {pages}")
            }
            Self::Timing(msg) => write!(f, "invalid frame timing: {msg}"),
            Self::RegisterLayout(msg) => write!(f, "register self-test failed: {msg}"),
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for SamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SamError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e)
    }
}
