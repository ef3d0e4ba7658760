//! Machine configuration.

use sam_asic::{ASIC_STARTUP_DELAY, FrameTiming};
use serde::Deserialize;

use crate::SamError;
use crate::memory::{MAX_EXTERNAL_PAGES, ROM_SIZE};

/// Configuration for creating a [`Sam`](crate::Sam).
///
/// The options block can be read from JSON with [`SamConfig::from_json`];
/// the ROM image is always supplied by the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamConfig {
    /// ROM0 followed by ROM1, 32,768 bytes.
    #[serde(skip)]
    pub rom: Vec<u8>,
    /// Internal RAM: 16 pages (256K) or 32 pages (512K).
    pub ram_pages: u8,
    /// External memory pages reachable through LEPR/HEPR (0-64).
    pub external_pages: u8,
    pub timing: FrameTiming,
    /// T-states after power-on during which the ASIC ignores its ports.
    /// `None` for an ASIC that responds immediately.
    pub asic_startup_delay: Option<u64>,
}

impl Default for SamConfig {
    fn default() -> Self {
        Self {
            rom: vec![0; ROM_SIZE],
            ram_pages: 32,
            external_pages: 0,
            timing: FrameTiming::default(),
            asic_startup_delay: None,
        }
    }
}

impl SamConfig {
    /// Parse the options block. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SamError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Same configuration with a different ROM image.
    #[must_use]
    pub fn with_rom(mut self, rom: Vec<u8>) -> Self {
        self.rom = rom;
        self
    }

    /// Same configuration with an ASIC that ignores its ports for the
    /// first 49,152 T-states, like early production machines.
    #[must_use]
    pub fn with_asic_startup(mut self) -> Self {
        self.asic_startup_delay = Some(ASIC_STARTUP_DELAY);
        self
    }

    pub fn validate(&self) -> Result<(), SamError> {
        if self.rom.len() != ROM_SIZE {
            return Err(SamError::RomSize(self.rom.len()));
        }
        if self.ram_pages != 16 && self.ram_pages != 32 {
            return Err(SamError::RamSize(self.ram_pages));
        }
        if usize::from(self.external_pages) > MAX_EXTERNAL_PAGES {
            return Err(SamError::ExternalSize(self.external_pages));
        }
        self.timing.validate().map_err(SamError::Timing)
    }
}
