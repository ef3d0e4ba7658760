//! SAM Coupé ASIC.
//!
//! The ASIC generates the display, arbitrates memory between the CPU and the
//! video fetch, and owns the paging, border, keyboard and interrupt status
//! registers. This crate holds the parts of it that are pure data: frame
//! geometry, the memory contention table, register bit layouts and the
//! keyboard matrix. Scheduling and port side effects live in the machine.
//!
//! # Standalone IC
//!
//! No dependencies beyond optional `serde` for [`FrameTiming`], so the
//! timing block can be read from a configuration file.
//!
//! # Timing (PAL)
//!
//! - 384 CPU T-states per line, 312 lines per frame (119,808 per frame)
//! - 68 top border lines, 192 screen lines
//! - 64 T-states of left border, 256 T-states of screen per line
//! - Interrupts become active 320 T-states into the line before the one
//!   they name, and stay active for 128 T-states
//!
//! # Contention
//!
//! The CPU gets one memory slot in every 8 T-states while the ASIC fetches
//! screen data, and one in every 4 otherwise. Mode 1 fetches in alternate
//! 64 T-state blocks across the whole line, including the border.

mod asic;
mod contention;
mod keyboard;
pub mod regs;
mod timing;

pub use asic::{Asic, BorderChange, ScreenMode};
pub use contention::ContentionTable;
pub use keyboard::KeyMatrix;
pub use timing::{ASIC_STARTUP_DELAY, FrameTiming, RasterPos};
