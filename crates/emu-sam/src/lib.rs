//! SAM Coupé emulation core.
//!
//! The machine is driven one instruction at a time. The CPU never counts
//! cycles itself: every access goes through [`SamBus`], which charges the
//! T-states (plus contention) to the line cycle counter. Cycle time moves to
//! the global counter when the bus processes events, and events are how the
//! ASIC raises interrupts, ends lines and frames, and polls input without a
//! thread or timer of its own.
//!
//! Peripherals sit behind [`IoDevice`] and the platform behind [`Host`];
//! both default to doing nothing.

mod bus;
mod config;
mod error;
mod events;
mod host;
mod io;
mod memory;
mod sam;

pub use bus::{AccessTrace, Clock, SamBus};
pub use config::SamConfig;
pub use error::SamError;
pub use events::{Event, EventKind, EventQueue};
pub use host::{Host, NullHost};
pub use io::{IoDevice, NullDevice, Peripherals};
pub use memory::{Memory, Page, PhysAddr};
pub use sam::Sam;
