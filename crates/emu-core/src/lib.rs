//! Core traits and types for cycle-accurate emulation.
//!
//! Time is counted in CPU T-states. The bus owns the clock: every timed
//! access advances it, so a CPU core never counts cycles itself.

mod bus;
mod cpu;
mod observable;

pub use bus::{Bus, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
