//! Zilog Z80 CPU, stepped one opcode at a time.
//!
//! The core never counts cycles itself. Every memory and port access goes
//! through the [`emu_core::Bus`], which charges the access cost (and any
//! contention) to the machine clock; internal cycles are charged with
//! `Bus::delay`. Instruction totals match the documented Z80 timings.
//!
//! DD/FD prefixes are executed as steps of their own that only select the
//! index register for the next opcode, so a machine can sample interrupts
//! between a prefix and its opcode exactly as the real part does.

mod alu;
mod cpu;
mod flags;
mod registers;

pub use cpu::{IndexReg, OP_DI, OP_EI, OP_HALT, OP_NOP, Z80};
pub use flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
pub use registers::Registers;
