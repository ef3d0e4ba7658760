//! CPU core trait.

use crate::Bus;

/// An instruction-granular CPU core.
///
/// The bus is passed in, not owned, so the machine can keep its clock,
/// memory map and peripherals in one place. Each call to [`Cpu::step`]
/// performs one fetch/decode/execute; all cycle accounting happens through
/// the bus.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Fetch and execute one opcode.
    fn step<B: Bus>(&mut self, bus: &mut B);

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU is sitting on a HALT.
    fn is_halted(&self) -> bool;

    /// Accept a maskable interrupt if the CPU is able to. Returns true if
    /// it was taken.
    fn interrupt<B: Bus>(&mut self, bus: &mut B) -> bool;

    /// Take a non-maskable interrupt.
    fn nmi<B: Bus>(&mut self, bus: &mut B);

    /// Apply the hardware reset line.
    fn reset(&mut self);
}
