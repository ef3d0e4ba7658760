//! Memory and I/O bus interface.

use std::collections::HashMap;

/// Timed memory and I/O bus for a Z80-family CPU.
///
/// Every timed access advances the machine clock by the access cost plus any
/// wait states the bus decides to insert. The CPU adds its internal cycles
/// with [`Bus::delay`]. Untimed access ([`Bus::peek`]/[`Bus::poke`]) is for
/// debuggers and tooling and has no side effects.
pub trait Bus {
    /// Timed data read (3 T-states plus wait states).
    fn read(&mut self, address: u16) -> u8;

    /// Timed data write (3 T-states plus wait states).
    fn write(&mut self, address: u16, value: u8);

    /// Timed instruction-stream read: opcodes, operands and displacements.
    ///
    /// Costs the same as [`Bus::read`] but is not reported to watchers of
    /// data reads.
    fn read_code(&mut self, address: u16) -> u8 {
        self.read(address)
    }

    /// Timed port read (4 T-states plus wait states).
    fn io_read(&mut self, port: u16) -> u8;

    /// Timed port write (4 T-states plus wait states).
    fn io_write(&mut self, port: u16, value: u8);

    /// Internal CPU cycles with no bus activity.
    fn delay(&mut self, tstates: u32);

    /// Untimed read.
    fn peek(&self, address: u16) -> u8;

    /// Untimed write.
    fn poke(&mut self, address: u16, value: u8);

    /// Timed little-endian word read.
    fn read_word(&mut self, address: u16) -> u16 {
        let lo = self.read(address);
        let hi = self.read(address.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    /// Timed little-endian word write, low byte first.
    fn write_word(&mut self, address: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write(address, lo);
        self.write(address.wrapping_add(1), hi);
    }

    /// Timed word write, high byte first. Stack pushes store in this order.
    fn write_word_reversed(&mut self, address: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write(address.wrapping_add(1), hi);
        self.write(address, lo);
    }

    /// Untimed little-endian word read.
    fn peek_word(&self, address: u16) -> u16 {
        u16::from_le_bytes([self.peek(address), self.peek(address.wrapping_add(1))])
    }
}

/// Flat 64 KiB RAM with uncontended timing. Used to test CPU cores.
///
/// Port reads return the value preloaded with [`SimpleBus::set_port`], or
/// 0xFF. Port writes are logged in order.
pub struct SimpleBus {
    pub ram: Vec<u8>,
    /// T-states elapsed.
    pub cycles: u64,
    ports: HashMap<u16, u8>,
    pub port_writes: Vec<(u16, u8)>,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ram: vec![0; 0x1_0000],
            cycles: 0,
            ports: HashMap::new(),
            port_writes: Vec::new(),
        }
    }

    /// Copy `bytes` into RAM starting at `address`.
    pub fn load(&mut self, address: u16, bytes: &[u8]) {
        for (i, &byte) in bytes.iter().enumerate() {
            self.ram[(usize::from(address) + i) & 0xFFFF] = byte;
        }
    }

    pub fn set_port(&mut self, port: u16, value: u8) {
        self.ports.insert(port, value);
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.cycles += 3;
        self.ram[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.cycles += 3;
        self.ram[usize::from(address)] = value;
    }

    fn io_read(&mut self, port: u16) -> u8 {
        self.cycles += 4;
        self.ports.get(&port).copied().unwrap_or(0xFF)
    }

    fn io_write(&mut self, port: u16, value: u8) {
        self.cycles += 4;
        self.port_writes.push((port, value));
    }

    fn delay(&mut self, tstates: u32) {
        self.cycles += u64::from(tstates);
    }

    fn peek(&self, address: u16) -> u8 {
        self.ram[usize::from(address)]
    }

    fn poke(&mut self, address: u16, value: u8) {
        self.ram[usize::from(address)] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_word_write_stores_high_byte_first() {
        struct Recorder(Vec<u16>);
        impl Bus for Recorder {
            fn read(&mut self, _: u16) -> u8 {
                0
            }
            fn write(&mut self, address: u16, _: u8) {
                self.0.push(address);
            }
            fn io_read(&mut self, _: u16) -> u8 {
                0xFF
            }
            fn io_write(&mut self, _: u16, _: u8) {}
            fn delay(&mut self, _: u32) {}
            fn peek(&self, _: u16) -> u8 {
                0
            }
            fn poke(&mut self, _: u16, _: u8) {}
        }

        let mut bus = Recorder(Vec::new());
        bus.write_word_reversed(0x7FFE, 0x1234);
        assert_eq!(bus.0, vec![0x7FFF, 0x7FFE]);
    }

    #[test]
    fn simple_bus_counts_access_costs() {
        let mut bus = SimpleBus::new();
        bus.write_word(0xFFFF, 0xBEEF);
        assert_eq!(bus.cycles, 6);
        assert_eq!(bus.peek(0xFFFF), 0xEF);
        assert_eq!(bus.peek(0x0000), 0xBE);
        bus.io_read(0x00FE);
        bus.delay(2);
        assert_eq!(bus.cycles, 12);
    }

    #[test]
    fn unset_ports_read_ff() {
        let mut bus = SimpleBus::new();
        bus.set_port(0x10FE, 0x1F);
        assert_eq!(bus.io_read(0x10FE), 0x1F);
        assert_eq!(bus.io_read(0x20FE), 0xFF);
    }
}
