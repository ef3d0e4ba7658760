//! Keyboard matrix.
//!
//! Eight rows are scanned by clearing a bit in the high byte of the port
//! address. A ninth row holds the keys that are read with the high byte at
//! 0xFF. Bits are active low: the low five bits of each row come back on
//! KEYBOARD, the top three on STATUS.

/// Rows of the keyboard matrix, active low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMatrix {
    rows: [u8; 9],
}

impl Default for KeyMatrix {
    fn default() -> Self {
        Self { rows: [0xFF; 9] }
    }
}

impl KeyMatrix {
    pub const ROWS: usize = 9;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Press the key at `row`, `bit`.
    pub fn press(&mut self, row: usize, bit: u8) {
        if let Some(value) = self.rows.get_mut(row) {
            *value &= !(1 << (bit & 7));
        }
    }

    pub fn release(&mut self, row: usize, bit: u8) {
        if let Some(value) = self.rows.get_mut(row) {
            *value |= 1 << (bit & 7);
        }
    }

    pub fn release_all(&mut self) {
        self.rows = [0xFF; Self::ROWS];
    }

    #[must_use]
    pub fn row(&self, row: usize) -> u8 {
        self.rows.get(row).copied().unwrap_or(0xFF)
    }

    /// Low five bits for a KEYBOARD read, other bits set.
    #[must_use]
    pub fn read_low(&self, high: u8) -> u8 {
        if high == 0xFF {
            return self.rows[8] | 0xE0;
        }
        self.scan(high) | 0xE0
    }

    /// Top three bits for a STATUS read, other bits set.
    #[must_use]
    pub fn read_high(&self, high: u8) -> u8 {
        self.scan(high) | 0x1F
    }

    /// AND together every row whose select bit is clear.
    fn scan(&self, high: u8) -> u8 {
        (0..8)
            .filter(|row| high & (1 << row) == 0)
            .fold(0xFF, |value, row| value & self.rows[row])
    }
}
