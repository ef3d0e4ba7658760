//! ASIC register file.

use crate::regs::{
    BORD_BEEP_MASK, BORD_COLOUR_MASK, BORD_KEY_MASK, BORD_MIC_MASK, BORD_SOFF, CLUT_REGS,
    HMPR_PAGE_MASK, LMPR_PAGE_MASK, LMPR_ROM0_OFF, LMPR_ROM1, LMPR_WPROT, STATUS_INT_NONE,
    VMPR_MDE1_MASK, VMPR_MODE_MASK, VMPR_PAGE_MASK, VMPR_RXMIDI,
};
use crate::{FrameTiming, KeyMatrix, RasterPos};

/// Display mode from VMPR bits 5-6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenMode {
    Mode1,
    Mode2,
    Mode3,
    Mode4,
}

impl ScreenMode {
    #[must_use]
    pub const fn from_vmpr(vmpr: u8) -> Self {
        match (vmpr & VMPR_MODE_MASK) >> 5 {
            0 => Self::Mode1,
            1 => Self::Mode2,
            2 => Self::Mode3,
            _ => Self::Mode4,
        }
    }

    /// Modes 3 and 4 honour the screen-off bit.
    #[must_use]
    pub const fn is_hi_res(self) -> bool {
        matches!(self, Self::Mode3 | Self::Mode4)
    }
}

/// What a BORDER write changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BorderChange {
    /// Screen-off toggled while in mode 3 or 4.
    pub screen_off: bool,
    pub colour: bool,
    pub beeper: bool,
    /// The screen was off before the write.
    pub was_off: bool,
}

impl BorderChange {
    /// The display up to this point must be drawn with the old settings.
    #[must_use]
    pub const fn visible(&self) -> bool {
        self.screen_off || self.colour
    }
}

/// ASIC registers. Writes here only store state; scheduling and host
/// notification are up to the machine.
#[derive(Debug, Clone)]
pub struct Asic {
    /// Interrupt status, active low.
    pub status: u8,
    /// Line interrupt target. 0xFF (or any value past the screen) disables it.
    pub line_int: u8,
    /// Low pen bits and the MIDI transmit flag.
    pub lpen: u8,
    pub border: u8,
    pub lmpr: u8,
    pub hmpr: u8,
    /// Mode and page bits only.
    pub vmpr: u8,
    pub lepr: u8,
    pub hepr: u8,
    /// Value latched for the top bits of KEYBOARD reads.
    pub keyboard: u8,
    pub keys: KeyMatrix,
    clut: [u8; CLUT_REGS],
}

impl Default for Asic {
    fn default() -> Self {
        Self::new()
    }
}

impl Asic {
    /// Power-on state.
    #[must_use]
    pub fn new() -> Self {
        let mut asic = Self {
            status: STATUS_INT_NONE,
            line_int: 0xFF,
            lpen: 0,
            border: 0,
            lmpr: 0,
            hmpr: 0,
            vmpr: 0,
            lepr: 0,
            hepr: 0,
            keyboard: 0xFF,
            keys: KeyMatrix::new(),
            clut: [0; CLUT_REGS],
        };
        asic.reset();
        asic
    }

    /// Reset line. The line interrupt target, palette and keyboard survive.
    pub fn reset(&mut self) {
        self.status = STATUS_INT_NONE;
        self.lpen = 0;
        self.border = 0;
        self.lmpr = 0;
        self.hmpr = 0;
        self.vmpr = 0;
        self.lepr = 0;
        self.hepr = 0;
    }

    #[must_use]
    pub const fn mode(&self) -> ScreenMode {
        ScreenMode::from_vmpr(self.vmpr)
    }

    #[must_use]
    pub const fn screen_page(&self) -> u8 {
        self.vmpr & VMPR_PAGE_MASK
    }

    /// VMPR as read back from the port.
    #[must_use]
    pub const fn vmpr_read(&self) -> u8 {
        self.vmpr | VMPR_RXMIDI
    }

    /// True if the screen is blanked (only possible in modes 3 and 4).
    #[must_use]
    pub const fn screen_off(&self) -> bool {
        self.border & BORD_SOFF != 0 && self.mode().is_hi_res()
    }

    /// Memory is contended unless the screen is blanked.
    #[must_use]
    pub const fn contention_active(&self) -> bool {
        !self.screen_off()
    }

    #[must_use]
    pub const fn border_colour(&self) -> u8 {
        self.border & BORD_COLOUR_MASK
    }

    #[must_use]
    pub const fn lmpr_page(&self) -> u8 {
        self.lmpr & LMPR_PAGE_MASK
    }

    #[must_use]
    pub const fn hmpr_page(&self) -> u8 {
        self.hmpr & HMPR_PAGE_MASK
    }

    #[must_use]
    pub const fn rom0_paged(&self) -> bool {
        self.lmpr & LMPR_ROM0_OFF == 0
    }

    #[must_use]
    pub const fn rom1_paged(&self) -> bool {
        self.lmpr & LMPR_ROM1 != 0
    }

    #[must_use]
    pub const fn write_protected(&self) -> bool {
        self.lmpr & LMPR_WPROT != 0
    }

    /// True if a VMPR write changes the mode and either side is mode 3 or 4.
    #[must_use]
    pub const fn mode_change_is_immediate(&self, value: u8) -> bool {
        (value | self.vmpr) & VMPR_MDE1_MASK != 0
    }

    /// Store a BORDER write and report what changed.
    pub fn write_border(&mut self, value: u8) -> BorderChange {
        let diff = self.border ^ value;
        let change = BorderChange {
            screen_off: diff & BORD_SOFF != 0 && self.mode().is_hi_res(),
            colour: diff & BORD_COLOUR_MASK != 0,
            beeper: diff & BORD_BEEP_MASK != 0,
            was_off: self.border & BORD_SOFF != 0,
        };

        self.border = value;
        // MIC is reflected back to EAR
        self.keyboard = (self.keyboard & BORD_KEY_MASK)
            | (value & BORD_SOFF)
            | ((value & BORD_MIC_MASK) << 3);
        change
    }

    /// KEYBOARD port read.
    #[must_use]
    pub fn read_keyboard(&self, high: u8) -> u8 {
        (self.keyboard & 0xE0) | (self.keys.read_low(high) & 0x1F)
    }

    /// STATUS port read: keyboard top bits over the interrupt status.
    #[must_use]
    pub fn read_status(&self, high: u8) -> u8 {
        (self.keys.read_high(high) & 0xE0) | (self.status & 0x1F)
    }

    /// Store a palette entry. Returns true if it changed.
    pub fn write_clut(&mut self, index: u8, value: u8) -> bool {
        let index = usize::from(index) & (CLUT_REGS - 1);
        let value = value & 0x7F;
        let changed = self.clut[index] != value;
        self.clut[index] = value;
        changed
    }

    #[must_use]
    pub const fn clut(&self) -> &[u8; CLUT_REGS] {
        &self.clut
    }

    /// LPEN read: horizontal position within the main screen, 0 elsewhere,
    /// over the low two LPEN bits.
    #[must_use]
    pub fn read_lpen(&self, pos: RasterPos, timing: &FrameTiming) -> u8 {
        let border = timing.border_cycles as i32;
        let screen = timing.screen_cycles as i32;
        let in_screen = timing.is_screen_line(pos.line)
            && pos.line_cycle >= border
            && pos.line_cycle < border + screen;
        let x = if in_screen {
            (pos.line_cycle - border) as u8
        } else {
            0
        };
        (x & 0xFC) | (self.lpen & 0x03)
    }

    /// HPEN read: screen line number, or the screen height in the border.
    /// A line starts at the right border for this purpose.
    #[must_use]
    pub fn read_hpen(pos: RasterPos, timing: &FrameTiming) -> u8 {
        let ahead = (pos.line_cycle.max(0) as u32 + timing.border_cycles) / timing.tstates_per_line;
        let line = pos.line + ahead;
        if timing.is_screen_line(line) {
            (line - timing.top_border_lines) as u8
        } else {
            timing.screen_lines as u8
        }
    }

    /// ATTR read: 0xFF on border lines, 0 on screen lines.
    #[must_use]
    pub fn read_attr(pos: RasterPos, timing: &FrameTiming) -> u8 {
        if timing.is_screen_line(pos.line) { 0x00 } else { 0xFF }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::{LPEN_TXFMST, STATUS_INT_FRAME};

    #[test]
    fn modes_from_vmpr() {
        assert_eq!(ScreenMode::from_vmpr(0x00), ScreenMode::Mode1);
        assert_eq!(ScreenMode::from_vmpr(0x3F), ScreenMode::Mode2);
        assert_eq!(ScreenMode::from_vmpr(0x40), ScreenMode::Mode3);
        assert_eq!(ScreenMode::from_vmpr(0x60), ScreenMode::Mode4);
        assert!(!ScreenMode::Mode2.is_hi_res());
    }

    #[test]
    fn screen_off_only_in_hi_res_modes() {
        let mut asic = Asic::new();
        asic.write_border(BORD_SOFF);
        assert!(!asic.screen_off());
        assert!(asic.contention_active());

        asic.vmpr = 0x60;
        assert!(asic.screen_off());
        assert!(!asic.contention_active());
    }

    #[test]
    fn border_write_reports_changes_and_latches_keyboard() {
        let mut asic = Asic::new();
        asic.vmpr = 0x40;
        let change = asic.write_border(BORD_SOFF | BORD_MIC_MASK | 0x02);
        assert!(change.screen_off);
        assert!(change.colour);
        assert!(!change.beeper);
        assert!(!change.was_off);
        assert_eq!(asic.keyboard & 0xC0, 0xC0);

        let change = asic.write_border(BORD_BEEP_MASK | 0x02);
        assert!(change.screen_off);
        assert!(change.was_off);
        assert!(change.beeper);
        assert!(!change.colour);
        assert_eq!(asic.keyboard & 0xC0, 0x00);
    }

    #[test]
    fn status_read_merges_keyboard_bits() {
        let mut asic = Asic::new();
        asic.status &= !STATUS_INT_FRAME;
        asic.keys.press(0, 7);
        assert_eq!(asic.read_status(0xFE), 0x7F & !STATUS_INT_FRAME);
        assert_eq!(asic.read_status(0xFF), 0xFF & !STATUS_INT_FRAME);
    }

    #[test]
    fn pen_positions() {
        let timing = FrameTiming::default();
        let mut asic = Asic::new();
        asic.lpen = LPEN_TXFMST | 0x01;

        let pos = RasterPos { line: 100, line_cycle: 64 + 0x47 };
        assert_eq!(asic.read_lpen(pos, &timing), 0x44 | 0x03);
        let border = RasterPos { line: 100, line_cycle: 10 };
        assert_eq!(asic.read_lpen(border, &timing), 0x03);

        assert_eq!(Asic::read_hpen(RasterPos { line: 100, line_cycle: 0 }, &timing), 32);
        // Right border counts as the next line
        assert_eq!(Asic::read_hpen(RasterPos { line: 100, line_cycle: 330 }, &timing), 33);
        assert_eq!(Asic::read_hpen(RasterPos { line: 10, line_cycle: 0 }, &timing), 192);
    }

    #[test]
    fn attr_reads_ff_in_border() {
        let timing = FrameTiming::default();
        assert_eq!(Asic::read_attr(RasterPos { line: 0, line_cycle: 0 }, &timing), 0xFF);
        assert_eq!(Asic::read_attr(RasterPos { line: 68, line_cycle: 0 }, &timing), 0x00);
    }

    #[test]
    fn clut_keeps_seven_bits() {
        let mut asic = Asic::new();
        assert!(asic.write_clut(0x13, 0xFF));
        assert_eq!(asic.clut()[3], 0x7F);
        assert!(!asic.write_clut(3, 0x7F));
    }

    #[test]
    fn reset_keeps_line_interrupt() {
        let mut asic = Asic::new();
        asic.line_int = 20;
        asic.lmpr = 0x1F;
        asic.reset();
        assert_eq!(asic.line_int, 20);
        assert_eq!(asic.lmpr, 0);
    }
}
