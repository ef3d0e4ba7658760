//! Port numbers and register bit layouts.

// Ports at or above this low byte belong to the ASIC and are slot-aligned.
pub const BASE_ASIC_PORT: u8 = 0xF8;

// External memory paging
pub const LEPR_PORT: u8 = 0x80;
pub const HEPR_PORT: u8 = 0x81;

// Floppy drives: eight registers each
pub const FLOPPY_MASK: u8 = 0xF8;
pub const FLOPPY1_BASE: u8 = 0xE0;
pub const FLOPPY2_BASE: u8 = 0xF0;

pub const PRINTL1_STAT: u8 = 0xE8;
pub const PRINTL1_DATA: u8 = 0xE9;
pub const PRINTL2_STAT: u8 = 0xEA;
pub const PRINTL2_DATA: u8 = 0xEB;
pub const SERIAL1: u8 = 0xEC;
pub const SERIAL2: u8 = 0xED;

// S D Software IDE interface: register latch and 16-bit data via two reads
pub const SDIDE_REG: u8 = 0xBF;
pub const SDIDE_DATA: u8 = 0xBD;

// YAMOD.ATBUS IDE interface: eight registers
pub const YATBUS_MASK: u8 = 0xF8;
pub const YATBUS_BASE: u8 = 0x48;

/// SAMBUS clock below 0xFE00, DALLAS clock above.
pub const CLOCK_PORT: u8 = 0xEF;
pub const DALLAS_CLOCK_BASE: u16 = 0xFE00;

/// LPEN on reads with bit 8 of the port clear, HPEN with it set.
pub const LPEN_PORT: u8 = 0xF8;
pub const PEN_MASK: u16 = 0x01FF;
pub const HPEN_PORT: u16 = 0x01F8;
/// Palette registers on writes, selected by the high byte.
pub const CLUT_BASE_PORT: u8 = 0xF8;
pub const CLUT_REGS: usize = 16;

/// STATUS on reads, LINE on writes.
pub const STATUS_PORT: u8 = 0xF9;
pub const LINE_PORT: u8 = 0xF9;
pub const LMPR_PORT: u8 = 0xFA;
pub const HMPR_PORT: u8 = 0xFB;
pub const VMPR_PORT: u8 = 0xFC;
pub const MIDI_PORT: u8 = 0xFD;
/// KEYBOARD on reads, BORDER on writes.
pub const KEYBOARD_PORT: u8 = 0xFE;
pub const BORDER_PORT: u8 = 0xFE;
/// ATTR on reads, SOUND on writes.
pub const ATTR_PORT: u8 = 0xFF;
pub const SOUND_DATA: u8 = 0xFF;

// LMPR
pub const LMPR_PAGE_MASK: u8 = 0x1F;
pub const LMPR_ROM0_OFF: u8 = 0x20;
pub const LMPR_ROM1: u8 = 0x40;
pub const LMPR_WPROT: u8 = 0x80;

// HMPR
pub const HMPR_PAGE_MASK: u8 = 0x1F;
pub const HMPR_MD3COL_MASK: u8 = 0x60;
pub const HMPR_MCNTRL: u8 = 0x80;

// VMPR
pub const VMPR_PAGE_MASK: u8 = 0x1F;
pub const VMPR_MODE_MASK: u8 = 0x60;
/// Set for modes 3 and 4.
pub const VMPR_MDE1_MASK: u8 = 0x40;
/// MIDI IN line, always reads as one.
pub const VMPR_RXMIDI: u8 = 0x80;

// BORDER
pub const BORD_COLOUR_MASK: u8 = 0x27;
pub const BORD_MIC_MASK: u8 = 0x08;
pub const BORD_BEEP_MASK: u8 = 0x10;
/// Screen off, only honoured in modes 3 and 4.
pub const BORD_SOFF: u8 = 0x80;

/// Keyboard latch bits kept across border writes.
pub const BORD_KEY_MASK: u8 = 0x3F;

// STATUS, active low
pub const STATUS_INT_LINE: u8 = 0x01;
pub const STATUS_INT_MIDIIN: u8 = 0x04;
pub const STATUS_INT_FRAME: u8 = 0x08;
pub const STATUS_INT_MIDIOUT: u8 = 0x10;
pub const STATUS_INT_NONE: u8 = 0xFF;

// LPEN
/// MIDI transmit in progress.
pub const LPEN_TXFMST: u8 = 0x02;
