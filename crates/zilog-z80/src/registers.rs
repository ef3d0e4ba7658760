//! Z80 register file.

/// Z80 programmer-visible registers.
///
/// The 8-bit registers are stored individually and the pairs are composed
/// on access, so writing one half of a pair never disturbs the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    // Main registers
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    // Alternate registers
    pub a_alt: u8,
    pub f_alt: u8,
    pub b_alt: u8,
    pub c_alt: u8,
    pub d_alt: u8,
    pub e_alt: u8,
    pub h_alt: u8,
    pub l_alt: u8,

    // Index registers
    pub ix: u16,
    pub iy: u16,

    pub sp: u16,
    pub pc: u16,
    /// Interrupt vector base.
    pub i: u8,
    /// Memory refresh counter. Bits 0-6 count opcode fetches; bit 7 only
    /// changes through `LD R,A`.
    pub r: u8,

    /// WZ/MEMPTR: internal temporary, visible through BIT n,(HL) flags.
    pub wz: u16,

    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,
}

macro_rules! pair {
    ($get:ident, $set:ident, $hi:ident, $lo:ident) => {
        #[must_use]
        pub const fn $get(&self) -> u16 {
            u16::from_be_bytes([self.$hi, self.$lo])
        }

        pub fn $set(&mut self, value: u16) {
            [self.$hi, self.$lo] = value.to_be_bytes();
        }
    };
}

impl Registers {
    pair!(af, set_af, a, f);
    pair!(bc, set_bc, b, c);
    pair!(de, set_de, d, e);
    pair!(hl, set_hl, h, l);
    pair!(af_alt, set_af_alt, a_alt, f_alt);
    pair!(bc_alt, set_bc_alt, b_alt, c_alt);
    pair!(de_alt, set_de_alt, d_alt, e_alt);
    pair!(hl_alt, set_hl_alt, h_alt, l_alt);

    #[must_use]
    pub const fn ixh(&self) -> u8 {
        (self.ix >> 8) as u8
    }

    #[must_use]
    pub const fn ixl(&self) -> u8 {
        self.ix as u8
    }

    #[must_use]
    pub const fn iyh(&self) -> u8 {
        (self.iy >> 8) as u8
    }

    #[must_use]
    pub const fn iyl(&self) -> u8 {
        self.iy as u8
    }

    pub fn set_ixh(&mut self, value: u8) {
        self.ix = (self.ix & 0x00FF) | (u16::from(value) << 8);
    }

    pub fn set_ixl(&mut self, value: u8) {
        self.ix = (self.ix & 0xFF00) | u16::from(value);
    }

    pub fn set_iyh(&mut self, value: u8) {
        self.iy = (self.iy & 0x00FF) | (u16::from(value) << 8);
    }

    pub fn set_iyl(&mut self, value: u8) {
        self.iy = (self.iy & 0xFF00) | u16::from(value);
    }

    /// `EX AF,AF'`
    pub fn exchange_af(&mut self) {
        std::mem::swap(&mut self.a, &mut self.a_alt);
        std::mem::swap(&mut self.f, &mut self.f_alt);
    }

    /// `EXX`
    pub fn exchange_main(&mut self) {
        std::mem::swap(&mut self.b, &mut self.b_alt);
        std::mem::swap(&mut self.c, &mut self.c_alt);
        std::mem::swap(&mut self.d, &mut self.d_alt);
        std::mem::swap(&mut self.e, &mut self.e_alt);
        std::mem::swap(&mut self.h, &mut self.h_alt);
        std::mem::swap(&mut self.l, &mut self.l_alt);
    }

    /// Bump the low seven bits of R, keeping bit 7.
    pub fn increment_r(&mut self) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
    }

    /// Check that pair and half views agree.
    ///
    /// A failure means every register access would be silently wrong, so
    /// machines run this once at construction and refuse to start on error.
    pub fn self_test() -> Result<(), String> {
        let mut regs = Self::default();
        regs.set_hl(1);
        if regs.h != 0 || regs.l != 1 {
            return Err(format!(
                "HL=0x0001 split into H={:#04X} L={:#04X}",
                regs.h, regs.l
            ));
        }
        regs.h = 0xAB;
        if regs.hl() != 0xAB01 {
            return Err(format!("writing H left HL={:#06X}", regs.hl()));
        }
        regs.set_ixl(0xCD);
        regs.set_ixh(0x12);
        if regs.ix != 0x12CD {
            return Err(format!("IX halves composed to {:#06X}", regs.ix));
        }
        Ok(())
    }
}
