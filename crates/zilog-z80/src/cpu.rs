//! Z80 CPU core stepped one opcode at a time.

use emu_core::{Bus, Cpu, Observable, Value};

use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
use crate::registers::Registers;

mod execute;
mod extended;

pub const OP_NOP: u8 = 0x00;
pub const OP_HALT: u8 = 0x76;
pub const OP_DI: u8 = 0xF3;
pub const OP_EI: u8 = 0xFB;

const IM1_HANDLER: u16 = 0x0038;
const NMI_HANDLER: u16 = 0x0066;

/// Which register an opcode's HL operand refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexReg {
    #[default]
    Hl,
    Ix,
    Iy,
}

/// Z80 CPU.
///
/// The CPU does not own the bus. The machine passes it to [`Z80::step`],
/// and the bus charges every access to the machine clock.
pub struct Z80 {
    pub regs: Registers,
    /// The opcode byte most recently fetched by [`Z80::step`]. Used to
    /// retire a HALT and to hold off interrupts after EI/DI.
    opcode: u8,
    /// Register the current opcode uses in place of HL.
    index: IndexReg,
    /// Register the next opcode will use in place of HL. A DD/FD prefix
    /// sets this and nothing else.
    next_index: IndexReg,
}

impl Z80 {
    /// A Z80 in its power-on state.
    #[must_use]
    pub fn new() -> Self {
        let mut cpu = Self {
            regs: Registers::default(),
            opcode: OP_NOP,
            index: IndexReg::Hl,
            next_index: IndexReg::Hl,
        };
        cpu.power_on();
        cpu
    }

    /// Power-on defaults. Most registers are only set here; the reset line
    /// leaves them alone.
    pub fn power_on(&mut self) {
        let regs = &mut self.regs;
        regs.set_af(0xFFFF);
        regs.set_bc(0xFFFF);
        regs.set_de(0xFFFF);
        regs.set_hl(0xFFFF);
        regs.set_af_alt(0xFFFF);
        regs.set_bc_alt(0xFFFF);
        regs.set_de_alt(0xFFFF);
        regs.set_hl_alt(0xFFFF);
        regs.ix = 0xFFFF;
        regs.iy = 0xFFFF;
        self.reset();
    }

    /// Apply the reset line: I, R, IM and both IFFs cleared, SP=0x8000,
    /// PC=0, no prefix pending and no previous opcode.
    pub fn reset(&mut self) {
        self.regs.i = 0;
        self.regs.r = 0;
        self.regs.im = 0;
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        self.regs.sp = 0x8000;
        self.regs.pc = 0x0000;
        self.index = IndexReg::Hl;
        self.next_index = IndexReg::Hl;
        self.opcode = OP_NOP;
    }

    /// Fetch and execute one opcode.
    ///
    /// A DD or FD prefix is a step of its own; it only redirects the HL
    /// operand of the following opcode.
    pub fn step<B: Bus>(&mut self, bus: &mut B) {
        self.index = self.next_index;
        self.next_index = IndexReg::Hl;

        let op = self.fetch_opcode(bus);
        self.opcode = op;
        self.execute(bus, op);
    }

    /// The opcode byte most recently fetched by [`Z80::step`].
    #[must_use]
    pub const fn last_opcode(&self) -> u8 {
        self.opcode
    }

    /// True between an index prefix and the opcode it applies to.
    #[must_use]
    pub fn prefix_pending(&self) -> bool {
        self.next_index != IndexReg::Hl
    }

    /// True if a maskable interrupt would be accepted right now.
    ///
    /// Interrupts are sampled one instruction late after EI or DI, and
    /// never between a prefix and its opcode.
    #[must_use]
    pub fn interrupt_ready(&self) -> bool {
        self.regs.iff1 && self.opcode != OP_EI && self.opcode != OP_DI && !self.prefix_pending()
    }

    /// Accept a maskable interrupt if [`Z80::interrupt_ready`]. Returns
    /// true if it was taken.
    pub fn take_interrupt<B: Bus>(&mut self, bus: &mut B) -> bool {
        if !self.interrupt_ready() {
            return false;
        }

        self.regs.iff1 = false;
        self.regs.iff2 = false;

        // The interrupt retires a HALT
        if self.opcode == OP_HALT {
            self.regs.pc = self.regs.pc.wrapping_add(1);
        }

        match self.regs.im {
            0 => {
                bus.delay(6);
                self.push(bus, self.regs.pc);
                self.regs.pc = IM1_HANDLER;
            }
            1 => {
                bus.delay(7);
                self.push(bus, self.regs.pc);
                self.regs.pc = IM1_HANDLER;
            }
            _ => {
                bus.delay(7);
                self.push(bus, self.regs.pc);
                // Vector table entry addressed by I and 0xFF from the data bus
                let vector = (u16::from(self.regs.i) << 8) | 0xFF;
                self.regs.pc = bus.read_word(vector);
            }
        }
        self.regs.wz = self.regs.pc;
        true
    }

    /// Take a non-maskable interrupt. Always accepted.
    pub fn nmi<B: Bus>(&mut self, bus: &mut B) {
        if bus.read_code(self.regs.pc) == OP_HALT {
            self.regs.pc = self.regs.pc.wrapping_add(1);
        }

        self.regs.iff2 = self.regs.iff1;
        self.regs.iff1 = false;
        bus.delay(2);

        self.push(bus, self.regs.pc);
        self.regs.pc = NMI_HANDLER;
        self.regs.wz = NMI_HANDLER;
    }

    // === Bus helpers ===

    /// M1 cycle: read the opcode, one refresh cycle, bump R.
    fn fetch_opcode<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let op = bus.read_code(self.regs.pc);
        bus.delay(1);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.regs.increment_r();
        op
    }

    fn fetch_byte<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read_code(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn fetch_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch_byte(bus);
        let hi = self.fetch_byte(bus);
        u16::from_le_bytes([lo, hi])
    }

    fn push<B: Bus>(&mut self, bus: &mut B, value: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(2);
        bus.write_word_reversed(self.regs.sp, value);
    }

    fn pop<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let value = bus.read_word(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(2);
        value
    }

    // === Register helpers ===

    /// HL, IX or IY for the current opcode.
    fn index_value(&self) -> u16 {
        match self.index {
            IndexReg::Hl => self.regs.hl(),
            IndexReg::Ix => self.regs.ix,
            IndexReg::Iy => self.regs.iy,
        }
    }

    fn set_index_value(&mut self, value: u16) {
        match self.index {
            IndexReg::Hl => self.regs.set_hl(value),
            IndexReg::Ix => self.regs.ix = value,
            IndexReg::Iy => self.regs.iy = value,
        }
    }

    /// Address of the `(HL)` operand, or `(IX+d)`/`(IY+d)` after a prefix.
    /// Indexed forms read the displacement and spend 5 internal cycles.
    fn operand_address<B: Bus>(&mut self, bus: &mut B) -> u16 {
        if self.index == IndexReg::Hl {
            return self.regs.hl();
        }
        let d = self.fetch_byte(bus) as i8;
        bus.delay(5);
        let address = self.index_value().wrapping_add_signed(i16::from(d));
        self.regs.wz = address;
        address
    }

    /// 8-bit register by opcode field (0=B .. 7=A; 6 is not a register).
    /// H and L become the index halves after a prefix.
    fn reg8(&self, r: u8) -> u8 {
        match (r, self.index) {
            (4, IndexReg::Ix) => self.regs.ixh(),
            (5, IndexReg::Ix) => self.regs.ixl(),
            (4, IndexReg::Iy) => self.regs.iyh(),
            (5, IndexReg::Iy) => self.regs.iyl(),
            _ => self.plain_reg8(r),
        }
    }

    fn set_reg8(&mut self, r: u8, value: u8) {
        match (r, self.index) {
            (4, IndexReg::Ix) => self.regs.set_ixh(value),
            (5, IndexReg::Ix) => self.regs.set_ixl(value),
            (4, IndexReg::Iy) => self.regs.set_iyh(value),
            (5, IndexReg::Iy) => self.regs.set_iyl(value),
            _ => self.set_plain_reg8(r, value),
        }
    }

    /// 8-bit register ignoring any prefix.
    fn plain_reg8(&self, r: u8) -> u8 {
        match r {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            _ => self.regs.a,
        }
    }

    fn set_plain_reg8(&mut self, r: u8, value: u8) {
        match r {
            0 => self.regs.b = value,
            1 => self.regs.c = value,
            2 => self.regs.d = value,
            3 => self.regs.e = value,
            4 => self.regs.h = value,
            5 => self.regs.l = value,
            _ => self.regs.a = value,
        }
    }

    /// Register pair by opcode field with SP at 3 (LD/INC/DEC/ADD forms).
    fn reg16_sp(&self, p: u8) -> u16 {
        match p {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.index_value(),
            _ => self.regs.sp,
        }
    }

    fn set_reg16_sp(&mut self, p: u8, value: u16) {
        match p {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.set_index_value(value),
            _ => self.regs.sp = value,
        }
    }

    /// Register pair by opcode field with AF at 3 (PUSH/POP).
    fn reg16_af(&self, p: u8) -> u16 {
        if p == 3 {
            self.regs.af()
        } else {
            self.reg16_sp(p)
        }
    }

    fn set_reg16_af(&mut self, p: u8, value: u16) {
        if p == 3 {
            self.regs.set_af(value);
        } else {
            self.set_reg16_sp(p, value);
        }
    }

    /// Condition code by opcode field: NZ, Z, NC, C, PO, PE, P, M.
    fn condition(&self, cc: u8) -> bool {
        let f = self.regs.f;
        match cc {
            0 => f & ZF == 0,
            1 => f & ZF != 0,
            2 => f & CF == 0,
            3 => f & CF != 0,
            4 => f & PF == 0,
            5 => f & PF != 0,
            6 => f & SF == 0,
            _ => f & SF != 0,
        }
    }
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu for Z80 {
    type Registers = Registers;

    fn step<B: Bus>(&mut self, bus: &mut B) {
        Z80::step(self, bus);
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.opcode == OP_HALT
    }

    fn interrupt<B: Bus>(&mut self, bus: &mut B) -> bool {
        self.take_interrupt(bus)
    }

    fn nmi<B: Bus>(&mut self, bus: &mut B) {
        Z80::nmi(self, bus);
    }

    fn reset(&mut self) {
        Z80::reset(self);
    }
}

const Z80_QUERY_PATHS: &[&str] = &[
    "a", "f", "b", "c", "d", "e", "h", "l",
    "af", "bc", "de", "hl",
    "af'", "bc'", "de'", "hl'",
    "ix", "iy", "ixh", "ixl", "iyh", "iyl",
    "sp", "pc", "i", "r", "wz",
    "flags.s", "flags.z", "flags.y", "flags.h",
    "flags.x", "flags.p", "flags.n", "flags.c",
    "iff1", "iff2", "im",
    "halted", "opcode", "prefix",
];

impl Observable for Z80 {
    fn query(&self, path: &str) -> Option<Value> {
        let regs = &self.regs;
        let value = match path {
            "a" => regs.a.into(),
            "f" => regs.f.into(),
            "b" => regs.b.into(),
            "c" => regs.c.into(),
            "d" => regs.d.into(),
            "e" => regs.e.into(),
            "h" => regs.h.into(),
            "l" => regs.l.into(),

            "af" => regs.af().into(),
            "bc" => regs.bc().into(),
            "de" => regs.de().into(),
            "hl" => regs.hl().into(),
            "af'" => regs.af_alt().into(),
            "bc'" => regs.bc_alt().into(),
            "de'" => regs.de_alt().into(),
            "hl'" => regs.hl_alt().into(),

            "ix" => regs.ix.into(),
            "iy" => regs.iy.into(),
            "ixh" => regs.ixh().into(),
            "ixl" => regs.ixl().into(),
            "iyh" => regs.iyh().into(),
            "iyl" => regs.iyl().into(),

            "sp" => regs.sp.into(),
            "pc" => regs.pc.into(),
            "i" => regs.i.into(),
            "r" => regs.r.into(),
            "wz" => regs.wz.into(),

            "flags.s" => (regs.f & SF != 0).into(),
            "flags.z" => (regs.f & ZF != 0).into(),
            "flags.y" => (regs.f & YF != 0).into(),
            "flags.h" => (regs.f & HF != 0).into(),
            "flags.x" => (regs.f & XF != 0).into(),
            "flags.p" => (regs.f & PF != 0).into(),
            "flags.n" => (regs.f & NF != 0).into(),
            "flags.c" => (regs.f & CF != 0).into(),

            "iff1" => regs.iff1.into(),
            "iff2" => regs.iff2.into(),
            "im" => regs.im.into(),

            "halted" => (self.opcode == OP_HALT).into(),
            "opcode" => self.opcode.into(),
            "prefix" => match self.next_index {
                IndexReg::Hl => "none",
                IndexReg::Ix => "ix",
                IndexReg::Iy => "iy",
            }
            .into(),

            _ => return None,
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        Z80_QUERY_PATHS
    }
}
