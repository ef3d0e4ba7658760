//! CB, DDCB/FDCB and ED instruction groups.

use emu_core::Bus;

use crate::alu;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, parity, sz53, sz53p};

use super::Z80;

impl Z80 {
    /// CB-prefixed rotates, shifts and bit operations on a register or (HL).
    pub(super) fn execute_cb<B: Bus>(&mut self, bus: &mut B) {
        let op = self.fetch_opcode(bus);
        let r = op & 7;

        if r == 6 {
            let address = self.regs.hl();
            let value = bus.read(address);
            bus.delay(1);
            // BIT n,(HL) takes its 5/3 flags from WZ
            let wz_high = (self.regs.wz >> 8) as u8;
            if let Some(result) = self.bit_op(op, value, wz_high) {
                bus.write(address, result);
            }
        } else {
            let value = self.plain_reg8(r);
            if let Some(result) = self.bit_op(op, value, value) {
                self.set_plain_reg8(r, result);
            }
        }
    }

    /// DDCB d op / FDCB d op. The displacement comes before the final
    /// opcode byte, which is read as an operand and does not bump R.
    pub(super) fn execute_index_cb<B: Bus>(&mut self, bus: &mut B) {
        let d = self.fetch_byte(bus) as i8;
        let op = self.fetch_byte(bus);
        bus.delay(2);

        let address = self.index_value().wrapping_add_signed(i16::from(d));
        self.regs.wz = address;
        let value = bus.read(address);
        bus.delay(1);

        if let Some(result) = self.bit_op(op, value, (address >> 8) as u8) {
            bus.write(address, result);
            // Undocumented: the result is also copied to the named register
            let r = op & 7;
            if r != 6 {
                self.set_plain_reg8(r, result);
            }
        }
    }

    /// Apply a CB-group operation to `value`. Returns the value to store,
    /// or `None` for BIT, which only sets flags. `xy` supplies the 5/3 flag
    /// bits for BIT.
    fn bit_op(&mut self, op: u8, value: u8, xy: u8) -> Option<u8> {
        let bit = (op >> 3) & 7;
        match op >> 6 {
            0 => {
                let result = alu::shift8(bit, value, self.regs.f);
                self.regs.f = result.flags;
                Some(result.value)
            }
            1 => {
                let set = value & (1 << bit);
                let mut f = (self.regs.f & CF) | HF | (xy & (YF | XF));
                if set == 0 {
                    f |= ZF | PF;
                } else if bit == 7 {
                    f |= SF;
                }
                self.regs.f = f;
                None
            }
            2 => Some(value & !(1 << bit)),
            _ => Some(value | (1 << bit)),
        }
    }

    /// ED-prefixed instructions. Undefined ED opcodes are 8 T-state NOPs.
    pub(super) fn execute_ed<B: Bus>(&mut self, bus: &mut B) {
        let op = self.fetch_opcode(bus);

        match op {
            // IN r, (C) (70 only sets flags)
            0x40 | 0x48 | 0x50 | 0x58 | 0x60 | 0x68 | 0x70 | 0x78 => {
                let port = self.regs.bc();
                let value = bus.io_read(port);
                self.regs.wz = port.wrapping_add(1);
                self.regs.f = (self.regs.f & CF) | sz53p(value);
                let r = (op >> 3) & 7;
                if r != 6 {
                    self.set_plain_reg8(r, value);
                }
            }

            // OUT (C), r (71 writes 0)
            0x41 | 0x49 | 0x51 | 0x59 | 0x61 | 0x69 | 0x71 | 0x79 => {
                let port = self.regs.bc();
                let r = (op >> 3) & 7;
                let value = if r == 6 { 0 } else { self.plain_reg8(r) };
                bus.io_write(port, value);
                self.regs.wz = port.wrapping_add(1);
            }

            // SBC HL, rr / ADC HL, rr
            0x42 | 0x52 | 0x62 | 0x72 | 0x4A | 0x5A | 0x6A | 0x7A => {
                bus.delay(7);
                let hl = self.regs.hl();
                let rr = self.ed_reg16((op >> 4) & 3);
                let carry = self.regs.f & CF != 0;
                let (value, flags) = if op & 0x08 == 0 {
                    alu::sbc16(hl, rr, carry)
                } else {
                    alu::adc16(hl, rr, carry)
                };
                self.regs.wz = hl.wrapping_add(1);
                self.regs.set_hl(value);
                self.regs.f = flags;
            }

            // LD (nn), rr
            0x43 | 0x53 | 0x63 | 0x73 => {
                let address = self.fetch_word(bus);
                bus.write_word(address, self.ed_reg16((op >> 4) & 3));
                self.regs.wz = address.wrapping_add(1);
            }

            // LD rr, (nn)
            0x4B | 0x5B | 0x6B | 0x7B => {
                let address = self.fetch_word(bus);
                let value = bus.read_word(address);
                match (op >> 4) & 3 {
                    0 => self.regs.set_bc(value),
                    1 => self.regs.set_de(value),
                    2 => self.regs.set_hl(value),
                    _ => self.regs.sp = value,
                }
                self.regs.wz = address.wrapping_add(1);
            }

            // NEG (and mirrors)
            0x44 | 0x4C | 0x54 | 0x5C | 0x64 | 0x6C | 0x74 | 0x7C => {
                let result = alu::sub8(0, self.regs.a, false);
                self.regs.a = result.value;
                self.regs.f = result.flags;
            }

            // RETN / RETI (and mirrors): both restore IFF1 from IFF2
            0x45 | 0x4D | 0x55 | 0x5D | 0x65 | 0x6D | 0x75 | 0x7D => {
                self.regs.iff1 = self.regs.iff2;
                self.regs.pc = self.pop(bus);
                self.regs.wz = self.regs.pc;
            }

            // IM 0 / IM 1 / IM 2
            0x46 | 0x4E | 0x66 | 0x6E => self.regs.im = 0,
            0x56 | 0x76 => self.regs.im = 1,
            0x5E | 0x7E => self.regs.im = 2,

            // LD I, A
            0x47 => {
                bus.delay(1);
                self.regs.i = self.regs.a;
            }

            // LD R, A
            0x4F => {
                bus.delay(1);
                self.regs.r = self.regs.a;
            }

            // LD A, I / LD A, R
            0x57 | 0x5F => {
                bus.delay(1);
                let value = if op == 0x57 { self.regs.i } else { self.regs.r };
                self.regs.a = value;
                let iff = if self.regs.iff2 { PF } else { 0 };
                self.regs.f = (self.regs.f & CF) | sz53(value) | iff;
            }

            // RRD
            0x67 => {
                let hl = self.regs.hl();
                let value = bus.read(hl);
                bus.delay(4);
                let a = self.regs.a;
                bus.write(hl, (a << 4) | (value >> 4));
                self.regs.a = (a & 0xF0) | (value & 0x0F);
                self.regs.f = (self.regs.f & CF) | sz53p(self.regs.a);
                self.regs.wz = hl.wrapping_add(1);
            }

            // RLD
            0x6F => {
                let hl = self.regs.hl();
                let value = bus.read(hl);
                bus.delay(4);
                let a = self.regs.a;
                bus.write(hl, (value << 4) | (a & 0x0F));
                self.regs.a = (a & 0xF0) | (value >> 4);
                self.regs.f = (self.regs.f & CF) | sz53p(self.regs.a);
                self.regs.wz = hl.wrapping_add(1);
            }

            // LDI, LDD, LDIR, LDDR
            0xA0 | 0xA8 | 0xB0 | 0xB8 => self.block_load(bus, op),

            // CPI, CPD, CPIR, CPDR
            0xA1 | 0xA9 | 0xB1 | 0xB9 => self.block_compare(bus, op),

            // INI, IND, INIR, INDR
            0xA2 | 0xAA | 0xB2 | 0xBA => self.block_in(bus, op),

            // OUTI, OUTD, OTIR, OTDR
            0xA3 | 0xAB | 0xB3 | 0xBB => self.block_out(bus, op),

            _ => {}
        }
    }

    /// Register pair for the ED 16-bit group: BC, DE, HL, SP. Never indexed.
    fn ed_reg16(&self, p: u8) -> u16 {
        match p {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            _ => self.regs.sp,
        }
    }

    /// Repeat a block instruction: rewind PC over the two opcode bytes so
    /// the next step runs it again, leaving an interrupt window between
    /// iterations.
    fn repeat_block<B: Bus>(&mut self, bus: &mut B) {
        bus.delay(5);
        self.regs.pc = self.regs.pc.wrapping_sub(2);
        self.regs.wz = self.regs.pc.wrapping_add(1);
    }

    fn block_step(op: u8) -> u16 {
        if op & 0x08 == 0 { 1 } else { 0xFFFF }
    }

    fn block_load<B: Bus>(&mut self, bus: &mut B, op: u8) {
        let step = Self::block_step(op);
        let hl = self.regs.hl();
        let de = self.regs.de();
        let value = bus.read(hl);
        bus.write(de, value);
        bus.delay(2);
        self.regs.set_hl(hl.wrapping_add(step));
        self.regs.set_de(de.wrapping_add(step));
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        let n = value.wrapping_add(self.regs.a);
        let mut f = (self.regs.f & (SF | ZF | CF)) | (n & XF) | ((n << 4) & YF);
        if bc != 0 {
            f |= PF;
        }
        self.regs.f = f;

        if op & 0x10 != 0 && bc != 0 {
            self.repeat_block(bus);
        }
    }

    fn block_compare<B: Bus>(&mut self, bus: &mut B, op: u8) {
        let step = Self::block_step(op);
        let hl = self.regs.hl();
        let value = bus.read(hl);
        bus.delay(5);
        self.regs.set_hl(hl.wrapping_add(step));
        self.regs.wz = self.regs.wz.wrapping_add(step);
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        let r = alu::sub8(self.regs.a, value, false);
        let half = r.flags & HF;
        let n = r.value.wrapping_sub(u8::from(half != 0));
        let mut f = (self.regs.f & CF) | NF | half | (r.value & SF) | (n & XF) | ((n << 4) & YF);
        if r.value == 0 {
            f |= ZF;
        }
        if bc != 0 {
            f |= PF;
        }
        self.regs.f = f;

        if op & 0x10 != 0 && bc != 0 && r.value != 0 {
            self.repeat_block(bus);
        }
    }

    fn block_in<B: Bus>(&mut self, bus: &mut B, op: u8) {
        let step = Self::block_step(op);
        bus.delay(1);
        let port = self.regs.bc();
        let value = bus.io_read(port);
        let hl = self.regs.hl();
        bus.write(hl, value);
        self.regs.wz = port.wrapping_add(step);
        self.regs.set_hl(hl.wrapping_add(step));
        self.regs.b = self.regs.b.wrapping_sub(1);

        let k = u16::from(value) + u16::from(self.regs.c.wrapping_add(step as u8));
        self.block_io_flags(value, k);

        if op & 0x10 != 0 && self.regs.b != 0 {
            self.repeat_block(bus);
        }
    }

    fn block_out<B: Bus>(&mut self, bus: &mut B, op: u8) {
        let step = Self::block_step(op);
        bus.delay(1);
        let hl = self.regs.hl();
        let value = bus.read(hl);
        self.regs.b = self.regs.b.wrapping_sub(1);
        let port = self.regs.bc();
        bus.io_write(port, value);
        self.regs.wz = port.wrapping_add(step);
        self.regs.set_hl(hl.wrapping_add(step));

        let k = u16::from(value) + u16::from(self.regs.l);
        self.block_io_flags(value, k);

        if op & 0x10 != 0 && self.regs.b != 0 {
            self.repeat_block(bus);
        }
    }

    /// Flags shared by the INI/OUTI family. B has already been decremented.
    fn block_io_flags(&mut self, value: u8, k: u16) {
        let b = self.regs.b;
        let mut f = sz53(b);
        if value & 0x80 != 0 {
            f |= NF;
        }
        if k > 0xFF {
            f |= HF | CF;
        }
        if parity(((k & 7) as u8) ^ b) {
            f |= PF;
        }
        self.regs.f = f;
    }
}

#[cfg(test)]
mod tests {
    use emu_core::SimpleBus;

    use super::*;

    #[test]
    fn bit_on_register_sets_zero_for_clear_bit() {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        cpu.regs.b = 0x7F;
        cpu.regs.f = CF;
        // BIT 7, B
        bus.load(0, &[0xCB, 0x78]);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.f & (ZF | PF | HF | CF | NF), ZF | PF | HF | CF);
        assert_eq!(bus.cycles, 8);
    }

    #[test]
    fn cb_memory_operand_timing() {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        cpu.regs.set_hl(0x9000);
        bus.poke(0x9000, 0x01);
        // SET 7, (HL)
        bus.load(0, &[0xCB, 0xFE]);
        cpu.step(&mut bus);
        assert_eq!(bus.peek(0x9000), 0x81);
        assert_eq!(bus.cycles, 15);
        assert_eq!(cpu.regs.r, 2);
    }

    #[test]
    fn indexed_cb_copies_result_to_register() {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        cpu.regs.ix = 0x9000;
        bus.poke(0x9003, 0x80);
        // RLC (IX+3), C
        bus.load(0, &[0xDD, 0xCB, 0x03, 0x01]);
        cpu.step(&mut bus);
        cpu.step(&mut bus);
        assert_eq!(bus.peek(0x9003), 0x01);
        assert_eq!(cpu.regs.c, 0x01);
        assert_eq!(cpu.regs.f & CF, CF);
        assert_eq!(bus.cycles, 23);
        // DD and CB bump R, the final opcode byte does not
        assert_eq!(cpu.regs.r, 2);
    }

    #[test]
    fn ldir_repeats_through_pc() {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        cpu.regs.set_hl(0x9000);
        cpu.regs.set_de(0xA000);
        cpu.regs.set_bc(3);
        bus.load(0x9000, &[1, 2, 3]);
        bus.load(0, &[0xED, 0xB0]);

        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0);
        assert_eq!(bus.cycles, 21);
        cpu.step(&mut bus);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 2);
        assert_eq!(bus.cycles, 21 + 21 + 16);
        assert_eq!(&bus.ram[0xA000..0xA003], &[1, 2, 3]);
        assert_eq!(cpu.regs.f & PF, 0);
    }

    #[test]
    fn sbc_hl_and_neg() {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        cpu.regs.set_hl(0x0001);
        cpu.regs.set_de(0x0002);
        cpu.regs.f = 0;
        cpu.regs.a = 0x01;
        // SBC HL, DE; NEG
        bus.load(0, &[0xED, 0x52, 0xED, 0x44]);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.hl(), 0xFFFF);
        assert_eq!(cpu.regs.f & (SF | CF | NF), SF | CF | NF);
        assert_eq!(bus.cycles, 15);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.a, 0xFF);
    }

    #[test]
    fn ld_a_i_reports_iff2() {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        cpu.regs.i = 0x3F;
        cpu.regs.iff2 = true;
        bus.load(0, &[0xED, 0x57]);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.a, 0x3F);
        assert_eq!(cpu.regs.f & PF, PF);
        assert_eq!(bus.cycles, 9);
    }

    #[test]
    fn in_r_c_uses_full_port_address() {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        cpu.regs.set_bc(0xFEF9);
        bus.set_port(0xFEF9, 0x00);
        // IN D, (C)
        bus.load(0, &[0xED, 0x50]);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.d, 0x00);
        assert_eq!(cpu.regs.f & (ZF | PF), ZF | PF);
        assert_eq!(bus.cycles, 12);
    }
}
