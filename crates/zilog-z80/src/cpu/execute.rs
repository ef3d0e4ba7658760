//! Unprefixed and DD/FD-indexed instruction execution.
//!
//! Every opcode arrives here after its 4 T-state fetch. Memory operands
//! cost 3 T-states each through the bus; the `bus.delay` calls supply the
//! remaining internal cycles so totals match the documented timings.

use emu_core::Bus;

use crate::alu;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};

use super::{IndexReg, Z80};

impl Z80 {
    pub(super) fn execute<B: Bus>(&mut self, bus: &mut B, op: u8) {
        match op {
            // NOP
            0x00 => {}

            // LD rr, nn (01=BC, 11=DE, 21=HL, 31=SP)
            0x01 | 0x11 | 0x21 | 0x31 => {
                let value = self.fetch_word(bus);
                self.set_reg16_sp(op >> 4, value);
            }

            // LD (BC), A / LD (DE), A
            0x02 | 0x12 => {
                let address = if op == 0x02 { self.regs.bc() } else { self.regs.de() };
                bus.write(address, self.regs.a);
                self.regs.wz = (u16::from(self.regs.a) << 8) | (address.wrapping_add(1) & 0xFF);
            }

            // LD A, (BC) / LD A, (DE)
            0x0A | 0x1A => {
                let address = if op == 0x0A { self.regs.bc() } else { self.regs.de() };
                self.regs.a = bus.read(address);
                self.regs.wz = address.wrapping_add(1);
            }

            // INC rr / DEC rr
            0x03 | 0x13 | 0x23 | 0x33 | 0x0B | 0x1B | 0x2B | 0x3B => {
                bus.delay(2);
                let p = (op >> 4) & 3;
                let value = if op & 0x08 == 0 {
                    self.reg16_sp(p).wrapping_add(1)
                } else {
                    self.reg16_sp(p).wrapping_sub(1)
                };
                self.set_reg16_sp(p, value);
            }

            // INC (HL) / DEC (HL)
            0x34 | 0x35 => {
                let address = self.operand_address(bus);
                let value = bus.read(address);
                bus.delay(1);
                let result = if op == 0x34 {
                    alu::inc8(value, self.regs.f)
                } else {
                    alu::dec8(value, self.regs.f)
                };
                bus.write(address, result.value);
                self.regs.f = result.flags;
            }

            // INC r
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x3C => {
                let r = (op >> 3) & 7;
                let result = alu::inc8(self.reg8(r), self.regs.f);
                self.set_reg8(r, result.value);
                self.regs.f = result.flags;
            }

            // DEC r
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x3D => {
                let r = (op >> 3) & 7;
                let result = alu::dec8(self.reg8(r), self.regs.f);
                self.set_reg8(r, result.value);
                self.regs.f = result.flags;
            }

            // LD (HL), n. The indexed form reads d then n before its
            // 2 internal cycles.
            0x36 => {
                let address = if self.index == IndexReg::Hl {
                    self.regs.hl()
                } else {
                    let d = self.fetch_byte(bus) as i8;
                    let address = self.index_value().wrapping_add_signed(i16::from(d));
                    self.regs.wz = address;
                    address
                };
                let value = self.fetch_byte(bus);
                if self.index != IndexReg::Hl {
                    bus.delay(2);
                }
                bus.write(address, value);
            }

            // LD r, n
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x3E => {
                let value = self.fetch_byte(bus);
                self.set_reg8((op >> 3) & 7, value);
            }

            // RLCA
            0x07 => {
                let a = self.regs.a.rotate_left(1);
                self.regs.a = a;
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | (a & (YF | XF)) | (a & CF);
            }

            // RRCA
            0x0F => {
                let carry = self.regs.a & 1;
                let a = self.regs.a.rotate_right(1);
                self.regs.a = a;
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | (a & (YF | XF)) | carry;
            }

            // RLA
            0x17 => {
                let carry = self.regs.a >> 7;
                let a = (self.regs.a << 1) | (self.regs.f & CF);
                self.regs.a = a;
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | (a & (YF | XF)) | carry;
            }

            // RRA
            0x1F => {
                let carry = self.regs.a & 1;
                let a = (self.regs.a >> 1) | ((self.regs.f & CF) << 7);
                self.regs.a = a;
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | (a & (YF | XF)) | carry;
            }

            // EX AF, AF'
            0x08 => self.regs.exchange_af(),

            // ADD HL, rr (09=BC, 19=DE, 29=HL, 39=SP)
            0x09 | 0x19 | 0x29 | 0x39 => {
                bus.delay(7);
                let hl = self.index_value();
                let (value, flags) = alu::add16(hl, self.reg16_sp(op >> 4));
                self.regs.wz = hl.wrapping_add(1);
                self.set_index_value(value);
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | flags;
            }

            // DJNZ e
            0x10 => {
                bus.delay(1);
                let e = self.fetch_byte(bus) as i8;
                self.regs.b = self.regs.b.wrapping_sub(1);
                if self.regs.b != 0 {
                    self.relative_jump(bus, e);
                }
            }

            // JR e
            0x18 => {
                let e = self.fetch_byte(bus) as i8;
                self.relative_jump(bus, e);
            }

            // JR cc, e (20=NZ, 28=Z, 30=NC, 38=C)
            0x20 | 0x28 | 0x30 | 0x38 => {
                let e = self.fetch_byte(bus) as i8;
                if self.condition((op >> 3) & 3) {
                    self.relative_jump(bus, e);
                }
            }

            // LD (nn), HL
            0x22 => {
                let address = self.fetch_word(bus);
                bus.write_word(address, self.index_value());
                self.regs.wz = address.wrapping_add(1);
            }

            // LD HL, (nn)
            0x2A => {
                let address = self.fetch_word(bus);
                let value = bus.read_word(address);
                self.set_index_value(value);
                self.regs.wz = address.wrapping_add(1);
            }

            // LD (nn), A
            0x32 => {
                let address = self.fetch_word(bus);
                bus.write(address, self.regs.a);
                self.regs.wz = (u16::from(self.regs.a) << 8) | (address.wrapping_add(1) & 0xFF);
            }

            // LD A, (nn)
            0x3A => {
                let address = self.fetch_word(bus);
                self.regs.a = bus.read(address);
                self.regs.wz = address.wrapping_add(1);
            }

            // DAA
            0x27 => {
                let result = alu::daa(self.regs.a, self.regs.f);
                self.regs.a = result.value;
                self.regs.f = result.flags;
            }

            // CPL
            0x2F => {
                let a = !self.regs.a;
                self.regs.a = a;
                self.regs.f = (self.regs.f & (SF | ZF | PF | CF)) | HF | NF | (a & (YF | XF));
            }

            // SCF
            0x37 => {
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | (self.regs.a & (YF | XF)) | CF;
            }

            // CCF: H takes the old carry
            0x3F => {
                let f = self.regs.f;
                let half = if f & CF != 0 { HF } else { 0 };
                self.regs.f = ((f & (SF | ZF | PF | CF)) | half | (self.regs.a & (YF | XF))) ^ CF;
            }

            // HALT: PC stays on the opcode so every step refetches it
            0x76 => {
                self.regs.pc = self.regs.pc.wrapping_sub(1);
            }

            // LD r, r' / LD r, (HL) / LD (HL), r
            0x40..=0x7F => {
                let dst = (op >> 3) & 7;
                let src = op & 7;
                if src == 6 {
                    let address = self.operand_address(bus);
                    let value = bus.read(address);
                    self.set_plain_reg8(dst, value);
                } else if dst == 6 {
                    let address = self.operand_address(bus);
                    bus.write(address, self.plain_reg8(src));
                } else {
                    let value = self.reg8(src);
                    self.set_reg8(dst, value);
                }
            }

            // ALU A, r / ALU A, (HL)
            0x80..=0xBF => {
                let src = op & 7;
                let value = if src == 6 {
                    let address = self.operand_address(bus);
                    bus.read(address)
                } else {
                    self.reg8(src)
                };
                self.alu_a((op >> 3) & 7, value);
            }

            // RET cc
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                bus.delay(1);
                if self.condition((op >> 3) & 7) {
                    self.regs.pc = self.pop(bus);
                    self.regs.wz = self.regs.pc;
                }
            }

            // POP rr (C1=BC, D1=DE, E1=HL, F1=AF)
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop(bus);
                self.set_reg16_af((op >> 4) & 3, value);
            }

            // JP cc, nn
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let address = self.fetch_word(bus);
                self.regs.wz = address;
                if self.condition((op >> 3) & 7) {
                    self.regs.pc = address;
                }
            }

            // JP nn
            0xC3 => {
                let address = self.fetch_word(bus);
                self.regs.wz = address;
                self.regs.pc = address;
            }

            // CALL cc, nn
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let address = self.fetch_word(bus);
                self.regs.wz = address;
                if self.condition((op >> 3) & 7) {
                    bus.delay(1);
                    self.push(bus, self.regs.pc);
                    self.regs.pc = address;
                }
            }

            // PUSH rr (C5=BC, D5=DE, E5=HL, F5=AF)
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                bus.delay(1);
                let value = self.reg16_af((op >> 4) & 3);
                self.push(bus, value);
            }

            // ALU A, n
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let value = self.fetch_byte(bus);
                self.alu_a((op >> 3) & 7, value);
            }

            // RST p
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                bus.delay(1);
                self.push(bus, self.regs.pc);
                self.regs.pc = u16::from(op & 0x38);
                self.regs.wz = self.regs.pc;
            }

            // RET
            0xC9 => {
                self.regs.pc = self.pop(bus);
                self.regs.wz = self.regs.pc;
            }

            // CB prefix
            0xCB => {
                if self.index == IndexReg::Hl {
                    self.execute_cb(bus);
                } else {
                    self.execute_index_cb(bus);
                }
            }

            // CALL nn
            0xCD => {
                let address = self.fetch_word(bus);
                bus.delay(1);
                self.push(bus, self.regs.pc);
                self.regs.pc = address;
                self.regs.wz = address;
            }

            // OUT (n), A
            0xD3 => {
                let n = self.fetch_byte(bus);
                let port = (u16::from(self.regs.a) << 8) | u16::from(n);
                bus.io_write(port, self.regs.a);
                self.regs.wz = (u16::from(self.regs.a) << 8) | u16::from(n.wrapping_add(1));
            }

            // EXX
            0xD9 => self.regs.exchange_main(),

            // IN A, (n)
            0xDB => {
                let n = self.fetch_byte(bus);
                let port = (u16::from(self.regs.a) << 8) | u16::from(n);
                self.regs.a = bus.io_read(port);
                self.regs.wz = port.wrapping_add(1);
            }

            // DD prefix: IX for the next opcode only
            0xDD => self.next_index = IndexReg::Ix,

            // FD prefix: IY for the next opcode only
            0xFD => self.next_index = IndexReg::Iy,

            // EX (SP), HL
            0xE3 => {
                let sp = self.regs.sp;
                let value = bus.read_word(sp);
                bus.delay(1);
                bus.write_word_reversed(sp, self.index_value());
                bus.delay(2);
                self.set_index_value(value);
                self.regs.wz = value;
            }

            // JP (HL)
            0xE9 => self.regs.pc = self.index_value(),

            // EX DE, HL (never indexed)
            0xEB => {
                let de = self.regs.de();
                self.regs.set_de(self.regs.hl());
                self.regs.set_hl(de);
            }

            // ED prefix
            0xED => self.execute_ed(bus),

            // DI
            0xF3 => {
                self.regs.iff1 = false;
                self.regs.iff2 = false;
            }

            // LD SP, HL
            0xF9 => {
                bus.delay(2);
                self.regs.sp = self.index_value();
            }

            // EI
            0xFB => {
                self.regs.iff1 = true;
                self.regs.iff2 = true;
            }
        }
    }

    /// Taken relative jump: 5 internal cycles then PC += e.
    fn relative_jump<B: Bus>(&mut self, bus: &mut B, e: i8) {
        bus.delay(5);
        self.regs.pc = self.regs.pc.wrapping_add_signed(i16::from(e));
        self.regs.wz = self.regs.pc;
    }

    /// ADD, ADC, SUB, SBC, AND, XOR, OR, CP by opcode field.
    pub(super) fn alu_a(&mut self, operation: u8, value: u8) {
        let a = self.regs.a;
        let carry = self.regs.f & CF != 0;
        let result = match operation {
            0 => alu::add8(a, value, false),
            1 => alu::add8(a, value, carry),
            2 => alu::sub8(a, value, false),
            3 => alu::sub8(a, value, carry),
            4 => alu::and8(a, value),
            5 => alu::xor8(a, value),
            6 => alu::or8(a, value),
            _ => alu::cp8(a, value),
        };
        self.regs.a = result.value;
        self.regs.f = result.flags;
    }
}

#[cfg(test)]
mod tests {
    use emu_core::SimpleBus;

    use super::*;

    fn run(program: &[u8], steps: usize) -> (Z80, SimpleBus) {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        bus.load(0, program);
        for _ in 0..steps {
            cpu.step(&mut bus);
        }
        (cpu, bus)
    }

    #[test]
    fn documented_timings() {
        // (program, steps, T-states)
        let cases: &[(&[u8], usize, u64)] = &[
            (&[0x00], 1, 4),                      // NOP
            (&[0x01, 0x34, 0x12], 1, 10),         // LD BC, nn
            (&[0x03], 1, 6),                      // INC BC
            (&[0x09], 1, 11),                     // ADD HL, BC
            (&[0x34], 1, 11),                     // INC (HL)
            (&[0x36, 0x55], 1, 10),               // LD (HL), n
            (&[0x18, 0x00], 1, 12),               // JR e
            (&[0xC5], 1, 11),                     // PUSH BC
            (&[0xC1], 1, 10),                     // POP BC
            (&[0xCD, 0x00, 0x10], 1, 17),         // CALL nn
            (&[0xC9], 1, 10),                     // RET
            (&[0xE3], 1, 19),                     // EX (SP), HL
            (&[0xD3, 0xFE], 1, 11),               // OUT (n), A
            (&[0xDD, 0x7E, 0x05], 2, 19),         // LD A, (IX+d)
            (&[0xDD, 0x36, 0x05, 0x99], 2, 19),   // LD (IX+d), n
            (&[0xFD, 0x34, 0x01], 2, 23),         // INC (IY+d)
            (&[0xDD, 0x21, 0x00, 0x00], 2, 14),   // LD IX, nn
            (&[0xDD, 0xE5], 2, 15),               // PUSH IX
        ];
        for &(program, steps, tstates) in cases {
            let (_, bus) = run(program, steps);
            assert_eq!(bus.cycles, tstates, "program {program:02X?}");
        }
    }

    #[test]
    fn index_halves_replace_h_and_l() {
        // LD IX, 0x1234; LD A, IXH (DD 7C); LD IXL, A (DD 6F)
        let (cpu, _) = run(&[0xDD, 0x21, 0x34, 0x12, 0xDD, 0x7C, 0xDD, 0x6F], 6);
        assert_eq!(cpu.regs.a, 0x12);
        assert_eq!(cpu.regs.ix, 0x1212);
        assert_eq!(cpu.regs.hl(), 0xFFFF);
    }

    #[test]
    fn indexed_memory_operand_keeps_real_h() {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        cpu.regs.iy = 0x4000;
        bus.poke(0x3FFE, 0xAB);
        // LD H, (IY-2)
        bus.load(0, &[0xFD, 0x66, 0xFE]);
        cpu.step(&mut bus);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.h, 0xAB);
        assert_eq!(cpu.regs.iy, 0x4000);
    }

    #[test]
    fn djnz_loops_until_b_is_zero() {
        // LD B, 3; loop: DJNZ loop
        let (cpu, bus) = run(&[0x06, 0x03, 0x10, 0xFE], 4);
        assert_eq!(cpu.regs.b, 0);
        assert_eq!(cpu.regs.pc, 4);
        // 7 + 13 + 13 + 8
        assert_eq!(bus.cycles, 41);
    }

    #[test]
    fn push_writes_high_byte_first_below_sp() {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        cpu.regs.set_bc(0xBEEF);
        bus.load(0, &[0xC5]);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.sp, 0x7FFE);
        assert_eq!(bus.peek_word(0x7FFE), 0xBEEF);
    }

    #[test]
    fn conditional_call_not_taken_costs_ten() {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        cpu.regs.f = 0;
        // CALL Z, 0x1000
        bus.load(0, &[0xCC, 0x00, 0x10]);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 3);
        assert_eq!(bus.cycles, 10);
    }

    #[test]
    fn halt_holds_pc_and_refetches() {
        let (cpu, bus) = run(&[0x76], 3);
        assert_eq!(cpu.regs.pc, 0);
        assert_eq!(bus.cycles, 12);
        assert_eq!(cpu.regs.r, 3);
    }
}
