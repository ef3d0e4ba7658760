//! ALU operations for the Z80.
//!
//! Each operation returns the result and the complete flag byte it
//! produces. Callers that must preserve some old flags (16-bit ADD, the
//! accumulator rotates) merge them in themselves.

use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, sz53, sz53p};

/// Result of an 8-bit ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub flags: u8,
}

impl AluResult {
    const fn new(value: u8, flags: u8) -> Self {
        Self { value, flags }
    }
}

/// ADD/ADC.
#[must_use]
pub fn add8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let wide = u16::from(a) + u16::from(b) + u16::from(c);
    let value = wide as u8;
    let mut flags = sz53(value);
    if (a & 0x0F) + (b & 0x0F) + c > 0x0F {
        flags |= HF;
    }
    if (a ^ b) & 0x80 == 0 && (a ^ value) & 0x80 != 0 {
        flags |= PF;
    }
    if wide > 0xFF {
        flags |= CF;
    }
    AluResult::new(value, flags)
}

/// SUB/SBC.
#[must_use]
pub fn sub8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let value = a.wrapping_sub(b).wrapping_sub(c);
    let mut flags = sz53(value) | NF;
    if (a & 0x0F) < (b & 0x0F) + c {
        flags |= HF;
    }
    if (a ^ b) & 0x80 != 0 && (a ^ value) & 0x80 != 0 {
        flags |= PF;
    }
    if u16::from(a) < u16::from(b) + u16::from(c) {
        flags |= CF;
    }
    AluResult::new(value, flags)
}

#[must_use]
pub fn and8(a: u8, b: u8) -> AluResult {
    let value = a & b;
    AluResult::new(value, sz53p(value) | HF)
}

#[must_use]
pub fn or8(a: u8, b: u8) -> AluResult {
    let value = a | b;
    AluResult::new(value, sz53p(value))
}

#[must_use]
pub fn xor8(a: u8, b: u8) -> AluResult {
    let value = a ^ b;
    AluResult::new(value, sz53p(value))
}

/// CP: a subtraction whose 5/3 flags come from the operand.
#[must_use]
pub fn cp8(a: u8, b: u8) -> AluResult {
    let r = sub8(a, b, false);
    AluResult::new(a, (r.flags & !(YF | XF)) | (b & (YF | XF)))
}

/// INC r. Carry is preserved from `flags`.
#[must_use]
pub fn inc8(a: u8, flags: u8) -> AluResult {
    let value = a.wrapping_add(1);
    let mut f = sz53(value) | (flags & CF);
    if a & 0x0F == 0x0F {
        f |= HF;
    }
    if a == 0x7F {
        f |= PF;
    }
    AluResult::new(value, f)
}

/// DEC r. Carry is preserved from `flags`.
#[must_use]
pub fn dec8(a: u8, flags: u8) -> AluResult {
    let value = a.wrapping_sub(1);
    let mut f = sz53(value) | NF | (flags & CF);
    if a & 0x0F == 0 {
        f |= HF;
    }
    if a == 0x80 {
        f |= PF;
    }
    AluResult::new(value, f)
}

/// CB-prefixed rotate/shift selected by bits 3-5 of the opcode.
#[must_use]
pub fn shift8(op: u8, a: u8, flags: u8) -> AluResult {
    let carry_in = flags & CF;
    let (value, carry) = match op & 7 {
        0 => (a.rotate_left(1), a >> 7),         // RLC
        1 => (a.rotate_right(1), a & 1),         // RRC
        2 => ((a << 1) | carry_in, a >> 7),      // RL
        3 => ((a >> 1) | (carry_in << 7), a & 1), // RR
        4 => (a << 1, a >> 7),                   // SLA
        5 => ((a >> 1) | (a & 0x80), a & 1),     // SRA
        6 => ((a << 1) | 1, a >> 7),             // SLL (undocumented)
        _ => (a >> 1, a & 1),                    // SRL
    };
    AluResult::new(value, sz53p(value) | carry)
}

/// DAA: adjust A after BCD addition or subtraction.
#[must_use]
pub fn daa(a: u8, flags: u8) -> AluResult {
    let mut correction = 0;
    let mut carry = flags & CF;
    if flags & HF != 0 || a & 0x0F > 9 {
        correction |= 0x06;
    }
    if carry != 0 || a > 0x99 {
        correction |= 0x60;
        carry = CF;
    }
    let subtract = flags & NF != 0;
    let value = if subtract {
        a.wrapping_sub(correction)
    } else {
        a.wrapping_add(correction)
    };
    let half = if subtract {
        flags & HF != 0 && a & 0x0F < 6
    } else {
        a & 0x0F > 9
    };
    let mut f = sz53p(value) | carry | (flags & NF);
    if half {
        f |= HF;
    }
    AluResult::new(value, f)
}

/// ADD HL,rr. Returns only H, C and the 5/3 bits; S, Z and P/V are left
/// for the caller to carry over.
#[must_use]
pub fn add16(a: u16, b: u16) -> (u16, u8) {
    let wide = u32::from(a) + u32::from(b);
    let value = wide as u16;
    let mut flags = ((value >> 8) as u8) & (YF | XF);
    if (a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF {
        flags |= HF;
    }
    if wide > 0xFFFF {
        flags |= CF;
    }
    (value, flags)
}

/// ADC HL,rr.
#[must_use]
pub fn adc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = u16::from(carry);
    let wide = u32::from(a) + u32::from(b) + u32::from(c);
    let value = wide as u16;
    let mut flags = ((value >> 8) as u8) & (SF | YF | XF);
    if value == 0 {
        flags |= ZF;
    }
    if (a & 0x0FFF) + (b & 0x0FFF) + c > 0x0FFF {
        flags |= HF;
    }
    if (a ^ b) & 0x8000 == 0 && (a ^ value) & 0x8000 != 0 {
        flags |= PF;
    }
    if wide > 0xFFFF {
        flags |= CF;
    }
    (value, flags)
}

/// SBC HL,rr.
#[must_use]
pub fn sbc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = u16::from(carry);
    let value = a.wrapping_sub(b).wrapping_sub(c);
    let mut flags = NF | ((value >> 8) as u8) & (SF | YF | XF);
    if value == 0 {
        flags |= ZF;
    }
    if (a & 0x0FFF) < (b & 0x0FFF) + c {
        flags |= HF;
    }
    if (a ^ b) & 0x8000 != 0 && (a ^ value) & 0x8000 != 0 {
        flags |= PF;
    }
    if u32::from(a) < u32::from(b) + u32::from(c) {
        flags |= CF;
    }
    (value, flags)
}
