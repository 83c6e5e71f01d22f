//! Arithmetic and status-flag derivation.
//!
//! Every function here is pure: it takes the operand values read from the
//! register file and returns the result together with the flags the opcode
//! defines. [`crate::cpu::Cpu::apply_flags`] commits them.

use crate::cpu::Sreg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluOut {
    pub value: i8,
    /// Flags this operation defines; the rest keep their previous value.
    pub touched: Sreg,
    /// Values for the bits in `touched`.
    pub set: Sreg,
}

/// Unsigned 9-bit sum of the operands exceeds 0xFF.
pub fn carry(a: i8, b: i8) -> bool {
    u16::from(a as u8) + u16::from(b as u8) > 0xFF
}

/// Operands share a sign and the result does not. ADD and SUB both use
/// this rule on the values read before write-back.
pub fn overflow(a: i8, b: i8, result: i8) -> bool {
    let (sa, sb, sr) = (a < 0, b < 0, result < 0);
    sa == sb && sa != sr
}

pub fn negative(result: i8) -> bool {
    result as u8 & 0x80 != 0
}

pub fn zero(result: i8) -> bool {
    result == 0
}

fn with_nz(value: i8, touched: Sreg, mut set: Sreg) -> AluOut {
    set.set(Sreg::N, negative(value));
    set.set(Sreg::Z, zero(value));
    AluOut {
        value,
        touched: touched | Sreg::N | Sreg::Z,
        set,
    }
}

pub fn add(a: i8, b: i8) -> AluOut {
    let value = a.wrapping_add(b);
    let mut set = Sreg::empty();
    set.set(Sreg::C, carry(a, b));
    set.set(Sreg::V, overflow(a, b, value));
    with_nz(value, Sreg::C | Sreg::V, set)
}

pub fn sub(a: i8, b: i8) -> AluOut {
    let value = a.wrapping_sub(b);
    let mut set = Sreg::empty();
    set.set(Sreg::V, overflow(a, b, value));
    with_nz(value, Sreg::V, set)
}

pub fn mul(a: i8, b: i8) -> AluOut {
    with_nz(a.wrapping_mul(b), Sreg::empty(), Sreg::empty())
}

pub fn and(a: i8, b: i8) -> AluOut {
    with_nz(a & b, Sreg::empty(), Sreg::empty())
}

pub fn eor(a: i8, b: i8) -> AluOut {
    with_nz(a ^ b, Sreg::empty(), Sreg::empty())
}

/// Shift left by 0..=63; eight or more clears the register.
pub fn sal(a: i8, shamt: u8) -> AluOut {
    let value = if shamt >= 8 { 0 } else { ((a as u8) << shamt) as i8 };
    with_nz(value, Sreg::empty(), Sreg::empty())
}

/// Arithmetic shift right by 0..=63; eight or more leaves only the sign.
pub fn sar(a: i8, shamt: u8) -> AluOut {
    with_nz(a >> shamt.min(7), Sreg::empty(), Sreg::empty())
}
