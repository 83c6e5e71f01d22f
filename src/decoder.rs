use serde::{Deserialize, Serialize};

/// All-ones word: "no instruction" in any pipeline slot.
pub const NOP_WORD: u16 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Movi,
    Beqz,
    Andi,
    Eor,
    Br,
    Sal,
    Sar,
    Ldr,
    Str,
    /// Opcodes 12..=15. Executes as a no-op but is reported.
    Unrecognized(u8),
    /// Empty pipeline slot.
    Nop,
}

impl Op {
    pub fn from_opcode(opcode: u8) -> Self {
        match opcode & 0xF {
            0 => Op::Add,
            1 => Op::Sub,
            2 => Op::Mul,
            3 => Op::Movi,
            4 => Op::Beqz,
            5 => Op::Andi,
            6 => Op::Eor,
            7 => Op::Br,
            8 => Op::Sal,
            9 => Op::Sar,
            10 => Op::Ldr,
            11 => Op::Str,
            other => Op::Unrecognized(other),
        }
    }

    /// The 4-bit opcode field, or `None` for the empty slot.
    pub fn opcode(self) -> Option<u8> {
        let code = match self {
            Op::Add => 0,
            Op::Sub => 1,
            Op::Mul => 2,
            Op::Movi => 3,
            Op::Beqz => 4,
            Op::Andi => 5,
            Op::Eor => 6,
            Op::Br => 7,
            Op::Sal => 8,
            Op::Sar => 9,
            Op::Ldr => 10,
            Op::Str => 11,
            Op::Unrecognized(code) => code,
            Op::Nop => return None,
        };
        Some(code)
    }

    /// Opcodes whose low field is a sign-extended immediate.
    pub fn has_signed_imm(self) -> bool {
        matches!(self, Op::Movi | Op::Beqz | Op::Andi | Op::Ldr | Op::Str)
    }

    /// Opcodes whose low field is an unsigned shift amount.
    pub fn has_shift_amount(self) -> bool {
        matches!(self, Op::Sal | Op::Sar)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoded {
    pub op: Op,
    pub r1: u8, // bits 11..6
    pub r2: u8, // bits 5..0 as a register index
    pub imm: i8, // bits 5..0 sign-extended; 0 unless `op.has_signed_imm()`
    pub shamt: u8, // bits 5..0 unsigned; 0 unless `op.has_shift_amount()`
    pub raw: u16,
}

impl Decoded {
    pub const NOP: Decoded = Decoded {
        op: Op::Nop,
        r1: 0,
        r2: 0,
        imm: 0,
        shamt: 0,
        raw: NOP_WORD,
    };

    pub fn is_nop(&self) -> bool {
        self.op == Op::Nop
    }
}

impl Default for Decoded {
    fn default() -> Self {
        Self::NOP
    }
}

pub trait Decoder {
    /// Decoding never fails; unknown opcodes surface as `Op::Unrecognized`.
    fn decode(&self, raw: u16) -> Decoded;
}
