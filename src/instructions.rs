use crate::decoder::Op;

/// How the low 6-bit field of an instruction is written in assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `OP Rd, Rs`
    RegReg,
    /// `OP Rd, imm` (sign-extended)
    RegImm,
    /// `OP Rd, shamt` (unsigned)
    RegShift,
    /// `OP Rd, [imm]`
    Mem,
}

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub op: Op,
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub format: Format,
}

pub const TABLE: &[InstrDesc] = &[
    InstrDesc {
        op: Op::Add,
        opcode: 0,
        mnemonic: "ADD",
        format: Format::RegReg,
    },
    InstrDesc {
        op: Op::Sub,
        opcode: 1,
        mnemonic: "SUB",
        format: Format::RegReg,
    },
    InstrDesc {
        op: Op::Mul,
        opcode: 2,
        mnemonic: "MUL",
        format: Format::RegReg,
    },
    InstrDesc {
        op: Op::Movi,
        opcode: 3,
        mnemonic: "MOVI",
        format: Format::RegImm,
    },
    InstrDesc {
        op: Op::Beqz,
        opcode: 4,
        mnemonic: "BEQZ",
        format: Format::RegImm,
    },
    InstrDesc {
        op: Op::Andi,
        opcode: 5,
        mnemonic: "ANDI",
        format: Format::RegImm,
    },
    InstrDesc {
        op: Op::Eor,
        opcode: 6,
        mnemonic: "EOR",
        format: Format::RegReg,
    },
    InstrDesc {
        op: Op::Br,
        opcode: 7,
        mnemonic: "BR",
        format: Format::RegReg,
    },
    InstrDesc {
        op: Op::Sal,
        opcode: 8,
        mnemonic: "SAL",
        format: Format::RegShift,
    },
    InstrDesc {
        op: Op::Sar,
        opcode: 9,
        mnemonic: "SAR",
        format: Format::RegShift,
    },
    InstrDesc {
        op: Op::Ldr,
        opcode: 10,
        mnemonic: "LDR",
        format: Format::Mem,
    },
    InstrDesc {
        op: Op::Str,
        opcode: 11,
        mnemonic: "STR",
        format: Format::Mem,
    },
];

pub fn describe(op: Op) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.op == op)
}

/// Case-insensitive mnemonic lookup.
pub fn by_mnemonic(mnemonic: &str) -> Option<&'static InstrDesc> {
    TABLE
        .iter()
        .find(|d| d.mnemonic.eq_ignore_ascii_case(mnemonic))
}
