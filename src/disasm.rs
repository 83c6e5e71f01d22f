use crate::decoder::{Decoded, Decoder, Op};
use crate::instructions::{describe, Format};
use crate::isa::p8::P8Decoder;

pub fn fmt_decoded(d: &Decoded) -> String {
    match d.op {
        Op::Nop => "(NOP)".to_string(),
        Op::Unrecognized(code) => format!("(Invalid {code:#x})"),
        op => match describe(op) {
            Some(desc) => match desc.format {
                Format::RegReg => format!("{} R{}, R{}", desc.mnemonic, d.r1, d.r2),
                Format::RegImm => format!("{} R{}, {}", desc.mnemonic, d.r1, d.imm),
                Format::RegShift => format!("{} R{}, {}", desc.mnemonic, d.r1, d.shamt),
                Format::Mem => format!("{} R{}, [{}]", desc.mnemonic, d.r1, d.imm),
            },
            None => format!("{op:?}"),
        },
    }
}

pub fn fmt_word(raw: u16) -> String {
    fmt_decoded(&P8Decoder::new().decode(raw))
}
