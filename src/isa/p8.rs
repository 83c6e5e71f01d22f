use bitvec::prelude::*;

use crate::decoder::{Decoded, Decoder, Op, NOP_WORD};

/// Decoder for the 16-bit `opcode[15:12] | r1[11:6] | r2/imm[5:0]` format.
///
/// Fields are sliced MSB-first so the layout matches the encoding table
/// regardless of host bit order.
#[derive(Debug, Default, Clone, Copy)]
pub struct P8Decoder;

impl P8Decoder {
    pub fn new() -> Self {
        Self
    }
}

/// Widen a 6-bit two's-complement field to 8 bits by copying bit 5 into bits 6 and 7.
pub fn sign_extend6(field: u8) -> i8 {
    let six = field & 0b0011_1111;
    if six & 0b0010_0000 != 0 {
        (six | 0b1100_0000) as i8
    } else {
        six as i8
    }
}

impl Decoder for P8Decoder {
    fn decode(&self, raw: u16) -> Decoded {
        if raw == NOP_WORD {
            return Decoded::NOP;
        }

        let bits = raw.view_bits::<Msb0>();
        let opcode: u8 = bits[0..4].load_be();
        let r1: u8 = bits[4..10].load_be();
        let low: u8 = bits[10..16].load_be();

        let op = Op::from_opcode(opcode);
        let imm = if op.has_signed_imm() { sign_extend6(low) } else { 0 };
        let shamt = if op.has_shift_amount() { low } else { 0 };

        Decoded {
            op,
            r1,
            r2: low,
            imm,
            shamt,
            raw,
        }
    }
}
