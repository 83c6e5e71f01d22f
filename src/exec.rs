use serde::Serialize;

use crate::alu::{self, AluOut};
use crate::cpu::{Cpu, Fault};
use crate::decoder::{Decoded, Op};
use crate::memory::Bus;

/// Architectural change made by one executed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    None,
    Reg { index: u8, value: i8 },
    Mem { addr: u16, value: i8 },
    /// BEQZ. `target` is set only when the PC was rewritten.
    Branch { taken: bool, target: Option<u16> },
    /// BR.
    Jump { target: u16 },
}

/// What the scheduler must do to the younger in-flight instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Flush {
    None,
    /// Elide execution for the next `n` cycles.
    Skip(u8),
    /// Overwrite IF and ID with the NOP word.
    Squash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub effect: Effect,
    pub flush: Flush,
}

impl Outcome {
    pub const NONE: Outcome = Outcome {
        effect: Effect::None,
        flush: Flush::None,
    };

    fn effect(effect: Effect) -> Self {
        Self {
            effect,
            flush: Flush::None,
        }
    }

    /// True when fetch was re-steered.
    pub fn redirects(&self) -> bool {
        matches!(
            self.effect,
            Effect::Jump { .. } | Effect::Branch { target: Some(_), .. }
        )
    }
}

pub trait Executor {
    fn exec<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, d: Decoded) -> Result<Outcome, Fault>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IntExecutor;

fn write_back(cpu: &mut Cpu, index: u8, out: AluOut) -> Outcome {
    cpu.set_reg(index, out.value);
    cpu.apply_flags(&out);
    Outcome::effect(Effect::Reg {
        index,
        value: out.value,
    })
}

impl Executor for IntExecutor {
    fn exec<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, d: Decoded) -> Result<Outcome, Fault> {
        // Operands are read once, before any write-back.
        let a = cpu.reg(d.r1);
        let b = cpu.reg(d.r2);
        let outcome = match d.op {
            Op::Add => write_back(cpu, d.r1, alu::add(a, b)),
            Op::Sub => write_back(cpu, d.r1, alu::sub(a, b)),
            Op::Mul => write_back(cpu, d.r1, alu::mul(a, b)),
            Op::Andi => write_back(cpu, d.r1, alu::and(a, d.imm)),
            Op::Eor => write_back(cpu, d.r1, alu::eor(a, b)),
            Op::Sal => write_back(cpu, d.r1, alu::sal(a, d.shamt)),
            Op::Sar => write_back(cpu, d.r1, alu::sar(a, d.shamt)),
            Op::Movi => {
                cpu.set_reg(d.r1, d.imm);
                Outcome::effect(Effect::Reg {
                    index: d.r1,
                    value: d.imm,
                })
            }
            Op::Beqz => {
                if a != 0 {
                    return Ok(Outcome::effect(Effect::Branch {
                        taken: false,
                        target: None,
                    }));
                }
                // PC is three past the branch here (IF and ID are full).
                // Offsets above 2 flush both and rebase PC by the two words
                // already fetched; 1..=2 elide that many executes; <= 0 is a no-op.
                match d.imm {
                    off if off > 2 => {
                        cpu.pc = cpu.pc.wrapping_add_signed(i16::from(off) - 2);
                        Outcome {
                            effect: Effect::Branch {
                                taken: true,
                                target: Some(cpu.pc),
                            },
                            flush: Flush::Skip(2),
                        }
                    }
                    off => Outcome {
                        effect: Effect::Branch {
                            taken: true,
                            target: None,
                        },
                        flush: if off > 0 {
                            Flush::Skip(off as u8)
                        } else {
                            Flush::None
                        },
                    },
                }
            }
            Op::Br => {
                // Halves are sign-widened before combining: a negative low byte
                // fills the high byte with ones.
                let hi = i32::from(a);
                let lo = i32::from(b);
                let target = ((hi << 8) | lo) as u16;
                cpu.pc = target;
                Outcome {
                    effect: Effect::Jump { target },
                    flush: Flush::Squash,
                }
            }
            Op::Ldr => {
                let addr = i32::from(d.imm);
                let value = bus.read_data(addr)?;
                cpu.set_reg(d.r1, value);
                Outcome::effect(Effect::Reg { index: d.r1, value })
            }
            Op::Str => {
                let addr = i32::from(d.imm);
                let value = a;
                bus.write_data(addr, value)?;
                Outcome::effect(Effect::Mem {
                    addr: addr as u16,
                    value,
                })
            }
            Op::Unrecognized(opcode) => {
                return Err(Fault::UnrecognizedOpcode {
                    opcode,
                    word: d.raw,
                })
            }
            Op::Nop => Outcome::NONE,
        };
        Ok(outcome)
    }
}
