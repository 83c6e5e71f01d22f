use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::alu::AluOut;
use crate::memory::{FetchPolicy, MemError};

pub const NUM_GPRS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    /// Stop the run after this many cycles; `None` runs until drained.
    pub max_cycles: Option<u64>,
    pub fetch_policy: FetchPolicy,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            max_cycles: Some(1_000_000),
            fetch_policy: FetchPolicy::ZeroTerminated,
        }
    }
}

bitflags! {
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sreg: u8 {
const C = 1 << 0; // Carry
const V = 1 << 1; // Overflow
const N = 1 << 2; // Negative
const S = 1 << 3; // Sign, N ^ V
const Z = 1 << 4; // Zero
}
}

/// Non-fatal conditions raised while executing; the pipeline reports them and keeps going.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    #[error(transparent)]
    AddressOutOfRange(#[from] MemError),
    #[error("Unrecognized opcode {opcode} in word {word:#06x}")]
    UnrecognizedOpcode { opcode: u8, word: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpu {
    pub pc: u16,
    pub sreg: Sreg,
    pub gpr: [i8; NUM_GPRS], // R0..R63
    pub cfg: CpuConfig,
}

impl Cpu {
    pub fn new(cfg: CpuConfig) -> Self {
        Self {
            pc: 0,
            sreg: Sreg::empty(),
            gpr: [0; NUM_GPRS],
            cfg,
        }
    }

    pub fn reset(&mut self, reset_pc: u16) {
        self.pc = reset_pc;
        self.sreg = Sreg::empty();
        self.gpr = [0; NUM_GPRS];
    }

    pub fn reg(&self, idx: u8) -> i8 {
        self.gpr[usize::from(idx) % NUM_GPRS]
    }

    pub fn set_reg(&mut self, idx: u8, val: i8) {
        self.gpr[usize::from(idx) % NUM_GPRS] = val;
    }

    pub fn flag(&self, f: Sreg) -> bool {
        self.sreg.contains(f)
    }

    /// Commit an ALU result's flags. Bits outside `touched` keep their value;
    /// S is rederived whenever both N and V were written.
    pub fn apply_flags(&mut self, out: &AluOut) {
        self.sreg.remove(out.touched);
        self.sreg.insert(out.set & out.touched);
        if out.touched.contains(Sreg::N | Sreg::V) {
            let s = self.sreg.contains(Sreg::N) ^ self.sreg.contains(Sreg::V);
            self.sreg.set(Sreg::S, s);
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new(CpuConfig::default())
    }
}
