pub mod alu;
pub mod asm;
pub mod cpu;
pub mod decoder;
pub mod disasm;
pub mod exec;
pub mod instructions;
pub mod loader;
pub mod machine;
pub mod memory;
pub mod pipeline;
pub mod trace;

pub mod isa {
    pub mod p8; // 16-bit opcode|r1|r2/imm encoding
}

pub use cpu::{Cpu, CpuConfig, Fault, Sreg};
pub use machine::{HaltReason, Machine, RunSummary, Snapshot};
pub use memory::{Bus, FetchPolicy, Memory};
