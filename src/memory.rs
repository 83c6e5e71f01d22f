use serde::{Deserialize, Serialize};

use crate::decoder::NOP_WORD;

pub const INSTRUCTION_MEMORY_SIZE: usize = 1024;
pub const DATA_MEMORY_SIZE: usize = 2048;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemError {
    #[error("Instruction memory address {addr} out of range")]
    InstructionAddress { addr: i32 },
    #[error("Data memory address {addr} out of range")]
    DataAddress { addr: i32 },
}

/// How fetch recognises the end of the loaded program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FetchPolicy {
    /// A zero word ends fetching, so `ADD R0, R0` cannot be stored.
    #[default]
    ZeroTerminated,
    /// Fetching stops past the last loaded address; zero words execute.
    ExplicitLength,
}

pub trait Bus {
    fn read_instr(&self, addr: u16) -> Result<u16, MemError>;
    fn write_instr(&mut self, addr: u16, word: u16) -> Result<(), MemError>;
    fn read_data(&self, addr: i32) -> Result<i8, MemError>;
    fn write_data(&mut self, addr: i32, val: i8) -> Result<(), MemError>;
    /// One past the highest instruction address written so far.
    fn program_len(&self) -> usize;

    /// Return the word at `*pc` and advance it, or `NOP_WORD` (leaving `*pc`
    /// alone) when `*pc` is out of range or past the end of the program.
    fn fetch(&self, pc: &mut u16, policy: FetchPolicy) -> u16 {
        let Ok(word) = self.read_instr(*pc) else {
            return NOP_WORD;
        };
        let ended = match policy {
            FetchPolicy::ZeroTerminated => word == 0,
            FetchPolicy::ExplicitLength => usize::from(*pc) >= self.program_len(),
        };
        if ended {
            return NOP_WORD;
        }
        *pc = pc.wrapping_add(1);
        word
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    pub imem: Vec<u16>,
    pub dmem: Vec<i8>,
    pub program_len: usize,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            imem: vec![0; INSTRUCTION_MEMORY_SIZE],
            dmem: vec![0; DATA_MEMORY_SIZE],
            program_len: 0,
        }
    }

    pub fn load_instruction(&mut self, addr: u16, value: u16) -> Result<(), MemError> {
        self.write_instr(addr, value)
    }

    pub fn load_data(&mut self, addr: u16, value: i8) -> Result<(), MemError> {
        self.write_data(i32::from(addr), value)
    }

    pub fn clear(&mut self) {
        self.imem.fill(0);
        self.dmem.fill(0);
        self.program_len = 0;
    }

    fn data_index(&self, addr: i32) -> Result<usize, MemError> {
        usize::try_from(addr)
            .ok()
            .filter(|&i| i < self.dmem.len())
            .ok_or(MemError::DataAddress { addr })
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for Memory {
    fn read_instr(&self, addr: u16) -> Result<u16, MemError> {
        self.imem
            .get(usize::from(addr))
            .copied()
            .ok_or(MemError::InstructionAddress { addr: i32::from(addr) })
    }

    fn write_instr(&mut self, addr: u16, word: u16) -> Result<(), MemError> {
        let idx = usize::from(addr);
        let cell = self
            .imem
            .get_mut(idx)
            .ok_or(MemError::InstructionAddress { addr: i32::from(addr) })?;
        *cell = word;
        self.program_len = self.program_len.max(idx + 1);
        Ok(())
    }

    fn read_data(&self, addr: i32) -> Result<i8, MemError> {
        let idx = self.data_index(addr)?;
        Ok(self.dmem[idx])
    }

    fn write_data(&mut self, addr: i32, val: i8) -> Result<(), MemError> {
        let idx = self.data_index(addr)?;
        self.dmem[idx] = val;
        Ok(())
    }

    fn program_len(&self) -> usize {
        self.program_len
    }
}
