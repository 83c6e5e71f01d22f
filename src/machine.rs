use serde::Serialize;
use tracing::{info, warn};

use crate::cpu::{Cpu, CpuConfig, Sreg};
use crate::exec::IntExecutor;
use crate::isa::p8::P8Decoder;
use crate::memory::Memory;
use crate::pipeline::{CycleReport, Pipeline, StageOutcome};
use crate::trace::Tracer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HaltReason {
    Drained,
    CycleLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub cycles: u64,
    pub executed: u64,
    pub skipped: u64,
    pub faults: u64,
    pub final_pc: u16,
    pub reason: HaltReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Flags {
    pub c: bool,
    pub v: bool,
    pub n: bool,
    pub s: bool,
    pub z: bool,
}

impl From<Sreg> for Flags {
    fn from(sreg: Sreg) -> Self {
        Self {
            c: sreg.contains(Sreg::C),
            v: sreg.contains(Sreg::V),
            n: sreg.contains(Sreg::N),
            s: sreg.contains(Sreg::S),
            z: sreg.contains(Sreg::Z),
        }
    }
}

/// Serializable end-of-run machine state. Memory lists only non-zero cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub pc: u16,
    pub flags: Flags,
    pub registers: Vec<i8>,
    pub program: Vec<(u16, u16)>,
    pub data: Vec<(u16, i8)>,
}

/// Complete machine: registers, both memories, and the pipeline that drives them.
#[derive(Debug, Clone)]
pub struct Machine {
    pub cpu: Cpu,
    pub mem: Memory,
    pub pipe: Pipeline,
    dec: P8Decoder,
    exec: IntExecutor,
}

impl Machine {
    pub fn new(cfg: CpuConfig) -> Self {
        Self {
            cpu: Cpu::new(cfg),
            mem: Memory::new(),
            pipe: Pipeline::new(),
            dec: P8Decoder::new(),
            exec: IntExecutor,
        }
    }

    /// Load `words` from instruction address 0. Words past the end of
    /// instruction memory are reported and dropped; returns how many were stored.
    pub fn load_program(&mut self, words: &[u16]) -> usize {
        let mut stored = 0;
        for (addr, &word) in words.iter().enumerate() {
            let Ok(addr) = u16::try_from(addr) else {
                warn!(addr, "instruction address out of range, word dropped");
                continue;
            };
            match self.mem.load_instruction(addr, word) {
                Ok(()) => stored += 1,
                Err(err) => warn!(%err, "program word dropped"),
            }
        }
        stored
    }

    /// Clear registers, memories and pipeline.
    pub fn reset(&mut self) {
        self.cpu.reset(0);
        self.mem.clear();
        self.pipe.reset();
    }

    /// Advance one clock. `None` once the pipeline has halted.
    pub fn step(&mut self) -> Option<CycleReport> {
        if self.pipe.is_halted() {
            return None;
        }
        Some(
            self.pipe
                .step(&mut self.cpu, &mut self.mem, &self.dec, &self.exec),
        )
    }

    pub fn run<T: Tracer>(&mut self, tracer: &mut T) -> RunSummary {
        let limit = self.cpu.cfg.max_cycles;
        let (mut executed, mut skipped, mut faults) = (0u64, 0u64, 0u64);

        let reason = loop {
            if self.pipe.is_halted() {
                break HaltReason::Drained;
            }
            if limit.is_some_and(|max| self.pipe.cycle >= max) {
                warn!(cycles = self.pipe.cycle, "cycle limit reached, stopping");
                break HaltReason::CycleLimit;
            }
            let Some(report) = self.step() else {
                break HaltReason::Drained;
            };
            match report.stage {
                StageOutcome::Executed(_) => executed += 1,
                StageOutcome::Skipped => skipped += 1,
                StageOutcome::Faulted(_) => faults += 1,
                StageOutcome::Idle => {}
            }
            tracer.cycle(&report);
        };

        let summary = RunSummary {
            cycles: self.pipe.cycle,
            executed,
            skipped,
            faults,
            final_pc: self.cpu.pc,
            reason,
        };
        info!(?summary, "run finished");
        summary
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pc: self.cpu.pc,
            flags: self.cpu.sreg.into(),
            registers: self.cpu.gpr.to_vec(),
            program: nonzero(&self.mem.imem, 0),
            data: nonzero(&self.mem.dmem, 0),
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(CpuConfig::default())
    }
}

fn nonzero<T: Copy + PartialEq>(cells: &[T], zero: T) -> Vec<(u16, T)> {
    cells
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v != zero)
        .map(|(addr, &v)| (addr as u16, v))
        .collect()
}
