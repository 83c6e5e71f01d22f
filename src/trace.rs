//! Human-readable rendering of a run. Nothing here affects machine state.

use std::io::{self, Write};

use tracing::warn;

use crate::cpu::{Cpu, Sreg};
use crate::disasm::{fmt_decoded, fmt_word};
use crate::exec::{Effect, Flush};
use crate::machine::{HaltReason, RunSummary};
use crate::memory::Memory;
use crate::pipeline::{CycleReport, StageOutcome};

pub trait Tracer {
    fn cycle(&mut self, report: &CycleReport);
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTracer;

impl Tracer for NullTracer {
    fn cycle(&mut self, _report: &CycleReport) {}
}

/// Keeps every report in memory.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    pub reports: Vec<CycleReport>,
}

impl Tracer for Recorder {
    fn cycle(&mut self, report: &CycleReport) {
        self.reports.push(*report);
    }
}

/// Writes one block per cycle: the three slots, then what EX did.
///
/// The first write error is kept and further output is dropped; callers
/// check [`TextTracer::take_error`] once the run is over.
#[derive(Debug)]
pub struct TextTracer<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> TextTracer<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn write_cycle(&mut self, r: &CycleReport) -> io::Result<()> {
        writeln!(self.out, "\nCycle {}:", r.cycle)?;
        writeln!(self.out, "  IF: {}", fmt_word(r.if_word))?;
        writeln!(self.out, "  ID: {}", fmt_word(r.id_word))?;
        writeln!(self.out, "  EX: {}", fmt_decoded(&r.ex))?;
        match &r.stage {
            StageOutcome::Idle => {}
            StageOutcome::Skipped => writeln!(self.out, "  -- flushed by branch, not executed")?,
            StageOutcome::Executed(o) => {
                writeln!(self.out, "  -> {}", fmt_effect(&o.effect, &o.flush))?;
                writeln!(self.out, "     SREG: {}  PC = {}", fmt_flags(r.sreg), r.pc)?;
            }
            StageOutcome::Faulted(fault) => writeln!(self.out, "  !! {fault} (ignored)")?,
        }
        Ok(())
    }
}

pub fn fmt_flags(sreg: Sreg) -> String {
    let bit = |f: Sreg| u8::from(sreg.contains(f));
    format!(
        "C={} V={} N={} S={} Z={}",
        bit(Sreg::C),
        bit(Sreg::V),
        bit(Sreg::N),
        bit(Sreg::S),
        bit(Sreg::Z)
    )
}

fn fmt_effect(effect: &Effect, flush: &Flush) -> String {
    let mut s = match *effect {
        Effect::None => "no change".to_string(),
        Effect::Reg { index, value } => format!("R{index} = {value}"),
        Effect::Mem { addr, value } => format!("mem[{addr}] = {value}"),
        Effect::Branch { taken: false, .. } => "branch not taken".to_string(),
        Effect::Branch {
            taken: true,
            target: Some(pc),
        } => format!("branch taken, PC = {pc}"),
        Effect::Branch { taken: true, target: None } => "branch taken".to_string(),
        Effect::Jump { target } => format!("jump, PC = {target}"),
    };
    match *flush {
        Flush::None => {}
        Flush::Skip(n) => s.push_str(&format!(" (skipping {n})")),
        Flush::Squash => s.push_str(" (IF/ID flushed)"),
    }
    s
}

impl<W: Write> Tracer for TextTracer<W> {
    fn cycle(&mut self, r: &CycleReport) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.write_cycle(r) {
            warn!(cycle = r.cycle, %err, "trace output failed, further cycles not written");
            self.error = Some(err);
        }
    }
}

/// Final dump: summary, every register, PC, SREG and all non-zero memory cells.
pub fn dump_state<W: Write>(
    out: &mut W,
    summary: &RunSummary,
    cpu: &Cpu,
    mem: &Memory,
) -> io::Result<()> {
    match summary.reason {
        HaltReason::Drained => writeln!(
            out,
            "\nExecution complete after {} cycles. Final PC = {:#06x}",
            summary.cycles, summary.final_pc
        )?,
        HaltReason::CycleLimit => writeln!(
            out,
            "\nStopped at cycle limit ({} cycles). PC = {:#06x}",
            summary.cycles, summary.final_pc
        )?,
    }
    writeln!(
        out,
        "Executed {}, flushed {}, faults {}",
        summary.executed, summary.skipped, summary.faults
    )?;

    writeln!(out, "\nFinal Register Values:")?;
    for (i, v) in cpu.gpr.iter().enumerate() {
        writeln!(out, "R{i} = {v}")?;
    }
    writeln!(out, "PC = {}", cpu.pc)?;
    writeln!(out, "SREG: {}", fmt_flags(cpu.sreg))?;

    writeln!(out, "\nInstruction Memory (nonzero):")?;
    for (addr, w) in mem.imem.iter().enumerate().filter(|&(_, &w)| w != 0) {
        writeln!(out, "Addr {addr}: {w:#06x}  {}", fmt_word(*w))?;
    }
    writeln!(out, "\nData Memory (nonzero):")?;
    for (addr, v) in mem.dmem.iter().enumerate().filter(|&(_, &v)| v != 0) {
        writeln!(out, "Addr {addr}: {:#04x} ({v})", *v as u8)?;
    }
    Ok(())
}
