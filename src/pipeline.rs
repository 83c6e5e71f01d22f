//! Three-stage IF/ID/EX scheduler.
//!
//! One call to [`Pipeline::step`] is one clock: EX takes the decoded ID word,
//! ID takes the IF word, IF takes a fresh fetch, and then the instruction now
//! in EX runs unless a branch asked for it to be elided. Program end is
//! detected by fetch returning the NOP word; two more cycles let the last
//! real instructions reach EX before the pipeline halts.

use serde::Serialize;
use tracing::{debug, warn};

use crate::cpu::{Cpu, Fault, Sreg};
use crate::decoder::{Decoded, Decoder, NOP_WORD};
use crate::exec::{Executor, Flush, Outcome};
use crate::memory::Bus;

/// Cycles between the first empty fetch and halt.
pub const DRAIN_CYCLES: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipeState {
    Running,
    Draining,
    Halted,
}

/// What the execute stage did this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// EX held the NOP slot.
    Idle,
    /// EX was elided by a pending branch skip.
    Skipped,
    Executed(Outcome),
    Faulted(Fault),
}

/// Per-cycle record handed to tracers. Buffer contents are captured after
/// the shift and before execute, so a squash shows up on the next cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    pub if_word: u16,
    pub id_word: u16,
    pub ex: Decoded,
    pub stage: StageOutcome,
    pub pc: u16,
    pub sreg: Sreg,
    pub state: PipeState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub if_buf: u16,
    pub id_buf: u16,
    pub ex_buf: Decoded,
    /// Remaining cycles whose execute is elided.
    pub skip: u8,
    /// Cycles left before halting, once an empty fetch has been seen.
    pub drain: Option<u8>,
    pub state: PipeState,
    pub cycle: u64,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            if_buf: NOP_WORD,
            id_buf: NOP_WORD,
            ex_buf: Decoded::NOP,
            skip: 0,
            drain: None,
            state: PipeState::Running,
            cycle: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_halted(&self) -> bool {
        self.state == PipeState::Halted
    }

    pub fn step<B: Bus, D: Decoder, X: Executor>(
        &mut self,
        cpu: &mut Cpu,
        bus: &mut B,
        dec: &D,
        exec: &X,
    ) -> CycleReport {
        self.cycle += 1;

        self.ex_buf = dec.decode(self.id_buf);
        self.id_buf = self.if_buf;
        self.if_buf = bus.fetch(&mut cpu.pc, cpu.cfg.fetch_policy);

        if self.if_buf == NOP_WORD {
            self.note_empty_fetch();
        } else if self.state == PipeState::Draining {
            debug!(cycle = self.cycle, pc = cpu.pc, "fetch resumed, drain cancelled");
            self.cancel_drain();
        }

        let (if_word, id_word, ex) = (self.if_buf, self.id_buf, self.ex_buf);
        debug!(
            cycle = self.cycle,
            pc = cpu.pc,
            if_word = format_args!("{if_word:#06x}"),
            id_word = format_args!("{id_word:#06x}"),
            ex = ?ex.op,
            "cycle"
        );

        let stage = if self.skip > 0 {
            self.skip -= 1;
            debug!(cycle = self.cycle, remaining = self.skip, "execute elided by branch");
            StageOutcome::Skipped
        } else if ex.is_nop() {
            StageOutcome::Idle
        } else {
            match exec.exec(cpu, bus, ex) {
                Ok(outcome) => {
                    self.apply_flush(outcome.flush);
                    if outcome.redirects() && self.state == PipeState::Draining {
                        debug!(cycle = self.cycle, pc = cpu.pc, "branch during drain, drain cancelled");
                        self.cancel_drain();
                    }
                    StageOutcome::Executed(outcome)
                }
                Err(fault) => {
                    warn!(cycle = self.cycle, word = format_args!("{:#06x}", ex.raw), %fault, "execute fault, continuing");
                    StageOutcome::Faulted(fault)
                }
            }
        };

        if self.drain == Some(0) {
            self.state = PipeState::Halted;
            debug!(cycle = self.cycle, "pipeline drained");
        }

        CycleReport {
            cycle: self.cycle,
            if_word,
            id_word,
            ex,
            stage,
            pc: cpu.pc,
            sreg: cpu.sreg,
            state: self.state,
        }
    }

    fn note_empty_fetch(&mut self) {
        let left = match self.drain {
            Some(n) => n.saturating_sub(1),
            None => {
                self.state = PipeState::Draining;
                DRAIN_CYCLES - 1
            }
        };
        self.drain = Some(left);
    }

    fn cancel_drain(&mut self) {
        self.drain = None;
        self.state = PipeState::Running;
    }

    fn apply_flush(&mut self, flush: Flush) {
        match flush {
            Flush::None => {}
            Flush::Skip(n) => {
                debug!(cycle = self.cycle, n, "branch taken, eliding younger instructions");
                self.skip = n;
            }
            Flush::Squash => {
                debug!(cycle = self.cycle, "jump taken, IF and ID squashed");
                self.if_buf = NOP_WORD;
                self.id_buf = NOP_WORD;
            }
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
