use pretty_assertions::assert_eq;

use pipe8_rs::asm::assemble;
use pipe8_rs::decoder::{Op, NOP_WORD};
use pipe8_rs::pipeline::{PipeState, StageOutcome};
use pipe8_rs::trace::{NullTracer, Recorder};
use pipe8_rs::{CpuConfig, HaltReason, Machine, Sreg};

const REFERENCE: &str = "\
MOVI R1 5
MOVI R2 3
ADD R1 R2
SUB R1 R2
MUL R1 R2
ANDI R1 2
EOR R1 R2
BEQZ R1 2
MOVI R3 0
MOVI R3 7
STR R3 6
LDR R4 6
SAL R4 1
SAR R4 1
";

#[test]
fn reference_program_end_state() {
    let mut m = Machine::default();
    m.load_program(&assemble(REFERENCE).unwrap());
    let summary = m.run(&mut NullTracer);

    assert_eq!(summary.reason, HaltReason::Drained);
    assert_eq!(summary.cycles, 16);
    assert_eq!(summary.executed, 14);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.final_pc, 14);
    assert_eq!(&m.cpu.gpr[..5], &[0, 1, 3, 7, 7]);
    assert_eq!(m.mem.dmem[6], 7);
    assert_eq!(m.cpu.sreg, Sreg::empty());
}

#[test]
fn n_instructions_take_n_plus_two_cycles() {
    for n in 1..=6 {
        let src = "MOVI R1 1\n".repeat(n);
        let mut m = Machine::default();
        m.load_program(&assemble(&src).unwrap());
        let summary = m.run(&mut NullTracer);
        assert_eq!(summary.cycles, n as u64 + 2, "{n} instructions");
        assert_eq!(summary.executed, n as u64);
    }
}

#[test]
fn first_instruction_reaches_execute_on_cycle_three() {
    let mut m = Machine::default();
    m.load_program(&assemble("MOVI R1 5\nMOVI R2 3\n").unwrap());

    let c1 = m.step().unwrap();
    assert_eq!((c1.if_word, c1.id_word, c1.ex.op), (0x3045, NOP_WORD, Op::Nop));
    assert_eq!(c1.stage, StageOutcome::Idle);

    let c2 = m.step().unwrap();
    assert_eq!((c2.if_word, c2.id_word), (0x3083, 0x3045));

    let c3 = m.step().unwrap();
    assert_eq!(c3.ex.op, Op::Movi);
    assert!(matches!(c3.stage, StageOutcome::Executed(_)));
    assert_eq!(c3.state, PipeState::Draining);
    assert_eq!(m.cpu.gpr[1], 5);

    let c4 = m.step().unwrap();
    assert_eq!(c4.state, PipeState::Halted);
    assert_eq!(m.cpu.gpr[2], 3);
    assert!(m.step().is_none());
}

#[test]
fn empty_program_drains_with_zero_registers() {
    let mut m = Machine::default();
    let summary = m.run(&mut NullTracer);
    assert_eq!(summary.reason, HaltReason::Drained);
    assert_eq!(summary.cycles, 2);
    assert!(m.cpu.gpr.iter().all(|&r| r == 0));
}

#[test]
fn nop_only_program_drains_with_zero_registers() {
    let mut m = Machine::default();
    m.load_program(&[NOP_WORD, NOP_WORD, NOP_WORD]);
    let summary = m.run(&mut NullTracer);
    assert_eq!(summary.reason, HaltReason::Drained);
    assert!(summary.cycles <= 4);
    assert_eq!(summary.executed, 0);
    assert!(m.cpu.gpr.iter().all(|&r| r == 0));
    assert_eq!(m.cpu.sreg, Sreg::empty());
}

#[test]
fn unlimited_config_still_drains() {
    let mut m = Machine::new(CpuConfig {
        max_cycles: None,
        ..CpuConfig::default()
    });
    m.load_program(&assemble("MOVI R1 1\nMOVI R2 2\n").unwrap());
    let summary = m.run(&mut NullTracer);
    assert_eq!(summary.reason, HaltReason::Drained);
    assert_eq!(summary.cycles, 4);
}

#[test]
fn recorder_sees_every_cycle() {
    let mut m = Machine::default();
    m.load_program(&assemble(REFERENCE).unwrap());
    let mut rec = Recorder::default();
    let summary = m.run(&mut rec);
    assert_eq!(rec.reports.len() as u64, summary.cycles);
    let cycles: Vec<u64> = rec.reports.iter().map(|r| r.cycle).collect();
    assert_eq!(cycles, (1..=summary.cycles).collect::<Vec<_>>());
}

#[test]
fn reset_clears_everything() {
    let mut m = Machine::default();
    m.load_program(&assemble("MOVI R1 5\nSTR R1 3\n").unwrap());
    m.run(&mut NullTracer);
    m.reset();
    assert_eq!(m.cpu.pc, 0);
    assert!(m.cpu.gpr.iter().all(|&r| r == 0));
    assert!(m.mem.imem.iter().all(|&w| w == 0));
    assert!(m.mem.dmem.iter().all(|&v| v == 0));
    assert_eq!(m.pipe.cycle, 0);
    assert!(!m.pipe.is_halted());
}

#[test]
fn config_defaults_from_empty_json() {
    let cfg: CpuConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg, CpuConfig::default());
    let cfg: CpuConfig =
        serde_json::from_str(r#"{"max_cycles": null, "fetch_policy": "ExplicitLength"}"#).unwrap();
    assert_eq!(cfg.max_cycles, None);
    assert_eq!(cfg.fetch_policy, pipe8_rs::FetchPolicy::ExplicitLength);
}

#[test]
fn nop_word_mid_program_drain_is_cancelled_by_next_fetch() {
    let mut m = Machine::default();
    m.load_program(&[0x3041, NOP_WORD, 0x3082]);
    let mut rec = Recorder::default();
    let summary = m.run(&mut rec);

    assert_eq!(rec.reports[1].state, PipeState::Draining);
    assert_eq!(rec.reports[2].state, PipeState::Running);
    assert_eq!(summary.reason, HaltReason::Drained);
    assert_eq!(summary.cycles, 5);
    assert_eq!((m.cpu.gpr[1], m.cpu.gpr[2]), (1, 2));
}
