use pipe8_rs::asm::assemble;
use pipe8_rs::trace::{dump_state, fmt_flags, TextTracer};
use pipe8_rs::{Machine, Sreg};

#[test]
fn text_tracer_prints_slots_and_effects() {
    let mut m = Machine::default();
    m.load_program(&assemble("MOVI R1 5\nMOVI R2 -3\nADD R1 R2\n").unwrap());
    let mut tracer = TextTracer::new(Vec::new());
    m.run(&mut tracer);
    let text = String::from_utf8(tracer.into_inner()).unwrap();

    assert!(text.contains("Cycle 1:"));
    assert!(text.contains("  IF: MOVI R1, 5"));
    assert!(text.contains("  EX: ADD R1, R2"));
    assert!(text.contains("-> R1 = 2"));
    assert!(text.contains("SREG: C=1 V=0 N=0 S=0 Z=0"));
    assert!(!text.contains("Cycle 6:"));
}

#[test]
fn dump_lists_registers_and_nonzero_memory() {
    let mut m = Machine::default();
    m.load_program(&assemble("MOVI R3 7\nSTR R3 6\n").unwrap());
    let summary = m.run(&mut pipe8_rs::trace::NullTracer);
    let mut out = Vec::new();
    dump_state(&mut out, &summary, &m.cpu, &m.mem).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("Execution complete after 4 cycles"));
    assert!(text.contains("R3 = 7\n"));
    assert!(text.contains("R63 = 0\n"));
    assert!(text.contains("Addr 0: 0x30c7  MOVI R3, 7"));
    assert!(text.contains("Addr 6: 0x07 (7)"));
}

#[test]
fn flags_render_in_fixed_order() {
    assert_eq!(fmt_flags(Sreg::empty()), "C=0 V=0 N=0 S=0 Z=0");
    assert_eq!(fmt_flags(Sreg::V | Sreg::Z), "C=0 V=1 N=0 S=0 Z=1");
}

#[test]
fn snapshot_serializes_nonzero_cells() {
    let mut m = Machine::default();
    m.load_program(&assemble("MOVI R3 7\nSTR R3 6\n").unwrap());
    m.run(&mut pipe8_rs::trace::NullTracer);
    let v = serde_json::to_value(m.snapshot()).unwrap();
    assert_eq!(v["pc"], 2);
    assert_eq!(v["registers"][3], 7);
    assert_eq!(v["data"], serde_json::json!([[6, 7]]));
    assert_eq!(v["flags"]["z"], false);
}

/// Accepts `budget` bytes, then fails every write.
struct ShortWriter {
    budget: usize,
    writes_after_failure: usize,
}

impl std::io::Write for ShortWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.budget == 0 {
            self.writes_after_failure += 1;
            return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"));
        }
        let n = buf.len().min(self.budget);
        self.budget -= n;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn text_tracer_keeps_first_write_error_and_stops() {
    let mut m = Machine::default();
    m.load_program(&assemble("MOVI R1 5\nMOVI R2 3\nADD R1 R2\n").unwrap());
    let mut tracer = TextTracer::new(ShortWriter { budget: 20, writes_after_failure: 0 });
    let summary = m.run(&mut tracer);

    // The run itself is unaffected.
    assert_eq!(summary.cycles, 5);
    assert_eq!(m.cpu.gpr[1], 8);

    let err = tracer.take_error().expect("write error recorded");
    assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
    assert!(tracer.take_error().is_none());
    assert_eq!(tracer.into_inner().writes_after_failure, 1);
}
