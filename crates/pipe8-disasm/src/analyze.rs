use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use serde::Serialize;

use pipe8_rs::decoder::{Decoder, Op};
use pipe8_rs::disasm::fmt_decoded;
use pipe8_rs::isa::p8::P8Decoder;
use pipe8_rs::FetchPolicy;

use crate::model::{is_mapped, read_word, Image};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Fallthrough,
    CondBranch,
    /// BR: the target lives in registers and is not resolved statically.
    Indirect,
}

impl EdgeKind {
    fn short(self) -> &'static str {
        match self {
            EdgeKind::Fallthrough => "ft",
            EdgeKind::CondBranch => "cbr",
            EdgeKind::Indirect => "ind",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: u16,
    pub to: Option<u16>,
    pub kind: EdgeKind,
}

/// Result of walking the image from a set of entry points.
#[derive(Debug, Clone, Default)]
pub struct Walk {
    pub visited: HashSet<u16>,
    pub edges: Vec<Edge>,
    /// BR sites; nothing falls through them.
    pub terminators: HashSet<u16>,
    /// Zero words reached while walking a zero-terminated program.
    pub ends: HashSet<u16>,
}

/// Follow sequential flow and BEQZ targets from `entries`. A taken BEQZ with
/// a positive offset continues at `pc + 1 + imm`; BR ends the path.
pub fn analyze_entries(img: &Image, entries: &[u16], max_instr: usize, policy: FetchPolicy) -> Walk {
    let dec = P8Decoder::new();
    let mut walk = Walk::default();
    let mut queue: VecDeque<u16> = entries.iter().copied().filter(|&e| is_mapped(img, e)).collect();
    let mut steps = 0usize;

    while let Some(pc) = queue.pop_front() {
        if steps >= max_instr {
            break;
        }
        if walk.visited.contains(&pc) {
            continue;
        }
        let Some(raw) = read_word(img, pc) else { continue };
        if policy == FetchPolicy::ZeroTerminated && raw == 0 {
            walk.ends.insert(pc);
            continue;
        }
        walk.visited.insert(pc);
        steps += 1;

        let d = dec.decode(raw);
        let ft = pc.wrapping_add(1);
        match d.op {
            Op::Beqz if d.imm > 0 => {
                let tgt = ft.wrapping_add(d.imm as u16);
                walk.edges.push(Edge { from: pc, to: Some(tgt), kind: EdgeKind::CondBranch });
                if is_mapped(img, tgt) {
                    queue.push_back(tgt);
                }
                walk.edges.push(Edge { from: pc, to: Some(ft), kind: EdgeKind::Fallthrough });
                if is_mapped(img, ft) {
                    queue.push_back(ft);
                }
            }
            Op::Br => {
                walk.edges.push(Edge { from: pc, to: None, kind: EdgeKind::Indirect });
                walk.terminators.insert(pc);
            }
            _ => {
                if is_mapped(img, ft) {
                    queue.push_back(ft);
                }
            }
        }
    }
    walk
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockOut {
    pub start: u16,
    pub end: u16,
    pub insns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeOut {
    pub from: u16,
    pub to: Option<u16>,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionOut {
    pub entry: u16,
    pub blocks: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub entries: Vec<u16>,
    pub instructions: usize,
    pub blocks: Vec<BlockOut>,
    pub edges: Vec<EdgeOut>,
    pub functions: Vec<FunctionOut>,
}

/// Walk the image, cut it into basic blocks and collect block-level edges.
pub fn build_report(img: &Image, entries: &[u16], max_instr: usize, policy: FetchPolicy) -> Report {
    let mut seeds = entries.to_vec();
    seeds.sort_unstable();
    seeds.dedup();
    let walk = analyze_entries(img, &seeds, max_instr, policy);

    let mut starts: BTreeSet<u16> = seeds.iter().copied().collect();
    starts.extend(walk.edges.iter().filter_map(|e| e.to));
    let branches: HashSet<u16> = walk
        .edges
        .iter()
        .filter(|e| e.kind == EdgeKind::CondBranch)
        .map(|e| e.from)
        .collect();

    let dec = P8Decoder::new();
    let mut blocks = Vec::new();
    let mut edges = Vec::new();
    let mut owner: HashMap<u16, u16> = HashMap::new();
    for &start in &starts {
        if !walk.visited.contains(&start) || owner.contains_key(&start) {
            continue;
        }
        let mut insns = Vec::new();
        let mut cur = start;
        loop {
            owner.insert(cur, start);
            if let Some(raw) = read_word(img, cur) {
                insns.push(format!("{cur:#06x}: {}", fmt_decoded(&dec.decode(raw))));
            }
            let next = cur.wrapping_add(1);
            let closes = walk.terminators.contains(&cur) || branches.contains(&cur);
            if closes || !walk.visited.contains(&next) || starts.contains(&next) {
                let out: Vec<&Edge> = walk.edges.iter().filter(|e| e.from == cur).collect();
                if out.is_empty() && !closes && walk.visited.contains(&next) {
                    edges.push(EdgeOut { from: start, to: Some(next), kind: EdgeKind::Fallthrough.short().into() });
                }
                for e in out {
                    edges.push(EdgeOut { from: start, to: e.to, kind: e.kind.short().into() });
                }
                blocks.push(BlockOut { start, end: next, insns });
                break;
            }
            cur = next;
        }
    }

    let mut adj: HashMap<u16, Vec<u16>> = HashMap::new();
    for e in &edges {
        if let Some(to) = e.to {
            adj.entry(e.from).or_default().push(to);
        }
    }
    let functions = seeds
        .iter()
        .filter(|s| walk.visited.contains(s))
        .map(|&entry| {
            let mut seen: BTreeSet<u16> = BTreeSet::new();
            let mut q = VecDeque::from([entry]);
            while let Some(b) = q.pop_front() {
                if !seen.insert(b) {
                    continue;
                }
                if let Some(nexts) = adj.get(&b) {
                    q.extend(nexts.iter().copied());
                }
            }
            FunctionOut { entry, blocks: seen.into_iter().collect() }
        })
        .collect();

    Report { entries: seeds, instructions: walk.visited.len(), blocks, edges, functions }
}
