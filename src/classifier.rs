//! Worklist classification of a raw byte image into code and data.
//!
//! Classification is a flood fill over control-flow reachability: user
//! entrypoints (and optional pattern seeds) go on a worklist, each popped
//! index is decoded, its operand bytes become code, its branch/jump/call
//! target is promoted and enqueued, and plain instructions continue at the
//! next sequential index. The loop runs to fixpoint; identical inputs
//! always produce an identical table.
//!
//! Precedence is a single rule: Data is sticky. Once a byte is Data no
//! propagation step promotes it back, and the only escape hatch is a user
//! Code entrypoint overriding illegal-opcode demotion at its own address.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::Result;
use crate::tables::{AddressingMode, OpcodeTable};
use crate::types::{ByteState, ByteTable, Entrypoint, EntrypointKind};

/// Classify `bytes` loaded at `start_addr`.
///
/// `entrypoints` outside the image are ignored. `pattern_seeds` are indices
/// from the signature scanner; they seed code like entrypoints do but carry
/// no user override. The opcode table is injected so tests can run against
/// synthetic tables.
pub fn classify(
    start_addr: u16,
    bytes: &[u8],
    entrypoints: &[Entrypoint],
    pattern_seeds: &[usize],
    opcodes: &OpcodeTable,
) -> Result<ByteTable> {
    let mut table = ByteTable::new(start_addr, bytes)?;
    let mut worklist: Vec<usize> = Vec::new();
    let mut visited = vec![false; table.len()];

    // Seed phase: user entrypoints win over everything that follows.
    for ep in entrypoints {
        if let Some(idx) = table.index_of(ep.address) {
            if let Some(entry) = table.get_mut(idx) {
                entry.is_target = true;
                entry.user_marked = true;
                match ep.kind {
                    EntrypointKind::Code => {
                        entry.state = ByteState::Code;
                        worklist.push(idx);
                    }
                    EntrypointKind::Data => entry.state = ByteState::Data,
                }
            }
        }
    }

    // Pattern-seed phase: only bytes nothing else has claimed yet.
    for &idx in pattern_seeds {
        if let Some(entry) = table.get_mut(idx) {
            if entry.state == ByteState::Unknown {
                entry.state = ByteState::Code;
                worklist.push(idx);
            }
        }
    }

    // Propagation to fixpoint. Stack order is deterministic.
    while let Some(idx) = worklist.pop() {
        if visited[idx] {
            continue;
        }
        visited[idx] = true;

        let (raw, user_marked, state) = match table.get(idx) {
            Some(e) => (e.raw, e.user_marked, e.state),
            None => continue,
        };
        if state == ByteState::Data {
            continue;
        }

        let desc = match opcodes.get(raw) {
            Some(d) if !d.illegal || user_marked => *d,
            _ => {
                // Undecodable here: demote to data and stop, unless the
                // user explicitly pinned this address as code.
                if let Some(entry) = table.get_mut(idx) {
                    if !(entry.user_marked && entry.state == ByteState::Code) {
                        entry.state = ByteState::Data;
                    }
                }
                continue;
            }
        };

        // Opcode and operand bytes are code; sticky Data is left alone.
        let len = desc.len();
        for j in idx..(idx + len).min(table.len()) {
            if let Some(entry) = table.get_mut(j) {
                if entry.state != ByteState::Data {
                    entry.state = ByteState::Code;
                }
            }
        }

        // A truncated instruction at the end of the image has no complete
        // operand to resolve and nowhere to fall through to.
        if idx + len > table.len() {
            continue;
        }

        let addr = table.addr_at(idx);
        let target = match desc.mode {
            AddressingMode::Relative => {
                let offset = bytes[idx + 1] as i8;
                Some(addr.wrapping_add(2).wrapping_add(offset as u16))
            }
            m if m.is_absolute_family() => {
                Some(LittleEndian::read_u16(&bytes[idx + 1..idx + 3]))
            }
            _ => None,
        };

        if let Some(target_addr) = target {
            if let Some(target_idx) = table.index_of(target_addr) {
                if let Some(entry) = table.get_mut(target_idx) {
                    entry.xrefs.insert(addr);
                    entry.is_target = true;
                    if desc.flow.is_control_transfer() {
                        if entry.state != ByteState::Data {
                            entry.state = ByteState::Code;
                            worklist.push(target_idx);
                        }
                    } else if entry.state == ByteState::Unknown {
                        // Plain memory access: the referenced byte is data,
                        // but an established Code byte is never demoted.
                        entry.state = ByteState::Data;
                    }
                }
            }
            // Out-of-range targets are hardware or external references;
            // nothing to record.
        }

        if !desc.flow.ends_sequential_flow() {
            let next = idx + len;
            if let Some(entry) = table.get(next) {
                if entry.state != ByteState::Data {
                    worklist.push(next);
                }
            }
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::Tables;
    use pretty_assertions::assert_eq;

    fn run(start: u16, bytes: &[u8], entrypoints: &[Entrypoint]) -> ByteTable {
        classify(start, bytes, entrypoints, &[], &Tables::shared().opcodes).unwrap()
    }

    fn states(table: &ByteTable) -> Vec<ByteState> {
        table.iter().map(|e| e.state).collect()
    }

    #[test]
    fn test_scenario_forward_call_over_data() {
        // JSR $1050 / three junk bytes / padding / LDA #$42, RTS at $1050
        let mut bytes = vec![0x20, 0x50, 0x10, 0x01, 0x02, 0x03];
        bytes.resize(0x50, 0x00);
        bytes.extend_from_slice(&[0xA9, 0x42, 0x60]);

        let table = run(0x1000, &bytes, &[Entrypoint::code(0x1000)]);

        for idx in 0..3 {
            assert_eq!(table.get(idx).unwrap().state, ByteState::Code);
        }
        // No fall-through after the call: the inline bytes stay off the
        // code path and render as data.
        for idx in 3..6 {
            assert_ne!(table.get(idx).unwrap().state, ByteState::Code);
        }
        // Target promoted via the call edge.
        for idx in 0x50..0x53 {
            assert_eq!(table.get(idx).unwrap().state, ByteState::Code);
        }
        let target = table.get(0x50).unwrap();
        assert!(target.is_target);
        assert!(target.xrefs.contains(&0x1000));
    }

    #[test]
    fn test_scenario_illegal_opcode_truncates_run() {
        // LDA #$05 / ISB-family $FF / RTS
        let table = run(0x1000, &[0xA9, 0x05, 0xFF, 0x60], &[Entrypoint::code(0x1000)]);

        assert_eq!(
            states(&table),
            vec![
                ByteState::Code,
                ByteState::Code,
                ByteState::Data,
                ByteState::Unknown,
            ]
        );
    }

    #[test]
    fn test_scenario_memory_access_marks_data() {
        // LDA $D020 -- target outside the image, silently ignored
        let table = run(0x1000, &[0xAD, 0x20, 0xD0, 0x60], &[Entrypoint::code(0x1000)]);
        assert_eq!(table.get(0).unwrap().state, ByteState::Code);
        assert!(table.iter().all(|e| e.xrefs.is_empty()));

        // LDA $1004 -- in-range target becomes data and gets a label
        let table = run(
            0x1000,
            &[0xAD, 0x04, 0x10, 0x60, 0x7F],
            &[Entrypoint::code(0x1000)],
        );
        let target = table.get(4).unwrap();
        assert_eq!(target.state, ByteState::Data);
        assert!(target.is_target);
        assert!(target.xrefs.contains(&0x1000));
    }

    #[test]
    fn test_branch_forward_offset() {
        // BNE +5 at $1000: target = $1002 + 5 = $1007
        let mut bytes = vec![0xD0, 0x05];
        bytes.resize(8, 0xEA);
        let table = run(0x1000, &bytes, &[Entrypoint::code(0x1000)]);
        let target = table.get(7).unwrap();
        assert!(target.is_target);
        assert_eq!(target.state, ByteState::Code);
        assert!(target.xrefs.contains(&0x1000));
    }

    #[test]
    fn test_branch_backward_offset() {
        // Entry at $1002: BNE -2 targets $1004 - 4 ... offset 0xFC = -4,
        // pc-after = $1004, target = $1000.
        let bytes = vec![0xEA, 0xEA, 0xD0, 0xFC, 0x60];
        let table = run(0x1000, &bytes, &[Entrypoint::code(0x1002)]);
        let target = table.get(0).unwrap();
        assert!(target.is_target);
        assert_eq!(target.state, ByteState::Code);
        assert!(target.xrefs.contains(&0x1002));
    }

    #[test]
    fn test_branch_offset_wraps_to_page_start() {
        // BEQ -2 at $1000: pc-after = $1002, offset 0xFE, target $1000.
        let table = run(0x1000, &[0xF0, 0xFE, 0x60], &[Entrypoint::code(0x1000)]);
        let origin = table.get(0).unwrap();
        assert!(origin.is_target);
        assert!(origin.xrefs.contains(&0x1000));
    }

    #[test]
    fn test_idempotence() {
        let mut bytes = vec![0x20, 0x50, 0x10, 0x01, 0x02, 0x03];
        bytes.resize(0x50, 0x00);
        bytes.extend_from_slice(&[0xA9, 0x42, 0x60]);
        let eps = [Entrypoint::code(0x1000), Entrypoint::data(0x1003)];

        let first = run(0x1000, &bytes, &eps);
        let second = run(0x1000, &bytes, &eps);
        assert_eq!(first, second);
    }

    #[test]
    fn test_data_entrypoint_is_sticky_against_jump() {
        // JMP $1003 where $1003 is pinned as data by the user.
        let bytes = vec![0x4C, 0x03, 0x10, 0xA9, 0x05, 0x60];
        let table = run(
            0x1000,
            &bytes,
            &[Entrypoint::code(0x1000), Entrypoint::data(0x1003)],
        );
        let pinned = table.get(3).unwrap();
        assert_eq!(pinned.state, ByteState::Data);
        assert!(pinned.is_target);
        assert!(pinned.xrefs.contains(&0x1000));
        // Nothing downstream of the dead jump either.
        assert_eq!(table.get(4).unwrap().state, ByteState::Unknown);
    }

    #[test]
    fn test_user_code_entry_overrides_illegal() {
        // $FF is undocumented ISB abs,X; a user code entrypoint forces it
        // to decode and propagate.
        let table = run(0x1000, &[0xFF, 0x04, 0x10, 0x60], &[Entrypoint::code(0x1000)]);
        assert_eq!(table.get(0).unwrap().state, ByteState::Code);
        assert_eq!(table.get(1).unwrap().state, ByteState::Code);
        assert_eq!(table.get(2).unwrap().state, ByteState::Code);
    }

    #[test]
    fn test_user_code_entry_on_undecodable_byte() {
        // $02 has no descriptor at all; the entry keeps its Code pin but
        // cannot propagate anywhere.
        let table = run(0x1000, &[0x02, 0xA9, 0x05], &[Entrypoint::code(0x1000)]);
        assert_eq!(table.get(0).unwrap().state, ByteState::Code);
        assert_eq!(table.get(1).unwrap().state, ByteState::Unknown);
    }

    #[test]
    fn test_pattern_seed_on_illegal_byte_demotes() {
        // A pattern seed has no user override, so an undecodable byte it
        // lands on degrades to data when popped.
        let table = classify(
            0x1000,
            &[0x02, 0xEA],
            &[],
            &[0],
            &Tables::shared().opcodes,
        )
        .unwrap();
        assert_eq!(table.get(0).unwrap().state, ByteState::Data);
    }

    #[test]
    fn test_pattern_seed_yields_code() {
        let table = classify(
            0x1000,
            &[0x00, 0xA9, 0x05, 0x60],
            &[],
            &[1],
            &Tables::shared().opcodes,
        )
        .unwrap();
        assert_eq!(table.get(1).unwrap().state, ByteState::Code);
        assert_eq!(table.get(2).unwrap().state, ByteState::Code);
        assert_eq!(table.get(3).unwrap().state, ByteState::Code);
        // Seeds are not user marks and not targets.
        assert!(!table.get(1).unwrap().user_marked);
        assert!(!table.get(1).unwrap().is_target);
    }

    #[test]
    fn test_out_of_range_entrypoint_ignored() {
        let table = run(0x1000, &[0xEA, 0x60], &[Entrypoint::code(0x8000)]);
        assert!(table.iter().all(|e| e.state == ByteState::Unknown));
    }

    #[test]
    fn test_operand_completeness() {
        // Every code line's operand bytes are code too.
        let bytes = vec![0xA9, 0x05, 0x8D, 0x20, 0xD0, 0x4C, 0x00, 0x10];
        let table = run(0x1000, &bytes, &[Entrypoint::code(0x1000)]);
        assert!(table.iter().all(|e| e.state == ByteState::Code));
    }

    #[test]
    fn test_truncated_instruction_at_end() {
        // JMP with only one operand byte present.
        let table = run(0x1000, &[0x4C, 0x00], &[Entrypoint::code(0x1000)]);
        assert_eq!(table.get(0).unwrap().state, ByteState::Code);
        assert_eq!(table.get(1).unwrap().state, ByteState::Code);
    }

    #[test]
    fn test_branch_falls_through() {
        // BEQ +2 then LDA #$01: both paths classified.
        let table = run(
            0x1000,
            &[0xF0, 0x02, 0xA9, 0x01, 0x60, 0x60],
            &[Entrypoint::code(0x1000)],
        );
        assert_eq!(table.get(2).unwrap().state, ByteState::Code); // fall-through
        assert_eq!(table.get(4).unwrap().state, ByteState::Code); // branch target
        assert!(table.get(4).unwrap().is_target);
    }

    #[test]
    fn test_jump_does_not_fall_through() {
        let table = run(
            0x1000,
            &[0x4C, 0x04, 0x10, 0xA9, 0x60],
            &[Entrypoint::code(0x1000)],
        );
        // Byte behind the JMP is unreached; the jump target is code.
        assert_eq!(table.get(3).unwrap().state, ByteState::Unknown);
        assert_eq!(table.get(4).unwrap().state, ByteState::Code);
    }
}
