//! Listing formatter for classified byte tables.
//!
//! A pure pass over an already-classified table: no flow analysis happens
//! here. Each call walks the table front to back and emits exactly one
//! output line per consumed byte range, so the lines always sum to the
//! whole image. Labels come from the user overlay when present and are
//! synthesized from the address otherwise, which keeps them stable across
//! runs.

use byteorder::{ByteOrder, LittleEndian};

use crate::tables::{AddressingMode, Tables};
use crate::types::{ByteState, ByteTable, CommentOverlay, LabelOverlay, OutputLine, Syntax};

/// Longest run of bytes a single data directive consumes.
const DATA_RUN_MAX: usize = 8;

/// Format a classified table into output lines.
///
/// `labels` and `comments` are the user overlays; label names were
/// validated on insert. The opcode table resolves operand counts and
/// templates, the memory map supplies auto-comments.
pub fn format(
    table: &ByteTable,
    tables: &Tables,
    syntax: &Syntax,
    labels: &LabelOverlay,
    comments: &CommentOverlay,
) -> Vec<OutputLine> {
    let mut lines = Vec::new();
    let mut idx = 0;
    while idx < table.len() {
        let line = code_line_at(table, tables, syntax, labels, comments, idx)
            .unwrap_or_else(|| data_line_at(table, syntax, labels, comments, idx));
        idx += line.bytes.len();
        lines.push(line);
    }
    lines
}

/// Resolved label text for `addr`: overlay name or synthesized
/// `prefix + 4-hex-digit-address`.
fn label_text(addr: u16, labels: &LabelOverlay, syntax: &Syntax) -> String {
    match labels.get(addr) {
        Some(name) => name.to_string(),
        None => format!("{}{:04X}", syntax.label_prefix, addr),
    }
}

/// Try to emit the instruction starting at `idx`.
///
/// Returns `None` whenever the byte cannot head a code line: wrong state,
/// no descriptor, illegal without a user mark, truncated at the image end,
/// or an operand byte that is itself a reference target (which must start
/// its own labeled line). The caller falls back to data emission.
fn code_line_at(
    table: &ByteTable,
    tables: &Tables,
    syntax: &Syntax,
    labels: &LabelOverlay,
    comments: &CommentOverlay,
    idx: usize,
) -> Option<OutputLine> {
    let entry = table.get(idx)?;
    if entry.state != ByteState::Code {
        return None;
    }
    let desc = tables.opcodes.get(entry.raw)?;
    if desc.illegal && !entry.user_marked {
        return None;
    }
    let len = desc.len();
    if idx + len > table.len() {
        return None;
    }
    for j in idx + 1..idx + len {
        let operand = table.get(j)?;
        if operand.state != ByteState::Code || operand.is_target {
            return None;
        }
    }

    let addr = table.addr_at(idx);
    let raw: Vec<u8> = (idx..idx + len)
        .filter_map(|j| table.get(j).map(|e| e.raw))
        .collect();

    let mut resolved_operand: Option<u16> = None;
    let text = match desc.mode.operand_len() {
        0 => desc.template.to_string(),
        1 => {
            let replacement = if desc.mode == AddressingMode::Relative {
                let target = addr.wrapping_add(2).wrapping_add((raw[1] as i8) as u16);
                label_text(target, labels, syntax)
            } else {
                format!("${:02X}", raw[1])
            };
            desc.template.replace('@', &replacement)
        }
        _ => {
            let operand = LittleEndian::read_u16(&raw[1..3]);
            resolved_operand = Some(operand);
            let replacement = if table.contains_addr(operand) {
                label_text(operand, labels, syntax)
            } else {
                // External or hardware reference: keep the raw number.
                format!("${:04X}", operand)
            };
            desc.template.replace('@', &replacement)
        }
    };

    let comment = comments
        .get(addr)
        .map(str::to_string)
        .or_else(|| {
            resolved_operand
                .and_then(|a| tables.memory_map.lookup(a))
                .map(str::to_string)
        });

    Some(OutputLine {
        address: addr,
        label: entry
            .is_target
            .then(|| label_text(addr, labels, syntax)),
        text,
        comment,
        bytes: raw,
        xrefs: entry.xrefs.iter().copied().collect(),
        is_data: false,
    })
}

/// Emit a data directive starting at `idx`.
///
/// Consumes up to [`DATA_RUN_MAX`] bytes sharing the first byte's state.
/// The run stops early at any reference target or code byte (so every
/// referenced address heads its own labeled line) and at any address
/// carrying a user comment (so the comment is never swallowed mid-run).
fn data_line_at(
    table: &ByteTable,
    syntax: &Syntax,
    labels: &LabelOverlay,
    comments: &CommentOverlay,
    idx: usize,
) -> OutputLine {
    let addr = table.addr_at(idx);
    let run_state = table.get(idx).map(|e| e.state).unwrap_or_default();

    let mut raw = Vec::new();
    let mut count = 0;
    while count < DATA_RUN_MAX && idx + count < table.len() {
        let entry = match table.get(idx + count) {
            Some(e) => e,
            None => break,
        };
        if count > 0 {
            if entry.is_target || entry.state == ByteState::Code || entry.state != run_state {
                break;
            }
            if comments.contains(table.addr_at(idx + count)) {
                break;
            }
        }
        raw.push(entry.raw);
        count += 1;
    }

    let items: Vec<String> = raw.iter().map(|b| format!("${:02X}", b)).collect();
    let first = table.get(idx);
    OutputLine {
        address: addr,
        label: first
            .filter(|e| e.is_target)
            .map(|_| label_text(addr, labels, syntax)),
        text: format!("{} {}", syntax.data_directive, items.join(", ")),
        comment: comments.get(addr).map(str::to_string),
        bytes: raw,
        xrefs: first.map(|e| e.xrefs.iter().copied().collect()).unwrap_or_default(),
        is_data: true,
    }
}

/// Render lines as assembly source text.
///
/// Cross-reference summaries appear as a comment line above their labeled
/// line, matching how hand-maintained disassemblies annotate entry points.
pub fn render_listing(lines: &[OutputLine], syntax: &Syntax) -> String {
    let mut out = String::new();
    for line in lines {
        if line.label.is_some() {
            if let Some(summary) = line.xref_summary() {
                out.push_str(&format!("{} {}\n", syntax.comment_prefix, summary));
            }
        }
        if let Some(label) = &line.label {
            out.push_str(&format!("{}{}\n", label, syntax.label_suffix));
        }
        match &line.comment {
            Some(comment) => out.push_str(&format!(
                "        {:<24}{} {}\n",
                line.text, syntax.comment_prefix, comment
            )),
            None => out.push_str(&format!("        {}\n", line.text)),
        }
    }
    out
}
