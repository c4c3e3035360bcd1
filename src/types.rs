//! Core types for the 6502 classifier.
//!
//! This module defines the classified byte table, entrypoints, the
//! user-editable label/comment overlays, and the output line model the
//! formatter produces. Classification state is a single tagged enum —
//! a byte is Unknown, Data, or Code, never a mix — with `is_target` and
//! `user_marked` carried as independent derived fields.

use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Classification state of a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteState {
    /// Not yet reached by any analysis step.
    #[default]
    Unknown,
    /// Established as data; sticky — later propagation never promotes it.
    Data,
    /// Established as executable code (opcode or operand byte).
    Code,
}

impl fmt::Display for ByteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteState::Unknown => write!(f, "unknown"),
            ByteState::Data => write!(f, "data"),
            ByteState::Code => write!(f, "code"),
        }
    }
}

/// One classified byte of the analyzed image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteEntry {
    /// Raw byte value.
    pub raw: u8,
    /// Current classification.
    pub state: ByteState,
    /// Some instruction or entrypoint references this address; drives label emission.
    pub is_target: bool,
    /// Set only by an explicit user entrypoint; the sole override for
    /// illegal-opcode-as-data handling.
    pub user_marked: bool,
    /// Addresses of instructions referencing this byte, kept sorted and unique.
    pub xrefs: BTreeSet<u16>,
}

impl ByteEntry {
    /// Create a fresh, unclassified entry.
    pub fn new(raw: u8) -> Self {
        Self {
            raw,
            state: ByteState::Unknown,
            is_target: false,
            user_marked: false,
            xrefs: BTreeSet::new(),
        }
    }
}

/// The classified byte table: one entry per input byte, indexed by position.
///
/// Address and index are interchangeable through `start`: the entry at
/// index `i` describes address `start + i`. The table owns no labels or
/// comments — those live in overlays so they survive re-analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteTable {
    start: u16,
    entries: Vec<ByteEntry>,
}

impl ByteTable {
    /// Build an unclassified table over `bytes` loaded at `start`.
    ///
    /// Fails only when the image does not fit in the 16-bit address space
    /// from `start`; an empty image is a valid (empty) table.
    pub fn new(start: u16, bytes: &[u8]) -> Result<Self> {
        if start as usize + bytes.len() > 0x1_0000 {
            return Err(AnalyzerError::ImageTooLarge {
                start,
                len: bytes.len(),
            });
        }
        Ok(Self {
            start,
            entries: bytes.iter().map(|&b| ByteEntry::new(b)).collect(),
        })
    }

    /// Load address of the first byte.
    pub fn start(&self) -> u16 {
        self.start
    }

    /// Number of bytes in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Address of the entry at `index`.
    pub fn addr_at(&self, index: usize) -> u16 {
        self.start.wrapping_add(index as u16)
    }

    /// Index of `addr`, or `None` when the address lies outside the image.
    pub fn index_of(&self, addr: u16) -> Option<usize> {
        let offset = addr.checked_sub(self.start)? as usize;
        (offset < self.entries.len()).then_some(offset)
    }

    /// True when `addr` falls inside the analyzed range.
    pub fn contains_addr(&self, addr: u16) -> bool {
        self.index_of(addr).is_some()
    }

    /// Entry at `index`.
    pub fn get(&self, index: usize) -> Option<&ByteEntry> {
        self.entries.get(index)
    }

    /// Mutable entry at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut ByteEntry> {
        self.entries.get_mut(index)
    }

    /// Iterate entries in address order.
    pub fn iter(&self) -> impl Iterator<Item = &ByteEntry> {
        self.entries.iter()
    }

    /// Raw byte values in address order.
    pub fn raw_bytes(&self) -> Vec<u8> {
        self.entries.iter().map(|e| e.raw).collect()
    }
}

/// Kind of a user-supplied entrypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrypointKind {
    /// Seed classification as executable code and propagate from here.
    Code,
    /// Pin this address as data; no propagation.
    Data,
}

/// A user-supplied classification seed.
///
/// Entrypoints outside the analyzed range are silently ignored — they
/// commonly point at ROM routines or hardware registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrypoint {
    /// Absolute address of the seed.
    pub address: u16,
    /// Whether the seed marks code or data.
    pub kind: EntrypointKind,
}

impl Entrypoint {
    /// Code entrypoint at `address`.
    pub fn code(address: u16) -> Self {
        Self {
            address,
            kind: EntrypointKind::Code,
        }
    }

    /// Data entrypoint at `address`.
    pub fn data(address: u16) -> Self {
        Self {
            address,
            kind: EntrypointKind::Data,
        }
    }
}

impl fmt::Display for Entrypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EntrypointKind::Code => write!(f, "${:04X}", self.address),
            EntrypointKind::Data => write!(f, "${:04X}:data", self.address),
        }
    }
}

/// Check a label name against the overlay naming rule: a letter or
/// underscore first, then letters, digits, underscores, or hyphens.
pub fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// User-editable address → symbolic name map.
///
/// Names are validated on insert so the formatter can assume every stored
/// name is well-formed. The overlay persists across re-analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelOverlay {
    map: BTreeMap<u16, String>,
}

impl LabelOverlay {
    /// Empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `address`, replacing any previous binding.
    pub fn insert(&mut self, address: u16, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if !is_valid_label_name(&name) {
            return Err(AnalyzerError::InvalidLabelName { name });
        }
        self.map.insert(address, name);
        Ok(())
    }

    /// Name bound to `address`, if any.
    pub fn get(&self, address: u16) -> Option<&str> {
        self.map.get(&address).map(String::as_str)
    }

    /// Remove the binding at `address`.
    pub fn remove(&mut self, address: u16) -> Option<String> {
        self.map.remove(&address)
    }

    /// Iterate bindings in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        self.map.iter().map(|(&a, n)| (a, n.as_str()))
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when no bindings exist.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// User-editable address → comment map.
///
/// A user comment at an address takes precedence over any memory-map
/// auto-comment the formatter would derive there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentOverlay {
    map: BTreeMap<u16, String>,
}

impl CommentOverlay {
    /// Empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `text` to `address`, replacing any previous comment.
    pub fn insert(&mut self, address: u16, text: impl Into<String>) {
        self.map.insert(address, text.into());
    }

    /// Comment at `address`, if any.
    pub fn get(&self, address: u16) -> Option<&str> {
        self.map.get(&address).map(String::as_str)
    }

    /// True when a comment exists at `address`.
    pub fn contains(&self, address: u16) -> bool {
        self.map.contains_key(&address)
    }

    /// Remove the comment at `address`.
    pub fn remove(&mut self, address: u16) -> Option<String> {
        self.map.remove(&address)
    }

    /// Iterate comments in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        self.map.iter().map(|(&a, t)| (a, t.as_str()))
    }

    /// Number of comments.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when no comments exist.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// One line of formatted output.
///
/// Recomputed fresh on every run; never persisted. The `bytes` field holds
/// exactly the input bytes this line consumed, so a listing's lines sum to
/// the whole image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputLine {
    /// Address of the first byte on this line.
    pub address: u16,
    /// Symbolic name emitted for this address, when it is a reference target.
    pub label: Option<String>,
    /// Instruction or data-directive text.
    pub text: String,
    /// User or memory-map comment, if any.
    pub comment: Option<String>,
    /// Raw bytes consumed by this line.
    pub bytes: Vec<u8>,
    /// Referencing addresses, sorted and de-duplicated; empty when unreferenced.
    pub xrefs: Vec<u16>,
    /// True for data-directive lines, false for instruction lines.
    pub is_data: bool,
}

impl OutputLine {
    /// Cross-reference annotation for labeled lines, `None` when empty.
    pub fn xref_summary(&self) -> Option<String> {
        if self.xrefs.is_empty() {
            return None;
        }
        let refs: Vec<String> = self.xrefs.iter().map(|a| format!("${:04X}", a)).collect();
        Some(format!("x-ref: {}", refs.join(", ")))
    }
}

/// Purely textual syntax configuration for the formatter.
///
/// Swapping the syntax changes how lines read, never what they mean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syntax {
    /// Directive that introduces a data line, e.g. `!byte` or `.byte`.
    pub data_directive: String,
    /// Prefix that introduces a comment, e.g. `;`.
    pub comment_prefix: String,
    /// Suffix appended to a label definition, e.g. `:` (may be empty).
    pub label_suffix: String,
    /// Prefix for synthesized labels, completed with the 4-hex-digit address.
    pub label_prefix: String,
}

impl Syntax {
    /// ACME assembler flavor.
    pub fn acme() -> Self {
        Self {
            data_directive: "!byte".to_string(),
            comment_prefix: ";".to_string(),
            label_suffix: String::new(),
            label_prefix: "L".to_string(),
        }
    }

    /// ca65 assembler flavor.
    pub fn ca65() -> Self {
        Self {
            data_directive: ".byte".to_string(),
            comment_prefix: ";".to_string(),
            label_suffix: ":".to_string(),
            label_prefix: "L".to_string(),
        }
    }

    /// Override the synthesized-label prefix.
    pub fn with_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = prefix.into();
        self
    }
}

impl Default for Syntax {
    fn default() -> Self {
        Self::acme()
    }
}

/// Options controlling an analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOptions {
    /// Run the signature scanner and seed extra code entrypoints from matches.
    pub use_patterns: bool,
    /// Output syntax for the formatting pass.
    pub syntax: Syntax,
}

impl AnalyzerOptions {
    /// Options with default settings (no pattern seeding, ACME syntax).
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pattern seeding.
    pub fn with_patterns(mut self) -> Self {
        self.use_patterns = true;
        self
    }

    /// Use a specific output syntax.
    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }
}

/// Complete result of one analysis run: the classified table plus the
/// formatted lines derived from it.
#[derive(Debug, Clone)]
pub struct Listing {
    /// The classified byte table.
    pub table: ByteTable,
    /// Formatted output lines in address order.
    pub lines: Vec<OutputLine>,
}
