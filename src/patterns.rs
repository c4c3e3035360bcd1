//! Instruction-sequence signature scanning.
//!
//! An optional seeding phase: known 6502 idioms located in the raw image
//! become extra code entrypoints for the classifier. A seed carries no user
//! authority — if it lands somewhere that fails to decode, propagation
//! demotes it to data like any other byte.

use memchr::memchr_iter;

/// A byte-sequence signature; `None` positions match any byte.
///
/// The first position must be concrete so the scanner can use a fast
/// single-byte search for candidates.
pub struct Signature {
    /// Short identifier for diagnostics.
    pub name: &'static str,
    /// Pattern bytes, wildcards as `None`.
    pub pattern: &'static [Option<u8>],
}

/// Idioms common enough in 6502 programs to justify seeding.
pub static SIGNATURES: &[Signature] = &[
    // SEI / LDX #imm / TXS -- classic reset/init entry
    Signature {
        name: "init-stack",
        pattern: &[Some(0x78), Some(0xA2), None, Some(0x9A)],
    },
    // PLA/TAY/PLA/TAX/PLA/RTI -- stock interrupt epilogue
    Signature {
        name: "irq-exit",
        pattern: &[
            Some(0x68),
            Some(0xA8),
            Some(0x68),
            Some(0xAA),
            Some(0x68),
            Some(0x40),
        ],
    },
    // PHA/TXA/PHA/TYA/PHA -- stock interrupt prologue
    Signature {
        name: "irq-entry",
        pattern: &[Some(0x48), Some(0x8A), Some(0x48), Some(0x98), Some(0x48)],
    },
    // LDX #$00 / LDA abs,X -- copy/print loop head
    Signature {
        name: "copy-loop",
        pattern: &[Some(0xA2), Some(0x00), Some(0xBD)],
    },
    // LDA $D012 / CMP #imm -- raster poll
    Signature {
        name: "raster-wait",
        pattern: &[Some(0xAD), Some(0x12), Some(0xD0), Some(0xC9)],
    },
];

/// Scan `bytes` for all signatures; returns match start indices, sorted
/// and de-duplicated.
pub fn scan(bytes: &[u8]) -> Vec<usize> {
    let mut seeds = Vec::new();
    for sig in SIGNATURES {
        let first = match sig.pattern.first() {
            Some(&Some(b)) => b,
            _ => continue,
        };
        for start in memchr_iter(first, bytes) {
            if matches_at(bytes, start, sig.pattern) {
                seeds.push(start);
            }
        }
    }
    seeds.sort_unstable();
    seeds.dedup();
    seeds
}

fn matches_at(bytes: &[u8], start: usize, pattern: &[Option<u8>]) -> bool {
    if start + pattern.len() > bytes.len() {
        return false;
    }
    pattern
        .iter()
        .zip(&bytes[start..])
        .all(|(want, &have)| want.map_or(true, |w| w == have))
}
