//! 6502 Code/Data Classifier - Listing Recovery for Raw Binaries
//!
//! This library separates executable code from embedded data in raw 6502
//! binary images and renders the result as labeled, commented,
//! cross-referenced assembly-style output.
//!
//! # How it works
//!
//! - **Classification**: a worklist flood fill starts from user-supplied
//!   entrypoints and transitively discovers code by following calls, jumps,
//!   branches, and sequential flow. Memory accesses mark their in-range
//!   targets as data; undecodable bytes degrade to data.
//! - **Formatting**: a pure pass over the classified table emits
//!   instruction lines, data directives, labels, cross-reference
//!   annotations, and memory-map comments.
//!
//! Both passes are deterministic and idempotent, so callers simply
//! recompute on input changes: re-classify when the bytes or entrypoints
//! change, re-format when only labels, comments, or syntax change.
//!
//! # Quick Start
//!
//! ```rust
//! use m6502_classifier::{analyze_bytes, AnalyzerOptions, CommentOverlay,
//!     Entrypoint, LabelOverlay};
//!
//! fn main() -> Result<(), m6502_classifier::AnalyzerError> {
//!     // LDA #$05 / STA $D020 / RTS
//!     let bytes = [0xA9, 0x05, 0x8D, 0x20, 0xD0, 0x60];
//!     let listing = analyze_bytes(
//!         &bytes,
//!         0x1000,
//!         &[Entrypoint::code(0x1000)],
//!         &LabelOverlay::new(),
//!         &CommentOverlay::new(),
//!         &AnalyzerOptions::new(),
//!     )?;
//!     for line in &listing.lines {
//!         println!("{:04X}  {}", line.address, line.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Scope
//!
//! The analysis is static and runs a single image to fixpoint. Indirect
//! jumps, jump tables, and self-modifying code are out of scope by design;
//! unresolved regions stay data until the user adds entrypoints.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]

pub mod classifier;
pub mod error;
pub mod formatter;
pub mod patterns;
pub mod project;
pub mod tables;
pub mod types;

pub use error::{AnalyzerError, Result};
pub use project::Project;
pub use tables::Tables;
pub use types::{
    AnalyzerOptions, ByteEntry, ByteState, ByteTable, CommentOverlay, Entrypoint,
    EntrypointKind, LabelOverlay, Listing, OutputLine, Syntax,
};

/// Classify and format a raw image in one call.
///
/// This is the primary library entry point. It loads the shared opcode and
/// memory-map tables (first call builds them; later calls reuse them), runs
/// the optional pattern-seed scan, classifies, and formats.
///
/// Callers that want to re-format without re-classifying — the common case
/// for label or comment edits — use [`classifier::classify`] and
/// [`formatter::format`] directly and keep the [`ByteTable`] around.
///
/// # Errors
///
/// Fails only when the image does not fit in the 64KB address space from
/// `start_addr`.
pub fn analyze_bytes(
    bytes: &[u8],
    start_addr: u16,
    entrypoints: &[Entrypoint],
    labels: &LabelOverlay,
    comments: &CommentOverlay,
    options: &AnalyzerOptions,
) -> Result<Listing> {
    let tables = Tables::shared();
    let seeds = if options.use_patterns {
        patterns::scan(bytes)
    } else {
        Vec::new()
    };
    let table = classifier::classify(start_addr, bytes, entrypoints, &seeds, &tables.opcodes)?;
    let lines = formatter::format(&table, tables, &options.syntax, labels, comments);
    Ok(Listing { table, lines })
}

/// Analyze a saved project record.
///
/// Decodes the stored image, rebuilds the overlays (label names are
/// re-validated), and runs [`analyze_bytes`]. Determinism guarantees the
/// listing matches what was on screen when the project was saved.
///
/// # Errors
///
/// Fails on a corrupt byte payload, an invalid stored label name, or an
/// oversized image.
pub fn analyze_project(project: &Project, options: &AnalyzerOptions) -> Result<Listing> {
    let bytes = project.bytes()?;
    let labels = project.label_overlay()?;
    let comments = project.comment_overlay();
    analyze_bytes(
        &bytes,
        project.start_address,
        &project.entrypoints,
        &labels,
        &comments,
        options,
    )
}

/// Get version information for this library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_analyze_bytes_end_to_end() {
        let bytes = [0xA9, 0x05, 0x8D, 0x20, 0xD0, 0x60];
        let listing = analyze_bytes(
            &bytes,
            0x1000,
            &[Entrypoint::code(0x1000)],
            &LabelOverlay::new(),
            &CommentOverlay::new(),
            &AnalyzerOptions::new(),
        )
        .unwrap();

        assert!(listing.table.iter().all(|e| e.state == ByteState::Code));
        let texts: Vec<&str> = listing.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["LDA #$05", "STA $D020", "RTS"]);
        assert_eq!(
            listing.lines[1].comment.as_deref(),
            Some("Border color")
        );
    }

    #[test]
    fn test_analyze_rejects_oversized_image() {
        let bytes = vec![0u8; 0x100];
        let err = analyze_bytes(
            &bytes,
            0xFFC0,
            &[],
            &LabelOverlay::new(),
            &CommentOverlay::new(),
            &AnalyzerOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalyzerError::ImageTooLarge { .. }));
    }

    #[test]
    fn test_pattern_option_seeds_code() {
        // No entrypoints at all: only the signature scan finds the code.
        let bytes = [0x78, 0xA2, 0xFF, 0x9A, 0x60];
        let without = analyze_bytes(
            &bytes,
            0xC000,
            &[],
            &LabelOverlay::new(),
            &CommentOverlay::new(),
            &AnalyzerOptions::new(),
        )
        .unwrap();
        assert!(without.lines.iter().all(|l| l.is_data));

        let with = analyze_bytes(
            &bytes,
            0xC000,
            &[],
            &LabelOverlay::new(),
            &CommentOverlay::new(),
            &AnalyzerOptions::new().with_patterns(),
        )
        .unwrap();
        let texts: Vec<&str> = with.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["SEI", "LDX #$FF", "TXS", "RTS"]);
    }

    #[test]
    fn test_project_round_trip_reproduces_listing() {
        let mut bytes = vec![0x20, 0x50, 0x10, 0x01, 0x02, 0x03];
        bytes.resize(0x50, 0x00);
        bytes.extend_from_slice(&[0xA9, 0x42, 0x60]);

        let mut project = Project::new("roundtrip", 0x1000, &bytes);
        project.entrypoints.push(Entrypoint::code(0x1000));
        let mut labels = LabelOverlay::new();
        labels.insert(0x1050, "draw").unwrap();
        let mut comments = CommentOverlay::new();
        comments.insert(0x1000, "main entry");
        project.set_overlays(&labels, &comments);

        let options = AnalyzerOptions::new();
        let original = analyze_project(&project, &options).unwrap();

        let file = tempfile::NamedTempFile::new().unwrap();
        project.save(file.path()).unwrap();
        let reloaded = Project::load(file.path()).unwrap();
        let reproduced = analyze_project(&reloaded, &options).unwrap();

        assert_eq!(original.lines, reproduced.lines);
        assert_eq!(original.table, reproduced.table);

        // Overlay data survived the trip.
        assert_eq!(
            reproduced
                .lines
                .iter()
                .find(|l| l.address == 0x1050)
                .unwrap()
                .label
                .as_deref(),
            Some("draw")
        );
        assert_eq!(
            reproduced.lines[0].comment.as_deref(),
            Some("main entry")
        );
    }

    #[test]
    fn test_structural_vs_cosmetic_recompute() {
        // Cosmetic change: re-format the same table with a different
        // syntax; classification is untouched.
        let bytes = [0x41, 0x42, 0x60];
        let listing = analyze_bytes(
            &bytes,
            0x1000,
            &[],
            &LabelOverlay::new(),
            &CommentOverlay::new(),
            &AnalyzerOptions::new(),
        )
        .unwrap();

        let tables = Tables::shared();
        let reformatted = formatter::format(
            &listing.table,
            tables,
            &Syntax::ca65(),
            &LabelOverlay::new(),
            &CommentOverlay::new(),
        );
        assert_eq!(reformatted[0].text, ".byte $41, $42, $60");
        assert_eq!(listing.lines[0].text, "!byte $41, $42, $60");
    }
}
