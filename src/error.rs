//! Error types for the 6502 classifier.
//!
//! Out-of-range entrypoints and branch targets are deliberately NOT errors:
//! they are legitimate references to hardware registers or external ROM and
//! the analysis ignores them silently. The variants here cover the few
//! inputs a caller can genuinely get wrong.

use thiserror::Error;

/// Primary error type for the classifier library.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The image does not fit in the 6502 address space from its start address.
    #[error("Image too large: {len} bytes from ${start:04X} exceeds the 64KB address space")]
    ImageTooLarge { start: u16, len: usize },

    /// A label name rejected at the overlay boundary.
    ///
    /// Names must start with a letter or underscore and continue with
    /// letters, digits, underscores, or hyphens.
    #[error("Invalid label name: {name:?}")]
    InvalidLabelName { name: String },

    /// Project file carries a version this build does not understand.
    #[error("Unsupported project version: {version} (expected {expected})")]
    ProjectVersion { version: u32, expected: u32 },

    /// Project file is not valid JSON or misses required fields.
    #[error("Project format error: {0}")]
    ProjectFormat(#[from] serde_json::Error),

    /// Project byte payload is not valid hex.
    #[error("Project byte payload error: {0}")]
    HexPayload(#[from] hex::FromHexError),
}

/// Result type alias for classifier operations.
pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalyzerError::ImageTooLarge {
            start: 0xC000,
            len: 0x5000,
        };
        let msg = err.to_string();
        assert!(msg.contains("C000"));
        assert!(msg.contains("20480"));
    }

    #[test]
    fn test_invalid_label_display() {
        let err = AnalyzerError::InvalidLabelName {
            name: "1bad".to_string(),
        };
        assert!(err.to_string().contains("1bad"));
    }
}
