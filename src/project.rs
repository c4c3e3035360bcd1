//! Durable project record.
//!
//! A project bundles everything needed to reproduce a listing: the raw
//! bytes (hex-encoded for a readable JSON file), the start address, the
//! entrypoints, and the label/comment overlays. Because classification and
//! formatting are deterministic, reloading a project and re-running the
//! analysis reproduces the exact previously-displayed output.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AnalyzerError, Result};
use crate::types::{CommentOverlay, Entrypoint, LabelOverlay};

/// Format version written by this build.
pub const PROJECT_VERSION: u32 = 1;

/// A persisted label binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRecord {
    /// Labeled address.
    pub address: u16,
    /// Symbolic name.
    pub name: String,
}

/// A persisted comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    /// Commented address.
    pub address: u16,
    /// Comment text.
    pub text: String,
}

/// The on-disk project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Format version; see [`PROJECT_VERSION`].
    pub version: u32,
    /// Display name of the project.
    pub name: String,
    /// Load address of the first byte.
    pub start_address: u16,
    /// Raw image, hex-encoded.
    bytes: String,
    /// User entrypoints.
    pub entrypoints: Vec<Entrypoint>,
    /// User labels.
    pub labels: Vec<LabelRecord>,
    /// User comments.
    pub comments: Vec<CommentRecord>,
}

impl Project {
    /// Create a project over a raw image.
    pub fn new(name: impl Into<String>, start_address: u16, bytes: &[u8]) -> Self {
        Self {
            version: PROJECT_VERSION,
            name: name.into(),
            start_address,
            bytes: hex::encode_upper(bytes),
            entrypoints: Vec::new(),
            labels: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Decode the raw image.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        Ok(hex::decode(&self.bytes)?)
    }

    /// Rebuild the label overlay, re-validating every stored name.
    pub fn label_overlay(&self) -> Result<LabelOverlay> {
        let mut overlay = LabelOverlay::new();
        for record in &self.labels {
            overlay.insert(record.address, record.name.clone())?;
        }
        Ok(overlay)
    }

    /// Rebuild the comment overlay.
    pub fn comment_overlay(&self) -> CommentOverlay {
        let mut overlay = CommentOverlay::new();
        for record in &self.comments {
            overlay.insert(record.address, record.text.clone());
        }
        overlay
    }

    /// Store the current overlays, replacing any previous records.
    pub fn set_overlays(&mut self, labels: &LabelOverlay, comments: &CommentOverlay) {
        self.labels = labels
            .iter()
            .map(|(address, name)| LabelRecord {
                address,
                name: name.to_string(),
            })
            .collect();
        self.comments = comments
            .iter()
            .map(|(address, text)| CommentRecord {
                address,
                text: text.to_string(),
            })
            .collect();
    }

    /// Read a project from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let project: Project = serde_json::from_str(&raw)?;
        if project.version != PROJECT_VERSION {
            return Err(AnalyzerError::ProjectVersion {
                version: project.version,
                expected: PROJECT_VERSION,
            });
        }
        Ok(project)
    }

    /// Write the project to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Project {
        let mut project = Project::new("demo", 0x1000, &[0xA9, 0x05, 0x60]);
        project.entrypoints.push(Entrypoint::code(0x1000));
        let mut labels = LabelOverlay::new();
        labels.insert(0x1000, "start").unwrap();
        let mut comments = CommentOverlay::new();
        comments.insert(0x1000, "entry");
        project.set_overlays(&labels, &comments);
        project
    }

    #[test]
    fn test_bytes_round_trip() {
        let project = sample();
        assert_eq!(project.bytes().unwrap(), vec![0xA9, 0x05, 0x60]);
    }

    #[test]
    fn test_save_load_identity() {
        let project = sample();
        let file = tempfile::NamedTempFile::new().unwrap();
        project.save(file.path()).unwrap();
        let reloaded = Project::load(file.path()).unwrap();
        assert_eq!(project, reloaded);
    }

    #[test]
    fn test_version_rejected() {
        let mut project = sample();
        project.version = 99;
        let file = tempfile::NamedTempFile::new().unwrap();
        // Bypass save-side version stamping by writing directly.
        std::fs::write(file.path(), serde_json::to_string(&project).unwrap()).unwrap();
        let err = Project::load(file.path()).unwrap_err();
        assert!(matches!(err, AnalyzerError::ProjectVersion { version: 99, .. }));
    }

    #[test]
    fn test_overlays_rebuilt() {
        let project = sample();
        let labels = project.label_overlay().unwrap();
        assert_eq!(labels.get(0x1000), Some("start"));
        let comments = project.comment_overlay();
        assert_eq!(comments.get(0x1000), Some("entry"));
    }

    #[test]
    fn test_invalid_stored_label_rejected() {
        let mut project = sample();
        project.labels.push(LabelRecord {
            address: 0x1001,
            name: "9lives".to_string(),
        });
        assert!(project.label_overlay().is_err());
    }
}
