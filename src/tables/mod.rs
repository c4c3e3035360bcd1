//! Static lookup tables: opcode descriptors and the memory map.
//!
//! Both tables are immutable and loaded once per process. `Tables::shared`
//! is a single-flight loader — concurrent first callers share one build and
//! every later call returns the cached reference. The classifier and
//! formatter never reach for the tables themselves; callers pass references
//! in, which keeps the core pure and testable against synthetic tables.

pub mod memmap;
pub mod opcodes;

pub use memmap::MemoryMap;
pub use opcodes::{AddressingMode, FlowKind, OpcodeDescriptor, OpcodeTable};

use std::sync::OnceLock;

/// The loaded table bundle handed to classifier and formatter.
pub struct Tables {
    /// Opcode byte → descriptor.
    pub opcodes: OpcodeTable,
    /// Absolute address → hardware comment.
    pub memory_map: MemoryMap,
}

impl Tables {
    /// Build a fresh bundle. Prefer [`Tables::shared`] outside tests.
    pub fn load() -> Self {
        Self {
            opcodes: OpcodeTable::build(),
            memory_map: MemoryMap::build(),
        }
    }

    /// Process-lifetime shared instance.
    pub fn shared() -> &'static Tables {
        static TABLES: OnceLock<Tables> = OnceLock::new();
        TABLES.get_or_init(Tables::load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_is_singleton() {
        let a = Tables::shared() as *const Tables;
        let b = Tables::shared() as *const Tables;
        assert_eq!(a, b);
    }

    #[test]
    fn test_load_builds_both() {
        let tables = Tables::load();
        assert!(tables.opcodes.get(0xA9).is_some());
        assert!(tables.memory_map.lookup(0xD020).is_some());
    }
}
