use std::collections::HashMap;

use tracing::debug;

use crate::ast::ast::{Program, StmtKind};

/// Bytes per top-level variable slot.
pub const SLOT_SIZE: u32 = 4;

/// Where top-level variables live in linear memory.
///
/// Slots are handed out in declaration order and never reused, so a layout
/// can be carried from one compilation unit to the next.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryLayout {
    pub globals: HashMap<String, u32>,
    /// The next free slot index.
    pub offset: u32,
}

impl MemoryLayout {
    pub fn new() -> Self {
        MemoryLayout::default()
    }

    /// Returns a layout extended with a fresh slot for every top-level `Init`
    /// of `program`. A re-declared name moves to its new slot.
    pub fn augment(&self, program: &Program) -> MemoryLayout {
        let mut layout = self.clone();

        for stmt in program.body.iter() {
            if let StmtKind::Init { name, .. } = &stmt.kind {
                debug!(name = name.as_str(), slot = layout.offset, "allocated slot");
                layout.globals.insert(name.clone(), layout.offset);
                layout.offset += 1;
            }
        }

        layout
    }

    pub fn address_of(&self, name: &str) -> Option<i32> {
        self.globals
            .get(name)
            .map(|slot| (slot * SLOT_SIZE) as i32)
    }
}
