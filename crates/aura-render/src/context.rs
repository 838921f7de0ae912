//! Per-pass reconciliation state

use std::collections::HashSet;
use std::rc::Rc;

use crate::component::{ComponentRef, GlobalId};

/// State threaded through one top-level rerender pass.
///
/// Nested rerenders triggered from renderer hooks reuse the same context,
/// so no component is processed twice within a pass. Components rendered
/// for the first time during the pass queue up for `after_render`.
#[derive(Debug, Default)]
pub struct ReconciliationContext {
    visited: HashSet<GlobalId>,
    after_render: Vec<ComponentRef>,
}

impl ReconciliationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visited(&self, id: &GlobalId) -> bool {
        self.visited.contains(id)
    }

    /// Returns false if the id was already visited
    pub fn mark_visited(&mut self, id: GlobalId) -> bool {
        self.visited.insert(id)
    }

    pub fn queue_after_render(&mut self, component: &ComponentRef) {
        if !self.after_render.iter().any(|c| Rc::ptr_eq(c, component)) {
            self.after_render.push(Rc::clone(component));
        }
    }

    pub(crate) fn take_after_render(&mut self) -> Vec<ComponentRef> {
        std::mem::take(&mut self.after_render)
    }
}
