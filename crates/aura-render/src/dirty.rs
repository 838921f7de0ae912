//! Dirty tracking store
//!
//! Maps a concrete component id to the expression paths that changed.
//! Entries keep first-marked order, and an entry exists only while at
//! least one path is dirty.

use std::rc::{Rc, Weak};

use indexmap::{IndexMap, IndexSet};

use crate::component::{Component, ComponentRef, GlobalId};

/// Separator between expression path segments
pub const PATH_SEPARATOR: char = '.';

#[derive(Debug)]
struct DirtyEntry {
    component: Weak<Component>,
    paths: IndexSet<String>,
}

/// Pending rerender bookkeeping
#[derive(Debug, Default)]
pub struct DirtyTracker {
    entries: IndexMap<GlobalId, DirtyEntry>,
    needs_cleaning: bool,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the ancestors of `path` dirty on a rendered component.
    ///
    /// `"a.b.c"` marks `"a.b"` and `"a"`. A path without separators marks
    /// itself. Returns whether the component was newly queued.
    pub fn add_dirty_value(&mut self, path: &str, component: &ComponentRef) -> bool {
        self.needs_cleaning = true;
        let concrete = component.concrete();
        if !concrete.is_valid() || !concrete.is_rendered() {
            return false;
        }

        let id = concrete.global_id().clone();
        let newly_dirty = !self.entries.contains_key(&id);
        let entry = self.entries.entry(id).or_insert_with(|| DirtyEntry {
            component: Rc::downgrade(&concrete),
            paths: IndexSet::new(),
        });
        for ancestor in ancestor_paths(path) {
            entry.paths.insert(ancestor.to_string());
        }
        if newly_dirty {
            tracing::trace!(component = %concrete.global_id(), path, "Component marked dirty");
        }
        newly_dirty
    }

    pub fn has_dirty_value(&self, component: &ComponentRef) -> bool {
        self.entries.contains_key(component.concrete().global_id())
    }

    pub fn is_dirty_value(&self, path: &str, component: &ComponentRef) -> bool {
        self.entries
            .get(component.concrete().global_id())
            .is_some_and(|entry| entry.paths.contains(path))
    }

    /// Drop one path; the entry goes away with its last path
    pub fn remove_dirty_value(&mut self, path: &str, component: &ComponentRef) {
        let concrete = component.concrete();
        if !concrete.is_valid() {
            return;
        }
        let id = concrete.global_id();
        let Some(entry) = self.entries.get_mut(id) else {
            return;
        };
        entry.paths.shift_remove(path);
        if entry.paths.is_empty() {
            self.entries.shift_remove(id);
        }
    }

    /// Forget everything about a component. Idempotent.
    pub fn clean_component(&mut self, id: &GlobalId) {
        self.entries.shift_remove(id);
    }

    /// Ids in first-marked order
    pub fn pending_ids(&self) -> impl Iterator<Item = &GlobalId> {
        self.entries.keys()
    }

    /// Take every pending entry in first-marked order
    pub(crate) fn drain(&mut self) -> Vec<(GlobalId, Weak<Component>)> {
        self.entries
            .drain(..)
            .map(|(id, entry)| (id, entry.component))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn needs_cleaning(&self) -> bool {
        self.needs_cleaning
    }

    pub(crate) fn take_needs_cleaning(&mut self) -> bool {
        std::mem::take(&mut self.needs_cleaning)
    }
}

/// Dot-truncated prefixes of `path`, longest first
fn ancestor_paths(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut current = path;
    while let Some(idx) = current.rfind(PATH_SEPARATOR) {
        current = &current[..idx];
        out.push(current);
    }
    if out.is_empty() {
        out.push(path);
    }
    out
}
