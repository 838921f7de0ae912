//! Facet reconciliation
//!
//! Diffs the children a parent rendered last time against its new child
//! list. Matching is by identity and the scan order decides tie-breaks:
//! each new child claims the first unconsumed old slot holding the same
//! component.

use std::rc::Rc;

use crate::component::ComponentRef;

/// An ordered child list, possibly sparse
#[derive(Debug, Clone, Default)]
pub struct Facet(Vec<Option<ComponentRef>>);

impl Facet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries, holes included
    pub fn entries(&self) -> &[Option<ComponentRef>] {
        &self.0
    }

    /// Children with holes removed
    pub fn components(&self) -> Vec<ComponentRef> {
        self.0.iter().flatten().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }
}

impl From<ComponentRef> for Facet {
    fn from(component: ComponentRef) -> Self {
        Self(vec![Some(component)])
    }
}

impl From<Vec<ComponentRef>> for Facet {
    fn from(components: Vec<ComponentRef>) -> Self {
        Self(components.into_iter().map(Some).collect())
    }
}

impl From<&[ComponentRef]> for Facet {
    fn from(components: &[ComponentRef]) -> Self {
        Self(components.iter().cloned().map(Some).collect())
    }
}

impl From<Vec<Option<ComponentRef>>> for Facet {
    fn from(entries: Vec<Option<ComponentRef>>) -> Self {
        Self(entries)
    }
}

impl FromIterator<ComponentRef> for Facet {
    fn from_iter<I: IntoIterator<Item = ComponentRef>>(iter: I) -> Self {
        Self(iter.into_iter().map(Some).collect())
    }
}

/// What to do with one child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetAction {
    /// New child with no DOM presence yet
    Render,
    /// Child present before and after
    Rerender,
    /// Child no longer in the facet
    Unrender,
}

/// A single reconciliation step
#[derive(Debug, Clone)]
pub struct FacetOp {
    pub action: FacetAction,
    pub component: ComponentRef,
    /// Slot in the previous snapshot (`None` for renders)
    pub old_index: Option<usize>,
    /// Slot in the new list (`None` for unrenders)
    pub new_index: Option<usize>,
}

/// Result of [`diff_facets`]
#[derive(Debug, Clone, Default)]
pub struct FacetDiff {
    /// Unrenders first (in old order), then renders/rerenders in new order
    pub operations: Vec<FacetOp>,
    /// Relative order of kept children changed; rebuild in a fragment
    pub requires_fragment: bool,
    /// Nothing remains to show
    pub is_full_unrender: bool,
    /// Snapshot to store once the operations are applied
    pub facet_info: Vec<ComponentRef>,
}

impl FacetDiff {
    /// Operations of one kind
    pub fn ops(&self, action: FacetAction) -> impl Iterator<Item = &FacetOp> {
        self.operations.iter().filter(move |op| op.action == action)
    }
}

/// Compute the operations turning `old` into `new`
pub fn diff_facets(old: &[ComponentRef], new: &Facet) -> FacetDiff {
    let mut unmatched: Vec<Option<&ComponentRef>> = old.iter().map(Some).collect();
    let mut diff = FacetDiff::default();
    let mut render_count = 0;

    for (new_index, child) in new.entries().iter().flatten().enumerate() {
        let found = unmatched
            .iter()
            .position(|slot| slot.is_some_and(|old_child| Rc::ptr_eq(old_child, child)));

        match found {
            Some(old_index) => {
                if old_index != new_index - render_count {
                    diff.requires_fragment = true;
                }
                unmatched[old_index] = None;
                diff.operations.push(FacetOp {
                    action: FacetAction::Rerender,
                    component: Rc::clone(child),
                    old_index: Some(old_index),
                    new_index: Some(new_index),
                });
            }
            None => {
                diff.operations.push(FacetOp {
                    action: FacetAction::Render,
                    component: Rc::clone(child),
                    old_index: None,
                    new_index: Some(new_index),
                });
                render_count += 1;
            }
        }
        diff.facet_info.push(Rc::clone(child));
    }

    if diff.operations.is_empty() {
        diff.is_full_unrender = true;
    }

    let unrenders: Vec<FacetOp> = unmatched
        .iter()
        .enumerate()
        .filter_map(|(old_index, slot)| {
            slot.map(|component| FacetOp {
                action: FacetAction::Unrender,
                component: Rc::clone(component),
                old_index: Some(old_index),
                new_index: None,
            })
        })
        .collect();
    diff.operations.splice(0..0, unrenders);

    diff
}
