//! Component contract consumed by the rendering service
//!
//! Components are shared (`Rc`) and compared by identity. All mutable
//! state sits behind `RefCell`s whose borrows never outlive a method call,
//! so renderer hooks can freely re-enter the engine.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use aura_dom::NodeId;
use serde::{Deserialize, Serialize};

use crate::facet::Facet;
use crate::marker::Anchor;
use crate::renderer::Renderer;
use crate::RenderingEngine;

/// Shared component handle
pub type ComponentRef = Rc<Component>;

static NEXT_GLOBAL_ID: AtomicU64 = AtomicU64::new(1);

/// Globally unique component id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GlobalId(String);

impl GlobalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Next id from the process-wide counter, in `"<n>:0"` form
    pub fn generate() -> Self {
        Self(format!("{}:0", NEXT_GLOBAL_ID.fetch_add(1, Ordering::Relaxed)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GlobalId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Serializable description of a component, instantiated lazily by `render`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    pub descriptor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Vec<ComponentConfig>,
}

impl ComponentConfig {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, path: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(path.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Vec<ComponentConfig>) -> Self {
        self.body = body;
        self
    }
}

#[derive(Debug, Default)]
struct LifecycleState {
    rendered: bool,
    elements: Vec<NodeId>,
    nodes: Vec<NodeId>,
    anchor: Option<Anchor>,
    facet_info: Option<Vec<ComponentRef>>,
    inline_facet: bool,
}

/// A UI component as seen by the rendering service
pub struct Component {
    global_id: GlobalId,
    descriptor: String,
    class_name: Option<String>,
    renderer: Rc<dyn Renderer>,
    valid: Cell<bool>,
    unrendering: Cell<bool>,
    state: RefCell<LifecycleState>,
    values: RefCell<BTreeMap<String, String>>,
    facets: RefCell<BTreeMap<String, Facet>>,
    concrete: RefCell<Option<ComponentRef>>,
}

impl Component {
    /// Start building a component rendered by `renderer`
    pub fn builder(descriptor: impl Into<String>, renderer: Rc<dyn Renderer>) -> ComponentBuilder {
        ComponentBuilder {
            id: None,
            descriptor: descriptor.into(),
            class_name: None,
            renderer,
            values: BTreeMap::new(),
            facets: BTreeMap::new(),
        }
    }

    pub fn global_id(&self) -> &GlobalId {
        &self.global_id
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn renderer(&self) -> Rc<dyn Renderer> {
        Rc::clone(&self.renderer)
    }

    pub fn is_valid(&self) -> bool {
        self.valid.get()
    }

    /// Mark the component destroyed. There is no way back.
    pub(crate) fn invalidate(&self) {
        self.valid.set(false);
    }

    pub fn is_rendered(&self) -> bool {
        self.state.borrow().rendered
    }

    pub(crate) fn set_rendered(&self, rendered: bool) {
        self.state.borrow_mut().rendered = rendered;
    }

    pub fn is_unrendering(&self) -> bool {
        self.unrendering.get()
    }

    pub(crate) fn set_unrendering(&self, unrendering: bool) {
        self.unrendering.set(unrendering);
    }

    /// The component that actually renders: the concrete sub-component if
    /// one was attached, otherwise this one.
    pub fn concrete(self: &Rc<Self>) -> ComponentRef {
        match self.concrete.borrow().as_ref() {
            Some(concrete) => concrete.concrete(),
            None => Rc::clone(self),
        }
    }

    /// Delegate rendering to `concrete`
    pub fn set_concrete(&self, concrete: ComponentRef) {
        *self.concrete.borrow_mut() = Some(concrete);
    }

    // === Elements ===

    /// Non-marker elements currently associated with this component
    pub fn elements(&self) -> Vec<NodeId> {
        self.state.borrow().elements.clone()
    }

    pub fn associate_element(&self, node: NodeId) {
        let mut state = self.state.borrow_mut();
        if !state.elements.contains(&node) {
            state.elements.push(node);
        }
    }

    pub fn disassociate_elements(&self) {
        self.state.borrow_mut().elements.clear();
    }

    /// Top-level nodes produced by the last render, markers included
    pub(crate) fn nodes(&self) -> Vec<NodeId> {
        self.state.borrow().nodes.clone()
    }

    pub(crate) fn set_nodes(&self, nodes: Vec<NodeId>) {
        self.state.borrow_mut().nodes = nodes;
    }

    /// DOM position of the component: a placeholder or its first element
    pub fn anchor(&self) -> Option<Anchor> {
        self.state.borrow().anchor
    }

    pub(crate) fn set_anchor(&self, anchor: Option<Anchor>) {
        self.state.borrow_mut().anchor = anchor;
    }

    // === Facet bookkeeping ===

    /// Children passed to the last facet render/rerender
    pub fn facet_info(&self) -> Option<Vec<ComponentRef>> {
        self.state.borrow().facet_info.clone()
    }

    pub(crate) fn store_facet_info(&self, children: Vec<ComponentRef>) {
        self.state.borrow_mut().facet_info = Some(children);
    }

    pub(crate) fn take_facet_info(&self) -> Option<Vec<ComponentRef>> {
        self.state.borrow_mut().facet_info.take()
    }

    /// Whether the facet is rendered in place (no wrapping element)
    pub(crate) fn hosts_inline_facet(&self) -> bool {
        self.state.borrow().inline_facet
    }

    pub(crate) fn set_inline_facet(&self, inline: bool) {
        self.state.borrow_mut().inline_facet = inline;
    }

    // === Values and facets ===

    pub fn value(&self, path: &str) -> Option<String> {
        self.values.borrow().get(path).cloned()
    }

    /// All values whose path starts with `prefix`, prefix stripped
    pub fn values_with_prefix(&self, prefix: &str) -> Vec<(String, String)> {
        self.values
            .borrow()
            .iter()
            .filter_map(|(k, v)| k.strip_prefix(prefix).map(|rest| (rest.to_string(), v.clone())))
            .collect()
    }

    /// Set a value and mark the path dirty
    pub fn set_value(
        self: &Rc<Self>,
        engine: &mut RenderingEngine,
        path: &str,
        value: impl Into<String>,
    ) {
        self.values.borrow_mut().insert(path.to_string(), value.into());
        engine.add_dirty_value(path, self);
    }

    pub fn facet(&self, name: &str) -> Facet {
        self.facets.borrow().get(name).cloned().unwrap_or_default()
    }

    /// Replace a facet and mark it dirty
    pub fn set_facet(
        self: &Rc<Self>,
        engine: &mut RenderingEngine,
        name: &str,
        facet: impl Into<Facet>,
    ) {
        self.facets.borrow_mut().insert(name.to_string(), facet.into());
        engine.add_dirty_value(&format!("v.{name}"), self);
    }

    pub fn body(&self) -> Facet {
        self.facet("body")
    }

    pub(crate) fn all_facets(&self) -> Vec<Facet> {
        self.facets.borrow().values().cloned().collect()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("global_id", &self.global_id)
            .field("descriptor", &self.descriptor)
            .field("valid", &self.valid.get())
            .field("rendered", &self.is_rendered())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Component`]
pub struct ComponentBuilder {
    id: Option<GlobalId>,
    descriptor: String,
    class_name: Option<String>,
    renderer: Rc<dyn Renderer>,
    values: BTreeMap<String, String>,
    facets: BTreeMap<String, Facet>,
}

impl ComponentBuilder {
    pub fn id(mut self, id: impl Into<GlobalId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn value(mut self, path: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(path.into(), value.into());
        self
    }

    pub fn facet(mut self, name: impl Into<String>, facet: impl Into<Facet>) -> Self {
        self.facets.insert(name.into(), facet.into());
        self
    }

    pub fn body(self, body: impl Into<Facet>) -> Self {
        self.facet("body", body)
    }

    pub fn build(self) -> ComponentRef {
        Rc::new(Component {
            global_id: self.id.unwrap_or_else(GlobalId::generate),
            descriptor: self.descriptor,
            class_name: self.class_name,
            renderer: self.renderer,
            valid: Cell::new(true),
            unrendering: Cell::new(false),
            state: RefCell::new(LifecycleState::default()),
            values: RefCell::new(self.values),
            facets: RefCell::new(self.facets),
            concrete: RefCell::new(None),
        })
    }
}
