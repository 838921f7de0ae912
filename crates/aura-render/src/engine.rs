//! Rendering service
//!
//! Orchestrates render, rerender, unrender and afterRender over components
//! and facets, and drains dirty components until nothing new is dirtied.
//! Everything runs on one thread; the only guard against processing a
//! component twice in a pass is the visited set of the
//! [`ReconciliationContext`].

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use aura_dom::{DomTree, NodeId};

use crate::component::{Component, ComponentConfig, ComponentRef, GlobalId};
use crate::config::RenderConfig;
use crate::context::ReconciliationContext;
use crate::dirty::DirtyTracker;
use crate::error::RenderError;
use crate::facet::{diff_facets, Facet, FacetAction};
use crate::factory::ComponentFactory;
use crate::marker::{self, Anchor};
use crate::renderer::RenderOutput;

/// Something `render` accepts: a live component or a configuration to
/// instantiate first
#[derive(Debug, Clone)]
pub enum Renderable {
    Component(ComponentRef),
    Config(ComponentConfig),
}

/// A normalized list of renderables
#[derive(Debug, Clone, Default)]
pub struct Batch(Vec<Renderable>);

impl From<ComponentRef> for Batch {
    fn from(component: ComponentRef) -> Self {
        Self(vec![Renderable::Component(component)])
    }
}

impl From<&ComponentRef> for Batch {
    fn from(component: &ComponentRef) -> Self {
        Self(vec![Renderable::Component(Rc::clone(component))])
    }
}

impl From<Vec<ComponentRef>> for Batch {
    fn from(components: Vec<ComponentRef>) -> Self {
        Self(components.into_iter().map(Renderable::Component).collect())
    }
}

impl From<&[ComponentRef]> for Batch {
    fn from(components: &[ComponentRef]) -> Self {
        Self(components.iter().cloned().map(Renderable::Component).collect())
    }
}

impl From<ComponentConfig> for Batch {
    fn from(config: ComponentConfig) -> Self {
        Self(vec![Renderable::Config(config)])
    }
}

impl From<Vec<ComponentConfig>> for Batch {
    fn from(configs: Vec<ComponentConfig>) -> Self {
        Self(configs.into_iter().map(Renderable::Config).collect())
    }
}

impl From<Vec<Renderable>> for Batch {
    fn from(items: Vec<Renderable>) -> Self {
        Self(items)
    }
}

impl From<Facet> for Batch {
    fn from(facet: Facet) -> Self {
        facet.components().into()
    }
}

/// Where rendered nodes go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Append as last children
    Append(NodeId),
    /// Insert before a reference node
    Before(NodeId),
    /// Insert after a reference node
    After(NodeId),
    /// Insert as first children
    First(NodeId),
}

/// Resets the unrendering flag however the hook exits
struct UnrenderingGuard(ComponentRef);

impl UnrenderingGuard {
    fn enter(component: &ComponentRef) -> Self {
        component.set_unrendering(true);
        Self(Rc::clone(component))
    }
}

impl Drop for UnrenderingGuard {
    fn drop(&mut self) {
        self.0.set_unrendering(false);
    }
}

/// The rendering service. Construct one per document.
pub struct RenderingEngine {
    config: RenderConfig,
    dom: DomTree,
    dirty: DirtyTracker,
    factory: Option<Box<dyn ComponentFactory>>,
    registry: HashMap<GlobalId, Weak<Component>>,
}

impl RenderingEngine {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            dom: DomTree::new(),
            dirty: DirtyTracker::new(),
            factory: None,
            registry: HashMap::new(),
        }
    }

    /// Engine able to instantiate component configurations
    pub fn with_factory(config: RenderConfig, factory: impl ComponentFactory + 'static) -> Self {
        let mut engine = Self::new(config);
        engine.factory = Some(Box::new(factory));
        engine
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn dom(&self) -> &DomTree {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut DomTree {
        &mut self.dom
    }

    pub fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }

    /// Look up a component that has been rendered by this engine
    pub fn component(&self, id: &GlobalId) -> Option<ComponentRef> {
        self.registry.get(id)?.upgrade().filter(|c| c.is_valid())
    }

    // === Dirty tracking ===

    pub fn add_dirty_value(&mut self, path: &str, component: &ComponentRef) {
        self.dirty.add_dirty_value(path, component);
    }

    pub fn has_dirty_value(&self, component: &ComponentRef) -> bool {
        self.dirty.has_dirty_value(component)
    }

    pub fn is_dirty_value(&self, path: &str, component: &ComponentRef) -> bool {
        self.dirty.is_dirty_value(path, component)
    }

    pub fn remove_dirty_value(&mut self, path: &str, component: &ComponentRef) {
        self.dirty.remove_dirty_value(path, component);
    }

    pub fn clean_component(&mut self, id: &GlobalId) {
        self.dirty.clean_component(id);
    }

    // === Render ===

    /// Render components (instantiating configurations first) and append
    /// the resulting nodes to `parent`, if given
    pub fn render(&mut self, items: impl Into<Batch>, parent: Option<NodeId>) -> Vec<NodeId> {
        self.render_at(items, parent.map(Placement::Append))
    }

    /// Render and insert according to `placement`
    pub fn render_at(
        &mut self,
        items: impl Into<Batch>,
        placement: Option<Placement>,
    ) -> Vec<NodeId> {
        let Batch(items) = items.into();
        let mut nodes = Vec::new();
        for item in items {
            let Some(component) = self.instantiate(item) else {
                continue;
            };
            nodes.extend(self.render_component(&component));
        }
        if let Some(placement) = placement {
            self.insert_nodes(&nodes, placement);
        }
        nodes
    }

    fn instantiate(&mut self, item: Renderable) -> Option<ComponentRef> {
        match item {
            Renderable::Component(component) => Some(component),
            Renderable::Config(config) => {
                let created = match &self.factory {
                    Some(factory) => factory.create_component(&config),
                    None => Err(RenderError::NoFactory(config.descriptor.clone())),
                };
                match created {
                    Ok(component) => Some(component),
                    Err(err) => {
                        tracing::error!(
                            descriptor = %config.descriptor,
                            %err,
                            "Failed to instantiate component for render"
                        );
                        None
                    }
                }
            }
        }
    }

    fn render_component(&mut self, component: &ComponentRef) -> Vec<NodeId> {
        let cmp = component.concrete();
        if !cmp.is_valid() {
            let err = RenderError::InvalidComponent(cmp.global_id().clone());
            tracing::error!(%err, "Skipping render");
            return Vec::new();
        }
        self.registry.insert(cmp.global_id().clone(), Rc::downgrade(&cmp));

        let output = match cmp.renderer().render(&cmp, self) {
            Ok(output) => output,
            Err(err) => {
                tracing::error!(
                    component = %cmp.global_id(),
                    descriptor = cmp.descriptor(),
                    %err,
                    "render threw an error"
                );
                RenderOutput::empty()
            }
        };
        let nodes = match output {
            RenderOutput::Nodes(nodes) => nodes,
            RenderOutput::Markup(markup) => self.evaluate_markup(&markup).unwrap_or_else(|err| {
                tracing::error!(
                    component = %cmp.global_id(),
                    %err,
                    "Failed to evaluate rendered markup"
                );
                Vec::new()
            }),
        };
        self.finish_render(&cmp, nodes)
    }

    /// Turn markup into detached nodes
    pub fn evaluate_markup(&mut self, markup: &str) -> Result<Vec<NodeId>, RenderError> {
        Ok(aura_html::parse_markup(&mut self.dom, markup)?)
    }

    fn finish_render(&mut self, cmp: &ComponentRef, mut nodes: Vec<NodeId>) -> Vec<NodeId> {
        if nodes.is_empty() {
            let label = format!("render: {}", cmp.global_id());
            nodes.push(marker::create_marker(&mut self.dom, None, &label));
        }
        cmp.disassociate_elements();
        self.associate_elements(cmp, &nodes);
        cmp.set_nodes(nodes.clone());
        cmp.set_anchor(Some(Anchor::from_node(&self.dom, nodes[0])));
        cmp.set_rendered(true);
        self.dirty.clean_component(cmp.global_id());
        nodes
    }

    /// Associate non-marker nodes with `cmp`, tag elements with the owner
    /// id (innermost owner wins) and apply the component class
    fn associate_elements(&mut self, cmp: &ComponentRef, nodes: &[NodeId]) {
        for &node in nodes {
            if self.dom.is_marker(node) {
                continue;
            }
            cmp.associate_element(node);
            if !self.dom.is_element(node) {
                continue;
            }
            let attribute = &self.config.rendered_by_attribute;
            if self.dom.get_attribute(node, attribute).is_none() {
                if let Err(err) = self
                    .dom
                    .set_attribute(node, attribute, cmp.global_id().as_str())
                {
                    tracing::warn!(%err, "Failed to tag rendered element");
                }
            }
            if let Some(class_name) = cmp.class_name() {
                if let Err(err) = self.dom.add_class(node, class_name) {
                    tracing::warn!(%err, "Failed to apply component class");
                }
            }
        }
    }

    fn insert_nodes(&mut self, nodes: &[NodeId], placement: Placement) {
        let result: Result<(), aura_dom::DomError> = match placement {
            Placement::Append(parent) => nodes
                .iter()
                .try_for_each(|&n| self.dom.append_child(parent, n)),
            Placement::Before(reference) => match self.dom.parent(reference) {
                Some(parent) => nodes
                    .iter()
                    .try_for_each(|&n| self.dom.insert_before(parent, n, Some(reference))),
                None => Ok(()),
            },
            Placement::After(reference) => {
                let mut cursor = reference;
                nodes.iter().try_for_each(|&n| {
                    self.dom.insert_after(cursor, n)?;
                    cursor = n;
                    Ok(())
                })
            }
            Placement::First(parent) => {
                let first = self.dom.first_child(parent);
                nodes.iter().try_for_each(|&n| self.dom.insert_before(parent, n, first))
            }
        };
        if let Err(err) = result {
            tracing::error!(%err, ?placement, "Failed to insert rendered nodes");
        }
    }

    // === Rerender ===

    /// Top-level rerender: fresh visited set, after-render queue flushed
    /// at the end
    pub fn rerender(&mut self, components: &[ComponentRef]) -> Result<Vec<NodeId>, RenderError> {
        let mut cx = ReconciliationContext::new();
        let nodes = self.rerender_in(components, &mut cx);
        let queued = cx.take_after_render();
        self.after_render(&queued);
        nodes
    }

    /// Rerender within an ongoing pass.
    ///
    /// A component that was never rendered is skipped and reported; the
    /// rest of the batch is still rerendered and the first such error is
    /// returned once the batch is done.
    pub fn rerender_in(
        &mut self,
        components: &[ComponentRef],
        cx: &mut ReconciliationContext,
    ) -> Result<Vec<NodeId>, RenderError> {
        let mut elements = Vec::new();
        let mut first_error = None;
        for component in components {
            let cmp = component.concrete();
            let id = cmp.global_id().clone();
            if !cmp.is_valid() {
                let err = RenderError::InvalidComponent(id.clone());
                tracing::debug!(%err, "Skipping rerender");
            } else if !cx.is_visited(&id) && !cmp.is_rendered() {
                let err = RenderError::NotRendered(id.clone());
                tracing::error!(%err, "Skipping rerender");
                first_error.get_or_insert(err);
            } else {
                elements.extend(self.rerender_one(&cmp, cx));
            }
            self.dirty.clean_component(&id);
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(elements),
        }
    }

    fn rerender_one(&mut self, cmp: &ComponentRef, cx: &mut ReconciliationContext) -> Vec<NodeId> {
        let id = cmp.global_id().clone();
        if !cx.mark_visited(id.clone()) {
            return self.rendered_nodes(cmp);
        }
        let slot = self.locate(cmp).and_then(|node| {
            let parent = self.dom.parent(node)?;
            Some((parent, self.dom.index_in_parent(node)))
        });
        let mut nodes = match cmp.renderer().rerender(cmp, self, cx) {
            Ok(Some(nodes)) => nodes,
            Ok(None) => return self.rendered_nodes(cmp),
            Err(err) => {
                tracing::error!(
                    component = %id,
                    descriptor = cmp.descriptor(),
                    %err,
                    "rerender threw an error"
                );
                return self.rendered_nodes(cmp);
            }
        };
        if nodes.is_empty() {
            nodes.push(self.replace_with_placeholder(cmp, slot));
        }
        cmp.disassociate_elements();
        self.associate_elements(cmp, &nodes);
        cmp.set_nodes(nodes.clone());
        cmp.set_anchor(Some(Anchor::from_node(&self.dom, nodes[0])));
        nodes
    }

    /// Put a marker where `cmp` used to start and detach whatever it still
    /// has on screen. `slot` is the parent and index of its first node
    /// before the hook ran.
    fn replace_with_placeholder(
        &mut self,
        cmp: &ComponentRef,
        slot: Option<(NodeId, usize)>,
    ) -> NodeId {
        if let Some(Anchor::Placeholder(node)) = cmp.anchor() {
            if self.dom.is_attached(node) {
                return node;
            }
        }
        let label = format!("rerender: {}", cmp.global_id());
        let marker = self.dom.create_marker(&label);
        if let Some((parent, index)) = slot {
            let reference = self.dom.child_at(parent, index);
            if let Err(err) = self.dom.insert_before(parent, marker, reference) {
                tracing::warn!(component = %cmp.global_id(), %err, "Failed to position marker");
            }
        }
        let mut stale = cmp.nodes();
        stale.extend(cmp.elements());
        for node in stale.into_iter().filter(|&node| node != marker) {
            if let Err(err) = self.dom.remove(node) {
                tracing::warn!(component = %cmp.global_id(), %err, "Failed to detach node");
            }
        }
        marker
    }

    // === Unrender ===

    pub fn unrender(&mut self, components: &[ComponentRef]) {
        let mut cx = ReconciliationContext::new();
        self.unrender_in(components, &mut cx);
    }

    /// Unrender within an ongoing pass; unrendered components count as
    /// visited
    pub fn unrender_in(&mut self, components: &[ComponentRef], cx: &mut ReconciliationContext) {
        for component in components {
            let cmp = component.concrete();
            if !cmp.is_valid() || !cmp.is_rendered() {
                continue;
            }
            let _guard = UnrenderingGuard::enter(&cmp);
            if let Err(err) = cmp.renderer().unrender(&cmp, self, cx) {
                tracing::error!(
                    component = %cmp.global_id(),
                    descriptor = cmp.descriptor(),
                    %err,
                    "unrender threw an error"
                );
            }
            self.detach_component(&cmp);
            cmp.set_rendered(false);
            cx.mark_visited(cmp.global_id().clone());
        }
    }

    fn detach_component(&mut self, cmp: &ComponentRef) {
        let mut nodes = cmp.nodes();
        nodes.extend(cmp.elements());
        if let Some(anchor) = cmp.anchor() {
            nodes.push(anchor.node());
        }
        for node in nodes {
            if let Err(err) = self.dom.remove(node) {
                tracing::warn!(component = %cmp.global_id(), %err, "Failed to detach node");
            }
        }
        cmp.disassociate_elements();
        cmp.set_nodes(Vec::new());
        cmp.set_anchor(None);
    }

    // === After render ===

    pub fn after_render(&mut self, components: &[ComponentRef]) {
        for component in components {
            let cmp = component.concrete();
            if !cmp.is_valid() {
                continue;
            }
            if let Err(err) = cmp.renderer().after_render(&cmp, self) {
                tracing::error!(
                    component = %cmp.global_id(),
                    descriptor = cmp.descriptor(),
                    %err,
                    "afterRender threw an error"
                );
            }
        }
    }

    // === Facets ===

    /// Render a facet for `parent`. With a `container` the nodes are
    /// appended to it; otherwise they are returned detached and become
    /// the parent's own nodes.
    pub fn render_facet(
        &mut self,
        parent: &ComponentRef,
        facet: impl Into<Facet>,
        container: Option<NodeId>,
    ) -> Vec<NodeId> {
        let children = facet.into().components();
        parent.store_facet_info(children.clone());
        parent.set_inline_facet(container.is_none());

        let mut nodes = self.render(children, container);
        if container.is_none() {
            if nodes.is_empty() {
                let label = format!("render facet: {}", parent.global_id());
                nodes.push(marker::create_marker(&mut self.dom, None, &label));
            }
            parent.set_anchor(Some(Anchor::from_node(&self.dom, nodes[0])));
        }
        nodes
    }

    /// Reconcile a facet against what `parent` rendered last time.
    ///
    /// A facet that has never been positioned is left alone.
    pub fn rerender_facet(
        &mut self,
        parent: &ComponentRef,
        facet: impl Into<Facet>,
        container: Option<NodeId>,
        cx: &mut ReconciliationContext,
    ) -> Result<Vec<NodeId>, RenderError> {
        let facet = facet.into();
        let inline = container.is_none();

        let (target, start, first) = match container {
            Some(container) => (container, 0, None),
            None => {
                let Some(first) = self.locate(parent) else {
                    tracing::trace!(
                        component = %parent.global_id(),
                        "Facet not positioned yet; skipping rerender"
                    );
                    return Ok(Vec::new());
                };
                let Some(target) = self.dom.parent(first) else {
                    return Ok(Vec::new());
                };
                (target, self.dom.index_in_parent(first), Some(first))
            }
        };

        let old = parent.facet_info().unwrap_or_default();
        let diff = diff_facets(&old, &facet);
        let label = format!("rerender facet: {}", parent.global_id());
        let mut marker = first.map(|node| Anchor::from_node(&self.dom, node));
        let mut position = start;
        let mut ret = Vec::new();

        for op in &diff.operations {
            let child = &op.component;
            match op.action {
                FacetAction::Unrender => {
                    if let Some(current) = marker.filter(|m| !m.is_placeholder()) {
                        let node = current.node();
                        if diff.is_full_unrender || self.dom.next_sibling(node).is_none() {
                            let placeholder =
                                marker::create_marker(&mut self.dom, Some(node), &label);
                            marker = Some(Anchor::Placeholder(placeholder));
                            parent.set_anchor(marker);
                        } else if child.is_valid()
                            && child.concrete().elements().first() == Some(&node)
                        {
                            if let Some(next) = self.dom.next_sibling(node) {
                                marker = Some(Anchor::from_node(&self.dom, next));
                                parent.set_anchor(marker);
                            }
                        }
                    }
                    self.unrender_in(std::slice::from_ref(child), cx);
                }
                FacetAction::Render => {
                    if !child.is_valid() {
                        continue;
                    }
                    let nodes = self.render(child, None);
                    if !diff.requires_fragment {
                        let reference = self.dom.child_at(target, position);
                        for &node in &nodes {
                            self.dom.insert_before(target, node, reference)?;
                        }
                    }
                    position += nodes.len();
                    cx.queue_after_render(child);
                    ret.extend(nodes);
                }
                FacetAction::Rerender => {
                    if !child.is_valid() {
                        continue;
                    }
                    let nodes = if self.dirty.has_dirty_value(child) {
                        self.rerender_in(std::slice::from_ref(child), cx)?
                    } else {
                        self.rendered_nodes(child)
                    };
                    position += nodes.len();
                    ret.extend(nodes);
                }
            }
        }

        if diff.requires_fragment {
            let fragment = self.dom.create_fragment();
            for &node in &ret {
                self.dom.append_child(fragment, node)?;
            }
            let reference = self.dom.child_at(target, start);
            self.dom.insert_before(target, fragment, reference)?;
        }

        parent.store_facet_info(diff.facet_info);

        if inline {
            parent.set_inline_facet(true);
            if ret.is_empty() {
                let placeholder = match parent.anchor() {
                    Some(Anchor::Placeholder(node)) if self.dom.parent(node) == Some(target) => {
                        node
                    }
                    _ => {
                        let reference = self.dom.child_at(target, start);
                        let node = self.dom.create_marker(&label);
                        self.dom.insert_before(target, node, reference)?;
                        node
                    }
                };
                ret.push(placeholder);
            } else if let Some(Anchor::Placeholder(node)) = parent.anchor() {
                if !ret.contains(&node) {
                    self.dom.remove(node)?;
                }
            }
            parent.disassociate_elements();
            self.associate_elements(parent, &ret);
            parent.set_nodes(ret.clone());
            parent.set_anchor(Some(Anchor::from_node(&self.dom, ret[0])));
        }

        Ok(ret)
    }

    /// Unrender everything `parent` rendered as a facet
    pub fn unrender_facet(&mut self, parent: &ComponentRef, cx: &mut ReconciliationContext) {
        if let Some(children) = parent.take_facet_info() {
            self.unrender_in(&children, cx);
        }
        if let Some(Anchor::Placeholder(node)) = parent.anchor() {
            if let Err(err) = self.dom.remove(node) {
                tracing::warn!(
                    component = %parent.global_id(),
                    %err,
                    "Failed to remove facet marker"
                );
            }
        }
    }

    /// Run afterRender on the children of the last rendered facet
    pub fn after_render_facet(&mut self, parent: &ComponentRef) {
        if let Some(children) = parent.facet_info() {
            self.after_render(&children);
        }
    }

    /// Nodes a component currently occupies in the DOM, in order. A
    /// component showing nothing occupies its placeholder.
    pub fn rendered_nodes(&self, component: &ComponentRef) -> Vec<NodeId> {
        let cmp = component.concrete();
        let mut nodes: Vec<NodeId> = if cmp.hosts_inline_facet() {
            cmp.facet_info()
                .unwrap_or_default()
                .iter()
                .filter(|child| child.is_valid() && child.is_rendered())
                .flat_map(|child| self.rendered_nodes(child))
                .collect()
        } else {
            cmp.nodes()
        };
        if nodes.is_empty() {
            if let Some(Anchor::Placeholder(node)) = cmp.anchor() {
                nodes.push(node);
            }
        }
        nodes
    }

    /// First attached node of a component, if it has been positioned
    fn locate(&self, component: &ComponentRef) -> Option<NodeId> {
        self.rendered_nodes(component)
            .into_iter()
            .find(|&node| self.dom.is_attached(node))
            .or_else(|| {
                component
                    .anchor()
                    .map(Anchor::node)
                    .filter(|&node| self.dom.is_attached(node))
            })
    }

    // === Dirty loop ===

    /// Rerender dirty components until a pass dirties nothing new.
    ///
    /// Returns the number of passes. A feedback cycle stops the loop at
    /// the configured iteration cap and is reported as
    /// [`RenderError::RerenderLimit`]. A batch member that could not be
    /// rerendered does not stop the loop; the first such error is returned
    /// once it settles.
    pub fn rerender_dirty(&mut self) -> Result<usize, RenderError> {
        if !self.dirty.take_needs_cleaning() {
            return Ok(0);
        }
        let max = self.config.max_rerender_iterations;
        let mut passes = 0;
        let mut first_error = None;
        while !self.dirty.is_empty() {
            if passes == max {
                tracing::error!(
                    iterations = max,
                    pending = self.dirty.len(),
                    "Max rerender iterations reached"
                );
                return Err(RenderError::RerenderLimit(max));
            }
            passes += 1;

            let mut batch = Vec::new();
            for (id, weak) in self.dirty.drain() {
                match weak.upgrade() {
                    Some(cmp) if cmp.is_valid() && cmp.is_rendered() => {
                        if cmp.is_unrendering() {
                            tracing::warn!(
                                component = %id,
                                "Skipping rerender of a component that is unrendering"
                            );
                            continue;
                        }
                        batch.push(cmp);
                    }
                    _ => tracing::trace!(component = %id, "Dropping stale dirty entry"),
                }
            }
            tracing::debug!(pass = passes, count = batch.len(), "Rerendering dirty components");
            if let Err(err) = self.rerender(&batch) {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(passes),
        }
    }

    // === Lifecycle ===

    /// Unrender, destroy facets and invalidate a component
    pub fn destroy(&mut self, component: &ComponentRef) {
        let cmp = component.concrete();
        if !cmp.is_valid() {
            return;
        }
        self.unrender(std::slice::from_ref(&cmp));
        for facet in cmp.all_facets() {
            for child in facet.components() {
                self.destroy(&child);
            }
        }
        cmp.invalidate();
        component.invalidate();
        self.dirty.clean_component(cmp.global_id());
        self.registry.remove(cmp.global_id());
        tracing::debug!(component = %cmp.global_id(), "Component destroyed");
    }

    /// Component that rendered `node` (or its nearest tagged ancestor)
    pub fn component_for_node(&self, node: NodeId) -> Option<ComponentRef> {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if let Some(id) = self.dom.get_attribute(current, &self.config.rendered_by_attribute) {
                return self.component(&GlobalId::from(id));
            }
            cursor = self.dom.parent(current);
        }
        None
    }
}

impl Default for RenderingEngine {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}
