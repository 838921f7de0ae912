//! Built-in renderers
//!
//! The handful of component definitions the framework ships with: an HTML
//! element wrapping its body, a text node, a bare facet and raw markup.

use aura_dom::NodeId;

use crate::component::ComponentRef;
use crate::context::ReconciliationContext;
use crate::error::RenderError;
use crate::renderer::{RenderOutput, Renderer};
use crate::RenderingEngine;

/// Value prefix holding element attributes
pub const HTML_ATTRIBUTES: &str = "v.HTMLAttributes.";

/// Value naming the element tag of an [`HtmlRenderer`] component
pub const TAG_VALUE: &str = "v.tag";

/// Renders an element whose children are the component's body facet
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    default_tag: String,
}

impl HtmlRenderer {
    /// Create a new HTML renderer. The `v.tag` value overrides `tag`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self { default_tag: tag.into() }
    }

    fn apply_attributes(
        component: &ComponentRef,
        engine: &mut RenderingEngine,
        element: NodeId,
    ) -> Result<(), RenderError> {
        for (name, value) in component.values_with_prefix(HTML_ATTRIBUTES) {
            engine.dom_mut().set_attribute(element, &name, &value)?;
        }
        Ok(())
    }
}

impl Renderer for HtmlRenderer {
    fn render(
        &self,
        component: &ComponentRef,
        engine: &mut RenderingEngine,
    ) -> Result<RenderOutput, RenderError> {
        let tag = component.value(TAG_VALUE).unwrap_or_else(|| self.default_tag.clone());
        let element = engine.dom_mut().create_element(&tag);
        Self::apply_attributes(component, engine, element)?;
        engine.render_facet(component, component.body(), Some(element));
        Ok(vec![element].into())
    }

    fn rerender(
        &self,
        component: &ComponentRef,
        engine: &mut RenderingEngine,
        cx: &mut ReconciliationContext,
    ) -> Result<Option<Vec<NodeId>>, RenderError> {
        let Some(element) = component.elements().first().copied() else {
            return Ok(None);
        };
        Self::apply_attributes(component, engine, element)?;
        engine.rerender_facet(component, component.body(), Some(element), cx)?;
        Ok(None)
    }

    fn unrender(
        &self,
        component: &ComponentRef,
        engine: &mut RenderingEngine,
        cx: &mut ReconciliationContext,
    ) -> Result<(), RenderError> {
        engine.unrender_facet(component, cx);
        Ok(())
    }

    fn after_render(
        &self,
        component: &ComponentRef,
        engine: &mut RenderingEngine,
    ) -> Result<(), RenderError> {
        engine.after_render_facet(component);
        Ok(())
    }
}

/// Renders one text node from a value
#[derive(Debug, Clone)]
pub struct TextRenderer {
    path: String,
}

impl TextRenderer {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Renderer for TextRenderer {
    fn render(
        &self,
        component: &ComponentRef,
        engine: &mut RenderingEngine,
    ) -> Result<RenderOutput, RenderError> {
        let text = component.value(&self.path).unwrap_or_default();
        if text.is_empty() {
            return Ok(RenderOutput::empty());
        }
        Ok(vec![engine.dom_mut().create_text(&text)].into())
    }

    fn rerender(
        &self,
        component: &ComponentRef,
        engine: &mut RenderingEngine,
        _cx: &mut ReconciliationContext,
    ) -> Result<Option<Vec<NodeId>>, RenderError> {
        let text = component.value(&self.path).unwrap_or_default();
        match component.elements().first().copied() {
            Some(node) if !text.is_empty() => {
                engine.dom_mut().set_text(node, &text)?;
                Ok(None)
            }
            // Switching between text and no text swaps the placeholder
            _ => {
                let current = engine.rendered_nodes(component);
                let replacement = if text.is_empty() {
                    engine.dom_mut().create_marker(&format!("render: {}", component.global_id()))
                } else {
                    engine.dom_mut().create_text(&text)
                };
                replace_nodes(engine, &current, &[replacement])?;
                Ok(Some(vec![replacement]))
            }
        }
    }
}

/// Renders the body facet in place, with no wrapping element
#[derive(Debug, Clone)]
pub struct FacetRenderer {
    facet: String,
}

impl FacetRenderer {
    pub fn new(facet: impl Into<String>) -> Self {
        Self { facet: facet.into() }
    }
}

impl Default for FacetRenderer {
    fn default() -> Self {
        Self::new("body")
    }
}

impl Renderer for FacetRenderer {
    fn render(
        &self,
        component: &ComponentRef,
        engine: &mut RenderingEngine,
    ) -> Result<RenderOutput, RenderError> {
        Ok(engine.render_facet(component, component.facet(&self.facet), None).into())
    }

    fn rerender(
        &self,
        component: &ComponentRef,
        engine: &mut RenderingEngine,
        cx: &mut ReconciliationContext,
    ) -> Result<Option<Vec<NodeId>>, RenderError> {
        let nodes = engine.rerender_facet(component, component.facet(&self.facet), None, cx)?;
        Ok((!nodes.is_empty()).then_some(nodes))
    }

    fn unrender(
        &self,
        component: &ComponentRef,
        engine: &mut RenderingEngine,
        cx: &mut ReconciliationContext,
    ) -> Result<(), RenderError> {
        engine.unrender_facet(component, cx);
        Ok(())
    }

    fn after_render(
        &self,
        component: &ComponentRef,
        engine: &mut RenderingEngine,
    ) -> Result<(), RenderError> {
        engine.after_render_facet(component);
        Ok(())
    }
}

/// Renders raw markup taken from a value
#[derive(Debug, Clone)]
pub struct MarkupRenderer {
    path: String,
}

impl MarkupRenderer {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Renderer for MarkupRenderer {
    fn render(
        &self,
        component: &ComponentRef,
        _engine: &mut RenderingEngine,
    ) -> Result<RenderOutput, RenderError> {
        Ok(RenderOutput::Markup(component.value(&self.path).unwrap_or_default()))
    }

    fn rerender(
        &self,
        component: &ComponentRef,
        engine: &mut RenderingEngine,
        _cx: &mut ReconciliationContext,
    ) -> Result<Option<Vec<NodeId>>, RenderError> {
        let markup = component.value(&self.path).unwrap_or_default();
        let mut fresh = engine.evaluate_markup(&markup)?;
        if fresh.is_empty() {
            let label = format!("render: {}", component.global_id());
            fresh.push(engine.dom_mut().create_marker(&label));
        }
        let current = engine.rendered_nodes(component);
        replace_nodes(engine, &current, &fresh)?;
        Ok(Some(fresh))
    }
}

/// Put `fresh` where `current` is and detach `current`
fn replace_nodes(
    engine: &mut RenderingEngine,
    current: &[NodeId],
    fresh: &[NodeId],
) -> Result<(), RenderError> {
    let dom = engine.dom_mut();
    if let Some(&first) = current.first() {
        if let Some(parent) = dom.parent(first) {
            for &node in fresh {
                dom.insert_before(parent, node, Some(first))?;
            }
        }
    }
    for &node in current {
        dom.remove(node)?;
    }
    Ok(())
}
