//! Component instantiation
//!
//! `render` accepts configurations as well as live components. A
//! [`ComponentFactory`] turns a configuration into a component; the
//! [`RendererRegistry`] does so by looking the descriptor up in a table of
//! renderers.

use std::collections::HashMap;
use std::rc::Rc;

use crate::component::{Component, ComponentConfig, ComponentRef};
use crate::error::RenderError;
use crate::facet::Facet;
use crate::renderer::Renderer;
use crate::renderers::{FacetRenderer, HtmlRenderer, MarkupRenderer, TextRenderer};

/// Creates components from configurations
pub trait ComponentFactory {
    fn create_component(&self, config: &ComponentConfig) -> Result<ComponentRef, RenderError>;
}

/// Descriptor to renderer table
#[derive(Default, Clone)]
pub struct RendererRegistry {
    renderers: HashMap<String, Rc<dyn Renderer>>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in definitions:
    /// `aura:html`, `aura:text`, `aura:expression`, `aura:unescapedHtml`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("aura:html", HtmlRenderer::new("div"));
        registry.register("aura:text", TextRenderer::new("v.value"));
        registry.register("aura:expression", FacetRenderer::default());
        registry.register("aura:unescapedHtml", MarkupRenderer::new("v.value"));
        registry
    }

    pub fn register(&mut self, descriptor: impl Into<String>, renderer: impl Renderer + 'static) {
        self.renderers.insert(descriptor.into(), Rc::new(renderer));
    }

    pub fn get(&self, descriptor: &str) -> Option<Rc<dyn Renderer>> {
        self.renderers.get(descriptor).cloned()
    }

    pub fn contains(&self, descriptor: &str) -> bool {
        self.renderers.contains_key(descriptor)
    }
}

impl ComponentFactory for RendererRegistry {
    fn create_component(&self, config: &ComponentConfig) -> Result<ComponentRef, RenderError> {
        let renderer = self
            .get(&config.descriptor)
            .ok_or_else(|| RenderError::UnknownDescriptor(config.descriptor.clone()))?;

        let body = config
            .body
            .iter()
            .map(|child| self.create_component(child))
            .collect::<Result<Facet, _>>()?;

        let mut builder = Component::builder(config.descriptor.clone(), renderer).body(body);
        if let Some(id) = &config.id {
            builder = builder.id(id.as_str());
        }
        if let Some(class_name) = &config.class_name {
            builder = builder.class_name(class_name.clone());
        }
        for (path, value) in &config.values {
            builder = builder.value(path.clone(), value.clone());
        }
        Ok(builder.build())
    }
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut descriptors: Vec<_> = self.renderers.keys().collect();
        descriptors.sort();
        f.debug_struct("RendererRegistry").field("descriptors", &descriptors).finish()
    }
}
