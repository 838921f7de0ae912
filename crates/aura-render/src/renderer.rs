//! Renderer lifecycle hooks

use aura_dom::NodeId;

use crate::component::ComponentRef;
use crate::context::ReconciliationContext;
use crate::error::RenderError;
use crate::RenderingEngine;

/// What a render hook produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutput {
    /// Detached DOM nodes
    Nodes(Vec<NodeId>),
    /// Raw markup, evaluated into nodes by the engine
    Markup(String),
}

impl RenderOutput {
    pub fn empty() -> Self {
        Self::Nodes(Vec::new())
    }
}

impl From<Vec<NodeId>> for RenderOutput {
    fn from(nodes: Vec<NodeId>) -> Self {
        Self::Nodes(nodes)
    }
}

impl From<String> for RenderOutput {
    fn from(markup: String) -> Self {
        Self::Markup(markup)
    }
}

/// The four lifecycle hooks of a component definition.
///
/// Hooks run with the engine borrowed mutably and may call back into it
/// (typically through the facet helpers). Errors are caught by the engine
/// and never abort a batch.
pub trait Renderer {
    /// Produce the component's nodes, detached
    fn render(
        &self,
        component: &ComponentRef,
        engine: &mut RenderingEngine,
    ) -> Result<RenderOutput, RenderError>;

    /// Bring existing nodes up to date. `Ok(None)` keeps the current nodes.
    fn rerender(
        &self,
        _component: &ComponentRef,
        _engine: &mut RenderingEngine,
        _cx: &mut ReconciliationContext,
    ) -> Result<Option<Vec<NodeId>>, RenderError> {
        Ok(None)
    }

    /// Release children. The engine detaches the component's own nodes.
    fn unrender(
        &self,
        _component: &ComponentRef,
        _engine: &mut RenderingEngine,
        _cx: &mut ReconciliationContext,
    ) -> Result<(), RenderError> {
        Ok(())
    }

    /// Runs once the nodes are in the document
    fn after_render(
        &self,
        _component: &ComponentRef,
        _engine: &mut RenderingEngine,
    ) -> Result<(), RenderError> {
        Ok(())
    }
}
