//! Aura Render - component rendering service
//!
//! Renders components into an `aura-dom` tree, tracks which expression
//! paths changed, reconciles facets (ordered child lists) against what was
//! rendered before and keeps empty components positioned with markers.
//!
//! ```ignore
//! let registry = RendererRegistry::with_builtins();
//! let mut engine = RenderingEngine::with_factory(RenderConfig::default(), registry);
//! let root = engine.dom().root();
//! engine.render(config, Some(root));
//! cmp.set_value(&mut engine, "v.value", "hello");
//! engine.rerender_dirty()?;
//! ```

mod component;
mod config;
mod context;
mod dirty;
mod engine;
mod error;
mod facet;
mod factory;
mod marker;
mod renderer;
mod renderers;

pub use component::{Component, ComponentBuilder, ComponentConfig, ComponentRef, GlobalId};
pub use config::RenderConfig;
pub use context::ReconciliationContext;
pub use dirty::{DirtyTracker, PATH_SEPARATOR};
pub use engine::{Batch, Placement, Renderable, RenderingEngine};
pub use error::RenderError;
pub use facet::{diff_facets, Facet, FacetAction, FacetDiff, FacetOp};
pub use factory::{ComponentFactory, RendererRegistry};
pub use marker::{create_marker, is_marker, Anchor};
pub use renderer::{RenderOutput, Renderer};
pub use renderers::{
    FacetRenderer, HtmlRenderer, MarkupRenderer, TextRenderer, HTML_ATTRIBUTES, TAG_VALUE,
};

pub use aura_dom::{DomTree, NodeId};
