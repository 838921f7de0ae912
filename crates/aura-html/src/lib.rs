//! Aura markup evaluation
//!
//! Renderers may hand back raw markup instead of DOM nodes. This crate
//! turns that text into detached `aura-dom` nodes using html5ever.

mod parser;

pub use parser::{MarkupParser, parse_markup};

/// Markup evaluation error
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("failed to read markup: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to insert parsed node: {0}")]
    Dom(#[from] aura_dom::DomError),
}
