//! Rendering errors

use crate::component::GlobalId;

/// Rendering error
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// `rerender` called before `render`
    #[error("attempt to rerender component {0} that has not been rendered")]
    NotRendered(GlobalId),

    /// Operation on a destroyed component
    #[error("component {0} is not valid")]
    InvalidComponent(GlobalId),

    /// Configuration could not be instantiated
    #[error("no renderer registered for descriptor {0}")]
    UnknownDescriptor(String),

    /// A configuration was passed but the engine has no factory
    #[error("cannot instantiate {0}: no component factory configured")]
    NoFactory(String),

    /// Raised by a renderer hook
    #[error("{hook} failed in {descriptor}: {message}")]
    Hook {
        hook: &'static str,
        descriptor: String,
        message: String,
    },

    /// The dirty loop kept producing work
    #[error("rerender did not settle after {0} iterations")]
    RerenderLimit(usize),

    #[error(transparent)]
    Dom(#[from] aura_dom::DomError),

    #[error(transparent)]
    Markup(#[from] aura_html::MarkupError),
}

impl RenderError {
    /// Convenience for hook implementations
    pub fn hook(
        hook: &'static str,
        descriptor: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Hook {
            hook,
            descriptor: descriptor.into(),
            message: message.into(),
        }
    }
}
