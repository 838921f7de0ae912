//! Rendering service configuration

/// Rendering service configuration options
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Passes `rerender_dirty` may run before giving up on a feedback cycle
    pub max_rerender_iterations: usize,

    /// Data attribute naming the component that rendered an element
    pub rendered_by_attribute: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_rerender_iterations: 1000,
            rendered_by_attribute: "data-aura-rendered-by".to_string(),
        }
    }
}
