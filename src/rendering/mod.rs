pub mod canvas;
pub mod context;

// Re-export main types
pub use canvas::Color;
pub use context::RenderContext;
