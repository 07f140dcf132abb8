pub mod cache;
pub mod disk;
pub mod fallback;
pub mod loader;
pub mod source;

// Re-exports for convenience
pub use cache::MemoryCache;
pub use disk::DiskCache;
pub use fallback::Fallback;
pub use loader::TileLoader;
pub use source::{TileProvider, TileResponse, TileService};
