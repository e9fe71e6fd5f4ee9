// Observer system for resource-specific rules around generic writes

pub mod context;
pub mod error;
pub mod implementations;
pub mod pipeline;
pub mod traits;

// Re-export core types
pub use context::ObserverContext;
pub use error::ObserverError;
pub use pipeline::ObserverPipeline;
pub use traits::{Observer, ObserverRing, Operation};
