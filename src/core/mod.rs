// Public modules
pub mod build;
pub mod defaults;
pub mod deploy;
pub mod error;
pub mod executor;
pub mod paths;
pub mod stack;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
