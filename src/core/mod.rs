// Public modules
pub mod archive;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod github;
pub mod layout;
pub mod lef;
pub mod paths;
pub mod pipeline;
pub mod submission;
pub mod verilog;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
