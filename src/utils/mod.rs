//! Generic utility primitives with zero domain knowledge.
//!
//! - `io` - File I/O with consistent error handling
//! - `parser` - Line and token helpers for line-oriented text formats

pub mod io;
pub mod parser;
