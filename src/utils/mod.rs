//! Utility functions module
//!
//! Output formatting, interactive prompts and retry logic.

pub mod format;
pub mod interactive;
pub mod retry;

pub use format::*;
pub use interactive::*;
pub use retry::*;
