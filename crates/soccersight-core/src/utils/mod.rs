//! Utility functions for display formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{delta_summary, format_percent, format_signed, truncate};
