// All core functionality is in bookclean-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod output;

// Re-export core types for convenience
pub use bookclean_core::*;
