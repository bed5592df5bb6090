//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config loading, money formatting)
//! - `profile` - Synthetic spending profile generation
//! - `plan` - Budget recommendation and feedback refinement
//! - `classify` - Feedback intent inspection
//! - `config` - Active configuration display

pub mod classify;
pub mod config;
pub mod core;
pub mod plan;
pub mod profile;

// Re-export command functions for main.rs
pub use classify::*;
pub use config::*;
pub use core::*;
pub use plan::*;
pub use profile::*;
