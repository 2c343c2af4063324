//! Catalog use-case services.
//!
//! # Responsibility
//! - Expose finders and writes through one facade.
//! - Render listings for terminal-style presentations.

pub mod data_manager;
pub mod listing;
