//! Configuration module for notecell
//!
//! This module handles user preferences, their JSON persistence in
//! platform-specific directories, and the live configuration service that
//! notifies cell views when a setting changes.

mod persistence;
mod service;
mod settings;

pub use persistence::*;
pub use service::*;
pub use settings::*;
