//! Playbook documents.
//!
//! Loading and the raw, schema-free view of a playbook's tasks.

pub mod loader;

pub use loader::*;
