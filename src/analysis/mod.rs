//! Analysis modules.
//!
//! Task classification and aggregation over a loaded playbook.

pub mod aggregator;

pub use aggregator::*;
