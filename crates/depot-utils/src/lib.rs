//! Leaf utilities for the depot manifest engine: placeholder template
//! expansion, dotted-numeric version ordering, and content hashing.

pub mod error;
pub mod hash;
pub mod template;
pub mod version;
