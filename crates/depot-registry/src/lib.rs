//! Registry management for the depot manifest engine.
//!
//! The registry is a schema-versioned TOML document mapping package names to
//! their upstream source configuration: provider kind, asset templates,
//! known versions (head = latest), recorded content hashes, and optional
//! per-version source overrides. This crate loads and validates that
//! document, projects per-version [`ResolvedSource`] views, and reserializes
//! the registry deterministically after updates.

pub mod error;
pub mod package;
pub mod registry;
pub mod resolver;
pub mod serialize;

pub use error::{ErrorContext, RegistryError, Result};
pub use package::{
    HashPolicy, InstallSpec, PackageConfig, SourceOverride, TagFallback, UpdateCheck,
};
pub use registry::{Registry, RegistryMeta, META_KEY, SUPPORTED_SCHEMA_VERSIONS};
pub use resolver::{resolve_source, ResolvedSource};
