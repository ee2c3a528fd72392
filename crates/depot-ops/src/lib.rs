//! Business logic for the depot manifest engine: link checking, update
//! discovery, descriptor generation and validation, and the registry
//! updater. Everything here operates on a loaded [`Registry`] and a
//! provider built per package; network access goes through the provider
//! seam so operations stay testable.
//!
//! [`Registry`]: depot_registry::Registry

pub mod check;
pub mod error;
pub mod generate;
pub mod platform;
pub mod provider;
pub mod update;
pub mod validate;

pub use check::{check_links, check_updates, LinkReport, UpdateFailure, UpdateReport};
pub use error::{OpsError, Result};
pub use generate::{descriptor_path, generate};
pub use update::{apply_update, update_package, UpdateOptions, UpdateOutcome, UpdateStatus};
pub use validate::{has_errors, validate, Issue, Severity};
