//! Source providers and artifact downloads for the depot manifest engine.
//!
//! A [`Provider`](traits::Provider) knows, for one kind of upstream hosting
//! source, how to build download URLs, verify that linked assets still
//! exist, and discover newly published versions. Concrete implementations
//! are registered in a compile-time factory keyed by the package's `type`
//! discriminator.

pub mod direct;
pub mod download;
pub mod error;
pub mod factory;
pub mod github;
pub mod http;
pub mod traits;

pub use download::download_to;
pub use error::DownloadError;
pub use factory::{create_provider, known_kinds};
pub use traits::{DiscoveredVersion, LinkCheck, LinkStatus, Provider, ResolvedAsset};
