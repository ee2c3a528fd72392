use serde::Serialize;

use crate::error::Result;

/// One fully qualified downloadable asset for a (version, platform) pair.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedAsset {
    pub package: String,
    pub version: String,
    pub platform: String,
    pub url: String,

    /// Release tag the asset hangs off, for release-hosted sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// The expanded asset filename.
    pub asset_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Ok,
    Fail,
}

/// Outcome of a single link reachability check.
#[derive(Debug, Clone, Serialize)]
pub struct LinkCheck {
    pub status: LinkStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LinkCheck {
    pub fn ok(http_status: Option<u16>) -> Self {
        Self {
            status: LinkStatus::Ok,
            http_status,
            error: None,
        }
    }

    pub fn fail(http_status: Option<u16>, error: impl Into<String>) -> Self {
        Self {
            status: LinkStatus::Fail,
            http_status,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == LinkStatus::Ok
    }
}

/// One upstream release seen during discovery.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredVersion {
    pub version: String,
    pub tag: String,

    /// True when the version is absent from the package's known versions.
    pub is_new: bool,

    /// Where the release was enumerated from (repository path).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A pluggable strategy for one kind of upstream hosting source.
///
/// Implementations are constructed through the
/// [`factory`](crate::factory) keyed by the package's `type` field.
pub trait Provider {
    /// Fully qualified URLs for every non-excluded (version, platform)
    /// pair of the package.
    fn resolve_urls(&self) -> Result<Vec<ResolvedAsset>>;

    /// Verifies that one resolved asset is still reachable upstream.
    ///
    /// Never returns an error: failures are folded into the
    /// [`LinkCheck`] so a broken link does not abort a whole run.
    fn check_link(&self, asset: &ResolvedAsset) -> LinkCheck;

    /// Enumerates recent upstream releases, marking the ones not yet
    /// registered.
    fn discover_versions(&self) -> Result<Vec<DiscoveredVersion>>;

    /// Short human-readable provenance string ("kind:identifier").
    fn describe_source(&self) -> String;
}
