//! Release-hosting provider backed by the GitHub releases API.

use std::{collections::BTreeMap, env};

use depot_registry::{resolve_source, PackageConfig};
use depot_utils::template::expand;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::{DownloadError, Result},
    http::Http,
    traits::{DiscoveredVersion, LinkCheck, Provider, ResolvedAsset},
};

const API_UPSTREAM: &str = "https://api.github.com";
const DOWNLOAD_HOST: &str = "https://github.com";
const TOKEN_ENV: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

#[derive(Debug, Clone, Deserialize)]
pub struct GithubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<GithubAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubAsset {
    pub name: String,
}

pub struct GithubProvider {
    package: String,
    config: PackageConfig,
}

impl GithubProvider {
    pub fn new(package: impl Into<String>, config: PackageConfig) -> Self {
        Self {
            package: package.into(),
            config,
        }
    }

    fn token() -> Option<String> {
        TOKEN_ENV.iter().find_map(|var| env::var(var).ok())
    }

    /// Fetches releases for a repository, optionally filtered to one tag.
    fn fetch_releases(repo: &str, tag: Option<&str>) -> Result<Vec<GithubRelease>> {
        let path = match tag {
            Some(tag) => {
                let encoded_tag =
                    url::form_urlencoded::byte_serialize(tag.as_bytes()).collect::<String>();
                format!("/repos/{repo}/releases/tags/{encoded_tag}")
            }
            None => format!("/repos/{repo}/releases?per_page=100"),
        };

        let url = format!("{API_UPSTREAM}{path}");
        let token = Self::token();
        let json: serde_json::Value = Http::get_json(&url, token.as_deref())?;

        match json {
            serde_json::Value::Array(_) => {
                serde_json::from_value(json).map_err(|_| DownloadError::InvalidResponse)
            }
            serde_json::Value::Object(_) => {
                let single: GithubRelease =
                    serde_json::from_value(json).map_err(|_| DownloadError::InvalidResponse)?;
                Ok(vec![single])
            }
            _ => Err(DownloadError::InvalidResponse),
        }
    }

    /// Checks that the release for `tag` exists and lists `asset_name`
    /// among its attachments. A successful API response whose asset list
    /// omits the filename is a failure, not a success.
    fn check_tag(repo: &str, tag: &str, asset_name: &str) -> LinkCheck {
        match Self::fetch_releases(repo, Some(tag)) {
            Ok(releases) => {
                let listed = releases
                    .iter()
                    .flat_map(|release| release.assets.iter())
                    .any(|asset| asset.name == asset_name);
                if listed {
                    LinkCheck::ok(Some(200))
                } else {
                    LinkCheck::fail(
                        Some(200),
                        format!("asset '{asset_name}' not listed under tag '{tag}'"),
                    )
                }
            }
            Err(DownloadError::HttpError { status, url }) => {
                LinkCheck::fail(Some(status), format!("HTTP {status}: {url}"))
            }
            Err(err) => LinkCheck::fail(None, err.to_string()),
        }
    }

    /// Inverts a tag template into an anchored matching pattern with one
    /// capture group in place of the version placeholder.
    fn tag_regex(pattern: &str) -> Result<regex::Regex> {
        let escaped = regex::escape(pattern);
        let with_capture = escaped
            .replace(&regex::escape("%(mapped_version)"), "(.+)")
            .replace(&regex::escape("%(version)"), "(.+)");

        if with_capture == escaped {
            return Err(DownloadError::InvalidTagPattern {
                pattern: pattern.to_string(),
            });
        }

        regex::Regex::new(&format!("^{with_capture}$")).map_err(|_| {
            DownloadError::InvalidTagPattern {
                pattern: pattern.to_string(),
            }
        })
    }

    /// Repositories and tag patterns to enumerate during discovery:
    /// overrides marked `discover_from` replace the package default.
    fn discovery_sources(&self) -> Result<Vec<(String, String)>> {
        let designated: Vec<_> = self
            .config
            .source_overrides
            .iter()
            .filter(|entry| entry.discover_from)
            .collect();

        if designated.is_empty() {
            let repo = self.require_repo(None)?;
            let tag_pattern = self.require_tag_pattern(None)?;
            return Ok(vec![(repo, tag_pattern)]);
        }

        let mut sources = Vec::new();
        for entry in designated {
            let repo = match entry.repo {
                Some(ref repo) => repo.clone(),
                None => self.require_repo(None)?,
            };
            let tag_pattern = match entry.tag_pattern {
                Some(ref tag_pattern) => tag_pattern.clone(),
                None => self.require_tag_pattern(None)?,
            };
            sources.push((repo, tag_pattern));
        }
        Ok(sources)
    }

    fn require_repo(&self, version: Option<&str>) -> Result<String> {
        self.config.repo.clone().ok_or_else(|| {
            DownloadError::MissingField {
                package: self.package.clone(),
                field: "repo",
                version: version.unwrap_or("*").to_string(),
            }
        })
    }

    fn require_tag_pattern(&self, version: Option<&str>) -> Result<String> {
        self.config.tag_pattern.clone().ok_or_else(|| {
            DownloadError::MissingField {
                package: self.package.clone(),
                field: "tag_pattern",
                version: version.unwrap_or("*").to_string(),
            }
        })
    }

    /// Vendor release name to semantic version, inverted from
    /// `version_map`.
    fn reverse_version_map(&self) -> BTreeMap<&str, &str> {
        self.config
            .version_map
            .iter()
            .flatten()
            .map(|(version, vendor)| (vendor.as_str(), version.as_str()))
            .collect()
    }
}

impl Provider for GithubProvider {
    fn resolve_urls(&self) -> Result<Vec<ResolvedAsset>> {
        let version_map = self.config.version_map.as_ref();
        let mut assets = Vec::new();

        for version in &self.config.versions {
            let source = resolve_source(&self.config, version);
            let repo = source.repo.as_deref().ok_or_else(|| {
                DownloadError::MissingField {
                    package: self.package.clone(),
                    field: "repo",
                    version: version.clone(),
                }
            })?;
            let tag_pattern = source.tag_pattern.as_deref().ok_or_else(|| {
                DownloadError::MissingField {
                    package: self.package.clone(),
                    field: "tag_pattern",
                    version: version.clone(),
                }
            })?;
            let tag = expand(tag_pattern, version, version_map);

            for (platform, template) in &source.assets {
                if self.config.is_excluded(version, platform) {
                    continue;
                }

                let asset_name = expand(template, version, version_map);
                let url =
                    format!("{DOWNLOAD_HOST}/{repo}/releases/download/{tag}/{asset_name}");

                assets.push(ResolvedAsset {
                    package: self.package.clone(),
                    version: version.clone(),
                    platform: platform.clone(),
                    url,
                    tag: Some(tag.clone()),
                    asset_name,
                });
            }
        }

        Ok(assets)
    }

    fn check_link(&self, asset: &ResolvedAsset) -> LinkCheck {
        let source = resolve_source(&self.config, &asset.version);
        let Some(repo) = source.repo.as_deref() else {
            return LinkCheck::fail(None, format!("no repo resolved for {}", asset.version));
        };
        let Some(tag) = asset.tag.as_deref() else {
            return LinkCheck::fail(None, "asset carries no release tag".to_string());
        };

        let primary = Self::check_tag(repo, tag, &asset.asset_name);
        if primary.is_ok() {
            return primary;
        }

        // Try the fallback tag before concluding failure.
        if let Some(fallback_pattern) = source.fallback_tag_pattern.as_deref() {
            let fallback_tag = expand(
                fallback_pattern,
                &asset.version,
                self.config.version_map.as_ref(),
            );
            debug!(
                "Primary tag '{}' failed for {}, trying fallback '{}'",
                tag, asset.package, fallback_tag
            );
            return Self::check_tag(repo, &fallback_tag, &asset.asset_name);
        }

        primary
    }

    fn discover_versions(&self) -> Result<Vec<DiscoveredVersion>> {
        let reverse_map = self.reverse_version_map();
        let mut discovered = Vec::new();
        let mut seen = std::collections::BTreeSet::new();

        for (repo, tag_pattern) in self.discovery_sources()? {
            let matcher = Self::tag_regex(&tag_pattern)?;
            let releases = Self::fetch_releases(&repo, None)?;

            for release in releases {
                if release.draft {
                    continue;
                }
                if release.prerelease && !self.config.include_prereleases {
                    continue;
                }

                let Some(caps) = matcher.captures(&release.tag_name) else {
                    continue;
                };
                let captured = caps.get(1).map_or("", |m| m.as_str());
                let version = reverse_map.get(captured).copied().unwrap_or(captured).to_string();

                // De-duplicate across discovery sources.
                if !seen.insert(version.clone()) {
                    continue;
                }

                let is_new = !self.config.versions.iter().any(|v| v == &version);
                discovered.push(DiscoveredVersion {
                    version,
                    tag: release.tag_name.clone(),
                    is_new,
                    source: Some(repo.clone()),
                });
            }
        }

        Ok(discovered)
    }

    fn describe_source(&self) -> String {
        format!(
            "github:{}",
            self.config.repo.as_deref().unwrap_or("<unset>")
        )
    }
}
