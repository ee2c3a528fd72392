//! Platform-id mapping for descriptor generation.
//!
//! Registry platform-ids follow the `<host>` or `<host>-<arch>` convention.
//! Generated descriptors group assets by host and dispatch on architecture
//! inside each host branch, so every id appearing in the data must map to a
//! known (host, arch) pair.

use crate::error::{OpsError, Result};

/// Descriptor hosts in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Host {
    Windows,
    Linux,
    Macosx,
}

impl Host {
    pub const ALL: [Host; 3] = [Host::Windows, Host::Linux, Host::Macosx];

    pub fn name(self) -> &'static str {
        match self {
            Host::Windows => "windows",
            Host::Linux => "linux",
            Host::Macosx => "macosx",
        }
    }
}

/// One known platform-id with its host and optional architecture
/// condition. `arch = None` marks an architecture-agnostic id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub id: &'static str,
    pub host: Host,
    pub arch: Option<&'static str>,
}

static PLATFORMS: &[Platform] = &[
    Platform { id: "windows", host: Host::Windows, arch: None },
    Platform { id: "windows-x86_64", host: Host::Windows, arch: Some("x64") },
    Platform { id: "windows-arm64", host: Host::Windows, arch: Some("arm64") },
    Platform { id: "linux", host: Host::Linux, arch: None },
    Platform { id: "linux-x86_64", host: Host::Linux, arch: Some("x86_64") },
    Platform { id: "linux-arm64", host: Host::Linux, arch: Some("arm64") },
    Platform { id: "macosx", host: Host::Macosx, arch: None },
    Platform { id: "macosx-universal", host: Host::Macosx, arch: None },
    Platform { id: "macosx-x86_64", host: Host::Macosx, arch: Some("x86_64") },
    Platform { id: "macosx-arm64", host: Host::Macosx, arch: Some("arm64") },
];

/// Looks up a platform-id appearing in package data.
///
/// # Errors
///
/// [`OpsError::UnknownPlatform`] for ids outside the known table.
pub fn lookup(package: &str, id: &str) -> Result<Platform> {
    PLATFORMS
        .iter()
        .copied()
        .find(|platform| platform.id == id)
        .ok_or_else(|| OpsError::UnknownPlatform {
            package: package.to_string(),
            platform: id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known() {
        let platform = lookup("tool", "linux-x86_64").unwrap();
        assert_eq!(platform.host, Host::Linux);
        assert_eq!(platform.arch, Some("x86_64"));

        let universal = lookup("tool", "macosx-universal").unwrap();
        assert_eq!(universal.host, Host::Macosx);
        assert_eq!(universal.arch, None);
    }

    #[test]
    fn test_lookup_unknown_is_error() {
        assert!(matches!(
            lookup("tool", "beos-ppc"),
            Err(OpsError::UnknownPlatform { .. })
        ));
    }

    #[test]
    fn test_host_order() {
        let names: Vec<_> = Host::ALL.iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["windows", "linux", "macosx"]);
    }
}
