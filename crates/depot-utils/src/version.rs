/// Returns true when version `a` orders greater than or equal to `b`.
///
/// Both strings are split on non-digit boundaries into integer components
/// which are compared left to right. A missing component counts as 0, so
/// `"19.1"` and `"19.1.0"` compare equal, and equality counts as `>=`.
///
/// # Examples
///
/// ```
/// use depot_utils::version::version_gte;
///
/// assert!(version_gte("19.1.5", "19.1"));
/// assert!(!version_gte("19.1", "19.1.5"));
/// assert!(version_gte("1.0.0", "1.0.0"));
/// ```
pub fn version_gte(a: &str, b: &str) -> bool {
    let a = components(a);
    let b = components(b);

    for i in 0..a.len().max(b.len()) {
        let left = a.get(i).copied().unwrap_or(0);
        let right = b.get(i).copied().unwrap_or(0);
        if left != right {
            return left > right;
        }
    }

    true
}

fn components(version: &str) -> Vec<u64> {
    version
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_is_gte() {
        assert!(version_gte("1.0.0", "1.0.0"));
        assert!(version_gte("19.1", "19.1"));
    }

    #[test]
    fn test_component_wise_ordering() {
        assert!(version_gte("2.0.0", "1.9.9"));
        assert!(!version_gte("1.9.9", "2.0.0"));
        assert!(version_gte("1.10.0", "1.9.0"));
    }

    #[test]
    fn test_differing_component_counts() {
        assert!(version_gte("19.1.5", "19.1"));
        assert!(!version_gte("19.1", "19.1.5"));
        assert!(version_gte("19.1", "19.1.0"));
        assert!(version_gte("19.1.0", "19.1"));
    }

    #[test]
    fn test_non_digit_separators() {
        assert!(version_gte("1.2-rc3", "1.2-rc2"));
        assert!(version_gte("v2.0", "1.9"));
    }

    #[test]
    fn test_antisymmetry_up_to_equality() {
        let versions = ["1.0", "1.0.0", "1.0.1", "2.3.4", "19.1", "19.1.5"];
        for a in versions {
            for b in versions {
                let forward = version_gte(a, b);
                let backward = version_gte(b, a);
                // At least one direction always holds; both hold only on ties.
                assert!(forward || backward, "{a} vs {b}");
                if forward && backward {
                    assert!(version_gte(a, b) && version_gte(b, a));
                }
            }
        }
    }
}
