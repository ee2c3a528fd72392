use std::{collections::BTreeMap, sync::LazyLock};

use regex::{Captures, Regex};

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%\(([A-Za-z0-9_]+)\)").expect("unable to compile placeholder regex")
});

/// Expands `%(name)` placeholders in an asset or tag template.
///
/// Two builtin variables are supplied: `version` (the literal version string)
/// and `mapped_version` (the vendor release name from `version_map`,
/// defaulting to `version` when the map has no entry). Unknown placeholder
/// names are not an error; they are echoed back as `<name>` so a malformed
/// template stays diagnosable instead of silently collapsing.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use depot_utils::template::expand;
///
/// let map = BTreeMap::from([("1.2.1".to_string(), "1.2.rel1".to_string())]);
/// assert_eq!(
///     expand("%(version)-%(mapped_version)", "1.2.1", Some(&map)),
///     "1.2.1-1.2.rel1"
/// );
/// assert_eq!(expand("%(bogus)", "1.0", None), "<bogus>");
/// ```
pub fn expand(template: &str, version: &str, version_map: Option<&BTreeMap<String, String>>) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            match name {
                "version" => version.to_string(),
                "mapped_version" => {
                    version_map
                        .and_then(|map| map.get(version))
                        .cloned()
                        .unwrap_or_else(|| version.to_string())
                }
                other => format!("<{other}>"),
            }
        })
        .into_owned()
}
