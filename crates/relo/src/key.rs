//! Mapping between absolute filesystem paths and registry keys.
//!
//! The external registry indexes project metadata by a flattened form of
//! the project's absolute path: every character that is not ASCII
//! alphanumeric becomes a hyphen, so `/home/wei/projects/my-app` is stored
//! under `-home-wei-projects-my-app`. Distinct real paths under a common
//! root always flatten to distinct keys except for pathological sibling
//! names (`/a/b` vs `/a-b`); the validator treats that collision as a
//! duplicate-destination conflict rather than resolving it here.

use std::path::Path;

/// Converts an absolute filesystem path into the registry key format.
pub fn encode(path: &Path) -> String {
    path.to_string_lossy()
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '-' })
        .collect()
}

/// Rewrites `old_key` as if the project it names had been relocated from
/// `old_root` to `new_root`.
///
/// Returns `None` when `old_key` was not derived from a path under
/// `old_root`. For any path `p` under `old_root`, the result equals
/// `encode` of the corresponding relocated path.
pub fn rekey(old_key: &str, old_root: &Path, new_root: &Path) -> Option<String> {
    let suffix = old_key.strip_prefix(&encode(old_root))?;
    // `/srv/application` must not count as being under `/srv/app`.
    if !suffix.is_empty() && !suffix.starts_with('-') {
        return None;
    }
    Some(format!("{}{suffix}", encode(new_root)))
}
