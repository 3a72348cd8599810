// src/watch/filter.rs

use std::path::Path;

use crate::watch::rules::ExclusionRules;

/// Decide whether a change to `path` should count towards a re-run.
///
/// Returns false if the path's directory matches a directory rule or its
/// base name matches a file rule; true otherwise. Backslashes are normalised
/// to forward slashes before matching. A path without a directory part has
/// directory `"."`.
pub fn is_relevant(path: &Path, rules: &ExclusionRules) -> bool {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            parent.to_string_lossy().replace('\\', "/")
        }
        Some(_) => ".".to_string(),
        None => path.to_string_lossy().replace('\\', "/"),
    };
    if rules.dir_matches(&dir) {
        return false;
    }

    let base = match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.to_string_lossy().into_owned(),
    };
    !rules.file_matches(&base)
}
