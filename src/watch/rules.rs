// src/watch/rules.rs

//! Directory / file exclusion rules, compiled once at startup.

use std::path::Path;

use regex::Regex;
use tracing::warn;

/// Compiled exclusion predicates.
///
/// Directory rules are searched (not full-matched) in the changed path's
/// directory, file rules in its base name. Anchoring, if any, is baked into
/// the regex by [`ExclusionRules::anchored`].
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    dirs: Vec<Regex>,
    files: Vec<Regex>,
}

impl ExclusionRules {
    /// Compile ready-made regular expressions as-is.
    ///
    /// A pattern that does not compile is logged and dropped, i.e. it never
    /// matches.
    pub fn new<D, F>(dirs: D, files: F) -> Self
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        Self {
            dirs: compile_all("dir", dirs),
            files: compile_all("file", files),
        }
    }

    /// Compile user-facing patterns from the config file.
    ///
    /// - dir pattern `p` becomes `^<root>/<p>(.*)$`, so `build` excludes
    ///   `<root>/build` and everything below it;
    /// - file pattern `p` becomes `^<p>`, with a trailing `$` when `p` ends in
    ///   a letter, so `*_test.go` only matches whole base names.
    ///
    /// In both, `*` stands for `(.*)`. Empty patterns are ignored.
    pub fn anchored(root: &Path, dirs: &[String], files: &[String]) -> Self {
        let root = root.to_string_lossy().replace('\\', "/");
        let root = root.trim_end_matches('/');

        let dirs = dirs
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| anchor_dir_pattern(root, p));
        let files = files
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| anchor_file_pattern(p));

        Self::new(dirs, files)
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }

    /// True if any directory rule matches `dir` (forward slashes).
    pub fn dir_matches(&self, dir: &str) -> bool {
        self.dirs.iter().any(|re| re.is_match(dir))
    }

    /// True if any file rule matches the base name `file`.
    pub fn file_matches(&self, file: &str) -> bool {
        self.files.iter().any(|re| re.is_match(file))
    }

    /// Compiled directory expressions, for display.
    pub fn dir_patterns(&self) -> impl Iterator<Item = &str> {
        self.dirs.iter().map(Regex::as_str)
    }

    pub fn file_patterns(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(Regex::as_str)
    }
}

fn anchor_dir_pattern(root: &str, pattern: &str) -> String {
    format!("^{}/{}(.*)$", regex::escape(root), pattern.replace('*', "(.*)"))
}

fn anchor_file_pattern(pattern: &str) -> String {
    let mut re = pattern.replace('*', "(.*)");
    if re.ends_with(|c: char| c.is_ascii_alphabetic()) {
        re.push('$');
    }
    format!("^{re}")
}

fn compile_all<I>(what: &str, patterns: I) -> Vec<Regex>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    patterns
        .into_iter()
        .filter_map(|p| {
            let p = p.as_ref();
            match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern = p, error = %e, "ignoring invalid {what} exclusion pattern");
                    None
                }
            }
        })
        .collect()
}
