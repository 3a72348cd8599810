// src/watch/scope.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Which files the event source reports at all.
///
/// Built from a list of file extensions (`["go", "c"]`); an empty list
/// watches every file. Paths are matched relative to the watched root, e.g.
/// `"src/main.go"`.
#[derive(Clone)]
pub struct WatchScope {
    /// `None` means every file.
    watch_set: Option<GlobSet>,
    include_hidden: bool,
}

impl fmt::Debug for WatchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchScope")
            .field("all_files", &self.watch_set.is_none())
            .field("include_hidden", &self.include_hidden)
            .finish_non_exhaustive()
    }
}

impl Default for WatchScope {
    fn default() -> Self {
        Self {
            watch_set: None,
            include_hidden: false,
        }
    }
}

impl WatchScope {
    /// Compile an extension list into `**/*.<ext>` globs.
    ///
    /// Extensions are trimmed and may be given with or without the leading
    /// dot. Blank entries are ignored.
    pub fn from_extensions(extensions: &[String], include_hidden: bool) -> Result<Self> {
        let globs: Vec<String> = extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.'))
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!("**/*.{ext}"))
            .collect();

        let watch_set = if globs.is_empty() {
            None
        } else {
            Some(build_globset(&globs)?)
        };

        Ok(Self {
            watch_set,
            include_hidden,
        })
    }

    /// Returns true if a change to `rel_path` should be reported.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include_hidden && is_hidden(rel_path) {
            return false;
        }
        match &self.watch_set {
            Some(set) => set.is_match(rel_path),
            None => true,
        }
    }
}

/// True if any component of the path starts with a dot (`.git/HEAD`,
/// `src/.main.go.swp`).
fn is_hidden(rel_path: &str) -> bool {
    rel_path
        .split('/')
        .any(|c| c.starts_with('.') && c != "." && c != "..")
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
