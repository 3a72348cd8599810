// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// In-memory filesystem with a fixed working directory.
#[derive(Debug, Clone)]
pub struct MockFileSystem {
    cwd: PathBuf,
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
}

impl MockFileSystem {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            files: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Add a file; relative paths are placed under the working directory.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = self.absolute(path.as_ref());
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        files.insert(path, content.into());
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        match files.get(&self.absolute(path)) {
            Some(content) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        let path = self.absolute(path);
        if path == self.cwd {
            return true;
        }
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        files.contains_key(&path)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // Paths are taken as already canonical.
        Ok(self.absolute(path))
    }

    fn current_dir(&self) -> Result<PathBuf> {
        Ok(self.cwd.clone())
    }
}
