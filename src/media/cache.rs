use crate::error::Result;
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory that holds downloaded media until it has been uploaded.
#[derive(Debug, Clone)]
pub struct CacheDir {
    root: PathBuf,
}

impl CacheDir {
    /// Creates the directory if it does not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!("Media cache directory: {}", root.display());
        Ok(CacheDir { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Reserves a fresh, extension-less path for one download. Nothing is
    /// written yet; the returned guard removes whatever ends up at the path.
    pub fn reserve(&self) -> CachedDownload {
        let name = uuid::Uuid::new_v4().simple().to_string();
        CachedDownload {
            path: self.root.join(name),
        }
    }
}

/// A downloaded file owned by a single upload. Dropping it deletes the file.
#[derive(Debug)]
pub struct CachedDownload {
    path: PathBuf,
}

impl CachedDownload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Renames the file to carry `extension` (given with its leading dot).
    pub fn append_extension(&mut self, extension: &str) -> io::Result<()> {
        let mut renamed = self.path.clone().into_os_string();
        renamed.push(extension);
        let renamed = PathBuf::from(renamed);
        fs::rename(&self.path, &renamed)?;
        self.path = renamed;
        Ok(())
    }
}

impl Drop for CachedDownload {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed cached download: {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove cached download {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
