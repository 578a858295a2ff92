use std::path::{Path, PathBuf};
use url::Url;

pub mod cache;
pub mod mime;
pub mod uploader;

pub use cache::{CacheDir, CachedDownload};
pub use uploader::MediaUploader;

/// What a media argument points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaReference {
    /// An existing regular file on this machine.
    Local(PathBuf),
    /// An absolute http(s) URL to fetch before uploading.
    Remote(Url),
    /// Neither of the above; kept verbatim.
    Invalid(String),
}

impl MediaReference {
    /// Classifies `value`. A string that is both an existing file and a
    /// valid URL is treated as `Local`.
    pub fn classify(value: &str) -> Self {
        Self::classify_with(value, |path| path.is_file())
    }

    pub(crate) fn classify_with<F>(value: &str, is_file: F) -> Self
    where
        F: Fn(&Path) -> bool,
    {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return MediaReference::Invalid(value.to_string());
        }
        if is_file(Path::new(value)) {
            return MediaReference::Local(PathBuf::from(value));
        }
        match parse_remote(trimmed) {
            Some(url) => MediaReference::Remote(url),
            None => MediaReference::Invalid(value.to_string()),
        }
    }
}

fn parse_remote(value: &str) -> Option<Url> {
    let url = Url::parse(value).ok()?;
    let has_host = url.host_str().is_some_and(|host| !host.is_empty());
    (matches!(url.scheme(), "http" | "https") && has_host).then_some(url)
}
