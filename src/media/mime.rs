//! Content sniffing for media files.
//!
//! The type is always taken from the bytes themselves; downloads carry no
//! trustworthy content-type at this layer.

use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// How many leading bytes are inspected.
const SNIFF_LEN: usize = 512;

/// Supported MIME types for downloaded media and the extension each gets.
const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/bmp", ".bmp"),
    ("image/tiff", ".tif"),
];

/// Looks up the canonical extension (with leading dot) for a downloadable type.
/// Anything outside the table is unsupported.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    MIME_EXTENSIONS
        .iter()
        .find(|(known, _)| *known == mime)
        .map(|(_, ext)| *ext)
}

/// Detects a MIME type from leading content bytes.
pub fn sniff_bytes(head: &[u8]) -> &'static str {
    if let Some(kind) = infer::get(head) {
        return kind.mime_type();
    }
    if head.is_empty() {
        return "application/x-empty";
    }

    // infer has no signature for plain text: valid UTF-8 without NULs counts.
    let text = match std::str::from_utf8(head) {
        Ok(text) => Some(text),
        // A multi-byte character may be cut at the sniff boundary.
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&head[..e.valid_up_to()]).ok(),
        Err(_) => None,
    };
    match text {
        Some(text) if !text.contains('\0') => "text/plain",
        _ => OCTET_STREAM,
    }
}

/// Reads the head of `path` and sniffs it.
pub fn sniff_file(path: &Path) -> std::io::Result<&'static str> {
    let file = File::open(path)?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut head)?;
    Ok(sniff_bytes(&head))
}

/// MIME type for a local upload: content first, then extension.
pub fn detect_local(path: &Path) -> std::io::Result<&'static str> {
    let sniffed = sniff_file(path)?;
    if sniffed == OCTET_STREAM || sniffed == "text/plain" {
        if let Some(guessed) = mime_guess::from_path(path).first_raw() {
            return Ok(guessed);
        }
    }
    Ok(sniffed)
}
