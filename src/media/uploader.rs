use super::cache::{CacheDir, CachedDownload};
use super::{MediaReference, mime};
use crate::error::{BotError, Result};
use crate::telegram::types::{ApiResponse, Params, form_value};
use log::{debug, error, info};
use reqwest::blocking::{Client, multipart};
use serde_json::Value;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// Sends one media field as a multipart upload, pulling remote media into
/// the cache directory first.
pub struct MediaUploader {
    client: Client,
    base_url: String,
    cache: CacheDir,
}

/// Media ready to attach: where the bytes live and what they are.
struct ResolvedMedia {
    path: PathBuf,
    mime_type: &'static str,
    /// Set for remote media; deletes the download when dropped.
    _download: Option<CachedDownload>,
}

impl MediaUploader {
    pub fn new(client: Client, base_url: &str, cache: CacheDir) -> Self {
        MediaUploader {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    pub fn cache(&self) -> &CacheDir {
        &self.cache
    }

    /// Uploads `fields[media_field]` (a local path or http(s) URL) together
    /// with the remaining scalar fields to `method`.
    ///
    /// Any file downloaded along the way is gone by the time this returns,
    /// whatever the outcome.
    pub fn upload(&self, method: &str, media_field: &str, fields: &Params) -> Result<ApiResponse> {
        let value = match fields.get(media_field) {
            Some(Value::String(value)) => value.as_str(),
            Some(other) => {
                return Err(BotError::InvalidMediaReference(format!(
                    "{} must be a string, got {}",
                    media_field, other
                )));
            }
            None => {
                return Err(BotError::InvalidMediaReference(format!(
                    "missing media field {}",
                    media_field
                )));
            }
        };

        self.upload_reference(method, media_field, MediaReference::classify(value), fields)
    }

    /// Same as [`MediaUploader::upload`] for a reference the caller has
    /// already classified. The media field's value in `fields` is ignored.
    pub fn upload_reference(
        &self,
        method: &str,
        media_field: &str,
        reference: MediaReference,
        fields: &Params,
    ) -> Result<ApiResponse> {
        let media = match reference {
            MediaReference::Local(path) => self.resolve_local(path)?,
            MediaReference::Remote(url) => self.resolve_remote(&url)?,
            MediaReference::Invalid(value) => {
                return Err(BotError::InvalidMediaReference(value));
            }
        };

        self.send_multipart(method, media_field, fields, &media)
    }

    fn resolve_local(&self, path: PathBuf) -> Result<ResolvedMedia> {
        let mime_type = mime::detect_local(&path)?;
        debug!("Local media {} sniffed as {}", path.display(), mime_type);
        Ok(ResolvedMedia {
            path,
            mime_type,
            _download: None,
        })
    }

    fn resolve_remote(&self, url: &Url) -> Result<ResolvedMedia> {
        let mut download = self.cache.reserve();
        debug!("Downloading {} to {}", url, download.path().display());

        let download_err = |source: reqwest::Error| BotError::Download {
            url: url.to_string(),
            source: source.without_url(),
        };
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(download_err)?;

        let mut file = File::create(download.path())?;
        let written = response.copy_to(&mut file).map_err(download_err)?;
        drop(file);

        let mime_type = mime::sniff_file(download.path())?;
        let Some(extension) = mime::extension_for_mime(mime_type) else {
            error!("Downloaded {} has unsupported type {}", url, mime_type);
            return Err(BotError::UnsupportedMimeType {
                mime: mime_type.to_string(),
            });
        };
        download.append_extension(extension)?;
        info!(
            "Downloaded {} ({} bytes, {}) to {}",
            url,
            written,
            mime_type,
            download.path().display()
        );

        Ok(ResolvedMedia {
            path: download.path().to_path_buf(),
            mime_type,
            _download: Some(download),
        })
    }

    fn send_multipart(
        &self,
        method: &str,
        media_field: &str,
        fields: &Params,
        media: &ResolvedMedia,
    ) -> Result<ApiResponse> {
        let url = format!("{}/{}", self.base_url, method);
        debug!("Uploading {} as {} to {}", media.path.display(), media_field, method);

        // The request URL carries the bot token; keep it out of the error.
        let upload_err = |source: reqwest::Error| BotError::Upload {
            method: method.to_string(),
            source: source.without_url(),
        };
        let part = multipart::Part::file(&media.path)?
            .file_name(upload_file_name(&media.path))
            .mime_str(media.mime_type)
            .map_err(upload_err)?;

        let mut form = multipart::Form::new();
        for (name, value) in fields.iter().filter(|(name, _)| name.as_str() != media_field) {
            if let Some(text) = form_value(value) {
                form = form.text(name.clone(), text);
            }
        }
        let form = form.part(media_field.to_string(), part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(upload_err)?;
        let status = response.status();
        let body = response.text().map_err(upload_err)?;

        let parsed: ApiResponse =
            serde_json::from_str(&body).map_err(|source| BotError::MalformedResponse {
                method: method.to_string(),
                source,
            })?;
        if parsed.ok {
            info!("{} upload accepted ({})", method, status);
        } else {
            error!("{} upload rejected: {} - {}", method, status, body);
        }
        Ok(parsed)
    }
}

fn upload_file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    const PNG: &[u8] = b"\x89PNG\r\n\x1A\n\x00\x00\x00\rIHDR\x00\x00\x00\x01\x00\x00\x00\x01";

    fn uploader(server: &mockito::Server, cache: &Path) -> MediaUploader {
        MediaUploader::new(
            Client::new(),
            &format!("{}/bottest_token", server.url()),
            CacheDir::new(cache).unwrap(),
        )
    }

    fn fields(media_field: &str, media: &str) -> Params {
        let mut fields = Params::new();
        fields.insert("chat_id".into(), json!(123));
        fields.insert(media_field.into(), json!(media));
        fields
    }

    fn cache_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[test]
    fn test_invalid_reference_makes_no_request() {
        let mut server = mockito::Server::new();
        let any = server.mock("POST", Matcher::Any).expect(0).create();
        let dir = tempfile::tempdir().unwrap();

        let err = uploader(&server, dir.path())
            .upload("sendPhoto", "photo", &fields("photo", "not a path or url"))
            .unwrap_err();
        assert!(matches!(err, BotError::InvalidMediaReference(_)));
        any.assert();
    }

    #[test]
    fn test_missing_or_non_string_media_field() {
        let server = mockito::Server::new();
        let dir = tempfile::tempdir().unwrap();
        let uploader = uploader(&server, dir.path());

        let err = uploader
            .upload("sendPhoto", "photo", &fields("document", "/tmp/x"))
            .unwrap_err();
        assert!(matches!(err, BotError::InvalidMediaReference(_)));

        let mut bad = Params::new();
        bad.insert("photo".into(), json!(42));
        let err = uploader.upload("sendPhoto", "photo", &bad).unwrap_err();
        assert!(matches!(err, BotError::InvalidMediaReference(_)));
    }

    #[test]
    fn test_local_file_single_request() {
        let mut server = mockito::Server::new();
        let upload = server
            .mock("POST", "/bottest_token/sendDocument")
            .match_header("content-type", Matcher::Regex("^multipart/form-data".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="chat_id"\r\n\r\n123\r\n"#.into()),
                Matcher::Regex(r#"(?i)name="document"; filename="report.pdf"\r\ncontent-type: application/pdf"#.into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true,"result":{"message_id":7}}"#)
            .expect(1)
            .create();
        let any_get = server.mock("GET", Matcher::Any).expect(0).create();

        let dir = tempfile::tempdir().unwrap();
        let media_dir = tempfile::tempdir().unwrap();
        let path = media_dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4\n%...").unwrap();

        let res = uploader(&server, dir.path())
            .upload("sendDocument", "document", &fields("document", path.to_str().unwrap()))
            .unwrap();
        assert!(res.ok);
        assert_eq!(res.result.unwrap()["message_id"], 7);
        assert!(path.exists(), "local media must not be deleted");
        upload.assert();
        any_get.assert();
    }

    #[test]
    fn test_local_file_outside_table_is_accepted() {
        let mut server = mockito::Server::new();
        let upload = server
            .mock("POST", "/bottest_token/sendAudio")
            .match_body(Matcher::Regex(r#"(?i)filename="song.ogg"\r\ncontent-type: audio/ogg"#.into()))
            .with_body(r#"{"ok":true}"#)
            .create();

        let dir = tempfile::tempdir().unwrap();
        let media_dir = tempfile::tempdir().unwrap();
        let path = media_dir.path().join("song.ogg");
        std::fs::write(&path, b"OggS\x00\x02rest-of-stream").unwrap();

        let res = uploader(&server, dir.path())
            .upload("sendAudio", "audio", &fields("audio", path.to_str().unwrap()))
            .unwrap();
        assert!(res.ok);
        upload.assert();
    }

    #[test]
    fn test_remote_png_end_to_end() {
        let mut server = mockito::Server::new();
        let download = server
            .mock("GET", "/media/cat")
            .with_status(200)
            .with_header("content-type", "application/octet-stream")
            .with_body(PNG)
            .expect(1)
            .create();
        let upload = server
            .mock("POST", "/bottest_token/sendPhoto")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="chat_id"\r\n\r\n123\r\n"#.into()),
                Matcher::Regex(
                    r#"(?i)name="photo"; filename="[0-9a-f]{32}\.png"\r\ncontent-type: image/png"#.into(),
                ),
            ]))
            .with_body(r#"{"ok":true,"result":{"message_id":1}}"#)
            .expect(1)
            .create();

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/media/cat", server.url());
        let res = uploader(&server, dir.path())
            .upload("sendPhoto", "photo", &fields("photo", &url))
            .unwrap();

        assert!(res.ok);
        download.assert();
        upload.assert();
        assert!(cache_is_empty(dir.path()));
    }

    #[test]
    fn test_remote_unsupported_type_cleans_up() {
        let mut server = mockito::Server::new();
        let download = server
            .mock("GET", "/page")
            .with_body("definitely not a photo, just words")
            .expect(1)
            .create();
        let upload = server.mock("POST", Matcher::Any).expect(0).create();

        let dir = tempfile::tempdir().unwrap();
        let err = uploader(&server, dir.path())
            .upload("sendPhoto", "photo", &fields("photo", &format!("{}/page", server.url())))
            .unwrap_err();

        match err {
            BotError::UnsupportedMimeType { mime } => assert_eq!(mime, "text/plain"),
            other => panic!("unexpected error: {other:?}"),
        }
        download.assert();
        upload.assert();
        assert!(cache_is_empty(dir.path()));
    }

    #[test]
    fn test_remote_download_failure() {
        let mut server = mockito::Server::new();
        let download = server.mock("GET", "/gone.png").with_status(404).create();
        let upload = server.mock("POST", Matcher::Any).expect(0).create();

        let dir = tempfile::tempdir().unwrap();
        let err = uploader(&server, dir.path())
            .upload("sendPhoto", "photo", &fields("photo", &format!("{}/gone.png", server.url())))
            .unwrap_err();

        assert!(matches!(err, BotError::Download { .. }));
        download.assert();
        upload.assert();
        assert!(cache_is_empty(dir.path()));
    }

    #[test]
    fn test_api_error_body_is_returned_and_cache_cleaned() {
        let mut server = mockito::Server::new();
        let _download = server.mock("GET", "/cat.png").with_body(PNG).create();
        let _upload = server
            .mock("POST", "/bottest_token/sendPhoto")
            .with_status(400)
            .with_body(r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#)
            .create();

        let dir = tempfile::tempdir().unwrap();
        let res = uploader(&server, dir.path())
            .upload("sendPhoto", "photo", &fields("photo", &format!("{}/cat.png", server.url())))
            .unwrap();

        assert!(!res.ok);
        assert_eq!(res.error_code, Some(400));
        assert!(cache_is_empty(dir.path()));
    }

    #[test]
    fn test_malformed_upload_response_cleans_up() {
        let mut server = mockito::Server::new();
        let _download = server.mock("GET", "/cat.png").with_body(PNG).create();
        let _upload = server
            .mock("POST", "/bottest_token/sendPhoto")
            .with_status(502)
            .with_body("<html>Bad Gateway</html>")
            .create();

        let dir = tempfile::tempdir().unwrap();
        let err = uploader(&server, dir.path())
            .upload("sendPhoto", "photo", &fields("photo", &format!("{}/cat.png", server.url())))
            .unwrap_err();

        assert!(matches!(err, BotError::MalformedResponse { .. }));
        assert!(cache_is_empty(dir.path()));
    }

    #[test]
    fn test_upload_transport_failure_cleans_up() {
        let mut server = mockito::Server::new();
        let download = server.mock("GET", "/cat.png").with_body(PNG).expect(1).create();
        // Bind then release a port so the POST cannot connect.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let dir = tempfile::tempdir().unwrap();
        let uploader = MediaUploader::new(
            Client::new(),
            &format!("http://127.0.0.1:{}/bot123456:SECRET_TOKEN", port),
            CacheDir::new(dir.path()).unwrap(),
        );
        let err = uploader
            .upload("sendPhoto", "photo", &fields("photo", &format!("{}/cat.png", server.url())))
            .unwrap_err();

        assert!(matches!(err, BotError::Upload { .. }));
        assert!(!err.to_string().contains("SECRET_TOKEN"));
        download.assert();
        assert!(cache_is_empty(dir.path()));
    }
}
