//! Redirect page generation
//!
//! Builds a self-contained HTML document that shows the uploaded image
//! inline and forwards the viewer to the redirect target, both through a
//! meta refresh and through a script, with a manual link as last resort.
//! The document is saved with a `.jpg` extension in the downloads area.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use common::error::{StorageError, StorageResult};
use common::storage::{Area, PublicStorage};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::validation::RedirectTarget;

/// File name prefix of generated documents
pub const OUTPUT_PREFIX: &str = "portfolio-redirect-";
/// File name suffix of generated documents
pub const OUTPUT_SUFFIX: &str = ".jpg";

const PAGE_TITLE: &str = "Redirecting to Portfolio";

const PAGE_STYLE: &str = r#"    body {
      font-family: Arial, sans-serif;
      text-align: center;
      padding: 50px;
      background-color: #f5f5f5;
    }
    .container {
      max-width: 600px;
      margin: 0 auto;
      background: white;
      padding: 30px;
      border-radius: 8px;
      box-shadow: 0 2px 10px rgba(0,0,0,0.1);
    }
    a {
      color: #0066cc;
      text-decoration: none;
    }"#;

/// A redirect document written to disk
#[derive(Debug, Clone)]
pub struct GeneratedPage {
    /// Public URL path, e.g. `/downloads/portfolio-redirect-1700000000000.jpg`
    pub download_url: String,
    pub filename: String,
    pub path: PathBuf,
}

/// Writes redirect documents into the downloads area
#[derive(Debug, Clone)]
pub struct RedirectPageGenerator {
    storage: PublicStorage,
}

impl RedirectPageGenerator {
    pub fn new(storage: PublicStorage) -> Self {
        Self { storage }
    }

    /// Generate the redirect document for a stored image
    pub async fn generate(
        &self,
        image_path: &Path,
        target: &RedirectTarget,
    ) -> StorageResult<GeneratedPage> {
        let image = tokio::fs::read(image_path)
            .await
            .map_err(|e| StorageError::io(image_path, e))?;
        let image_base64 = STANDARD.encode(&image);

        let html = render_page(&image_base64, image_mime_type(image_path), target);

        let mut artifact = self
            .storage
            .create_download(OUTPUT_PREFIX, OUTPUT_SUFFIX)
            .await?;
        artifact
            .file
            .write_all(html.as_bytes())
            .await
            .map_err(|e| StorageError::io(&artifact.path, e))?;
        artifact
            .file
            .flush()
            .await
            .map_err(|e| StorageError::io(&artifact.path, e))?;

        debug!(
            "Wrote {} bytes of HTML to {}",
            html.len(),
            artifact.path.display()
        );

        Ok(GeneratedPage {
            download_url: self.storage.public_url(Area::Downloads, &artifact.filename),
            filename: artifact.filename,
            path: artifact.path,
        })
    }
}

/// Render the redirect document
pub fn render_page(image_base64: &str, mime_type: &str, target: &RedirectTarget) -> String {
    let attribute_url = target.html_attribute();
    let script_url = target.js_literal();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset='UTF-8'>
  <meta http-equiv='refresh' content='0;url={attribute_url}'>
  <script>window.location.href='{script_url}';</script>
  <title>{PAGE_TITLE}</title>
  <style>
{PAGE_STYLE}
  </style>
</head>
<body>
  <div class="container">
    <h1>{PAGE_TITLE}</h1>
    <img src="data:{mime_type};base64,{image_base64}" style="max-width: 100%; height: auto; margin: 20px 0;">
    <p>You are being redirected to the portfolio website.</p>
    <p>If you are not redirected automatically, <a href="{attribute_url}">click here</a>.</p>
  </div>
</body>
</html>"#
    )
}

/// Data URI media type for an image, chosen from its extension
pub fn image_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("ico") => "image/x-icon",
        Some("avif") => "image/avif",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn target(url: &str) -> RedirectTarget {
        RedirectTarget::parse(Some(url)).unwrap()
    }

    fn embedded_payload(html: &str) -> &str {
        let start = html.find(";base64,").unwrap() + ";base64,".len();
        let end = start + html[start..].find('"').unwrap();
        &html[start..end]
    }

    #[test]
    fn test_render_places_url_at_every_injection_point() {
        let html = render_page("AAAA", "image/jpeg", &target("https://example.com/portfolio"));

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(
            "<meta http-equiv='refresh' content='0;url=https://example.com/portfolio'>"
        ));
        assert!(html.contains("window.location.href='https://example.com/portfolio';"));
        assert!(html.contains(r#"<a href="https://example.com/portfolio">click here</a>"#));
        assert!(html.contains(r#"src="data:image/jpeg;base64,AAAA""#));
    }

    #[test]
    fn test_render_keeps_redirects_before_content() {
        let html = render_page("AAAA", "image/png", &target("https://example.com"));

        let meta = html.find("http-equiv='refresh'").unwrap();
        let script = html.find("<script>").unwrap();
        let heading = html.find("<h1>").unwrap();
        let image = html.find("<img").unwrap();
        let link = html.find("<a href=").unwrap();
        assert!(meta < script && script < heading && heading < image && image < link);
    }

    #[test]
    fn test_render_escapes_hostile_url() {
        let html = render_page(
            "",
            "image/jpeg",
            &target("https://x.test/'><script>alert(1)</script>"),
        );

        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains("content='0;url=https://x.test/&#39;&gt;&lt;script&gt;"));
        assert!(html.contains("window.location.href='https://x.test/\\'\\x3E\\x3Cscript\\x3E"));
        assert_eq!(html.matches("<script>").count(), 1);
    }

    #[test]
    fn test_image_mime_type() {
        assert_eq!(image_mime_type(Path::new("1.png")), "image/png");
        assert_eq!(image_mime_type(Path::new("1.PNG")), "image/png");
        assert_eq!(image_mime_type(Path::new("1.webp")), "image/webp");
        assert_eq!(image_mime_type(Path::new("1.jpeg")), "image/jpeg");
        assert_eq!(image_mime_type(Path::new("1.ico")), "image/x-icon");
        assert_eq!(image_mime_type(Path::new("1")), "image/jpeg");
    }

    #[tokio::test]
    async fn test_generate_round_trips_image_bytes() {
        let temp = TempDir::new().unwrap();
        let storage = PublicStorage::new(temp.path());
        storage.ensure_layout().await.unwrap();

        let image: Vec<u8> = (0..=255u8).collect();
        let image_path = storage.dir(Area::Uploads).join("1.png");
        std::fs::write(&image_path, &image).unwrap();

        let generator = RedirectPageGenerator::new(storage.clone());
        let page = generator
            .generate(&image_path, &target("https://example.com/portfolio"))
            .await
            .unwrap();

        assert!(page.filename.starts_with(OUTPUT_PREFIX));
        assert!(page.filename.ends_with(OUTPUT_SUFFIX));
        assert_eq!(page.download_url, format!("/downloads/{}", page.filename));
        assert_eq!(page.path, storage.dir(Area::Downloads).join(&page.filename));

        let html = std::fs::read_to_string(&page.path).unwrap();
        assert!(html.contains("data:image/png;base64,"));
        assert_eq!(STANDARD.decode(embedded_payload(&html)).unwrap(), image);
    }

    #[tokio::test]
    async fn test_generate_accepts_empty_image() {
        let temp = TempDir::new().unwrap();
        let storage = PublicStorage::new(temp.path());
        storage.ensure_layout().await.unwrap();

        let image_path = storage.dir(Area::Uploads).join("empty.jpg");
        std::fs::write(&image_path, b"").unwrap();

        let page = RedirectPageGenerator::new(storage)
            .generate(&image_path, &target("https://example.com"))
            .await
            .unwrap();

        let html = std::fs::read_to_string(&page.path).unwrap();
        assert!(html.contains(r#"src="data:image/jpeg;base64,""#));
    }

    #[tokio::test]
    async fn test_generate_fails_for_missing_image() {
        let temp = TempDir::new().unwrap();
        let storage = PublicStorage::new(temp.path());
        storage.ensure_layout().await.unwrap();

        let result = RedirectPageGenerator::new(storage.clone())
            .generate(
                &storage.dir(Area::Uploads).join("missing.png"),
                &target("https://example.com"),
            )
            .await;

        assert!(matches!(result, Err(StorageError::Io { .. })));
        let written = std::fs::read_dir(storage.dir(Area::Downloads)).unwrap().count();
        assert_eq!(written, 0);
    }
}
