//! Artifact materialization for image tasks
//!
//! Turns the API's image descriptors into files persisted through the run
//! context: URL-format responses are fetched over HTTP, base64-format
//! responses are decoded in place. Files come back in response order under
//! unique names. Failures abort the whole task; nothing is retried here.

use crate::context::{RunContext, StoredFile};
use crate::error::{TaskError, TaskResult};
use crate::openai::{ImageData, ImageResponseFormat};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Persist each returned image, in response order
pub(crate) async fn materialize(
    ctx: &dyn RunContext,
    http: &Client,
    format: ImageResponseFormat,
    images: &[ImageData],
) -> TaskResult<Vec<StoredFile>> {
    let mut files = Vec::with_capacity(images.len());
    for image in images {
        let bytes = match format {
            ImageResponseFormat::Url => {
                let url = image.url.as_deref().ok_or_else(|| TaskError::Download {
                    url: "<missing>".to_string(),
                    message: "response contained no image URL".to_string(),
                })?;
                fetch(http, url).await?
            }
            ImageResponseFormat::B64Json => {
                let payload = image
                    .b64_json
                    .as_deref()
                    .ok_or_else(|| {
                        TaskError::Decode("response contained no base64 payload".to_string())
                    })?;
                BASE64
                    .decode(payload)
                    .map_err(|e| TaskError::Decode(e.to_string()))?
            }
        };

        let name = format!("openai-{}.png", Uuid::new_v4());
        debug!(name = %name, bytes = bytes.len(), "storing generated image");
        files.push(ctx.put_temp_file(&bytes, &name)?);
    }
    Ok(files)
}

/// Fetch the bytes behind a generated-image URL
async fn fetch(http: &Client, url_str: &str) -> TaskResult<Vec<u8>> {
    let url = Url::parse(url_str).map_err(|e| TaskError::Download {
        url: url_str.to_string(),
        message: e.to_string(),
    })?;

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| TaskError::Download {
            url: url_str.to_string(),
            message: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(TaskError::Download {
            url: url_str.to_string(),
            message: format!("HTTP status {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(|e| TaskError::Download {
        url: url_str.to_string(),
        message: e.to_string(),
    })?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InMemoryRunContext;

    fn image(url: Option<&str>, b64_json: Option<&str>) -> ImageData {
        ImageData {
            url: url.map(String::from),
            b64_json: b64_json.map(String::from),
            revised_prompt: None,
        }
    }

    #[tokio::test]
    async fn decodes_base64_payloads_to_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = InMemoryRunContext::new(dir.path());
        let http = Client::new();
        let payload = BASE64.encode(b"image bytes");

        let files = materialize(
            &ctx,
            &http,
            ImageResponseFormat::B64Json,
            &[image(None, Some(&payload)), image(None, Some(&payload))],
        )
        .await
        .unwrap();

        assert_eq!(files.len(), 2);
        assert_ne!(files[0].name, files[1].name);
        for file in &files {
            assert!(file.name.starts_with("openai-"));
            assert!(file.name.ends_with(".png"));
            assert_eq!(std::fs::read(&file.path).unwrap(), b"image bytes");
        }
    }

    #[tokio::test]
    async fn malformed_base64_fails_with_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = InMemoryRunContext::new(dir.path());
        let http = Client::new();

        let err = materialize(
            &ctx,
            &http,
            ImageResponseFormat::B64Json,
            &[image(None, Some("not base64!!!"))],
        )
        .await
        .unwrap_err();

        assert!(matches!(err, TaskError::Decode(_)));
    }

    #[tokio::test]
    async fn missing_payload_fails_with_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = InMemoryRunContext::new(dir.path());
        let http = Client::new();

        let err = materialize(&ctx, &http, ImageResponseFormat::B64Json, &[image(None, None)])
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::Decode(_)));
    }

    #[tokio::test]
    async fn unwritable_storage_fails_with_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        // Storage root sits below a regular file, so persisting must fail
        let ctx = InMemoryRunContext::new(blocker.join("inner"));
        let http = Client::new();
        let payload = BASE64.encode(b"image bytes");

        let err = materialize(
            &ctx,
            &http,
            ImageResponseFormat::B64Json,
            &[image(None, Some(&payload))],
        )
        .await
        .unwrap_err();

        assert!(matches!(err, TaskError::Storage(_)));
    }

    #[tokio::test]
    async fn invalid_url_fails_with_download_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = InMemoryRunContext::new(dir.path());
        let http = Client::new();

        let err = materialize(
            &ctx,
            &http,
            ImageResponseFormat::Url,
            &[image(Some("not a url"), None)],
        )
        .await
        .unwrap_err();

        assert!(matches!(err, TaskError::Download { .. }));
    }
}
