//! Input resolution: turn a user-supplied path, URL or buffer into a
//! [`RawDocument`].
//!
//! The pipeline works on bytes, not paths: pdfium loads straight from the
//! buffer, so there is no temp file to manage. Every entry point runs the
//! same checks before a document is accepted: the `%PDF` signature and the
//! configured size ceiling.

use crate::error::Pdf2SlidesError;
use futures::StreamExt;
use std::path::PathBuf;
use tracing::{debug, info};

/// The source PDF of one run. Consumed by rasterisation.
#[derive(Clone)]
pub struct RawDocument {
    bytes: Vec<u8>,
    name: Option<String>,
}

impl RawDocument {
    /// Wrap an in-memory buffer without validation.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            name: None,
        }
    }

    /// Attach a display name (file name or URL) used in logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Check the PDF signature and the size ceiling.
    pub fn validate(&self, max_bytes: Option<usize>) -> Result<(), Pdf2SlidesError> {
        if let Some(limit) = max_bytes {
            if self.bytes.len() > limit {
                return Err(Pdf2SlidesError::DocumentTooLarge {
                    size: self.bytes.len(),
                    limit,
                });
            }
        }
        if !self.bytes.starts_with(b"%PDF") {
            let magic = self.bytes.iter().take(4).copied().collect();
            return Err(Pdf2SlidesError::NotAPdf { magic });
        }
        Ok(())
    }
}

impl std::fmt::Debug for RawDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawDocument")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load a document from a local path or an HTTP(S) URL and validate it.
pub async fn load_document(
    input: &str,
    max_bytes: Option<usize>,
    download_timeout_secs: u64,
) -> Result<RawDocument, Pdf2SlidesError> {
    if input.trim().is_empty() {
        return Err(Pdf2SlidesError::InvalidInput {
            input: input.to_string(),
        });
    }

    let document = if is_url(input) {
        download_url(input, max_bytes, download_timeout_secs).await?
    } else {
        read_local(input, max_bytes).await?
    };

    document.validate(max_bytes)?;
    Ok(document)
}

/// Read a local file into memory, checking its size before reading.
async fn read_local(
    path_str: &str,
    max_bytes: Option<usize>,
) -> Result<RawDocument, Pdf2SlidesError> {
    let path = PathBuf::from(path_str);
    let io_error = |e: std::io::Error| match e.kind() {
        std::io::ErrorKind::NotFound => Pdf2SlidesError::FileNotFound { path: path.clone() },
        std::io::ErrorKind::PermissionDenied => {
            Pdf2SlidesError::PermissionDenied { path: path.clone() }
        }
        _ => Pdf2SlidesError::Internal(format!("Failed to read '{}': {}", path.display(), e)),
    };

    if let Some(limit) = max_bytes {
        let metadata = tokio::fs::metadata(&path).await.map_err(io_error)?;
        let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if size > limit {
            return Err(Pdf2SlidesError::DocumentTooLarge { size, limit });
        }
    }

    let bytes = tokio::fs::read(&path).await.map_err(io_error)?;

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path_str.to_string());
    Ok(RawDocument::from_bytes(bytes).with_name(name))
}

/// Download a URL into memory, never buffering more than `max_bytes`.
async fn download_url(
    url: &str,
    max_bytes: Option<usize>,
    timeout_secs: u64,
) -> Result<RawDocument, Pdf2SlidesError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Pdf2SlidesError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Pdf2SlidesError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Pdf2SlidesError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Pdf2SlidesError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    if let (Some(limit), Some(declared)) = (max_bytes, response.content_length()) {
        let size = usize::try_from(declared).unwrap_or(usize::MAX);
        if size > limit {
            debug!("Rejecting {}: Content-Length {} over limit {}", url, declared, limit);
            return Err(Pdf2SlidesError::DocumentTooLarge { size, limit });
        }
    }

    let mut bytes = Vec::new();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| {
            if e.is_timeout() {
                Pdf2SlidesError::DownloadTimeout {
                    url: url.to_string(),
                    secs: timeout_secs,
                }
            } else {
                Pdf2SlidesError::DownloadFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        let size = bytes.len() + chunk.len();
        if let Some(limit) = max_bytes.filter(|&limit| size > limit) {
            debug!("Aborting download of {} after {} bytes", url, size);
            return Err(Pdf2SlidesError::DocumentTooLarge { size, limit });
        }
        bytes.extend_from_slice(&chunk);
    }

    info!("Downloaded {} bytes", bytes.len());
    Ok(RawDocument::from_bytes(bytes).with_name(url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const MIB: usize = 1024 * 1024;

    /// Serve one response of `body_len` bytes starting with `%PDF`, writing in
    /// 64 KiB chunks until the body is done or the client hangs up. Returns
    /// the URL and a counter of body bytes actually written.
    async fn serve_pdf(body_len: usize, declare_length: bool) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/big.pdf", listener.local_addr().unwrap());
        let sent = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&sent);

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;

            let mut head = String::from("HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\n");
            if declare_length {
                head.push_str(&format!("Content-Length: {body_len}\r\n"));
            }
            head.push_str("Connection: close\r\n\r\n");
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }

            let mut chunk = vec![b' '; 64 * 1024];
            chunk[..4].copy_from_slice(b"%PDF");
            while counter.load(Ordering::SeqCst) < body_len {
                if socket.write_all(&chunk).await.is_err() {
                    break;
                }
                counter.fetch_add(chunk.len(), Ordering::SeqCst);
                chunk[..4].copy_from_slice(b"    ");
            }
        });

        (url, sent)
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn validate_rejects_non_pdf() {
        let doc = RawDocument::from_bytes(b"GIF89a....".to_vec());
        match doc.validate(None) {
            Err(Pdf2SlidesError::NotAPdf { magic }) => assert_eq!(magic, b"GIF8".to_vec()),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_empty_buffer() {
        let doc = RawDocument::from_bytes(Vec::new());
        assert!(matches!(
            doc.validate(None),
            Err(Pdf2SlidesError::NotAPdf { .. })
        ));
    }

    #[test]
    fn validate_enforces_size_ceiling() {
        let mut bytes = b"%PDF-1.7\n".to_vec();
        bytes.resize(2048, b' ');
        let doc = RawDocument::from_bytes(bytes);
        assert!(doc.validate(Some(4096)).is_ok());
        assert!(matches!(
            doc.validate(Some(1024)),
            Err(Pdf2SlidesError::DocumentTooLarge { size: 2048, limit: 1024 })
        ));
        assert!(doc.validate(None).is_ok());
    }

    #[tokio::test]
    async fn load_missing_file() {
        let err = load_document("/definitely/not/here.pdf", None, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2SlidesError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn load_local_file_keeps_name() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"%PDF-1.4\n%%EOF\n").unwrap();
        let path = tmp.path().to_string_lossy().to_string();

        let doc = load_document(&path, Some(1024), 5).await.unwrap();
        assert_eq!(doc.len(), 15);
        assert!(doc.name().unwrap().ends_with(".pdf"));
    }

    #[tokio::test]
    async fn oversized_local_file_is_rejected() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"%PDF-1.4\n").unwrap();
        tmp.write_all(&[b' '; 4096]).unwrap();
        let path = tmp.path().to_string_lossy().to_string();

        let err = load_document(&path, Some(1024), 5).await.unwrap_err();
        assert!(matches!(
            err,
            Pdf2SlidesError::DocumentTooLarge { size: 4105, limit: 1024 }
        ));
    }

    #[test]
    fn load_rejects_blank_input() {
        let err = tokio_test::block_on(load_document("   ", None, 5)).unwrap_err();
        assert!(matches!(err, Pdf2SlidesError::InvalidInput { .. }));
    }

    #[test]
    fn load_rejects_local_non_pdf() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"<html></html>").unwrap();
        let path = tmp.path().to_string_lossy().to_string();

        let err = tokio_test::block_on(load_document(&path, None, 5)).unwrap_err();
        assert!(matches!(err, Pdf2SlidesError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn oversized_download_is_rejected_from_content_length() {
        let (url, sent) = serve_pdf(64 * MIB, true).await;

        let err = load_document(&url, Some(10 * MIB), 30).await.unwrap_err();

        assert!(matches!(
            err,
            Pdf2SlidesError::DocumentTooLarge { size, limit }
                if size == 64 * MIB && limit == 10 * MIB
        ));
        assert!(
            sent.load(Ordering::SeqCst) < 64 * MIB,
            "whole body was sent before rejection"
        );
    }

    #[tokio::test]
    async fn oversized_download_without_length_stops_at_the_limit() {
        let (url, sent) = serve_pdf(64 * MIB, false).await;

        let err = load_document(&url, Some(MIB), 30).await.unwrap_err();

        match err {
            Pdf2SlidesError::DocumentTooLarge { size, limit } => {
                assert_eq!(limit, MIB);
                assert!(size > MIB && size < 2 * MIB, "read {size} bytes");
            }
            other => panic!("expected DocumentTooLarge, got {other:?}"),
        }
        assert!(
            sent.load(Ordering::SeqCst) < 64 * MIB,
            "whole body was sent before rejection"
        );
    }

    #[tokio::test]
    async fn download_within_limit_is_loaded() {
        let (url, _) = serve_pdf(256 * 1024, true).await;

        let doc = load_document(&url, Some(MIB), 30).await.unwrap();

        assert_eq!(doc.len(), 256 * 1024);
        assert!(doc.bytes().starts_with(b"%PDF"));
        assert_eq!(doc.name(), Some(url.as_str()));
    }
}
