//! HTTP client wrapper for downloading product files.
//!
//! This module provides the `HttpClient` struct which streams a response body
//! to disk, verifies its size and moves it into place.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::error::DownloadError;
use crate::http::{HttpTimeouts, build_http_client};

/// Suffix of the temporary file a download streams into.
const PARTIAL_SUFFIX: &str = ".part";

/// HTTP client for downloading files with streaming support.
///
/// This client is designed to be created once and reused for every job of a
/// run, taking advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use planetary_fetch::HttpTimeouts;
/// use planetary_fetch::download::HttpClient;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(HttpTimeouts::default())?;
/// let result = client
///     .download_to_path("https://pds.example/a.img", Path::new("./data/a.img"), None)
///     .await?;
/// println!("Downloaded {} bytes", result.bytes_downloaded);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

/// Result of a completed download.
#[derive(Debug, Clone)]
pub struct DownloadFileResult {
    /// Final output path.
    pub path: PathBuf,
    /// Size of the file written.
    pub bytes_downloaded: u64,
}

impl HttpClient {
    /// Creates a new HTTP client with the given timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] if the underlying client cannot be built.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, DownloadError> {
        let client = build_http_client(timeouts).map_err(|reason| DownloadError::Client { reason })?;
        Ok(Self { client })
    }

    /// Downloads `url` to `destination`.
    ///
    /// The body is streamed into `<destination>.part`; once complete and
    /// verified, it replaces `destination`. On any error the partial file is
    /// removed and an existing `destination` is left untouched.
    ///
    /// The expected size is `expected_size` when given (catalog-reported),
    /// otherwise the response `Content-Length`, when present.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (4xx, 5xx)
    /// - Writing to disk fails
    /// - The downloaded size differs from the expected size
    #[instrument(skip(self, destination), fields(url = %url, path = %destination.display()))]
    pub async fn download_to_path(
        &self,
        url: &str,
        destination: &Path,
        expected_size: Option<u64>,
    ) -> Result<DownloadFileResult, DownloadError> {
        debug!("starting download");

        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::request(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent, e))?;
        }

        let partial_path = partial_path_for(destination);
        let mut file = File::create(&partial_path)
            .await
            .map_err(|e| DownloadError::io(partial_path.clone(), e))?;

        let stream_result = stream_to_file(&mut file, response, url, &partial_path).await;
        drop(file);

        let bytes_written = match stream_result {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %partial_path.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(&partial_path).await;
                return Err(e);
            }
        };

        if let Some(expected) = expected_size.or(content_length)
            && expected != bytes_written
        {
            let _ = tokio::fs::remove_file(&partial_path).await;
            return Err(DownloadError::integrity(
                destination,
                expected,
                bytes_written,
            ));
        }

        replace_file(&partial_path, destination).await?;

        debug!(bytes = bytes_written, "download complete");

        Ok(DownloadFileResult {
            path: destination.to_path_buf(),
            bytes_downloaded: bytes_written,
        })
    }
}

/// Returns `<destination>.part`.
fn partial_path_for(destination: &Path) -> PathBuf {
    let mut name: OsString = destination
        .file_name()
        .map(ToOwned::to_owned)
        .unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    destination.with_file_name(name)
}

/// Moves the finished partial file over the destination.
async fn replace_file(partial_path: &Path, destination: &Path) -> Result<(), DownloadError> {
    // rename() does not replace an existing file on every platform.
    if tokio::fs::try_exists(destination).await.unwrap_or(false) {
        tokio::fs::remove_file(destination)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;
    }
    if let Err(e) = tokio::fs::rename(partial_path, destination).await {
        let _ = tokio::fs::remove_file(partial_path).await;
        return Err(DownloadError::io(destination, e));
    }
    Ok(())
}

/// Streams response body to file, returning bytes written.
///
/// This is extracted to enable cleanup on error in the caller.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::request(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> HttpClient {
        HttpClient::new(HttpTimeouts::default()).unwrap()
    }

    fn short_timeouts() -> HttpTimeouts {
        HttpTimeouts {
            connect_secs: 1,
            read_secs: 1,
        }
    }

    /// Serves one response whose body arrives a byte at a time, `gap` apart.
    async fn spawn_trickle_server(body: &'static [u8], gap: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0_u8; 2048];
            let _ = socket.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            for byte in body {
                tokio::time::sleep(gap).await;
                socket.write_all(std::slice::from_ref(byte)).await.unwrap();
                socket.flush().await.unwrap();
            }
        });
        format!("http://{addr}/trickle.img")
    }

    #[tokio::test]
    async fn test_download_writes_destination() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.img"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"IMG content"))
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("A.IMG");
        let url = format!("{}/a.img", mock_server.uri());

        let result = client().download_to_path(&url, &destination, None).await;

        assert!(result.is_ok(), "Expected Ok, got: {result:?}");
        let result = result.unwrap();
        assert_eq!(result.path, destination);
        assert_eq!(result.bytes_downloaded, 11);
        assert_eq!(std::fs::read(&destination).unwrap(), b"IMG content");
        assert!(!partial_path_for(&destination).exists());
    }

    #[tokio::test]
    async fn test_download_creates_parent_directories() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x"))
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("HRLCA").join("DATA").join("x.img");
        let url = format!("{}/x.img", mock_server.uri());

        client()
            .download_to_path(&url, &destination, None)
            .await
            .unwrap();
        assert!(destination.exists());
    }

    #[tokio::test]
    async fn test_download_404_error_leaves_nothing_behind() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.img"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("missing.img");
        let url = format!("{}/missing.img", mock_server.uri());

        let result = client().download_to_path(&url, &destination, None).await;

        match result {
            Err(DownloadError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected HttpStatus error, got: {other:?}"),
        }
        assert!(!destination.exists());
        assert!(!partial_path_for(&destination).exists());
    }

    #[tokio::test]
    async fn test_download_size_mismatch_is_integrity_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"short"))
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("a.img");
        let url = format!("{}/a.img", mock_server.uri());

        let result = client().download_to_path(&url, &destination, Some(100)).await;

        match result {
            Err(DownloadError::Integrity {
                expected_bytes,
                actual_bytes,
                ..
            }) => {
                assert_eq!(expected_bytes, 100);
                assert_eq!(actual_bytes, 5);
            }
            other => panic!("Expected Integrity error, got: {other:?}"),
        }
        assert!(!destination.exists());
        assert!(!partial_path_for(&destination).exists());
    }

    #[tokio::test]
    async fn test_download_overwrites_existing_file() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new"))
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("a.lbl");
        std::fs::write(&destination, b"old content").unwrap();
        let url = format!("{}/a.lbl", mock_server.uri());

        client()
            .download_to_path(&url, &destination, Some(3))
            .await
            .unwrap();
        assert_eq!(std::fs::read(&destination).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_failed_download_keeps_existing_file() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("a.lbl");
        std::fs::write(&destination, b"old content").unwrap();
        let url = format!("{}/a.lbl", mock_server.uri());

        let result = client().download_to_path(&url, &destination, None).await;
        assert!(result.is_err());
        assert_eq!(std::fs::read(&destination).unwrap(), b"old content");
    }

    #[tokio::test]
    async fn test_download_invalid_url() {
        let temp_dir = TempDir::new().unwrap();
        let result = client()
            .download_to_path("not-a-valid-url", &temp_dir.path().join("x"), None)
            .await;
        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_download_read_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("slow.img");
        let url = format!("{}/slow.img", mock_server.uri());
        let client = HttpClient::new(short_timeouts()).unwrap();

        let result = client.download_to_path(&url, &destination, None).await;
        assert!(
            matches!(
                result,
                Err(DownloadError::Timeout { .. } | DownloadError::Network { .. })
            ),
            "Expected a timeout failure, got: {result:?}"
        );
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_slow_stream_outlasting_read_timeout_completes() {
        // Total transfer takes ~2.8s, every gap stays under the 1s read timeout.
        let url = spawn_trickle_server(b"TRICKLE", Duration::from_millis(400)).await;
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("trickle.img");
        let client = HttpClient::new(short_timeouts()).unwrap();

        let result = client.download_to_path(&url, &destination, None).await;

        assert!(result.is_ok(), "Expected Ok, got: {result:?}");
        assert_eq!(result.unwrap().bytes_downloaded, 7);
        assert_eq!(std::fs::read(&destination).unwrap(), b"TRICKLE");
    }

    #[test]
    fn test_partial_path_appends_suffix() {
        assert_eq!(
            partial_path_for(Path::new("/out/A.IMG")),
            PathBuf::from("/out/A.IMG.part")
        );
    }
}
