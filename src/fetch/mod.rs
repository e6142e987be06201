// src/fetch/mod.rs
use crate::error::{HexError, Result};
use futures_util::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};
use tracing::info;
use url::Url;

/// True when `location` is an http(s) URL rather than a local path.
pub fn is_remote(location: &str) -> bool {
    Url::parse(location)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Download `url` to `dest`, streaming the body to disk.
///
/// The body lands in a `.part` file that is renamed into place only once
/// complete, so an interrupted download never looks like a cached artifact.
pub async fn download_file(client: &Client, url: &str, dest: impl AsRef<Path>) -> Result<PathBuf> {
    let dest = dest.as_ref().to_path_buf();
    let fail = |reason: String| HexError::DownloadFailure {
        url: url.to_string(),
        reason,
    };

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }

    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| fail(e.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(fail(format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )));
    }

    let part = dest.with_extension("part");
    let mut file = fs::File::create(&part).await?;
    let mut stream = resp.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| fail(e.to_string()))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);
    fs::rename(&part, &dest).await?;

    info!(url, bytes = written, path = %dest.display(), "downloaded");
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/broadband.duckdb"));
        assert!(is_remote("http://10.0.0.2:9000/db"));
        assert!(!is_remote("./data/broadband.duckdb"));
        assert!(!is_remote("/srv/broadband.duckdb"));
        assert!(!is_remote("file:///srv/broadband.duckdb"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_download_failure() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("db.duckdb");
        // port 9 (discard) is not expected to be listening locally
        let err = download_file(&Client::new(), "http://127.0.0.1:9/broadband.duckdb", &dest)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "download_failure");
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }

    #[tokio::test]
    async fn test_malformed_url_is_download_failure() {
        let dir = tempdir().unwrap();
        let err = download_file(&Client::new(), "http://", dir.path().join("x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "download_failure");
    }
}
