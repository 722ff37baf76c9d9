// kdebug-net/src/fetch.rs
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use kdebug_common::error::{KdebugError, Result};
use kdebug_common::release::{BinaryArtifact, HelperRelease, Platform};
use reqwest::Client;
use tokio::fs::File as TokioFile;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::checksum::verify_checksum;

const DOWNLOAD_TIMEOUT_SECS: u64 = 300;
const CONNECT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT_STRING: &str = "kdebug (Rust; +https://github.com/kdebug-io/kdebug)";

// The binary cache directory is shared across invocations; serialize
// fetch attempts so concurrent verify/delete/download cannot race.
static FETCH_LOCK: Mutex<()> = Mutex::const_new(());

/// Returns the path to a verified, executable helper binary, downloading
/// it first if the cache has no valid copy. `consent` is asked exactly
/// once, before any network traffic.
///
/// Idempotent: with a valid cached binary this costs one hash computation
/// and no network I/O.
pub async fn ensure_helper(
    release: &HelperRelease,
    platform: Platform,
    install_root: &Path,
    consent: impl FnOnce() -> bool,
) -> Result<PathBuf> {
    let artifact = release.artifact(platform, install_root);
    let _guard = FETCH_LOCK.lock().await;
    ensure_artifact(&artifact, consent, |url, dest| async move {
        download_to_path(&url, &dest).await
    })
    .await
}

/// Acquisition flow with the download step injected, so the verification
/// and self-healing logic is testable without a network.
async fn ensure_artifact<C, D, Fut>(artifact: &BinaryArtifact, consent: C, download: D) -> Result<PathBuf>
where
    C: FnOnce() -> bool,
    D: FnOnce(String, PathBuf) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let path = &artifact.local_path;

    if path.is_file() {
        match verify_checksum(path, &artifact.expected_checksum) {
            Ok(()) => {
                debug!("Using cached helper binary: {}", path.display());
                set_executable(path)?;
                return Ok(path.clone());
            }
            Err(e) => {
                // A binary with the wrong checksum must never be executed.
                warn!(
                    "Cached helper binary failed verification ({}): {}. Removing.",
                    path.display(),
                    e
                );
                fs::remove_file(path)?;
            }
        }
    }

    if !consent() {
        return Err(KdebugError::Download(
            artifact.name(),
            artifact.url.clone(),
            "download declined".to_string(),
        ));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    validate_url(&artifact.url)?;
    debug!("Downloading helper binary from {}", artifact.url);
    download(artifact.url.clone(), path.clone()).await?;

    // Second verification failure is fatal; retrying against a corrupted
    // or tampered release would loop forever.
    if let Err(e) = verify_checksum(path, &artifact.expected_checksum) {
        let _ = fs::remove_file(path);
        return Err(KdebugError::Integrity(format!(
            "downloaded helper binary failed verification; the release may be corrupted: {e}"
        )));
    }
    set_executable(path)?;
    Ok(path.clone())
}

fn validate_url(url_str: &str) -> Result<()> {
    let url = Url::parse(url_str)
        .map_err(|e| KdebugError::Config(format!("Failed to parse URL '{url_str}': {e}")))?;
    if url.scheme() == "https" {
        Ok(())
    } else {
        Err(KdebugError::Config(format!(
            "Invalid URL scheme for '{}': Must be https, but got '{}'",
            url_str,
            url.scheme()
        )))
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

fn build_http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .user_agent(USER_AGENT_STRING)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| KdebugError::Config(format!("Failed to build HTTP client: {e}")))
}

async fn download_to_path(url: &str, final_path: &Path) -> Result<()> {
    let temp_filename = format!(
        ".{}.download",
        final_path.file_name().unwrap_or_default().to_string_lossy()
    );
    let temp_path = final_path.with_file_name(temp_filename);
    if temp_path.exists() {
        if let Err(e) = fs::remove_file(&temp_path) {
            warn!(
                "Could not remove existing temporary file {}: {}",
                temp_path.display(),
                e
            );
        }
    }

    let client = build_http_client()?;
    let response = client.get(url).send().await?;
    let status = response.status();
    debug!("Received HTTP status {} for {}", status, url);
    if !status.is_success() {
        return Err(KdebugError::Download(
            final_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            url.to_string(),
            format!("HTTP error {status}"),
        ));
    }

    let mut temp_file = TokioFile::create(&temp_path).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            KdebugError::Download(
                final_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                url.to_string(),
                format!("stream failed: {e}"),
            )
        })?;
        temp_file.write_all(&chunk).await?;
    }
    temp_file.flush().await?;
    drop(temp_file);

    fs::rename(&temp_path, final_path)?;
    debug!("Moved download to final location: {}", final_path.display());
    Ok(())
}
