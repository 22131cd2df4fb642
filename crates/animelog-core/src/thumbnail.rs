//! Best-effort thumbnail download into the vault.

use std::future::Future;

use animelog_api::Skipped;

use crate::error::AnimelogError;
use crate::notify::Notifier;
use crate::vault::{normalize_path, Entry, Vault};

/// Downloads image bytes.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, AnimelogError>> + Send;
}

/// [`ImageFetcher`] over plain HTTP GET.
#[derive(Debug, Clone, Default)]
pub struct HttpImageFetcher {
    http: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AnimelogError> {
        let bytes = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

/// File extension from the last path segment of `url`, defaulting to `jpg`.
pub fn extension_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            let segment = u.path_segments()?.next_back()?.to_string();
            let (_, ext) = segment.rsplit_once('.')?;
            (!ext.is_empty()).then(|| ext.to_string())
        })
        .unwrap_or_else(|| "jpg".to_string())
}

/// Vault path of the thumbnail for `anime_id`.
pub fn thumbnail_path(attachments_dir: &str, anime_id: u64, url: &str) -> String {
    normalize_path(&format!(
        "{attachments_dir}/{anime_id}_thumbnail.{}",
        extension_from_url(url)
    ))
}

/// Identifier encoded in a thumbnail file name, if it is one.
pub fn thumbnail_id(path: &str) -> Option<u64> {
    let name = path.rsplit('/').next()?;
    let (id, rest) = name.split_once('_')?;
    if !rest.starts_with("thumbnail.") {
        return None;
    }
    id.parse().ok()
}

/// Store the thumbnail for `anime_id` under `attachments_dir`.
///
/// An existing file at the computed path is returned as is, without a network
/// call. Download or write failures are logged, surfaced as a notice and
/// returned as [`Skipped`].
pub async fn acquire_thumbnail<V, F, N>(
    vault: &V,
    fetcher: &F,
    notifier: &N,
    attachments_dir: &str,
    anime_id: u64,
    url: &str,
) -> Result<String, Skipped>
where
    V: Vault,
    F: ImageFetcher,
    N: Notifier,
{
    let path = thumbnail_path(attachments_dir, anime_id, url);

    let result = store_thumbnail(vault, fetcher, attachments_dir, &path, url).await;
    match result {
        Ok(()) => Ok(path),
        Err(e) => {
            tracing::warn!(anime_id, url, error = %e, "Failed to save thumbnail");
            notifier.notice("Failed to download thumbnail.");
            Err(Skipped::new(e.to_string()))
        }
    }
}

async fn store_thumbnail<V: Vault, F: ImageFetcher>(
    vault: &V,
    fetcher: &F,
    attachments_dir: &str,
    path: &str,
    url: &str,
) -> Result<(), AnimelogError> {
    vault.ensure_dir(attachments_dir).await?;
    if vault.entry(path).await? != Entry::NotFound {
        return Ok(());
    }
    let bytes = fetcher.fetch(url).await?;
    vault.create_binary(path, &bytes).await?;
    tracing::debug!(path, "Saved thumbnail");
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::vault::MemoryVault;

    /// Fetcher that counts calls and optionally fails.
    #[derive(Debug, Default)]
    pub struct CountingFetcher {
        pub calls: AtomicUsize,
        pub fail: bool,
    }

    impl CountingFetcher {
        pub fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ImageFetcher for CountingFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, AnimelogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AnimelogError::Io(std::io::Error::other("offline")))
            } else {
                Ok(vec![0xff, 0xd8, 0xff])
            }
        }
    }

    const URL: &str = "https://cdn.myanimelist.net/images/anime/1208/94745l.jpg";

    #[test]
    fn test_extension_from_url() {
        assert_eq!(extension_from_url(URL), "jpg");
        assert_eq!(extension_from_url("https://cdn/x/cover.webp?s=1"), "webp");
        assert_eq!(extension_from_url("https://cdn/x/cover"), "jpg");
        assert_eq!(extension_from_url("not a url"), "jpg");
    }

    #[test]
    fn test_thumbnail_id() {
        assert_eq!(thumbnail_id("attachments/anime/5114_thumbnail.jpg"), Some(5114));
        assert_eq!(thumbnail_id("attachments/anime/5114_cover.jpg"), None);
        assert_eq!(thumbnail_id("attachments/anime/notes.txt"), None);
    }

    #[tokio::test]
    async fn test_downloads_once() {
        let vault = MemoryVault::new();
        let fetcher = CountingFetcher::default();
        let notifier = RecordingNotifier::default();

        let path = acquire_thumbnail(&vault, &fetcher, &notifier, "attachments/anime", 5114, URL)
            .await
            .unwrap();
        assert_eq!(path, "attachments/anime/5114_thumbnail.jpg");
        assert!(vault.contains(&path));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_existing_asset_makes_no_network_call() {
        let vault = MemoryVault::new();
        vault.insert_binary("attachments/anime/5114_thumbnail.jpg", b"old");
        let fetcher = CountingFetcher::default();
        let notifier = RecordingNotifier::default();

        let path = acquire_thumbnail(&vault, &fetcher, &notifier, "attachments/anime", 5114, URL)
            .await
            .unwrap();
        assert_eq!(path, "attachments/anime/5114_thumbnail.jpg");
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(vault.binary_writes(), 0);
    }

    #[tokio::test]
    async fn test_failure_is_skipped_with_notice() {
        let vault = MemoryVault::new();
        let fetcher = CountingFetcher::failing();
        let notifier = RecordingNotifier::default();

        let result =
            acquire_thumbnail(&vault, &fetcher, &notifier, "attachments/anime", 5114, URL).await;
        assert!(result.is_err());
        assert_eq!(notifier.notices(), vec!["Failed to download thumbnail."]);
        assert!(!vault.contains("attachments/anime/5114_thumbnail.jpg"));
    }
}
