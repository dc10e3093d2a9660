//! # Image Cache
//!
//! Maps an image source to one shared load. The first request for a
//! source starts the loader; every later request for the same source,
//! pending or finished, gets the same future back. A renderer that finds
//! the load pending shows a placeholder and asks again once the future
//! resolves.
//!
//! The handle is cheap to clone; clones share one cache.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to load image {src}: {reason}")]
pub struct ImageLoadError {
    pub src: String,
    pub reason: String,
}

pub type ImageResult = Result<ImageSize, ImageLoadError>;
pub type ImageFuture = Shared<BoxFuture<'static, ImageResult>>;
type Loader = Arc<dyn Fn(String) -> BoxFuture<'static, ImageResult> + Send + Sync>;

/// What a renderer can know about a source without waiting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageStatus {
    Pending,
    Ready(ImageSize),
    Failed(ImageLoadError),
}

#[derive(Clone)]
pub struct ImageCache {
    entries: Arc<Mutex<HashMap<String, ImageFuture>>>,
    loader: Loader,
}

impl ImageCache {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn(String) -> BoxFuture<'static, ImageResult> + Send + Sync + 'static,
    {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            loader: Arc::new(loader),
        }
    }

    /// The shared load for `src`, started on first request
    pub fn load(&self, src: &str) -> ImageFuture {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(src) {
            return existing.clone();
        }
        debug!(src, "start image load");
        let future = (self.loader)(src.to_string()).shared();
        entries.insert(src.to_string(), future.clone());
        future
    }

    /// Wait for `src` to load
    pub async fn get(&self, src: &str) -> ImageResult {
        self.load(src).await
    }

    /// Status of a source already requested; `None` if it never was
    pub fn status(&self, src: &str) -> Option<ImageStatus> {
        let entries = self.entries.lock();
        let future = entries.get(src)?;
        Some(match future.peek() {
            None => ImageStatus::Pending,
            Some(Ok(size)) => ImageStatus::Ready(*size),
            Some(Err(err)) => ImageStatus::Failed(err.clone()),
        })
    }

    /// Forget `src` so the next request loads it again
    pub fn evict(&self, src: &str) -> bool {
        self.entries.lock().remove(src).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCache")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_cache(calls: Arc<AtomicUsize>) -> ImageCache {
        ImageCache::new(move |src: String| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::task::yield_now().await;
                if src.ends_with(".png") {
                    Ok(ImageSize {
                        width: 640,
                        height: 480,
                    })
                } else {
                    Err(ImageLoadError {
                        src,
                        reason: "unsupported".to_string(),
                    })
                }
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = counting_cache(Arc::clone(&calls));

        let other = cache.clone();
        let (a, b) = tokio::join!(cache.get("a.png"), other.get("a.png"));
        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_status_follows_the_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = counting_cache(calls);

        assert_eq!(cache.status("a.png"), None);
        let pending = cache.load("a.png");
        assert_eq!(cache.status("a.png"), Some(ImageStatus::Pending));
        pending.await.unwrap();
        assert_eq!(
            cache.status("a.png"),
            Some(ImageStatus::Ready(ImageSize {
                width: 640,
                height: 480
            }))
        );
    }

    #[tokio::test]
    async fn test_failures_are_cached_until_evicted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = counting_cache(Arc::clone(&calls));

        assert!(cache.get("broken.gif").await.is_err());
        assert!(matches!(cache.status("broken.gif"), Some(ImageStatus::Failed(_))));
        assert!(cache.get("broken.gif").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(cache.evict("broken.gif"));
        assert!(cache.get("broken.gif").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
