// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/frame.rs
//
// Frame asset loaded once in the background and shared by every render.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};

use crate::domain::FrameAsset;
use crate::error::FrameLoadError;

type FrameFuture = Shared<BoxFuture<'static, Result<Arc<FrameAsset>, FrameLoadError>>>;

/// Cloneable handle to the frame load started at startup.
///
/// Awaiting it never blocks upload or cropping; only the compositing step
/// waits on it.
#[derive(Clone)]
pub struct FrameHandle {
    inner: FrameFuture,
}

impl FrameHandle {
    /// Start loading the frame from `path` on the blocking pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(path: PathBuf) -> Self {
        log::debug!("Loading frame from {}", path.display());
        let task = tokio::task::spawn_blocking(move || FrameAsset::open(&path));
        Self::from_future(async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(FrameLoadError::Decode(format!("frame loader task failed: {e}"))),
            }
        })
    }

    /// Wrap any future that eventually yields the frame.
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<FrameAsset, FrameLoadError>> + Send + 'static,
    {
        let inner = async move {
            let result = future.await.map(Arc::new);
            if let Err(e) = &result {
                // Runs once per handle family, not once per await.
                log::warn!("{e}; framing with a plain outline instead");
            }
            result
        }
        .boxed()
        .shared();
        Self { inner }
    }

    /// A frame that is already available.
    pub fn ready_with(frame: FrameAsset) -> Self {
        Self::from_future(std::future::ready(Ok(frame)))
    }

    /// No frame at all; every composite uses the outline fallback.
    pub fn unavailable() -> Self {
        Self::from_future(std::future::ready(Err(FrameLoadError::Missing(
            "no frame configured".to_string(),
        ))))
    }

    /// Wait for the load to finish and return the outcome.
    pub async fn status(&self) -> Result<Arc<FrameAsset>, FrameLoadError> {
        self.inner.clone().await
    }

    /// Wait for the load to finish; `None` means draw the fallback ring.
    pub async fn ready(&self) -> Option<Arc<FrameAsset>> {
        self.status().await.ok()
    }

    /// The frame if loading already finished, without waiting.
    pub fn peek(&self) -> Option<Result<Arc<FrameAsset>, FrameLoadError>> {
        self.inner.peek().cloned()
    }
}

impl std::fmt::Debug for FrameHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.inner.peek() {
            None => "pending",
            Some(Ok(_)) => "loaded",
            Some(Err(_)) => "failed",
        };
        write!(f, "FrameHandle({state})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbaImage};
    use tokio::sync::oneshot;

    fn tiny_frame() -> FrameAsset {
        FrameAsset::from_image(DynamicImage::ImageRgba8(RgbaImage::new(4, 4)))
    }

    #[tokio::test]
    async fn test_ready_frame_is_shared() {
        let handle = FrameHandle::ready_with(tiny_frame());
        let a = handle.ready().await.unwrap();
        let b = handle.clone().ready().await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_missing_file_degrades_to_none() {
        let handle = FrameHandle::spawn(PathBuf::from("no/such/frame.png"));
        assert!(handle.ready().await.is_none());
        assert!(matches!(handle.status().await, Err(FrameLoadError::Missing(_))));
    }

    #[tokio::test]
    async fn test_pending_until_resolved() {
        let (tx, rx) = oneshot::channel::<FrameAsset>();
        let handle = FrameHandle::from_future(async move {
            rx.await
                .map_err(|_| FrameLoadError::Missing("sender dropped".into()))
        });
        assert!(handle.peek().is_none());

        let waiter = tokio::spawn({
            let handle = handle.clone();
            async move { handle.ready().await.is_some() }
        });
        tx.send(tiny_frame()).unwrap();
        assert!(waiter.await.unwrap());
        assert!(matches!(handle.peek(), Some(Ok(_))));
    }
}
