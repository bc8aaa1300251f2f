//! Fire-and-forget progress delivery.
//!
//! A progress callback can never change the outcome of an orchestration run:
//! errors, panics and timeouts are logged and dropped here.

use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use log::{debug, warn};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

// Milestones
pub const STARTED: f64 = 0.0;
pub const ANALYSIS_STARTED: f64 = 0.1;
pub const TEMPLATE_RESOLVED: f64 = 0.2;
pub const SECTIONS_EXTRACTED: f64 = 0.4;
pub const LLM_COMPLETED: f64 = 0.8;
pub const COMPLETED: f64 = 1.0;

pub type SyncProgressFn = dyn Fn(f64, &str) -> Result<()> + Send + Sync;
pub type AsyncProgressFn = dyn Fn(f64, String) -> BoxFuture<'static, Result<()>> + Send + Sync;

/// Receives `(progress in [0, 1], message)`.
#[derive(Clone)]
pub enum ProgressCallback {
    Sync(Arc<SyncProgressFn>),
    Async(Arc<AsyncProgressFn>),
}

impl ProgressCallback {
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(f64, &str) -> Result<()> + Send + Sync + 'static,
    {
        ProgressCallback::Sync(Arc::new(f))
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(f64, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        ProgressCallback::Async(Arc::new(move |progress, message| {
            f(progress, message).boxed()
        }))
    }
}

impl fmt::Debug for ProgressCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressCallback::Sync(_) => write!(f, "ProgressCallback::Sync"),
            ProgressCallback::Async(_) => write!(f, "ProgressCallback::Async"),
        }
    }
}

pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    timeout: Duration,
    last: f64,
}

impl ProgressReporter {
    pub fn new(callback: Option<ProgressCallback>, timeout: Duration) -> Self {
        Self {
            callback,
            timeout,
            last: STARTED,
        }
    }

    pub fn last_reported(&self) -> f64 {
        self.last
    }

    pub async fn report(&mut self, progress: f64, message: &str) {
        let progress = progress.clamp(0.0, 1.0);
        self.last = progress;
        debug!("Progress {:.0}%: {}", progress * 100.0, message);

        let Some(callback) = &self.callback else {
            return;
        };

        match callback {
            ProgressCallback::Sync(f) => {
                let f = Arc::clone(f);
                let message = message.to_string();
                // Run off the async workers so a slow callback can be abandoned.
                let handle = tokio::task::spawn_blocking(move || f(progress, &message));
                match tokio::time::timeout(self.timeout, handle).await {
                    Ok(Ok(Ok(()))) => {}
                    Ok(Ok(Err(e))) => warn!("Progress callback failed: {:#}", e),
                    Ok(Err(e)) => warn!("Progress callback panicked: {}", e),
                    Err(_) => warn!(
                        "Progress callback did not return within {:?}, continuing",
                        self.timeout
                    ),
                }
            }
            ProgressCallback::Async(f) => {
                let future = match std::panic::catch_unwind(AssertUnwindSafe(|| {
                    f(progress, message.to_string())
                })) {
                    Ok(future) => future,
                    Err(_) => {
                        warn!("Progress callback panicked");
                        return;
                    }
                };
                match tokio::time::timeout(self.timeout, AssertUnwindSafe(future).catch_unwind())
                    .await
                {
                    Ok(Ok(Ok(()))) => {}
                    Ok(Ok(Err(e))) => warn!("Progress callback failed: {:#}", e),
                    Ok(Err(_)) => warn!("Progress callback panicked"),
                    Err(_) => warn!(
                        "Progress callback did not return within {:?}, continuing",
                        self.timeout
                    ),
                }
            }
        }
    }
}
