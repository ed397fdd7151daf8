use std::future::Future;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::error;

#[derive(Debug, Clone, PartialEq)]
pub struct CachedToken {
    pub token: String,
    /// Unix timestamp in seconds.
    pub expires_at: i64,
}

/// Bearer token shared by all requests of one API client.
///
/// The lock is held while a new token is fetched, so concurrent callers wait
/// for a single refresh instead of each logging in.
#[derive(Debug, Default)]
pub struct TokenCache {
    inner: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    /// Tokens with less validity left than this are refreshed.
    pub const REFRESH_MARGIN_SECS: i64 = 60;

    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get<F, Fut>(&self, fetch: F) -> error::Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = error::Result<CachedToken>>,
    {
        self.get_at(Utc::now().timestamp(), fetch).await
    }

    pub async fn get_at<F, Fut>(&self, now: i64, fetch: F) -> error::Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = error::Result<CachedToken>>,
    {
        let mut cached = self.inner.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at - now > Self::REFRESH_MARGIN_SECS {
                return Ok(token.token.clone());
            }
        }

        let fresh = fetch().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    pub async fn invalidate(&self) {
        *self.inner.lock().await = None;
    }
}
