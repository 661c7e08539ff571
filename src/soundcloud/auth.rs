use chrono::{DateTime, Utc};
use reqwest::Client;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    utils,
};

/// The opaque credential every api-v2 call carries as `client_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub obtained_at: DateTime<Utc>,
}

/// Obtains and caches the SoundCloud client id.
///
/// SoundCloud has no public token endpoint for anonymous clients; the id is
/// embedded in one of the JavaScript bundles referenced by the landing page.
/// The provider scrapes it on first use and keeps it until a caller reports
/// that the upstream rejected it. There is no expiry timer: refresh is purely
/// reactive.
///
/// A fixed client id (see [`crate::config::soundcloud_client_id`]) bypasses
/// scraping entirely.
pub struct CredentialProvider {
    http: Client,
    web_url: String,
    fixed: Option<String>,
    token: RwLock<Option<AccessToken>>,
    refresh: Mutex<()>,
}

impl CredentialProvider {
    pub fn new(http: Client, web_url: impl Into<String>, fixed: Option<String>) -> Self {
        Self {
            http,
            web_url: web_url.into(),
            fixed,
            token: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Returns the cached token, fetching one if none is held.
    ///
    /// Concurrent callers that find the cache empty wait for a single scrape
    /// instead of each scanning the bundles.
    ///
    /// # Errors
    ///
    /// [`Error::CredentialUnavailable`] when the landing page cannot be loaded
    /// or none of its scripts contains a client id.
    pub async fn get_token(&self) -> Result<AccessToken> {
        if let Some(token) = self.current().await {
            return Ok(token);
        }

        let _guard = self.refresh.lock().await;
        if let Some(token) = self.current().await {
            return Ok(token);
        }

        let value = match &self.fixed {
            Some(id) => id.clone(),
            None => self.scrape().await?,
        };
        let token = AccessToken {
            value,
            obtained_at: Utc::now(),
        };
        *self.token.write().await = Some(token.clone());
        info!("obtained SoundCloud client id");
        Ok(token)
    }

    /// Drops the cached token so the next [`get_token`](Self::get_token)
    /// fetches a fresh one.
    pub async fn invalidate(&self) {
        if self.fixed.is_some() {
            return;
        }
        *self.token.write().await = None;
    }

    /// Drops the cached token only if it is still `stale`. Called when
    /// SoundCloud rejects `stale` with a 401.
    ///
    /// Returns whether the token was cleared. A request that failed with an old
    /// token must not throw away a token another request already refreshed.
    /// A configured client id is never dropped; the rejection is only logged.
    pub async fn invalidate_if(&self, stale: &str) -> bool {
        if self.fixed.is_some() {
            warn!("configured SOUNDCLOUD_CLIENT_ID was rejected upstream");
            return false;
        }
        let mut token = self.token.write().await;
        match token.as_ref() {
            Some(current) if current.value == stale => {
                *token = None;
                true
            }
            _ => false,
        }
    }

    pub async fn current(&self) -> Option<AccessToken> {
        self.token.read().await.clone()
    }

    pub async fn obtained_at(&self) -> Option<DateTime<Utc>> {
        self.token.read().await.as_ref().map(|t| t.obtained_at)
    }

    async fn scrape(&self) -> Result<String> {
        let html = self
            .fetch_text(&self.web_url)
            .await
            .map_err(|e| Error::CredentialUnavailable(format!("landing page: {e}")))?;

        let scripts = utils::extract_script_urls(&html, &self.web_url);
        if scripts.is_empty() {
            return Err(Error::CredentialUnavailable(
                "landing page references no scripts".to_string(),
            ));
        }

        for script_url in &scripts {
            match self.fetch_text(script_url).await {
                Ok(body) => {
                    if let Some(client_id) = utils::find_client_id(&body) {
                        debug!("client id found in {}", script_url);
                        return Ok(client_id);
                    }
                }
                Err(e) => debug!("skipping script {}: {}", script_url, e),
            }
        }

        warn!("scanned {} scripts without finding a client id", scripts.len());
        Err(Error::CredentialUnavailable(format!(
            "none of {} scripts contained a client id",
            scripts.len()
        )))
    }

    async fn fetch_text(&self, url: &str) -> std::result::Result<String, reqwest::Error> {
        self.http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}
