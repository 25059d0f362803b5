use super::PageSource;
use crate::error::FetchError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, SetCookiesParams};
use futures_util::StreamExt;
use std::path::PathBuf;
use threadgrab_model::StorageState;

/// Loads pages through a headless Chromium carrying a saved login session.
///
/// Each `fetch_text` call launches its own browser, installs the session
/// cookies, loads the URL once, and closes the browser again before
/// returning, whether the load worked or not.
pub struct BrowserSource {
    state: StorageState,
    chrome: Option<PathBuf>,
}

impl BrowserSource {
    pub fn new(state: StorageState) -> Self {
        Self {
            state,
            chrome: None,
        }
    }

    /// Use a specific Chrome/Chromium binary instead of auto-detecting one.
    pub fn with_chrome(mut self, chrome: Option<PathBuf>) -> Self {
        self.chrome = chrome;
        self
    }

    fn config(&self) -> Result<BrowserConfig, FetchError> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-dev-shm-usage");
        if let Some(chrome) = &self.chrome {
            builder = builder.chrome_executable(chrome);
        }
        builder.build().map_err(FetchError::Browser)
    }

    fn cookie_params(&self) -> Result<Vec<CookieParam>, FetchError> {
        self.state
            .live_cookies()
            .map(|c| {
                CookieParam::builder()
                    .name(c.name.as_str())
                    .value(c.value.as_str())
                    .domain(c.domain.as_str())
                    .path(c.path.as_str())
                    .secure(c.secure)
                    .http_only(c.http_only)
                    .build()
                    .map_err(FetchError::Browser)
            })
            .collect()
    }

    /// Everything that happens while the browser is open.
    async fn load(&self, browser: &Browser, url: &str) -> Result<String, FetchError> {
        let page = browser.new_page("about:blank").await?;

        let cookies = self.cookie_params()?;
        tracing::debug!(cookies = cookies.len(), "Installing session cookies");
        if !cookies.is_empty() {
            page.execute(SetCookiesParams::new(cookies)).await?;
        }

        tracing::debug!(url = %url, "Navigating");
        page.goto(url).await?;

        // Chromium renders a JSON response inside a single <pre>.
        let pre = page
            .find_element("pre")
            .await
            .map_err(|_| FetchError::MissingBody(url.to_string()))?;
        pre.inner_text()
            .await?
            .ok_or_else(|| FetchError::MissingBody(url.to_string()))
    }
}

impl PageSource for BrowserSource {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let config = self.config()?;

        tracing::debug!("Launching headless browser");
        let (mut browser, mut handler) = Browser::launch(config).await?;
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!(error = %e, "CDP handler error");
                }
            }
        });

        let result = self.load(&browser, url).await;

        if let Err(e) = browser.close().await {
            tracing::warn!(error = %e, "Failed to close browser");
        }
        if let Err(e) = browser.wait().await {
            tracing::warn!(error = %e, "Failed to reap browser process");
        }
        events.abort();
        tracing::debug!("Browser closed");

        result
    }
}
