use super::PageSource;
use crate::error::FetchError;
use reqwest::header::{ACCEPT, COOKIE};
use reqwest::Url;
use threadgrab_model::StorageState;

/// Loads pages with a plain HTTP client, replaying the saved session's
/// cookies. Lighter than a browser, but sites that gate JSON behind
/// client-side checks will only answer the browser source.
pub struct HttpSource {
    client: reqwest::Client,
    state: StorageState,
}

impl HttpSource {
    pub fn new(state: StorageState) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent("threadgrab/0.1 (forum thread tool)")
            .build()?;
        Ok(Self { client, state })
    }
}

impl PageSource for HttpSource {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let host = parsed.host_str().unwrap_or_default();

        let mut request = self
            .client
            .get(parsed.clone())
            .header(ACCEPT, "application/json");
        match self.state.cookie_header(host, parsed.path()) {
            Some(cookie) => request = request.header(COOKIE, cookie),
            None => tracing::warn!(host = %host, "No session cookies apply to this host"),
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
