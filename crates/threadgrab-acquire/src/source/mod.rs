use crate::error::FetchError;

pub mod browser;
pub mod http;

pub use browser::BrowserSource;
pub use http::HttpSource;

/// One authenticated page load, returning the raw JSON text the forum sent.
///
/// Implementations own whatever session resources they need and must have
/// released them by the time `fetch_text` returns.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}
