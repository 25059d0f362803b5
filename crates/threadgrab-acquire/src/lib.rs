pub mod clean;
pub mod error;
pub mod output;
pub mod source;
pub mod thread;

pub use error::FetchError;
pub use source::{BrowserSource, HttpSource, PageSource};
pub use thread::{fetch_and_save, run, FetchConfig, RunOutcome};
