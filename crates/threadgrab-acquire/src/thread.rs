use crate::clean;
use crate::error::FetchError;
use crate::output;
use crate::source::PageSource;
use std::path::{Path, PathBuf};
use threadgrab_model::{StorageState, ThreadRecord};

pub const DEFAULT_BASE_URL: &str = "https://discourse.onlinedegree.iitm.ac.in";
pub const DEFAULT_AUTH_STATE: &str = "auth.json";
pub const DEFAULT_OUTPUT_DIR: &str = "downloaded_threads";

/// Where to fetch from and where to put the result.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Forum origin, without a trailing slash.
    pub base_url: String,
    /// Saved browser session (`auth.json`).
    pub auth_state: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_state: PathBuf::from(DEFAULT_AUTH_STATE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl FetchConfig {
    pub fn thread_url(&self, thread_id: u64) -> String {
        format!("{}/t/{thread_id}.json", self.base_url.trim_end_matches('/'))
    }
}

/// Fetch one thread, strip the HTML from its posts, and save it as JSON.
///
/// Returns the saved path. Every failure, from the page load through the
/// file write, is logged with the thread id and handed back as the error.
/// The output file only appears (or changes) once the full record has been
/// written; see [`output::write_thread`].
pub async fn fetch_and_save<S: PageSource>(
    source: &S,
    config: &FetchConfig,
    thread_id: u64,
) -> Result<PathBuf, FetchError> {
    tracing::info!(thread = thread_id, "Fetching thread");
    match fetch_clean_write(source, config, thread_id).await {
        Ok(path) => Ok(path),
        Err(e) => {
            tracing::error!(thread = thread_id, error = %e, "Failed to fetch thread");
            Err(e)
        }
    }
}

async fn fetch_clean_write<S: PageSource>(
    source: &S,
    config: &FetchConfig,
    thread_id: u64,
) -> Result<PathBuf, FetchError> {
    let url = config.thread_url(thread_id);
    let body = source.fetch_text(&url).await?;
    tracing::debug!(url = %url, bytes = body.len(), "Received thread body");

    let mut record = ThreadRecord::from_json(&body).map_err(FetchError::Parse)?;
    let cleaned = clean::clean_posts(&mut record);
    tracing::debug!(cleaned, "Stripped HTML from posts");

    let file_name = record.file_name(thread_id);
    let path = output::write_thread(&record, &config.output_dir, &file_name)?;

    tracing::info!(title = %record.title_or_default(), "Thread title");
    tracing::info!(posts = record.posts().len(), "Posts in thread");
    Ok(path)
}

/// Result of one end-to-end run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The saved session file doesn't exist; nothing was attempted.
    MissingSession(PathBuf),
    Saved { thread_id: u64, path: PathBuf },
    Failed { thread_id: u64, error: FetchError },
}

impl RunOutcome {
    /// Log a human-readable summary of the run.
    pub fn report(&self) {
        match self {
            RunOutcome::MissingSession(path) => {
                tracing::error!(
                    path = %path.display(),
                    "No saved session found. Log in and capture a session state file first."
                );
            }
            RunOutcome::Saved { thread_id, path } => {
                tracing::info!(thread = thread_id, path = %path.display(), "Successfully saved thread");
                tracing::info!("Next steps:");
                tracing::info!("  1. Run the preprocessing script to add this thread to your knowledge base");
                tracing::info!("  2. Restart your API server");
                tracing::info!("  3. Re-run the evaluation");
            }
            RunOutcome::Failed { thread_id, error } => {
                tracing::error!(thread = thread_id, error = %error, "Failed to save thread");
            }
        }
    }
}

/// Check the session precondition, then fetch and save one thread.
///
/// `make_source` is only called once the session file is known to exist
/// and has been parsed, so a missing session never opens a connection.
pub async fn run<S, F>(config: &FetchConfig, thread_id: u64, make_source: F) -> RunOutcome
where
    S: PageSource,
    F: FnOnce(StorageState) -> Result<S, FetchError>,
{
    if !session_exists(&config.auth_state) {
        return RunOutcome::MissingSession(config.auth_state.clone());
    }

    let source = match StorageState::load(&config.auth_state)
        .map_err(FetchError::Session)
        .and_then(make_source)
    {
        Ok(source) => source,
        Err(error) => {
            tracing::error!(thread = thread_id, error = %error, "Could not open a session");
            return RunOutcome::Failed { thread_id, error };
        }
    };

    match fetch_and_save(&source, config, thread_id).await {
        Ok(path) => RunOutcome::Saved { thread_id, path },
        Err(error) => RunOutcome::Failed { thread_id, error },
    }
}

fn session_exists(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::fs;

    /// Serves canned bodies and records the URLs it was asked for.
    struct FakeSource {
        body: Result<String, String>,
        requests: RefCell<Vec<String>>,
    }

    impl FakeSource {
        fn ok(body: Value) -> Self {
            Self {
                body: Ok(body.to_string()),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn raw(body: &str) -> Self {
            Self {
                body: Ok(body.to_string()),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                body: Err(reason.to_string()),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl PageSource for FakeSource {
        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.requests.borrow_mut().push(url.to_string());
            self.body.clone().map_err(FetchError::Browser)
        }
    }

    fn config(dir: &Path) -> FetchConfig {
        FetchConfig {
            base_url: "https://forum.example.org".into(),
            auth_state: dir.join("auth.json"),
            output_dir: dir.join("downloaded_threads"),
        }
    }

    fn thread() -> Value {
        json!({
            "id": 155939,
            "title": "Example Thread",
            "slug": "example-thread",
            "post_stream": {
                "posts": [
                    { "id": 1, "post_number": 1, "cooked": "<p>Hello <b>world</b></p>" },
                    { "id": 2, "post_number": 2, "cooked": "<p>Second &amp; <em>last</em></p>" }
                ],
                "stream": [1, 2]
            }
        })
    }

    #[test]
    fn test_thread_url() {
        let mut config = FetchConfig::default();
        assert_eq!(
            config.thread_url(155939),
            "https://discourse.onlinedegree.iitm.ac.in/t/155939.json"
        );
        config.base_url = "https://forum.example.org/".into();
        assert_eq!(config.thread_url(7), "https://forum.example.org/t/7.json");
    }

    #[tokio::test]
    async fn test_fetch_and_save_writes_cleaned_record() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());
        let source = FakeSource::ok(thread());

        let path = fetch_and_save(&source, &config, 155939).await.unwrap();

        assert_eq!(path, config.output_dir.join("example-thread_155939.json"));
        assert_eq!(
            *source.requests.borrow(),
            vec!["https://forum.example.org/t/155939.json".to_string()]
        );

        let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["post_stream"]["posts"][0]["cooked"], "Hello world");
        assert_eq!(saved["post_stream"]["posts"][1]["cooked"], "Second & last");
        assert_eq!(saved["post_stream"]["posts"][1]["post_number"], 2);
        assert_eq!(saved["post_stream"]["stream"], json!([1, 2]));
        assert_eq!(saved["id"], 155939);
    }

    #[tokio::test]
    async fn test_file_name_derivations() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());

        let titled = FakeSource::ok(json!({ "title": "My Great Thread" }));
        let path = fetch_and_save(&titled, &config, 42).await.unwrap();
        assert!(path.ends_with("my-great-thread_42.json"));

        let bare = FakeSource::ok(json!({ "id": 9 }));
        let path = fetch_and_save(&bare, &config, 9).await.unwrap();
        assert!(path.ends_with("unknown_9.json"));
    }

    #[tokio::test]
    async fn test_saved_file_keeps_explicit_nulls() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());
        let body = json!({
            "title": "Nulls",
            "slug": null,
            "post_stream": { "posts": [{ "id": 1, "cooked": null }, { "id": 2, "cooked": "<b>hi</b>" }] }
        });

        let path = fetch_and_save(&FakeSource::ok(body), &config, 5).await.unwrap();
        assert!(path.ends_with("nulls_5.json"));

        let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            saved,
            json!({
                "title": "Nulls",
                "slug": null,
                "post_stream": { "posts": [{ "id": 1, "cooked": null }, { "id": 2, "cooked": "hi" }] }
            })
        );
    }

    #[tokio::test]
    async fn test_second_run_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());

        let first = fetch_and_save(&FakeSource::ok(thread()), &config, 155939).await.unwrap();
        let mut changed = thread();
        changed["post_stream"]["posts"][0]["cooked"] = json!("<p>edited</p>");
        let second = fetch_and_save(&FakeSource::ok(changed), &config, 155939).await.unwrap();

        assert_eq!(first, second);
        let saved: Value = serde_json::from_str(&fs::read_to_string(&second).unwrap()).unwrap();
        assert_eq!(saved["post_stream"]["posts"][0]["cooked"], "edited");
        assert_eq!(fs::read_dir(&config.output_dir).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_load_failure_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());

        let err = fetch_and_save(&FakeSource::failing("navigation timed out"), &config, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Browser(_)));
        assert!(!config.output_dir.exists());
    }

    #[tokio::test]
    async fn test_malformed_body_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());

        let err = fetch_and_save(&FakeSource::raw("<html>Please log in</html>"), &config, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
        assert!(!config.output_dir.exists());
    }

    #[tokio::test]
    async fn test_run_without_session_makes_no_request() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());
        let mut factory_called = false;

        let outcome = run(&config, 155939, |_state| {
            factory_called = true;
            Ok(FakeSource::ok(thread()))
        })
        .await;

        assert!(matches!(outcome, RunOutcome::MissingSession(_)));
        assert!(!factory_called);
        assert!(!config.output_dir.exists());
    }

    #[tokio::test]
    async fn test_run_with_session() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());
        fs::write(
            &config.auth_state,
            r#"{"cookies":[{"name":"_t","value":"tok","domain":"forum.example.org","path":"/"}],"origins":[]}"#,
        )
        .unwrap();

        let outcome = run(&config, 155939, |state| {
            assert_eq!(state.cookies.len(), 1);
            Ok(FakeSource::ok(thread()))
        })
        .await;

        match outcome {
            RunOutcome::Saved { thread_id, ref path } => {
                assert_eq!(thread_id, 155939);
                assert!(path.exists());
            }
            other => panic!("expected Saved, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_with_corrupt_session() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());
        fs::write(&config.auth_state, "garbage").unwrap();

        let outcome = run(&config, 1, |_| Ok(FakeSource::ok(thread()))).await;
        assert!(matches!(
            outcome,
            RunOutcome::Failed { error: FetchError::Session(_), .. }
        ));
    }
}
