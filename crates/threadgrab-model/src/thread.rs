use crate::ModelError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::rust::double_option;

/// Fallback used when a thread carries neither a slug nor a title.
pub const UNKNOWN_TITLE: &str = "unknown";

/// A forum thread as returned by the `/t/{id}.json` endpoint.
///
/// Only the fields this tool reads are typed. Everything else the forum
/// sends is kept in `extra` and written back out untouched.
///
/// Typed fields are `Option<Option<T>>`: the outer `None` means the key was
/// absent, `Some(None)` means it was an explicit `null`. Both survive a
/// round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadRecord {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub slug: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub post_stream: Option<Option<PostStream>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The ordered post list of a thread, plus whatever else the forum puts
/// next to it (e.g. the `stream` id array).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostStream {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub posts: Option<Option<Vec<Post>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One message within a thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Rendered HTML body.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub cooked: Option<Option<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Post {
    pub fn with_cooked(html: impl Into<String>) -> Self {
        Self {
            cooked: Some(Some(html.into())),
            ..Default::default()
        }
    }

    /// The `cooked` body, if the post has a non-null one.
    pub fn cooked(&self) -> Option<&str> {
        self.cooked.as_ref().and_then(|c| c.as_deref())
    }

    pub fn cooked_mut(&mut self) -> Option<&mut String> {
        self.cooked.as_mut().and_then(|c| c.as_mut())
    }
}

impl PostStream {
    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts: Some(Some(posts)),
            ..Default::default()
        }
    }
}

impl ThreadRecord {
    /// Parse a raw response body. The body must be a JSON object.
    pub fn from_json(body: &str) -> Result<Self, ModelError> {
        let value: Value = serde_json::from_str(body)?;
        if !value.is_object() {
            return Err(ModelError::NotAnObject(json_kind(&value)));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_ref().and_then(|t| t.as_deref())
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_ref().and_then(|s| s.as_deref())
    }

    /// The thread title, or `"unknown"` if the forum sent none (or `null`).
    pub fn title_or_default(&self) -> &str {
        self.title().unwrap_or(UNKNOWN_TITLE)
    }

    pub fn posts(&self) -> &[Post] {
        self.post_stream
            .as_ref()
            .and_then(|s| s.as_ref())
            .and_then(|s| s.posts.as_ref())
            .and_then(|p| p.as_deref())
            .unwrap_or(&[])
    }

    pub fn posts_mut(&mut self) -> &mut [Post] {
        let posts = self
            .post_stream
            .as_mut()
            .and_then(|s| s.as_mut())
            .and_then(|s| s.posts.as_mut())
            .and_then(|p| p.as_mut());
        match posts {
            Some(posts) => posts.as_mut_slice(),
            None => &mut [],
        }
    }

    /// Slug used for the output file name.
    ///
    /// Prefers the forum's own slug. Otherwise (absent or `null`) the title
    /// is lowercased and spaces become hyphens; path separators are replaced
    /// too so the name cannot escape the output directory.
    pub fn file_slug(&self) -> String {
        match self.slug() {
            Some(slug) => slug.to_string(),
            None => slugify(self.title_or_default()),
        }
    }

    /// `{slug}_{id}.json`
    pub fn file_name(&self, thread_id: u64) -> String {
        format!("{}_{thread_id}.json", self.file_slug())
    }
}

fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '-',
            other => other,
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
