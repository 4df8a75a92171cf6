use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Timestamp layout the board server writes for `created_at`.
pub const SERVER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// Posts
// ============================================================================

/// Opaque post identifier.
///
/// The server sends integers, but nothing on the client depends on that;
/// string identifiers are accepted and kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for PostId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Str(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => PostId::from(n),
            RawId::Str(s) => PostId(s),
        })
    }
}

/// A single comment. The client model carries only its text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Comment {
    pub text: String,
}

/// A post as listed by `GET /api/posts`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub category: String,
    #[serde(default)]
    pub title: Option<String>,
    pub message: String,
    #[serde(default)]
    pub likes: u64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub comments: Vec<Comment>,
}

impl Post {
    /// Title to display, treating an empty string like a missing title.
    pub fn display_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Accepts the server's `YYYY-MM-DD HH:MM:SS` layout, falling back to RFC 3339.
///
/// The server layout is already local wall time; RFC 3339 values are
/// shifted into the local zone so both read the same way.
fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("unrecognised timestamp: {raw:?}"))
    })
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, SERVER_TIME_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Local).naive_local())
        })
}

fn deserialize_null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Envelope of the listing endpoint. A missing or null `posts` is empty.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PostsEnvelope {
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub posts: Vec<Post>,
}

/// Request body for `POST /api/posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPost {
    pub category: String,
    pub title: String,
    pub message: String,
}

/// Request body for `POST /api/posts/{id}/comment`.
#[derive(Debug, Serialize)]
pub(crate) struct NewComment<'a> {
    pub text: &'a str,
}

// ============================================================================
// Likes
// ============================================================================

/// Server message for a like that was added.
pub const LIKED_MESSAGE: &str = "Post liked successfully.";
/// Server message for a like that was withdrawn.
pub const UNLIKED_MESSAGE: &str = "Like removed.";

/// Response of `POST /api/posts/{id}/like`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LikeResponse {
    pub likes: u64,
    #[serde(default)]
    pub message: String,
}

/// Toggle direction decided by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    Liked,
    Unliked,
}

impl LikeResponse {
    /// Resolves the toggle direction from the server message.
    ///
    /// Trailing punctuation is ignored so `"Post liked successfully"` and
    /// `"Post liked successfully."` both count. Unknown messages yield `None`.
    pub fn state(&self) -> Option<LikeState> {
        let message = self.message.trim().trim_end_matches('.');
        if message.eq_ignore_ascii_case(LIKED_MESSAGE.trim_end_matches('.')) {
            Some(LikeState::Liked)
        } else if message.eq_ignore_ascii_case(UNLIKED_MESSAGE.trim_end_matches('.')) {
            Some(LikeState::Unliked)
        } else {
            None
        }
    }
}

// ============================================================================
// Aggregates
// ============================================================================

/// One figure of the stats endpoint.
///
/// Aggregates computed by the database (`SUM(likes)`) arrive as decimal
/// strings such as `"12"`, plain counts as JSON integers. Both are shown
/// as sent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Count(u64),
    Text(String),
}

impl Default for StatValue {
    fn default() -> Self {
        StatValue::Count(0)
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Count(n) => write!(f, "{n}"),
            StatValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<u64> for StatValue {
    fn from(n: u64) -> Self {
        StatValue::Count(n)
    }
}

/// Response of `GET /api/stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub posts_this_week: StatValue,
    #[serde(default)]
    pub total_likes: StatValue,
    #[serde(default)]
    pub total_comments: StatValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

/// Top post entry of the trending endpoint; only title and message are sent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrendingPost {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Response of `GET /api/trending`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Trending {
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub categories: Vec<CategoryCount>,
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub top_posts: Vec<TrendingPost>,
}

// ============================================================================
// Errors
// ============================================================================

/// Error payload of a rejected request.
///
/// `reasons` is filled by the server's content moderation on post creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub reasons: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_post_from_server_json() {
        let json = r#"{
            "id": 7,
            "title": null,
            "message": "line one\nline two",
            "category": "confession",
            "likes": 3,
            "created_at": "2024-03-01 12:30:00",
            "comments": [{"text": "first"}, {"text": "second"}]
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.id, PostId::from(7));
        assert_eq!(post.title, None);
        assert_eq!(post.likes, 3);
        assert_eq!(post.comments.len(), 2);
        assert_eq!(post.comments[1].text, "second");
        assert_eq!(
            post.created_at.format(SERVER_TIME_FORMAT).to_string(),
            "2024-03-01 12:30:00"
        );
    }

    #[test]
    fn test_string_id_and_rfc3339_timestamp() {
        let json = r#"{
            "id": "abc-1",
            "message": "m",
            "category": "rant",
            "created_at": "2024-03-01T12:30:00+00:00"
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.id.as_str(), "abc-1");
        assert_eq!(post.likes, 0);
        assert!(post.comments.is_empty());

        let instant = DateTime::parse_from_rfc3339("2024-03-01T12:30:00+00:00").unwrap();
        assert_eq!(post.created_at, instant.with_timezone(&Local).naive_local());
    }

    #[test]
    fn test_rfc3339_offsets_name_the_same_instant() {
        let utc = parse_timestamp("2024-03-01T12:30:00Z").unwrap();
        let shifted = parse_timestamp("2024-03-01T14:30:00+02:00").unwrap();
        assert_eq!(utc, shifted);
    }

    #[test]
    fn test_bad_timestamp_is_decode_error() {
        let json = r#"{"id":1,"message":"m","category":"c","created_at":"yesterday"}"#;
        assert!(serde_json::from_str::<Post>(json).is_err());
    }

    #[test]
    fn test_posts_envelope_missing_or_null() {
        let env: PostsEnvelope = serde_json::from_str("{}").unwrap();
        assert!(env.posts.is_empty());
        let env: PostsEnvelope = serde_json::from_str(r#"{"posts":null}"#).unwrap();
        assert!(env.posts.is_empty());
    }

    #[test]
    fn test_empty_title_not_displayed() {
        let json = r#"{"id":1,"title":"  ","message":"m","category":"c","created_at":"2024-01-01 00:00:00"}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.display_title(), None);
    }

    #[test]
    fn test_like_state_from_message() {
        let liked = LikeResponse {
            likes: 1,
            message: LIKED_MESSAGE.into(),
        };
        let unliked = LikeResponse {
            likes: 0,
            message: UNLIKED_MESSAGE.into(),
        };
        let bare = LikeResponse {
            likes: 1,
            message: "Post liked successfully".into(),
        };
        let other = LikeResponse {
            likes: 1,
            message: "ok".into(),
        };
        assert_eq!(liked.state(), Some(LikeState::Liked));
        assert_eq!(unliked.state(), Some(LikeState::Unliked));
        assert_eq!(bare.state(), Some(LikeState::Liked));
        assert_eq!(other.state(), None);
    }

    #[test]
    fn test_error_body_with_reasons() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"Rejected","reasons":["spam","profanity"]}"#)
                .unwrap();
        assert_eq!(body.error.as_deref(), Some("Rejected"));
        assert_eq!(
            body.reasons,
            Some(vec!["spam".to_string(), "profanity".to_string()])
        );
    }
}
