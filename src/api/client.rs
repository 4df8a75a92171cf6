use super::types::{
    Comment, ErrorBody, LikeResponse, NewComment, NewPost, Post, PostId, PostsEnvelope, Stats,
    Trending,
};
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Errors from a single board API request.
///
/// Everything except [`ApiError::Rejected`] is a transport or decode
/// failure: the server never produced an answer the client can act on.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Read endpoint answered with a non-2xx status
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Mutation refused by the server with an error payload
    #[error("Rejected with status {status}")]
    Rejected { status: u16, body: ErrorBody },
    /// Body was not the JSON shape expected for the endpoint
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    /// Body exceeded the 5MB limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Base URL cannot have path segments appended
    #[error("Base URL cannot carry API paths")]
    InvalidBaseUrl,
}

impl ApiError {
    /// True for failures where the request never got a usable answer.
    pub fn is_transport(&self) -> bool {
        !matches!(self, ApiError::Rejected { .. })
    }
}

/// Redirect policy: at most 3 hops, loops rejected.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );
        attempt.follow()
    })
}

/// HTTP client for the board's JSON API.
///
/// Cheap to clone; the underlying `reqwest::Client` shares its pool.
#[derive(Debug, Clone)]
pub struct BoardClient {
    http: reqwest::Client,
    base: Url,
    timeout: Option<Duration>,
}

impl BoardClient {
    /// Builds a client for the board mounted at `base`.
    ///
    /// `base` is expected to come from [`crate::util::validate_base_url`].
    /// A `timeout` of `None` leaves requests unbounded.
    pub fn new(base: Url, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .user_agent(concat!("confide/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(http, base, timeout))
    }

    pub fn with_client(http: reqwest::Client, base: Url, timeout: Option<Duration>) -> Self {
        Self {
            http,
            base,
            timeout,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let request = request.header(ACCEPT, "application/json");
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, request.send())
                .await
                .map_err(|_| ApiError::Timeout(limit))?
                .map_err(ApiError::Network),
            None => request.send().await.map_err(ApiError::Network),
        }
    }

    fn json_body<T: Serialize>(request: RequestBuilder, body: &T) -> Result<RequestBuilder, ApiError> {
        Ok(request
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?))
    }

    /// `GET` a read-only endpoint and decode its body.
    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let response = self.send(self.http.get(url)).await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }
        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Lists the board's posts, newest first as the server orders them.
    pub async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        let envelope: PostsEnvelope = self.get_json(&["api", "posts"]).await?;
        Ok(envelope.posts)
    }

    /// Creates a post. Only `201 Created` counts as success.
    pub async fn create_post(&self, post: &NewPost) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "posts"])?;
        let request = Self::json_body(self.http.post(url), post)?;
        let response = self.send(request).await?;
        if response.status() != StatusCode::CREATED {
            return Err(rejection(response).await);
        }
        Ok(())
    }

    /// Toggles the like on a post; the server decides the direction.
    pub async fn toggle_like(&self, id: &PostId) -> Result<LikeResponse, ApiError> {
        let url = self.endpoint(&["api", "posts", id.as_str(), "like"])?;
        let response = self.send(self.http.post(url)).await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Adds a comment and returns the text the server stored.
    pub async fn add_comment(&self, id: &PostId, text: &str) -> Result<Comment, ApiError> {
        let url = self.endpoint(&["api", "posts", id.as_str(), "comment"])?;
        let request = Self::json_body(self.http.post(url), &NewComment { text })?;
        let response = self.send(request).await?;
        if response.status() != StatusCode::CREATED {
            return Err(rejection(response).await);
        }
        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn stats(&self) -> Result<Stats, ApiError> {
        self.get_json(&["api", "stats"]).await
    }

    pub async fn trending(&self) -> Result<Trending, ApiError> {
        self.get_json(&["api", "trending"]).await
    }
}

/// Turns a refused mutation into [`ApiError::Rejected`].
///
/// The error payload is read leniently: a body that is missing, too large
/// or not JSON still yields a rejection, just without a server message.
async fn rejection(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let body = match read_limited_bytes(response, MAX_RESPONSE_SIZE).await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            tracing::debug!(status, error = %e, "Rejection body is not an error payload");
            ErrorBody::default()
        }),
        Err(e) => {
            tracing::debug!(status, error = %e, "Failed to read rejection body");
            ErrorBody::default()
        }
    };
    ApiError::Rejected { status, body }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, ApiError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
