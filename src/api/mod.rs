//! Board API: wire types and the HTTP client for the confession board's
//! JSON endpoints.
//!
//! - [`types`] - posts, comments, likes, stats and trending payloads
//! - [`client`] - [`BoardClient`], one method per endpoint

mod client;
mod types;

pub use client::{ApiError, BoardClient};
pub use types::{
    CategoryCount, Comment, ErrorBody, LikeResponse, LikeState, NewPost, Post, PostId, StatValue,
    Stats, Trending, TrendingPost, LIKED_MESSAGE, SERVER_TIME_FORMAT, UNLIKED_MESSAGE,
};
