//! Client for an anonymous confession board.
//!
//! The [`feed::FeedController`] mirrors the board's posts over HTTP,
//! applies the category filter and sort view, and renders the feed into
//! the [`page::Page`] model. The [`ui`] module drives it from a terminal.

pub mod api;
pub mod config;
pub mod feed;
pub mod page;
pub mod ui;
pub mod util;
