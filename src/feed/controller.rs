use super::state::{CategoryFilter, SortView, ViewState};
use crate::api::{ApiError, BoardClient, Comment, LikeResponse, LikeState, NewPost, PostId};
use crate::page::{
    comment_html, render_card, top_posts_html, trending_categories_html, Page,
};
use crate::util::escape_html;
use std::fmt;
use thiserror::Error;

/// Fallback texts when a rejection carries no server message.
const LIKE_REJECTED: &str = "Error occurred.";
const COMMENT_REJECTED: &str = "Failed to comment";
const POST_REJECTED: &str = "Failed to post";

/// Generic notices for transport failures.
const LIKE_UNAVAILABLE: &str = "Unable to like post at the moment.";
const COMMENT_UNAVAILABLE: &str = "Unable to comment at the moment.";
const POST_UNAVAILABLE: &str = "Failed to post. Check the log for details.";

/// Failure of a user action. `Display` is the notice shown to the user.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Caught before any request was made.
    #[error("{0}")]
    Invalid(&'static str),
    /// The server refused the action; carries its message verbatim.
    #[error("{0}")]
    Rejected(String),
    /// The request failed or its answer could not be read.
    #[error("{notice}")]
    Transport {
        notice: &'static str,
        #[source]
        source: ApiError,
    },
}

/// Transport failures are warnings; a refusal is an ordinary answer.
fn log_failure(err: &ApiError, action: &str, subject: &dyn fmt::Display) {
    if err.is_transport() {
        tracing::warn!(action, subject = %subject, error = %err, "Request failed");
    } else {
        tracing::info!(action, subject = %subject, error = %err, "Refused by server");
    }
}

impl ActionError {
    fn from_api(err: ApiError, fallback: &'static str, notice: &'static str) -> Self {
        match err {
            ApiError::Rejected { body, .. } => {
                ActionError::Rejected(body.error.unwrap_or_else(|| fallback.to_string()))
            }
            source => ActionError::Transport { notice, source },
        }
    }
}

/// Owns the view state and the page, and keeps both in step with the server.
///
/// All methods run on one task; nothing here is shared across threads.
pub struct FeedController {
    client: BoardClient,
    state: ViewState,
    page: Page,
    time_layout: String,
}

impl FeedController {
    pub fn new(client: BoardClient, page: Page, time_layout: impl Into<String>) -> Self {
        Self {
            client,
            state: ViewState::default(),
            page,
            time_layout: time_layout.into(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    /// Initial load: posts, then stats, then trending, one after another.
    pub async fn initialize(&mut self) {
        self.fetch_posts().await;
        self.fetch_stats().await;
        self.fetch_trending().await;
    }

    /// Replaces the cached posts with the server listing and re-renders.
    ///
    /// On failure the error is logged and the cache and page are left as
    /// they were; returns whether the cache was replaced.
    pub async fn fetch_posts(&mut self) -> bool {
        match self.client.list_posts().await {
            Ok(posts) => {
                tracing::debug!(count = posts.len(), "Fetched posts");
                self.state.replace_posts(posts);
                self.render_posts();
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch posts");
                false
            }
        }
    }

    /// Rebuilds the post list region from the view state.
    pub fn render_posts(&mut self) {
        let Some(list) = self.page.posts.as_mut() else {
            return;
        };

        let visible = self.state.visible_posts();
        list.cards.clear();
        if visible.is_empty() {
            list.empty_state_visible = true;
            return;
        }

        list.empty_state_visible = false;
        list.cards = visible
            .into_iter()
            .map(|post| render_card(post, self.state.is_liked(&post.id), &self.time_layout))
            .collect();
    }

    /// Toggles the like on a post.
    ///
    /// The server decides the direction; the liked marker follows its
    /// message and the count always comes from the response, both on the
    /// control and in the cached post. Stats are refreshed afterwards.
    pub async fn toggle_like(&mut self, id: &PostId) -> Result<LikeResponse, ActionError> {
        let response = match self.client.toggle_like(id).await {
            Ok(response) => response,
            Err(e) => {
                log_failure(&e, "like", id);
                return Err(ActionError::from_api(e, LIKE_REJECTED, LIKE_UNAVAILABLE));
            }
        };

        let state = response.state();
        match state {
            Some(LikeState::Liked) => {
                self.state.liked.insert(id.clone());
            }
            Some(LikeState::Unliked) => {
                self.state.liked.remove(id);
            }
            None => {
                tracing::debug!(post_id = %id, message = %response.message, "Unrecognised like message, keeping control state");
            }
        }

        if let Some(post) = self.state.post_mut(id) {
            post.likes = response.likes;
        }
        let liked = self.state.is_liked(id);
        if let Some(card) = self.page.posts.as_mut().and_then(|l| l.card_mut(id)) {
            card.like.liked = liked;
            card.like.count = response.likes;
        }

        tracing::info!(post_id = %id, likes = response.likes, liked, "Like toggled");
        self.fetch_stats().await;
        Ok(response)
    }

    /// Adds a comment to a post.
    ///
    /// Whitespace-only text is rejected without a request. On success the
    /// server's text is appended to the cached post and to the rendered card
    /// only, and the card's input is cleared.
    pub async fn submit_comment(&mut self, id: &PostId, text: &str) -> Result<Comment, ActionError> {
        if let Some(card) = self.page.posts.as_mut().and_then(|l| l.card_mut(id)) {
            card.comment_draft = text.to_string();
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(ActionError::Invalid("Write a comment first"));
        }

        let comment = match self.client.add_comment(id, text).await {
            Ok(comment) => comment,
            Err(e) => {
                log_failure(&e, "comment", id);
                return Err(ActionError::from_api(e, COMMENT_REJECTED, COMMENT_UNAVAILABLE));
            }
        };

        if let Some(post) = self.state.post_mut(id) {
            post.comments.push(comment.clone());
        }
        if let Some(card) = self.page.posts.as_mut().and_then(|l| l.card_mut(id)) {
            card.comments_html.push(comment_html(&comment.text));
            card.comment_draft.clear();
        }

        tracing::info!(post_id = %id, "Comment added");
        self.fetch_stats().await;
        Ok(comment)
    }

    /// Creates a post from the compose form values.
    ///
    /// Category and message are required, title is optional; all three are
    /// trimmed. On success the form is reset and posts, stats and trending
    /// are refreshed in that order.
    pub async fn submit_post(&mut self, draft: NewPost) -> Result<(), ActionError> {
        self.page.compose.fill(&draft);

        let post = NewPost {
            category: draft.category.trim().to_string(),
            title: draft.title.trim().to_string(),
            message: draft.message.trim().to_string(),
        };
        if post.category.is_empty() {
            return Err(ActionError::Invalid("Choose a category"));
        }
        if post.message.is_empty() {
            return Err(ActionError::Invalid("Write your message"));
        }

        if let Err(e) = self.client.create_post(&post).await {
            log_failure(&e, "post", &post.category);
            return Err(match e {
                ApiError::Rejected { body, .. } => {
                    let mut message = body.error.unwrap_or_else(|| POST_REJECTED.to_string());
                    if let Some(reasons) = body.reasons.filter(|r| !r.is_empty()) {
                        message.push_str("\nReasons: ");
                        message.push_str(&reasons.join(", "));
                    }
                    ActionError::Rejected(message)
                }
                source => ActionError::Transport {
                    notice: POST_UNAVAILABLE,
                    source,
                },
            });
        }

        tracing::info!(category = %post.category, "Post created");
        self.page.compose.reset();
        self.fetch_posts().await;
        self.fetch_stats().await;
        self.fetch_trending().await;
        Ok(())
    }

    /// Switches the category filter and re-renders locally.
    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.page.filters.activate(filter.as_str());
        self.state.filter = filter;
        self.render_posts();
    }

    /// Switches the sort view and re-renders locally.
    pub fn set_view(&mut self, view: SortView) {
        self.page.views.activate(view.as_str());
        self.state.view = view;
        self.render_posts();
    }

    /// Refreshes the stats panel. No request is made when the page has
    /// none of its fields.
    pub async fn fetch_stats(&mut self) {
        if !self.page.stats.is_present() {
            return;
        }

        match self.client.stats().await {
            Ok(stats) => {
                let panel = &mut self.page.stats;
                if let Some(region) = panel.posts_this_week.as_mut() {
                    region.set(escape_html(&stats.posts_this_week.to_string()));
                }
                if let Some(region) = panel.total_likes.as_mut() {
                    region.set(escape_html(&stats.total_likes.to_string()));
                }
                if let Some(region) = panel.total_comments.as_mut() {
                    region.set(escape_html(&stats.total_comments.to_string()));
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to fetch stats"),
        }
    }

    /// Refreshes the trending panel. No request is made when the page has
    /// neither of its regions.
    pub async fn fetch_trending(&mut self) {
        if !self.page.trending.is_present() {
            return;
        }

        match self.client.trending().await {
            Ok(trending) => {
                let panel = &mut self.page.trending;
                if let Some(region) = panel.categories.as_mut() {
                    region.set(trending_categories_html(&trending.categories));
                }
                if let Some(region) = panel.top_posts.as_mut() {
                    region.set(top_posts_html(&trending.top_posts));
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to fetch trending"),
        }
    }
}
