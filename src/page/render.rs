use super::{LikeControl, PostCard};
use crate::api::{CategoryCount, Post, TrendingPost};
use crate::util::{char_prefix, escape_html, multiline_html};
use chrono::NaiveDateTime;
use std::fmt::Write;

/// Timestamp layout used when none is configured, close to an en-US
/// `toLocaleString()` rendering.
pub const DEFAULT_TIME_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Length of the message preview in the trending panel.
pub const PREVIEW_CHARS: usize = 50;

/// Formats a creation timestamp with a strftime-style layout.
///
/// Layouts chrono cannot render fall back to [`DEFAULT_TIME_FORMAT`]
/// instead of failing the whole card.
pub fn format_timestamp(ts: &NaiveDateTime, layout: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", ts.format(layout)).is_err() {
        tracing::debug!(layout, "Invalid timestamp layout, using default");
        out.clear();
        // The default layout only uses valid specifiers
        let _ = write!(out, "{}", ts.format(DEFAULT_TIME_FORMAT));
    }
    out
}

/// Markup of a single comment.
pub fn comment_html(text: &str) -> String {
    format!("<div class=\"comment\">💬 {}</div>", escape_html(text))
}

/// Builds the card for a post. Every server-supplied field is escaped here.
pub fn render_card(post: &Post, liked: bool, time_layout: &str) -> PostCard {
    PostCard {
        id: post.id.clone(),
        category_html: escape_html(&post.category).into_owned(),
        time: format_timestamp(&post.created_at, time_layout),
        title_html: post.display_title().map(|t| escape_html(t).into_owned()),
        body_html: multiline_html(&post.message),
        like: LikeControl {
            liked,
            count: post.likes,
        },
        comments_html: post.comments.iter().map(|c| comment_html(&c.text)).collect(),
        comment_draft: String::new(),
    }
}

impl PostCard {
    pub fn to_html(&self) -> String {
        let id = escape_html(self.id.as_str());
        let title = self
            .title_html
            .as_ref()
            .map(|t| format!("<div class=\"post-title\">{t}</div>\n"))
            .unwrap_or_default();
        let liked_class = if self.like.liked { " liked" } else { "" };
        let comments: String = self.comments_html.concat();

        format!(
            "<div class=\"post-card\" data-id=\"{id}\">\n\
             <div class=\"post-header\">\n\
             <div class=\"post-category\">{category}</div>\n\
             <div class=\"post-meta\"><div class=\"post-time\">{time}</div></div>\n\
             </div>\n\
             {title}\
             <div class=\"post-content\">{body}</div>\n\
             <div class=\"post-footer\">\n\
             <div class=\"post-action like-action\">\
             <button class=\"like-btn{liked_class}\" data-id=\"{id}\">{label}</button></div>\n\
             <div class=\"post-action comment-action\"><span>{count} comments</span></div>\n\
             </div>\n\
             <div class=\"comments-section\">\n\
             <div class=\"comment-list\" id=\"comments-{id}\">{comments}</div>\n\
             <form class=\"comment-form\" data-id=\"{id}\">\
             <input type=\"text\" name=\"comment\" placeholder=\"Write a comment...\" value=\"{draft}\">\
             <button type=\"submit\">Send</button></form>\n\
             </div>\n\
             </div>\n",
            category = self.category_html,
            time = escape_html(&self.time),
            body = self.body_html,
            label = self.like.label(),
            count = self.comments_html.len(),
            draft = escape_html(&self.comment_draft),
        )
    }
}

/// Markup of the trending categories region.
pub fn trending_categories_html(categories: &[CategoryCount]) -> String {
    categories
        .iter()
        .map(|c| format!("<div>{}: {}</div>", escape_html(&c.category), c.count))
        .collect()
}

/// Markup of the top posts region.
///
/// Each preview is the first [`PREVIEW_CHARS`] characters of the message
/// followed by `...`, whatever its length. The cut happens before escaping,
/// so an entity is never split.
pub fn top_posts_html(posts: &[TrendingPost]) -> String {
    posts
        .iter()
        .map(|p| {
            let title = p
                .title
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or("No Title");
            let preview = char_prefix(&p.message, PREVIEW_CHARS);
            format!(
                "<div><strong>{}</strong><br>{}...</div>",
                escape_html(title),
                escape_html(preview)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Comment, PostId, SERVER_TIME_FORMAT};
    use pretty_assertions::assert_eq;

    fn sample_post() -> Post {
        Post {
            id: PostId::from(9),
            category: "rant<".into(),
            title: Some("\"Quoted\" & 'single'".into()),
            message: "<script>alert(1)</script>\nsecond line".into(),
            likes: 4,
            created_at: NaiveDateTime::parse_from_str("2024-03-05 14:07:09", SERVER_TIME_FORMAT)
                .unwrap(),
            comments: vec![
                Comment {
                    text: "first".into(),
                },
                Comment {
                    text: "<img src=x>".into(),
                },
            ],
        }
    }

    #[test]
    fn test_card_escapes_every_field() {
        let card = render_card(&sample_post(), false, DEFAULT_TIME_FORMAT);
        assert_eq!(card.category_html, "rant&lt;");
        assert_eq!(
            card.title_html.as_deref(),
            Some("&quot;Quoted&quot; &amp; &#039;single&#039;")
        );
        assert_eq!(
            card.body_html,
            "&lt;script&gt;alert(1)&lt;/script&gt;<br>second line"
        );
        assert_eq!(card.comments_html[1], "<div class=\"comment\">💬 &lt;img src=x&gt;</div>");

        let html = card.to_html();
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<img"));
        assert!(html.contains("<span>2 comments</span>"));
    }

    #[test]
    fn test_card_timestamp() {
        let card = render_card(&sample_post(), false, DEFAULT_TIME_FORMAT);
        assert_eq!(card.time, "3/5/2024, 2:07:09 PM");

        let card = render_card(&sample_post(), false, "%Y-%m-%d");
        assert_eq!(card.time, "2024-03-05");
    }

    #[test]
    fn test_invalid_layout_falls_back() {
        let ts = NaiveDateTime::parse_from_str("2024-03-05 14:07:09", SERVER_TIME_FORMAT).unwrap();
        assert_eq!(format_timestamp(&ts, "%Q"), "3/5/2024, 2:07:09 PM");
    }

    #[test]
    fn test_card_without_title() {
        let mut post = sample_post();
        post.title = None;
        let html = render_card(&post, false, DEFAULT_TIME_FORMAT).to_html();
        assert!(!html.contains("post-title"));
    }

    #[test]
    fn test_like_control_markup() {
        let mut card = render_card(&sample_post(), false, DEFAULT_TIME_FORMAT);
        assert!(card.to_html().contains("<button class=\"like-btn\" data-id=\"9\">❤️ Like (4)</button>"));

        card.like = LikeControl {
            liked: true,
            count: 5,
        };
        assert!(card
            .to_html()
            .contains("<button class=\"like-btn liked\" data-id=\"9\">💖 Liked (5)</button>"));
    }

    #[test]
    fn test_trending_categories_escaped() {
        let html = trending_categories_html(&[
            CategoryCount {
                category: "<b>rant</b>".into(),
                count: 3,
            },
            CategoryCount {
                category: "crush".into(),
                count: 1,
            },
        ]);
        assert_eq!(html, "<div>&lt;b&gt;rant&lt;/b&gt;: 3</div><div>crush: 1</div>");
    }

    #[test]
    fn test_top_posts_preview() {
        let long = "x".repeat(80);
        let html = top_posts_html(&[
            TrendingPost {
                title: None,
                message: long,
            },
            TrendingPost {
                title: Some("Hi".into()),
                message: "short".into(),
            },
        ]);
        let expected = format!(
            "<div><strong>No Title</strong><br>{}...</div><div><strong>Hi</strong><br>short...</div>",
            "x".repeat(PREVIEW_CHARS)
        );
        assert_eq!(html, expected);
    }

    #[test]
    fn test_top_posts_truncates_before_escaping() {
        let message = format!("{}&more", "a".repeat(PREVIEW_CHARS - 1));
        let html = top_posts_html(&[TrendingPost {
            title: None,
            message,
        }]);
        assert!(html.contains(&format!("{}&amp;...", "a".repeat(PREVIEW_CHARS - 1))));
    }
}
