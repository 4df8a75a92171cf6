//! In-memory model of the board page.
//!
//! The page is a set of optional regions, mirroring a document where any
//! widget may be absent. The feed controller writes into these regions and
//! [`Page::to_html`] serialises the whole thing into a standalone document.

mod render;

pub use render::{
    comment_html, format_timestamp, render_card, top_posts_html, trending_categories_html,
    DEFAULT_TIME_FORMAT, PREVIEW_CHARS,
};

use crate::api::{NewPost, PostId};
use crate::feed::ALL;
use crate::util::escape_html;

/// Which regions exist on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub posts: bool,
    pub stats: bool,
    pub trending: bool,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            posts: true,
            stats: true,
            trending: true,
        }
    }
}

/// A display slot whose content is replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    pub html: String,
}

impl Region {
    fn placeholder() -> Self {
        Self {
            html: "-".to_string(),
        }
    }

    pub fn set(&mut self, html: impl Into<String>) {
        self.html = html.into();
    }
}

/// Like button of a post card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeControl {
    pub liked: bool,
    pub count: u64,
}

impl LikeControl {
    pub fn label(&self) -> String {
        if self.liked {
            format!("💖 Liked ({})", self.count)
        } else {
            format!("❤️ Like ({})", self.count)
        }
    }
}

/// One rendered post. Text fields hold already-escaped markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCard {
    pub id: PostId,
    pub category_html: String,
    pub time: String,
    pub title_html: Option<String>,
    pub body_html: String,
    pub like: LikeControl,
    pub comments_html: Vec<String>,
    /// Raw contents of the inline comment input.
    pub comment_draft: String,
}

/// The post list region plus its empty-state indicator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostList {
    pub empty_state_visible: bool,
    pub cards: Vec<PostCard>,
}

impl PostList {
    pub fn card(&self, id: &PostId) -> Option<&PostCard> {
        self.cards.iter().find(|c| c.id == *id)
    }

    pub fn card_mut(&mut self, id: &PostId) -> Option<&mut PostCard> {
        self.cards.iter_mut().find(|c| c.id == *id)
    }
}

/// A group of mutually exclusive controls; exactly one value is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlGroup {
    options: Vec<String>,
    active: String,
}

impl ControlGroup {
    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options: Vec<String> = options.into_iter().map(Into::into).collect();
        if !options.iter().any(|o| o == ALL) {
            options.insert(0, ALL.to_string());
        }
        Self {
            options,
            active: ALL.to_string(),
        }
    }

    /// Marks `value` active, adding it as an option if the page lacked one.
    pub fn activate(&mut self, value: &str) {
        if !self.options.iter().any(|o| o == value) {
            self.options.push(value.to_string());
        }
        self.active = value.to_string();
    }

    pub fn active(&self) -> &str {
        &self.active
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn is_active(&self, value: &str) -> bool {
        self.active == value
    }
}

/// The new-post form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeForm {
    pub category: String,
    pub title: String,
    pub message: String,
}

impl ComposeForm {
    pub fn fill(&mut self, draft: &NewPost) {
        self.category.clone_from(&draft.category);
        self.title.clone_from(&draft.title);
        self.message.clone_from(&draft.message);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Character count shown under the message box.
    pub fn char_count(&self) -> usize {
        self.message.chars().count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsPanel {
    pub posts_this_week: Option<Region>,
    pub total_likes: Option<Region>,
    pub total_comments: Option<Region>,
}

impl StatsPanel {
    pub fn is_present(&self) -> bool {
        self.posts_this_week.is_some() || self.total_likes.is_some() || self.total_comments.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrendingPanel {
    pub categories: Option<Region>,
    pub top_posts: Option<Region>,
}

impl TrendingPanel {
    pub fn is_present(&self) -> bool {
        self.categories.is_some() || self.top_posts.is_some()
    }
}

/// The whole page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub posts: Option<PostList>,
    pub filters: ControlGroup,
    pub views: ControlGroup,
    pub compose: ComposeForm,
    pub stats: StatsPanel,
    pub trending: TrendingPanel,
}

impl Page {
    /// Builds an empty page with the given regions and filter categories.
    pub fn new(layout: PageLayout, categories: &[String]) -> Self {
        let stats = if layout.stats {
            StatsPanel {
                posts_this_week: Some(Region::placeholder()),
                total_likes: Some(Region::placeholder()),
                total_comments: Some(Region::placeholder()),
            }
        } else {
            StatsPanel::default()
        };
        let trending = if layout.trending {
            TrendingPanel {
                categories: Some(Region::default()),
                top_posts: Some(Region::default()),
            }
        } else {
            TrendingPanel::default()
        };

        Self {
            posts: layout.posts.then(PostList::default),
            filters: ControlGroup::new(categories.iter().cloned()),
            views: ControlGroup::new(["all", "popular"]),
            compose: ComposeForm::default(),
            stats,
            trending,
        }
    }

    /// Serialises the page into a standalone HTML document.
    pub fn to_html(&self) -> String {
        let mut html = String::from(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>Confession Board</title>\n</head>\n<body>\n",
        );

        if self.stats.is_present() {
            html.push_str("<section class=\"stats\">\n");
            for (id, label, region) in [
                ("totalPosts", "Posts this week", &self.stats.posts_this_week),
                ("totalLikes", "Total likes", &self.stats.total_likes),
                ("totalComments", "Total comments", &self.stats.total_comments),
            ] {
                if let Some(region) = region {
                    html.push_str(&format!(
                        "<div class=\"stat\"><span class=\"stat-label\">{label}</span> \
                         <span id=\"{id}\">{}</span></div>\n",
                        region.html
                    ));
                }
            }
            html.push_str("</section>\n");
        }

        if self.trending.is_present() {
            html.push_str("<section class=\"trending\">\n");
            if let Some(region) = &self.trending.categories {
                html.push_str(&format!(
                    "<div id=\"trendingCategories\">{}</div>\n",
                    region.html
                ));
            }
            if let Some(region) = &self.trending.top_posts {
                html.push_str(&format!("<div id=\"topPosts\">{}</div>\n", region.html));
            }
            html.push_str("</section>\n");
        }

        html.push_str(&self.compose_html());
        html.push_str(&control_group_html("filterButtons", "filter-btn", "data-filter", &self.filters));
        html.push_str(&control_group_html("viewButtons", "view-btn", "data-view", &self.views));

        if let Some(list) = &self.posts {
            let display = if list.empty_state_visible { "block" } else { "none" };
            html.push_str(&format!(
                "<div id=\"emptyState\" style=\"display:{display}\">No posts yet.</div>\n"
            ));
            html.push_str("<div id=\"postsContainer\">\n");
            for card in &list.cards {
                html.push_str(&card.to_html());
            }
            html.push_str("</div>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    fn compose_html(&self) -> String {
        let form = &self.compose;
        format!(
            "<form id=\"postForm\">\n\
             <input id=\"category\" name=\"category\" value=\"{}\">\n\
             <input id=\"title\" name=\"title\" value=\"{}\">\n\
             <textarea id=\"message\" name=\"message\">{}</textarea>\n\
             <span id=\"charCount\">{}</span>\n\
             <button type=\"submit\">Post</button>\n\
             </form>\n",
            escape_html(&form.category),
            escape_html(&form.title),
            escape_html(&form.message),
            form.char_count()
        )
    }
}

fn control_group_html(id: &str, class: &str, attr: &str, group: &ControlGroup) -> String {
    let mut html = format!("<div id=\"{id}\">");
    for option in group.options() {
        let active = if group.is_active(option) { " active" } else { "" };
        let value = escape_html(option);
        html.push_str(&format!(
            "<button class=\"{class}{active}\" {attr}=\"{value}\">{value}</button>"
        ));
    }
    html.push_str("</div>\n");
    html
}
