use crate::api::{Post, PostId};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Value of the filter and view controls meaning "no restriction".
pub const ALL: &str = "all";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewParseError {
    #[error("Category filter cannot be empty")]
    EmptyFilter,
    #[error("Unknown view '{0}' (expected 'all' or 'popular')")]
    UnknownView(String),
}

/// Category filter: everything, or exactly one category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Category(String),
}

impl CategoryFilter {
    pub fn matches(&self, post: &Post) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(category) => post.category == *category,
        }
    }

    /// Control value, as carried by the filter buttons.
    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => ALL,
            CategoryFilter::Category(category) => category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = ViewParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(ViewParseError::EmptyFilter),
            ALL => Ok(CategoryFilter::All),
            category => Ok(CategoryFilter::Category(category.to_string())),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort order of the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortView {
    /// Newest first by creation time.
    #[default]
    Newest,
    /// Most likes first, ties newest first.
    Popular,
}

impl SortView {
    pub fn as_str(self) -> &'static str {
        match self {
            SortView::Newest => ALL,
            SortView::Popular => "popular",
        }
    }
}

impl FromStr for SortView {
    type Err = ViewParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            ALL | "newest" => Ok(SortView::Newest),
            "popular" => Ok(SortView::Popular),
            other => Err(ViewParseError::UnknownView(other.to_string())),
        }
    }
}

impl fmt::Display for SortView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters and orders posts for display.
///
/// The sort is stable, so posts with equal keys keep the order the server
/// listed them in and the result is fully determined by the input.
pub fn visible_posts<'a>(
    posts: &'a [Post],
    filter: &CategoryFilter,
    view: SortView,
) -> Vec<&'a Post> {
    let mut visible: Vec<&Post> = posts.iter().filter(|p| filter.matches(p)).collect();
    match view {
        SortView::Newest => visible.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortView::Popular => visible.sort_by(|a, b| {
            b.likes
                .cmp(&a.likes)
                .then_with(|| b.created_at.cmp(&a.created_at))
        }),
    }
    visible
}

/// Client-only state of the feed, reset whenever the process starts.
#[derive(Debug, Default, Clone)]
pub struct ViewState {
    pub filter: CategoryFilter,
    pub view: SortView,
    /// Snapshot from the last successful listing.
    pub posts: Vec<Post>,
    /// Posts whose like control shows the "liked" state.
    pub liked: HashSet<PostId>,
}

impl ViewState {
    pub fn visible_posts(&self) -> Vec<&Post> {
        visible_posts(&self.posts, &self.filter, self.view)
    }

    /// Replaces the cached posts wholesale.
    ///
    /// Liked markers for posts that disappeared from the listing are dropped.
    pub fn replace_posts(&mut self, posts: Vec<Post>) {
        self.liked
            .retain(|id| posts.iter().any(|p| p.id == *id));
        self.posts = posts;
    }

    pub fn post_mut(&mut self, id: &PostId) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| p.id == *id)
    }

    pub fn is_liked(&self, id: &PostId) -> bool {
        self.liked.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Comment, SERVER_TIME_FORMAT};
    use chrono::NaiveDateTime;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn post(id: i64, category: &str, likes: u64, created_at: &str) -> Post {
        Post {
            id: PostId::from(id),
            category: category.to_string(),
            title: None,
            message: format!("message {id}"),
            likes,
            created_at: NaiveDateTime::parse_from_str(created_at, SERVER_TIME_FORMAT).unwrap(),
            comments: Vec::<Comment>::new(),
        }
    }

    fn ids(posts: &[&Post]) -> Vec<String> {
        posts.iter().map(|p| p.id.to_string()).collect()
    }

    fn fixture() -> Vec<Post> {
        vec![
            post(1, "rant", 5, "2024-01-01 10:00:00"),
            post(2, "crush", 9, "2024-01-03 10:00:00"),
            post(3, "rant", 5, "2024-01-04 10:00:00"),
            post(4, "advice", 0, "2024-01-02 10:00:00"),
        ]
    }

    #[test]
    fn test_newest_first() {
        let posts = fixture();
        let visible = visible_posts(&posts, &CategoryFilter::All, SortView::Newest);
        assert_eq!(ids(&visible), vec!["3", "2", "4", "1"]);
    }

    #[test]
    fn test_popular_ties_newest_first() {
        let posts = fixture();
        let visible = visible_posts(&posts, &CategoryFilter::All, SortView::Popular);
        assert_eq!(ids(&visible), vec!["2", "3", "1", "4"]);
    }

    #[test]
    fn test_filter_narrows_then_sorts() {
        let posts = fixture();
        let filter: CategoryFilter = "rant".parse().unwrap();
        let visible = visible_posts(&posts, &filter, SortView::Newest);
        assert_eq!(ids(&visible), vec!["3", "1"]);
    }

    #[test]
    fn test_filter_unknown_category_is_empty() {
        let posts = fixture();
        let filter = CategoryFilter::Category("missing".into());
        assert!(visible_posts(&posts, &filter, SortView::Popular).is_empty());
    }

    #[test]
    fn test_parse_controls() {
        assert_eq!("all".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
        assert_eq!(
            " crush ".parse::<CategoryFilter>(),
            Ok(CategoryFilter::Category("crush".into()))
        );
        assert_eq!("".parse::<CategoryFilter>(), Err(ViewParseError::EmptyFilter));
        assert_eq!("Popular".parse::<SortView>(), Ok(SortView::Popular));
        assert_eq!("all".parse::<SortView>(), Ok(SortView::Newest));
        assert!("hot".parse::<SortView>().is_err());
    }

    #[test]
    fn test_replace_posts_prunes_liked() {
        let mut state = ViewState::default();
        state.replace_posts(fixture());
        state.liked.insert(PostId::from(1));
        state.liked.insert(PostId::from(4));

        state.replace_posts(vec![post(1, "rant", 6, "2024-01-01 10:00:00")]);
        assert!(state.is_liked(&PostId::from(1)));
        assert!(!state.is_liked(&PostId::from(4)));
    }

    fn arb_posts() -> impl Strategy<Value = Vec<Post>> {
        prop::collection::vec(
            (
                prop::sample::select(vec!["rant", "crush", "advice"]),
                0u64..5,
                0u32..10,
            ),
            0..30,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (category, likes, day))| {
                    post(
                        i as i64,
                        category,
                        likes,
                        &format!("2024-02-{:02} 08:00:00", day + 1),
                    )
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_popular_order(posts in arb_posts()) {
            let visible = visible_posts(&posts, &CategoryFilter::All, SortView::Popular);
            prop_assert_eq!(visible.len(), posts.len());
            for pair in visible.windows(2) {
                prop_assert!(pair[0].likes >= pair[1].likes);
                if pair[0].likes == pair[1].likes {
                    prop_assert!(pair[0].created_at >= pair[1].created_at);
                }
            }
        }

        #[test]
        fn prop_filter_is_exact_and_keeps_order(
            posts in arb_posts(),
            category in prop::sample::select(vec!["rant", "crush", "advice"]),
            popular in any::<bool>(),
        ) {
            let view = if popular { SortView::Popular } else { SortView::Newest };
            let filter = CategoryFilter::Category(category.to_string());
            let filtered = visible_posts(&posts, &filter, view);
            let all = visible_posts(&posts, &CategoryFilter::All, view);

            prop_assert!(filtered.iter().all(|p| p.category == category));
            prop_assert_eq!(
                filtered.len(),
                posts.iter().filter(|p| p.category == category).count()
            );
            let expected: Vec<&PostId> = all
                .iter()
                .filter(|p| p.category == category)
                .map(|p| &p.id)
                .collect();
            let actual: Vec<&PostId> = filtered.iter().map(|p| &p.id).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
