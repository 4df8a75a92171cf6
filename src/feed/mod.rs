//! The feed controller and its supporting pieces.
//!
//! - [`state`] - client-only view state and the filter/sort rules
//! - [`controller`] - [`FeedController`], which keeps the page in step with
//!   the server
//! - [`poller`] - independent periodic refresh timers

mod controller;
mod poller;
mod state;

pub use controller::{ActionError, FeedController};
pub use poller::{PollSchedule, PollTarget, Poller};
pub use state::{visible_posts, CategoryFilter, SortView, ViewParseError, ViewState, ALL};
