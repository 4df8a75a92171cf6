//! Command parsing for the interactive session.
//!
//! Each stdin line is one command. Parsing is pure; dispatching to the
//! feed controller happens in the loop runner.

use crate::api::{NewPost, PostId};
use crate::feed::{CategoryFilter, PollTarget, SortView, ViewParseError};
use thiserror::Error;

/// Separator between the fields of a `post` command.
const FIELD_SEPARATOR: char = '|';

/// Usage lines, also printed by `help`.
pub const HELP_TEXT: &str = "\
Commands:
  like <id>                          toggle your like on a post
  comment <id> <text>                add a comment to a post
  post <category> | [title |] <msg>  create a post (\\n for a line break)
  filter <category|all>              show one category
  view <all|popular>                 sort newest first or by likes
  refresh [posts|stats|trending]     fetch now instead of waiting
  show                               list the visible posts
  help                               print this text
  quit                               leave the session";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// First word is not a known command.
    #[error("Unknown command '{0}'. Type 'help' for the list of commands")]
    Unknown(String),

    /// A required argument is missing.
    #[error("Usage: {0}")]
    Usage(&'static str),

    /// Filter or view value could not be parsed.
    #[error(transparent)]
    View(#[from] ViewParseError),

    /// `refresh` was given something other than posts, stats or trending.
    #[error("Unknown refresh target '{0}' (expected posts, stats or trending)")]
    UnknownTarget(String),
}

/// A parsed session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Like(PostId),
    Comment { id: PostId, text: String },
    Post(NewPost),
    Filter(CategoryFilter),
    View(SortView),
    /// `None` refreshes everything.
    Refresh(Option<PollTarget>),
    Show,
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "like" => Command::Like(parse_id(rest, "like <id>")?),
        "comment" => {
            let (id, text) = match rest.split_once(char::is_whitespace) {
                Some((id, text)) => (id, text.trim()),
                None => (rest, ""),
            };
            Command::Comment {
                id: parse_id(id, "comment <id> <text>")?,
                text: text.to_string(),
            }
        }
        "post" => Command::Post(parse_post(rest)?),
        "filter" => {
            if rest.is_empty() {
                return Err(CommandError::Usage("filter <category|all>"));
            }
            Command::Filter(rest.parse()?)
        }
        "view" | "sort" => {
            if rest.is_empty() {
                return Err(CommandError::Usage("view <all|popular>"));
            }
            Command::View(rest.parse()?)
        }
        "refresh" | "r" => Command::Refresh(parse_target(rest)?),
        "show" | "ls" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

fn parse_id(raw: &str, usage: &'static str) -> Result<PostId, CommandError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains(char::is_whitespace) {
        return Err(CommandError::Usage(usage));
    }
    Ok(PostId::new(raw))
}

/// `category | message` or `category | title | message`.
///
/// Empty fields are passed through so the controller can report which one
/// is missing. Only the first two separators split; a message may contain
/// `|` itself.
fn parse_post(rest: &str) -> Result<NewPost, CommandError> {
    const USAGE: &str = "post <category> | [title |] <message>";

    let fields: Vec<&str> = rest.splitn(3, FIELD_SEPARATOR).map(str::trim).collect();
    let (category, title, message) = match fields.as_slice() {
        [category, message] => (*category, "", *message),
        [category, title, message] => (*category, *title, *message),
        _ => return Err(CommandError::Usage(USAGE)),
    };

    Ok(NewPost {
        category: category.to_string(),
        title: title.to_string(),
        message: message.replace("\\n", "\n"),
    })
}

fn parse_target(rest: &str) -> Result<Option<PollTarget>, CommandError> {
    match rest.to_ascii_lowercase().as_str() {
        "" | "all" => Ok(None),
        "posts" => Ok(Some(PollTarget::Posts)),
        "stats" => Ok(Some(PollTarget::Stats)),
        "trending" => Ok(Some(PollTarget::Trending)),
        other => Err(CommandError::UnknownTarget(other.to_string())),
    }
}
