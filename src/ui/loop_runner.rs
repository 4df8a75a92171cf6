//! Main event loop for the interactive session.
//!
//! Multiplexes shutdown signals, stdin command lines and poll timer ticks
//! into one task that owns the feed controller.

use crate::feed::{FeedController, PollSchedule, PollTarget, Poller};
use crate::util::{strip_control_chars, truncate_chars};
use anyhow::{Context, Result};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::input::{parse_command, Command, HELP_TEXT};
use super::page_file::atomic_write;

/// Message previews in `show` are cut to this many characters.
const SUMMARY_PREVIEW_CHARS: usize = 120;

/// Result of handling one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep reading commands.
    Continue,
    /// Leave the session.
    Quit,
}

/// Settings for [`run`] and [`run_with`].
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub schedule: PollSchedule,
    /// Where the rendered page is kept up to date, if anywhere.
    pub output: Option<PathBuf>,
    /// Open `output` in the default browser after the initial load.
    pub open_page: bool,
}

/// Name of the signal that asked the session to end.
pub type ShutdownRx = mpsc::Receiver<&'static str>;

/// One unit of work for the session loop.
enum Event {
    Line(String),
    Poll(PollTarget),
}

/// Runs the interactive session on stdin/stdout until `quit`, end of
/// input or a signal.
pub async fn run(controller: &mut FeedController, options: SessionOptions) -> Result<()> {
    let shutdown = listen_for_shutdown()?;
    let input = BufReader::new(tokio::io::stdin());
    run_with(controller, options, input, shutdown, &mut std::io::stdout()).await
}

/// Forwards the first SIGTERM / SIGINT (Ctrl-C elsewhere) into a channel.
///
/// Installing the handlers replaces the default "terminate" action, so the
/// session must watch the channel at every await point.
fn listen_for_shutdown() -> Result<ShutdownRx> {
    let (tx, rx) = mpsc::channel(1);

    #[cfg(unix)]
    {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            let name = tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
            };
            let _ = tx.send(name).await;
        });
    }

    #[cfg(not(unix))]
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send("Ctrl-C").await;
        }
    });

    Ok(rx)
}

/// Session loop over any line source and output.
///
/// Uses `tokio::select!` to multiplex three event sources:
/// - **Shutdown**: a signal name from `shutdown` ends the session
/// - **Input**: one command per line
/// - **Poll timers**: posts, stats and trending refresh ticks
///
/// Requests run inline on this task, so a slow server delays the next
/// command rather than racing it. Each handler is itself raced against
/// `shutdown`, so a hung request never blocks exit. The page file is
/// rewritten after every handled event.
pub async fn run_with<R, W>(
    controller: &mut FeedController,
    options: SessionOptions,
    input: R,
    mut shutdown: ShutdownRx,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if interruptible(&mut shutdown, controller.initialize())
        .await
        .is_none()
    {
        return Ok(());
    }

    if let Some(path) = &options.output {
        atomic_write(path, controller.page().to_html().as_bytes())
            .with_context(|| format!("Failed to write page to '{}'", path.display()))?;
        say(out, &format!("Page written to {}", path.display()));
        if options.open_page {
            if let Err(e) = open::that(path) {
                tracing::warn!(path = %path.display(), error = %e, "Failed to open page");
            }
        }
    }

    let (poll_tx, mut poll_rx) = mpsc::channel::<PollTarget>(8);
    let mut poller = Poller::start(options.schedule, poll_tx);
    let mut lines = input.lines();

    say(out, "Type 'help' for commands.");
    prompt(out);

    loop {
        let event = tokio::select! {
            biased;

            Some(name) = shutdown.recv() => {
                tracing::info!(signal = name, "Received shutdown signal, shutting down gracefully");
                break;
            }

            line = lines.next_line() => match line {
                Ok(Some(line)) => Event::Line(line),
                Ok(None) => {
                    tracing::debug!("Input closed, ending session");
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read input");
                    break;
                }
            },

            Some(target) = poll_rx.recv() => Event::Poll(target),
        };

        let handled = handle_event(controller, &mut poller, event, out);
        let Some(action) = interruptible(&mut shutdown, handled).await else {
            break;
        };
        if action == Action::Quit {
            break;
        }

        if let Some(path) = &options.output {
            write_page(controller, path);
        }
    }

    poller.shutdown();
    if let Some(path) = &options.output {
        write_page(controller, path);
    }
    Ok(())
}

/// Runs `work` to completion unless a shutdown signal arrives first.
async fn interruptible<F: Future>(shutdown: &mut ShutdownRx, work: F) -> Option<F::Output> {
    tokio::select! {
        biased;

        Some(name) = shutdown.recv() => {
            tracing::info!(signal = name, "Received shutdown signal, abandoning request in flight");
            None
        }

        output = work => Some(output),
    }
}

async fn handle_event<W: Write>(
    controller: &mut FeedController,
    poller: &mut Poller,
    event: Event,
    out: &mut W,
) -> Action {
    match event {
        Event::Line(line) => {
            let action = match parse_command(&line) {
                Ok(Some(command)) => {
                    if let Command::Refresh(target) = command {
                        match target {
                            Some(target) => poller.restart(target),
                            None => PollTarget::ALL.into_iter().for_each(|t| poller.restart(t)),
                        }
                    }
                    handle_command(controller, command, out).await
                }
                Ok(None) => Action::Continue,
                Err(e) => {
                    say(out, &e.to_string());
                    Action::Continue
                }
            };
            if action == Action::Continue {
                prompt(out);
            }
            action
        }
        Event::Poll(target) => {
            tracing::debug!(?target, "Poll tick");
            refresh(controller, target).await;
            Action::Continue
        }
    }
}

/// Executes one command against the controller, writing notices to `out`.
pub async fn handle_command<W: Write>(
    controller: &mut FeedController,
    command: Command,
    out: &mut W,
) -> Action {
    match command {
        Command::Like(id) => match controller.toggle_like(&id).await {
            Ok(response) => say(
                out,
                &format!(
                    "{} ({} likes)",
                    strip_control_chars(&response.message),
                    response.likes
                ),
            ),
            Err(e) => say(out, &strip_control_chars(&e.to_string())),
        },
        Command::Comment { id, text } => match controller.submit_comment(&id, &text).await {
            Ok(_) => say(out, &format!("Comment added to #{id}")),
            Err(e) => say(out, &strip_control_chars(&e.to_string())),
        },
        Command::Post(draft) => match controller.submit_post(draft).await {
            Ok(()) => say(out, "Posted."),
            Err(e) => say(out, &strip_control_chars(&e.to_string())),
        },
        Command::Filter(filter) => {
            controller.set_filter(filter);
            say(out, &summary(controller));
        }
        Command::View(view) => {
            controller.set_view(view);
            say(out, &summary(controller));
        }
        Command::Refresh(Some(target)) => refresh(controller, target).await,
        Command::Refresh(None) => controller.initialize().await,
        Command::Show => say(out, &summary(controller)),
        Command::Help => say(out, HELP_TEXT),
        Command::Quit => return Action::Quit,
    }
    Action::Continue
}

async fn refresh(controller: &mut FeedController, target: PollTarget) {
    match target {
        PollTarget::Posts => {
            controller.fetch_posts().await;
        }
        PollTarget::Stats => controller.fetch_stats().await,
        PollTarget::Trending => controller.fetch_trending().await,
    }
}

/// Plain-text listing of the visible posts, safe to print to a terminal.
pub fn summary(controller: &FeedController) -> String {
    let state = controller.state();
    let visible = state.visible_posts();

    let mut text = format!(
        "Filter: {} | View: {} | {} of {} posts",
        strip_control_chars(state.filter.as_str()),
        state.view.as_str(),
        visible.len(),
        state.posts.len()
    );

    let stats = &controller.page().stats;
    if stats.is_present() {
        let value = |region: &Option<crate::page::Region>| {
            region
                .as_ref()
                .map(|r| r.html.clone())
                .unwrap_or_else(|| "-".to_string())
        };
        text.push_str(&format!(
            "\nThis week: {} | Likes: {} | Comments: {}",
            value(&stats.posts_this_week),
            value(&stats.total_likes),
            value(&stats.total_comments)
        ));
    }

    if visible.is_empty() {
        text.push_str("\n(no posts)");
        return text;
    }

    for post in visible {
        let heart = if state.is_liked(&post.id) { "💖" } else { "❤️" };
        text.push_str(&format!(
            "\n#{} [{}] {}  {}  {} {}  💬 {}",
            post.id,
            strip_control_chars(&post.category),
            strip_control_chars(post.display_title().unwrap_or("No Title")),
            post.created_at.format("%Y-%m-%d %H:%M"),
            heart,
            post.likes,
            post.comments.len()
        ));
        let message = post.message.replace(|c: char| c == '\r' || c == '\n', " ");
        let message = strip_control_chars(&message);
        text.push_str(&format!(
            "\n    {}",
            truncate_chars(&message, SUMMARY_PREVIEW_CHARS)
        ));
    }
    text
}

fn write_page(controller: &FeedController, path: &Path) {
    if let Err(e) = atomic_write(path, controller.page().to_html().as_bytes()) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to write page");
    }
}

fn say<W: Write>(out: &mut W, message: &str) {
    if let Err(e) = writeln!(out, "{message}") {
        tracing::debug!(error = %e, "Failed to write to output");
    }
}

fn prompt<W: Write>(out: &mut W) {
    let _ = write!(out, "> ");
    let _ = out.flush();
}
