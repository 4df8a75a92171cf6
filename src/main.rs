use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use confide::api::{BoardClient, NewPost, PostId};
use confide::config::Config;
use confide::feed::{CategoryFilter, FeedController, SortView};
use confide::page::Page;
use confide::ui::{self, SessionOptions};
use confide::util::{strip_control_chars, validate_base_url};

/// Get the config directory path (~/.config/confide/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("confide");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(name = "confide", about = "Terminal client for an anonymous confession board")]
struct Args {
    /// Board address (overrides config file and CONFIDE_BASE_URL)
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,

    /// Config file (default: ~/.config/confide/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Leave the stats panel out of the page
    #[arg(long, global = true)]
    no_stats: bool,

    /// Leave the trending panel out of the page
    #[arg(long, global = true)]
    no_trending: bool,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Interactive session with periodic refresh (default)
    Watch {
        /// Keep the rendered page in this file (default: ~/.config/confide/board.html)
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Open the page in the default browser after the first load
        #[arg(long)]
        open: bool,
    },
    /// Load the board once and print the page HTML
    Render {
        /// Category to show, or "all"
        #[arg(long, default_value = "all")]
        filter: String,

        /// "all" (newest first) or "popular"
        #[arg(long, default_value = "all")]
        view: String,
    },
    /// Create a post
    Post {
        #[arg(long)]
        category: String,

        #[arg(long, default_value = "")]
        title: String,

        message: String,
    },
    /// Toggle your like on a post
    Like { id: String },
    /// Comment on a post
    Comment { id: String, text: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for page output and the prompt
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config_dir = get_config_dir()?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?
        .with_env_overrides();
    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    if args.no_stats {
        config.show_stats = false;
    }
    if args.no_trending {
        config.show_trending = false;
    }

    let base = validate_base_url(&config.base_url)
        .with_context(|| format!("Invalid board address '{}'", config.base_url))?;
    let client = BoardClient::new(base, config.request_timeout())
        .context("Failed to create HTTP client")?;
    let page = Page::new(config.page_layout(), &config.categories);
    let mut controller = FeedController::new(client, page, config.timestamp_format.clone());

    match args.command.unwrap_or(CliCommand::Watch {
        output: None,
        open: false,
    }) {
        CliCommand::Watch { output, open } => {
            let output = match output {
                Some(path) => path,
                None => {
                    if !config_dir.exists() {
                        std::fs::create_dir_all(&config_dir)
                            .context("Failed to create config directory")?;
                    }
                    config_dir.join("board.html")
                }
            };
            let options = SessionOptions {
                schedule: config.poll_schedule(),
                output: Some(output),
                open_page: open,
            };
            ui::run(&mut controller, options).await?;
            println!("Goodbye!");
        }
        CliCommand::Render { filter, view } => {
            let filter: CategoryFilter = filter.parse()?;
            let view: SortView = view.parse()?;
            controller.initialize().await;
            controller.set_filter(filter);
            controller.set_view(view);
            print!("{}", controller.page().to_html());
        }
        CliCommand::Post {
            category,
            title,
            message,
        } => {
            controller
                .submit_post(NewPost {
                    category,
                    title,
                    message,
                })
                .await?;
            println!("Posted.");
        }
        CliCommand::Like { id } => {
            let response = controller.toggle_like(&PostId::new(id)).await?;
            println!(
                "{} ({} likes)",
                strip_control_chars(&response.message),
                response.likes
            );
        }
        CliCommand::Comment { id, text } => {
            let id = PostId::new(id);
            let comment = controller.submit_comment(&id, &text).await?;
            println!(
                "Comment added to #{id}: {}",
                strip_control_chars(&comment.text)
            );
        }
    }

    Ok(())
}
