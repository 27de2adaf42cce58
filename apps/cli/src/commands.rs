//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use sanstha_aggregator::FeedOutcome;
use sanstha_core::Sanstha;
use sanstha_shared::{
    AppConfig, AuthoredPost, Post, init_config, load_config, load_config_from, render_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Sanstha: aggregate marketing feeds and author posts with AI.
#[derive(Parser)]
#[command(
    name = "sanstha",
    version,
    about = "Aggregate marketing feeds and generate blog posts with a hosted model.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.sanstha/sanstha.toml.
    #[arg(long, env = "SANSTHA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Manage the registered feeds.
    Feeds {
        #[command(subcommand)]
        action: FeedsAction,
    },

    /// Aggregate all registered feeds into a ranked post list.
    Fetch {
        /// Print posts as JSON instead of a summary table.
        #[arg(long)]
        json: bool,
    },

    /// Generate and store a post about a topic.
    Generate {
        /// Topic to write about.
        topic: String,
    },

    /// Generate and store a post seeded by a random feed item.
    FeedPost,

    /// Store an admin-authored post.
    Create {
        #[arg(long)]
        title: String,

        /// Author name (defaults to "Admin").
        #[arg(long, default_value = "")]
        author: String,

        /// Body markup. Generated from the title when omitted.
        #[arg(long)]
        content: Option<String>,
    },

    /// Inspect or delete stored posts.
    Posts {
        #[command(subcommand)]
        action: PostsAction,
    },

    /// Generate a post from the feeds periodically until Ctrl-C.
    Schedule,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Feed registry subcommands.
#[derive(Subcommand)]
pub(crate) enum FeedsAction {
    /// List registered feeds.
    List,
    /// Register a feed URL.
    Add { url: String },
    /// Unregister a feed URL.
    Remove { url: String },
}

/// Post store subcommands.
#[derive(Subcommand)]
pub(crate) enum PostsAction {
    /// List stored posts, newest first.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Print one stored post as JSON.
    Show { id: String },
    /// Delete a stored post.
    Delete { id: String },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "sanstha=info",
        1 => "sanstha=debug",
        _ => "sanstha=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
        Command::Feeds { action } => {
            let app = Sanstha::open(&config).await?;
            match action {
                FeedsAction::List => cmd_feeds_list(&app).await,
                FeedsAction::Add { url } => cmd_feeds_add(&app, &url).await,
                FeedsAction::Remove { url } => cmd_feeds_remove(&app, &url).await,
            }
        }
        Command::Fetch { json } => cmd_fetch(&Sanstha::open(&config).await?, json).await,
        Command::Generate { topic } => cmd_generate(&Sanstha::open(&config).await?, &topic).await,
        Command::FeedPost => cmd_feed_post(&Sanstha::open(&config).await?).await,
        Command::Create {
            title,
            author,
            content,
        } => {
            let input = AuthoredPost {
                title,
                content: content.unwrap_or_default(),
                author,
            };
            cmd_create(&Sanstha::open(&config).await?, input).await
        }
        Command::Posts { action } => {
            let app = Sanstha::open(&config).await?;
            match action {
                PostsAction::List { json } => cmd_posts_list(&app, json).await,
                PostsAction::Show { id } => cmd_posts_show(&app, &id).await,
                PostsAction::Delete { id } => cmd_posts_delete(&app, &id).await,
            }
        }
        Command::Schedule => cmd_schedule(&Sanstha::open(&config).await?).await,
    }
}

// ---------------------------------------------------------------------------
// Spinner
// ---------------------------------------------------------------------------

/// Indeterminate spinner shown while waiting on the network.
struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    fn start(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }

    fn finish(self) {
        self.bar.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Feeds
// ---------------------------------------------------------------------------

async fn cmd_feeds_list(app: &Sanstha) -> Result<()> {
    let feeds = app.list_feeds().await;
    if feeds.is_empty() {
        println!("No feeds registered.");
    }
    for (i, feed) in feeds.iter().enumerate() {
        println!("{:>3}. {feed}", i + 1);
    }
    Ok(())
}

async fn cmd_feeds_add(app: &Sanstha, url: &str) -> Result<()> {
    if app.add_feed(url).await? {
        println!("Added {url}");
        Ok(())
    } else {
        Err(eyre!("'{url}' is not a valid feed URL or is already registered"))
    }
}

async fn cmd_feeds_remove(app: &Sanstha, url: &str) -> Result<()> {
    app.remove_feed(url).await?;
    println!("Removed {url}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Read path
// ---------------------------------------------------------------------------

async fn cmd_fetch(app: &Sanstha, json: bool) -> Result<()> {
    let spinner = Spinner::start("Fetching feeds");
    let report = app.fetch_report().await;
    spinner.finish();

    if json {
        println!("{}", serde_json::to_string_pretty(&report.posts)?);
        return Ok(());
    }

    println!();
    for outcome in &report.outcomes {
        match outcome {
            FeedOutcome::Posts { title, kept, .. } => println!("  ok    {title} ({kept} posts)"),
            FeedOutcome::NoRelevantItems { url, .. } => println!("  skip  {url} (nothing relevant)"),
            FeedOutcome::Unavailable { url, error } => println!("  fail  {url}: {error}"),
        }
    }
    println!();
    for post in &report.posts {
        print_post_line(post);
    }
    println!();
    println!(
        "  {} posts from {} feeds in {:.1}s",
        report.posts.len(),
        report.outcomes.len(),
        report.duration.as_secs_f64()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Write path
// ---------------------------------------------------------------------------

async fn cmd_generate(app: &Sanstha, topic: &str) -> Result<()> {
    info!(topic, "generating post");
    let spinner = Spinner::start("Generating post");
    let result = app.generate_post(topic).await;
    spinner.finish();
    print_created(&result?);
    Ok(())
}

async fn cmd_feed_post(app: &Sanstha) -> Result<()> {
    let spinner = Spinner::start("Generating post from a random feed item");
    let result = app.generate_from_feeds().await;
    spinner.finish();
    print_created(&result?);
    Ok(())
}

async fn cmd_create(app: &Sanstha, input: AuthoredPost) -> Result<()> {
    let spinner = Spinner::start("Creating post");
    let result = app.create_authored_post(input).await;
    spinner.finish();
    print_created(&result?);
    Ok(())
}

fn print_created(post: &Post) {
    println!();
    println!("  Post created!");
    println!("  ID:     {}", post.id);
    println!("  Title:  {}", post.title);
    println!("  Author: {}", post.author);
    println!("  Source: {}", post.source);
    println!("  Image:  {}", post.image_url);
    println!();
}

// ---------------------------------------------------------------------------
// Stored posts
// ---------------------------------------------------------------------------

async fn cmd_posts_list(app: &Sanstha, json: bool) -> Result<()> {
    let posts = app.list_stored_posts().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&posts)?);
        return Ok(());
    }
    if posts.is_empty() {
        println!("No stored posts.");
    }
    for post in &posts {
        println!("{}  {}", post.id, post.title);
    }
    Ok(())
}

async fn cmd_posts_show(app: &Sanstha, id: &str) -> Result<()> {
    let post = app
        .get_stored_post(id)
        .await
        .ok_or_else(|| eyre!("no stored post with id '{id}'"))?;
    println!("{}", serde_json::to_string_pretty(&post)?);
    Ok(())
}

async fn cmd_posts_delete(app: &Sanstha, id: &str) -> Result<()> {
    if app.delete_stored_post(id).await? {
        println!("Deleted {id}");
        Ok(())
    } else {
        Err(eyre!("no stored post with id '{id}'"))
    }
}

fn print_post_line(post: &Post) {
    println!("  {:<10} {}  [{}]", post.published_date, post.title, post.source);
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

async fn cmd_schedule(app: &Sanstha) -> Result<()> {
    let handle = app.arm_scheduler()?;
    println!(
        "Scheduler armed: one post every {}h. Press Ctrl-C to stop.",
        app.scheduler_period().as_secs() / 3600
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| eyre!("failed to listen for Ctrl-C: {e}"))?;

    handle.stop().await;
    println!("Scheduler stopped.");
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    println!("{}", render_config(config)?);
    Ok(())
}
