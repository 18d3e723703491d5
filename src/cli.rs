use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "puckfeed", version, about = "Live NHL scores, game detail and news")]
pub struct Cli {
    #[command(flatten)]
    pub options: Options,

    #[command(subcommand)]
    pub command: Option<Mode>,
}

#[derive(Debug, Clone, Args)]
pub struct Options {
    /// Summarization / highlight API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "PUCKFEED_MODEL", global = true)]
    pub model: Option<String>,

    /// Seconds between live score polls
    #[arg(long, env = "PUCKFEED_POLL_SECS", default_value_t = 15, global = true)]
    pub poll_secs: u64,

    /// News items per page
    #[arg(long, env = "PUCKFEED_PAGE_SIZE", default_value_t = 6, global = true)]
    pub page_size: usize,

    /// Comma-separated news outlets to keep
    #[arg(long, env = "PUCKFEED_TRUSTED_SOURCES", value_delimiter = ',', global = true)]
    pub trusted_sources: Vec<String>,

    #[arg(long, env = "PUCKFEED_TOPIC", default_value = "NHL", global = true)]
    pub topic: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "PUCKFEED_TIMEOUT_SECS", default_value_t = 10, global = true)]
    pub timeout_secs: u64,

    #[arg(long, env = "PUCKFEED_NHL_BASE", global = true)]
    pub nhl_base: Option<String>,

    #[arg(long, env = "PUCKFEED_CONTENT_BASE", global = true)]
    pub content_base: Option<String>,

    #[arg(long, env = "PUCKFEED_GEMINI_BASE", global = true)]
    pub gemini_base: Option<String>,

    /// Overridden by RUST_LOG when set
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Mode {
    /// Print the schedule for a date as JSON and exit
    Scores {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print one game's detail as JSON and exit
    Game { id: i64 },
    /// Print summarized news as JSON and exit
    News {
        #[arg(long)]
        topic: Option<String>,
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Print current standings as JSON and exit
    Standings,
}
