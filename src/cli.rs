use clap::{Parser, Subcommand, ValueEnum};

/// Shell types for completion generation
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

#[derive(Parser)]
#[command(name = "openwatch")]
#[command(author, version, about = "Watch a web page and get alerted the moment it opens", long_about = None)]
#[command(after_help = r#"Examples:
  openwatch add https://www.stc.com/products/tip-gdp --name "TIP GDP"
  openwatch check "TIP GDP"                        Check now
  openwatch history "TIP GDP"                      Last 10 results
  openwatch notify set --ntfy my-alerts            Where alerts go
  openwatch daemon                                 Keep checking until Ctrl+C
"#)]
pub struct Cli {
    /// Log level when OPENWATCH_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a monitor
    #[command(after_help = r#"Examples:
  openwatch add https://example.com/product --search "in stock"
  openwatch add https://example.com --regex --search "(?i)applications\s+open"
  openwatch add https://example.com --selector ".status" --interval 5
"#)]
    Add {
        /// URL to check
        #[arg(value_name = "URL", default_value = "https://www.stc.com/products/tip-gdp")]
        url: String,

        /// Monitor name (defaults to the URL host)
        #[arg(long)]
        name: Option<String>,

        /// Text whose presence means the page is open
        #[arg(long, default_value = "now open")]
        search: String,

        /// Treat the search text as a regular expression
        #[arg(long)]
        regex: bool,

        /// Match case exactly (substring mode only)
        #[arg(long, conflicts_with = "regex")]
        case_sensitive: bool,

        /// Check interval in minutes: 1, 5, 15, 30 or 60
        #[arg(short, long)]
        interval: Option<String>,

        /// Only match text inside elements matching this CSS selector
        #[arg(long, conflicts_with = "html")]
        selector: Option<String>,

        /// Match against the raw HTML instead of visible text
        #[arg(long)]
        html: bool,

        /// Extra request header, "Name: value" (repeatable)
        #[arg(long = "header", value_name = "NAME: VALUE")]
        headers: Vec<String>,
    },

    /// List monitors with their current status
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show details of a monitor
    Show {
        /// Monitor ID or name
        #[arg(value_name = "ID_OR_NAME")]
        monitor: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change a monitor's settings
    Edit {
        /// Monitor ID or name
        #[arg(value_name = "ID_OR_NAME")]
        monitor: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New URL
        #[arg(long)]
        url: Option<String>,

        /// New search text
        #[arg(long)]
        search: Option<String>,

        /// Interpret the search text as a regex (true) or plain text (false)
        #[arg(long)]
        regex: Option<bool>,

        /// New interval in minutes: 1, 5, 15, 30 or 60
        #[arg(short, long)]
        interval: Option<String>,

        /// Match only inside this CSS selector
        #[arg(long, conflicts_with_all = ["html", "text"])]
        selector: Option<String>,

        /// Match against the raw HTML
        #[arg(long, conflicts_with = "text")]
        html: bool,

        /// Match against the visible page text
        #[arg(long)]
        text: bool,

        /// Enable or disable the monitor
        #[arg(long)]
        enabled: Option<bool>,
    },

    /// Pause a monitor
    Pause {
        #[arg(value_name = "ID_OR_NAME")]
        monitor: String,
    },

    /// Resume a paused monitor
    Resume {
        #[arg(value_name = "ID_OR_NAME")]
        monitor: String,
    },

    /// Delete a monitor and its history
    Remove {
        #[arg(value_name = "ID_OR_NAME")]
        monitor: String,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Check a monitor now and record the result
    Check {
        #[arg(value_name = "ID_OR_NAME")]
        monitor: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the status history of a monitor (newest first)
    History {
        #[arg(value_name = "ID_OR_NAME")]
        monitor: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check all enabled monitors once (for cron)
    Run,

    /// Check all enabled monitors on their intervals until Ctrl+C
    Daemon {
        /// Stop after this many checks
        #[arg(long)]
        count: Option<usize>,
    },

    /// Watch a URL without saving anything
    #[command(after_help = r#"Examples:
  openwatch watch https://example.com --search "now open" --interval 1
"#)]
    Watch {
        #[arg(value_name = "URL")]
        url: String,

        /// Text whose presence means the page is open
        #[arg(long, default_value = "now open")]
        search: String,

        /// Treat the search text as a regular expression
        #[arg(long)]
        regex: bool,

        /// Check interval in minutes: 1, 5, 15, 30 or 60
        #[arg(short, long, default_value = "1")]
        interval: String,
    },

    /// Manage notification settings
    #[command(subcommand, after_help = r#"Examples:
  openwatch notify set --ntfy my-alerts       Use ntfy.sh
  openwatch notify set --command "notify-send 'Page open'"
  openwatch notify show                       Show current settings
  openwatch notify test                       Send a test alert
  openwatch notify quiet --start 22:00 --end 08:00
"#)]
    Notify(NotifyCommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
pub enum NotifyCommands {
    /// Set the default notification target
    Set {
        /// ntfy topic (e.g., my-topic or https://ntfy.sh/my-topic)
        #[arg(long)]
        ntfy: Option<String>,

        /// Slack webhook URL
        #[arg(long)]
        slack: Option<String>,

        /// Discord webhook URL
        #[arg(long)]
        discord: Option<String>,

        /// Gotify server URL (e.g., https://gotify.example.com)
        #[arg(long)]
        gotify_server: Option<String>,

        /// Gotify application token
        #[arg(long)]
        gotify_token: Option<String>,

        /// Telegram bot token
        #[arg(long)]
        telegram_token: Option<String>,

        /// Telegram chat ID
        #[arg(long)]
        telegram_chat: Option<String>,

        /// Custom command to execute (receives JSON on stdin)
        #[arg(long)]
        command: Option<String>,

        /// Remove the notification target
        #[arg(long)]
        clear: bool,
    },

    /// Show current notification settings
    Show,

    /// Send a test notification
    Test,

    /// Configure quiet hours (suppress notifications during this time)
    Quiet {
        /// Start time in HH:MM format (e.g., "22:00")
        #[arg(long)]
        start: Option<String>,

        /// End time in HH:MM format (e.g., "08:00")
        #[arg(long)]
        end: Option<String>,

        /// Disable quiet hours
        #[arg(long)]
        disable: bool,
    },
}
