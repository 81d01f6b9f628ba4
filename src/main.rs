//! openwatch - watch a web page and get alerted the moment it opens

use clap::Parser;
use tracing_subscriber::EnvFilter;

use openwatch::cli::{Cli, Commands, NotifyCommands};
use openwatch::error::Result;

mod commands;
mod utils;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        if let Some(hint) = e.hint() {
            eprintln!("\n{}", hint);
        }
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr; OPENWATCH_LOG takes precedence over --log-level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_env("OPENWATCH_LOG")
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        // Monitor management
        Commands::Add {
            url,
            name,
            search,
            regex,
            case_sensitive,
            interval,
            selector,
            html,
            headers,
        } => commands::cmd_add(
            url, name, search, regex, case_sensitive, interval, selector, html, headers,
        ),
        Commands::List { json } => commands::cmd_list(json),
        Commands::Show { monitor, json } => commands::cmd_show(&monitor, json),
        Commands::Edit {
            monitor,
            name,
            url,
            search,
            regex,
            interval,
            selector,
            html,
            text,
            enabled,
        } => commands::cmd_edit(
            &monitor, name, url, search, regex, interval, selector, html, text, enabled,
        ),
        Commands::Pause { monitor } => commands::cmd_set_enabled(&monitor, false),
        Commands::Resume { monitor } => commands::cmd_set_enabled(&monitor, true),
        Commands::Remove { monitor, yes } => commands::cmd_remove(&monitor, yes),

        // Checking
        Commands::Check { monitor, json } => commands::cmd_check(&monitor, json),
        Commands::History { monitor, json } => commands::cmd_history(&monitor, json),
        Commands::Run => commands::cmd_run(),
        Commands::Daemon { count } => commands::cmd_daemon(count),
        Commands::Watch { url, search, regex, interval } => {
            commands::cmd_watch(&url, &search, regex, &interval)
        }

        // Notifications
        Commands::Notify(NotifyCommands::Set {
            ntfy,
            slack,
            discord,
            gotify_server,
            gotify_token,
            telegram_token,
            telegram_chat,
            command,
            clear,
        }) => commands::cmd_notify_set(
            ntfy, slack, discord, gotify_server, gotify_token,
            telegram_token, telegram_chat, command, clear,
        ),
        Commands::Notify(NotifyCommands::Show) => commands::cmd_notify_show(),
        Commands::Notify(NotifyCommands::Test) => commands::cmd_notify_test(),
        Commands::Notify(NotifyCommands::Quiet { start, end, disable }) => {
            commands::cmd_notify_quiet(start, end, disable)
        }

        Commands::Completions { shell } => commands::cmd_completions(shell),
    }
}
