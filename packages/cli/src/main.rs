mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    drafts, init, log, prefs, presence, template, versions, watch, DraftCommand, InitArgs,
    LogArgs, PrefsCommand, PresenceArgs, TemplateCommand, VersionCommand, WatchArgs,
};
use config::Context;
use tracing_subscriber::EnvFilter;

/// Wireframe CLI - inspect and manage wireframe templates
#[derive(Parser, Debug)]
#[command(name = "wireframe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a wireframe workspace in the current directory
    Init(InitArgs),

    /// Create, list, edit, rename and delete templates
    Template {
        #[command(subcommand)]
        command: TemplateCommand,
    },

    /// Version snapshots
    Versions {
        #[command(subcommand)]
        command: VersionCommand,
    },

    /// Recent change log entries
    Log(LogArgs),

    /// Who is in a template right now
    Presence(PresenceArgs),

    /// Local autosave drafts
    Drafts {
        #[command(subcommand)]
        command: DraftCommand,
    },

    /// Follow a template's stored revisions
    Watch(WatchArgs),

    /// Grid, snapping, theme mode and saved themes
    Prefs {
        #[command(subcommand)]
        command: PrefsCommand,
    },
}

async fn run(command: Command, cwd: &std::path::Path) -> anyhow::Result<()> {
    if let Command::Init(args) = command {
        return init(args, cwd);
    }

    let ctx = Context::load(cwd)?;
    tracing::debug!(project = %ctx.config.project_id, user = %ctx.config.user.id, "loaded workspace config");
    match command {
        Command::Init(_) => Ok(()),
        Command::Template { command } => template(command, &ctx).await,
        Command::Versions { command } => versions(command, &ctx).await,
        Command::Log(args) => log(args, &ctx).await,
        Command::Presence(args) => presence(args, &ctx).await,
        Command::Drafts { command } => drafts(command, &ctx).await,
        Command::Watch(args) => watch(args, &ctx).await,
        Command::Prefs { command } => prefs(command, &ctx).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match std::env::current_dir() {
        Ok(cwd) => run(cli.command, &cwd).await,
        Err(e) => Err(anyhow::anyhow!("Cannot get current directory: {}", e)),
    };

    if let Err(err) = result {
        tracing::debug!(error = ?err, "command failed");
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
