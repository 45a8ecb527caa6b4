use super::format_time;
use crate::config::Context;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use wireframe_editor::ChangeAction;
use wireframe_workspace::DocumentStore;

#[derive(Debug, Args)]
pub struct LogArgs {
    pub template: String,

    /// Number of entries to show
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

pub async fn log(args: LogArgs, ctx: &Context) -> Result<()> {
    let entries = ctx
        .store()
        .recent_changes(&ctx.template(&args.template), args.limit)
        .await?;

    if entries.is_empty() {
        println!("{}", "No changes recorded".yellow());
        return Ok(());
    }

    for entry in entries {
        let action = match entry.action {
            ChangeAction::Add => entry.action.to_string().green(),
            ChangeAction::Delete => entry.action.to_string().red(),
            _ => entry.action.to_string().yellow(),
        };
        let who = if entry.actor_name.is_empty() {
            &entry.actor_id
        } else {
            &entry.actor_name
        };
        println!(
            "  {}  {:<16} {:<7} {} ({})",
            format_time(entry.timestamp).dimmed(),
            who,
            action,
            entry.component_id.bright_white(),
            entry.viewport
        );
    }
    Ok(())
}
