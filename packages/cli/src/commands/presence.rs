use super::{format_age, format_time};
use crate::config::Context;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use wireframe_common::{Clock, SystemClock};
use wireframe_workspace::DocumentStore;

#[derive(Debug, Args)]
pub struct PresenceArgs {
    pub template: String,

    /// Include records past their TTL
    #[arg(long)]
    pub all: bool,
}

pub async fn presence(args: PresenceArgs, ctx: &Context) -> Result<()> {
    let now = SystemClock.now_millis();
    let ttl = ctx.config.timings.presence_ttl_ms;
    let mut records = ctx
        .store()
        .list_presence(&ctx.template(&args.template))
        .await?;
    if !args.all {
        records.retain(|r| r.is_live(now, ttl));
    }

    if records.is_empty() {
        println!("{}", "Nobody here".yellow());
        return Ok(());
    }

    for record in records {
        let status = if record.is_live(now, ttl) {
            "live".green()
        } else {
            "stale".dimmed()
        };
        println!(
            "  {} {:<20} {:<8} cursor ({:.2}, {:.2})  {}  {} ({} ago)",
            status,
            record.display_name.bright_white(),
            record.viewport.to_string().cyan(),
            record.cursor.x,
            record.cursor.y,
            record.color.dimmed(),
            format_time(record.last_active).dimmed(),
            format_age(now - record.last_active)
        );
        if let Some(selected) = &record.selected_component_id {
            println!("      selected {}", selected);
        }
    }
    Ok(())
}
