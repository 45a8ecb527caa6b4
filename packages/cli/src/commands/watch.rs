use super::format_time;
use crate::config::Context;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::info;
use wireframe_editor::Viewport;
use wireframe_workspace::DocumentStore;

#[derive(Debug, Args)]
pub struct WatchArgs {
    pub template: String,
}

/// Print every stored revision of a template until interrupted
pub async fn watch(args: WatchArgs, ctx: &Context) -> Result<()> {
    let template = ctx.template(&args.template);
    let mut feed = ctx.store().subscribe(&template).await?;
    println!("{} {} (ctrl-c to stop)", "👀 Watching".bright_blue().bold(), template);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            record = feed.next() => {
                let Some(record) = record else { break };
                let document = record.to_document();
                let counts = Viewport::ALL
                    .iter()
                    .map(|v| format!("{}:{}", v, document.components(*v).len()))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("  {}  {}", format_time(record.updated_at).dimmed(), counts);
            }
        }
    }

    feed.unsubscribe();
    info!(%template, "stopped watching");
    Ok(())
}
