use super::{format_age, format_time};
use crate::config::Context;
use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use tracing::{info, warn};
use wireframe_common::{Clock, SystemClock};
use wireframe_editor::DraftKey;

#[derive(Debug, Subcommand)]
pub enum DraftCommand {
    /// List local drafts
    List,

    /// Show one draft; omit the template for the unsaved new document
    Show { template: Option<String> },

    /// Delete a draft, or every draft with --all
    Clear {
        template: Option<String>,

        #[arg(long, conflicts_with = "template")]
        all: bool,
    },
}

pub async fn drafts(command: DraftCommand, ctx: &Context) -> Result<()> {
    let drafts = ctx.drafts()?;
    let now = SystemClock.now_millis();
    let freshness = ctx.config.timings.draft_freshness_ms;

    match command {
        DraftCommand::List => {
            let keys = drafts.keys()?;
            if keys.is_empty() {
                println!("{}", "No local drafts".yellow());
            }
            for key in keys {
                let draft = match drafts.load(&key) {
                    Ok(Some(draft)) => draft,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!(%key, error = %e, "skipping unreadable draft");
                        continue;
                    }
                };
                let age = draft.age(now);
                let state = if age <= freshness {
                    "fresh".green()
                } else {
                    "stale".dimmed()
                };
                println!(
                    "  {:<40} {}  {} ago",
                    key.to_string().bright_white(),
                    state,
                    format_age(age)
                );
            }
        }
        DraftCommand::Show { template } => {
            let key = DraftKey::for_document(template.as_deref());
            let Some(draft) = drafts.load(&key)? else {
                println!("{} no draft for {}", "⚠️".yellow(), key);
                return Ok(());
            };
            println!("{} {}", "Draft".bold(), key.to_string().bright_white());
            println!(
                "  saved {} ({} ago)",
                format_time(draft.payload.updated_at),
                format_age(draft.age(now))
            );
            println!("  theme {}", draft.payload.theme.name);
            for (viewport, state) in &draft.payload.viewports {
                println!(
                    "  {:<8} {:>3} components",
                    viewport.to_string().cyan(),
                    state.components.len()
                );
            }
        }
        DraftCommand::Clear { template, all } => {
            let keys = if all {
                drafts.keys()?
            } else {
                vec![DraftKey::for_document(template.as_deref())]
            };
            for key in keys {
                drafts.discard(&key)?;
                info!(%key, "draft cleared");
                println!("  {} Cleared {}", "✓".green(), key);
            }
        }
    }
    Ok(())
}
