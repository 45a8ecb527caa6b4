use super::{format_time, open_for_write};
use crate::config::Context;
use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use tracing::info;
use wireframe_editor::SnapshotKind;
use wireframe_workspace::VersionService;

#[derive(Debug, Subcommand)]
pub enum VersionCommand {
    /// List snapshots, newest first
    List { template: String },

    /// Snapshot the template as it is stored now
    Create {
        template: String,

        #[arg(short, long, default_value = "Manual snapshot")]
        message: String,
    },

    /// Restore a snapshot; the current state is kept as a pre-restore snapshot
    Restore { template: String, version: String },

    /// Component count and canvas size deltas between two snapshots
    Compare {
        template: String,
        from: String,
        to: String,
    },
}

pub async fn versions(command: VersionCommand, ctx: &Context) -> Result<()> {
    match command {
        VersionCommand::List { template } => {
            let service = VersionService::new(ctx.store());
            let snapshots = service.list(&ctx.template(&template)).await?;
            if snapshots.is_empty() {
                println!("{}", "No versions yet".yellow());
            }
            for snapshot in snapshots {
                let marker = match snapshot.kind() {
                    SnapshotKind::PreRestore => "pre-restore".magenta(),
                    SnapshotKind::Manual => "manual".normal(),
                };
                let counts = snapshot
                    .component_counts()
                    .iter()
                    .map(|(viewport, count)| format!("{}:{}", viewport, count))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!(
                    "  {}  {}  {}  {}  {}",
                    snapshot.id().bright_white(),
                    format_time(snapshot.created_at()).dimmed(),
                    marker,
                    snapshot.message(),
                    counts.dimmed()
                );
            }
        }
        VersionCommand::Create { template, message } => {
            let mut client = ctx.client()?;
            open_for_write(&mut client, &template).await?;
            let snapshot = client.create_version(&message).await?;
            client.close().await;
            info!(%template, version = snapshot.id(), "version created");
            println!("  {} Created version {}", "✓".green(), snapshot.id().bright_white());
        }
        VersionCommand::Restore { template, version } => {
            let mut client = ctx.client()?;
            open_for_write(&mut client, &template).await?;
            let marker = client.restore_version(&version).await?;
            client.close().await;
            info!(%template, %version, marker = marker.id(), "version restored");
            println!("  {} Restored {}", "✓".green(), version.bright_white());
            println!("    previous state saved as {}", marker.id().dimmed());
        }
        VersionCommand::Compare { template, from, to } => {
            let service = VersionService::new(ctx.store());
            let diff = service.compare(&ctx.template(&template), &from, &to).await?;
            if diff.is_unchanged() {
                println!("{}", "No structural differences".green());
                return Ok(());
            }
            for (viewport, delta) in &diff.viewports {
                if delta.is_zero() {
                    continue;
                }
                println!(
                    "  {:<8} components {:+}  canvas {:+}x{:+}",
                    viewport.to_string().cyan(),
                    delta.component_count,
                    delta.canvas_width,
                    delta.canvas_height
                );
            }
        }
    }
    Ok(())
}
