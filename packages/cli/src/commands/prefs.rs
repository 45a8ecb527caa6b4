use crate::config::Context;
use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;
use tracing::info;
use wireframe_editor::ThemeMode;
use wireframe_workspace::DocumentStore;

#[derive(Debug, Subcommand)]
pub enum PrefsCommand {
    /// Print the current preferences
    Show,

    /// Change one or more preferences
    Set {
        /// Grid step in canvas units
        #[arg(long)]
        grid_size: Option<f64>,

        /// Snap drawn boxes to the grid (true or false)
        #[arg(long)]
        snap: Option<bool>,

        /// light or dark
        #[arg(long)]
        theme_mode: Option<ThemeMode>,
    },

    /// Copy a template's theme into the saved-theme library
    SaveTheme { template: String },

    /// Remove a theme from the library by name
    ForgetTheme { name: String },
}

pub async fn prefs(command: PrefsCommand, ctx: &Context) -> Result<()> {
    let mut prefs = ctx.preferences()?;

    match command {
        PrefsCommand::Show => {}
        PrefsCommand::Set {
            grid_size,
            snap,
            theme_mode,
        } => {
            if grid_size.is_none() && snap.is_none() && theme_mode.is_none() {
                bail!("Nothing to set; pass --grid-size, --snap or --theme-mode");
            }
            prefs.update(|p| {
                if let Some(grid_size) = grid_size {
                    p.grid_size = grid_size;
                }
                if let Some(snap) = snap {
                    p.snap_to_grid = snap;
                }
                if let Some(mode) = theme_mode {
                    p.theme_mode = mode;
                }
            })?;
            info!(grid_size = prefs.get().grid_size, snap = prefs.get().snap_to_grid, "preferences updated");
        }
        PrefsCommand::SaveTheme { template } => {
            let record = ctx.store().load_template(&ctx.template(&template)).await?;
            let name = record.theme.name.clone();
            prefs.save_theme(record.theme)?;
            info!(theme = %name, "theme saved");
            println!("  {} Saved theme {}", "✓".green(), name.bright_white());
        }
        PrefsCommand::ForgetTheme { name } => {
            if !prefs.get().saved_themes.iter().any(|t| t.name == name) {
                bail!("No saved theme named {}", name);
            }
            prefs.remove_theme(&name)?;
            info!(theme = %name, "theme removed");
            println!("  {} Removed theme {}", "✓".green(), name.bright_white());
        }
    }

    let current = prefs.get();
    println!("{}", "Preferences".bold());
    println!("  theme mode: {}", current.theme_mode);
    println!(
        "  grid:       {} ({})",
        current.grid_size,
        if current.snap_to_grid { "snapping" } else { "free" }
    );
    if current.saved_themes.is_empty() {
        println!("  themes:     {}", "none saved".dimmed());
    }
    for theme in &current.saved_themes {
        println!(
            "  theme:      {} ({}, {})",
            theme.name.bright_white(),
            theme.mode,
            theme.colors.primary.dimmed()
        );
    }
    Ok(())
}
