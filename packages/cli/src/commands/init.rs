use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::Path;
use tracing::info;
use wireframe_workspace::{WorkspaceConfig, DEFAULT_CONFIG_NAME};

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Project the templates belong to
    #[arg(short, long, default_value = "default")]
    pub project: String,

    /// Local user id recorded in change logs and presence
    #[arg(short, long)]
    pub user: Option<String>,

    /// Display name shown to collaborators
    #[arg(short, long)]
    pub name: Option<String>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing wireframe workspace...".bright_blue().bold());

    let mut config = WorkspaceConfig {
        project_id: args.project,
        ..WorkspaceConfig::default()
    };
    if let Some(id) = args.user {
        config.user.id = id;
    }
    if let Some(name) = args.name {
        config.user.display_name = name;
    }

    for dir in [config.get_store_dir(cwd), config.get_draft_dir(cwd)] {
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            println!("  {} Created {}/", "✓".green(), dir.display());
        }
    }

    let path = config.save(cwd)?;
    info!(path = %path.display(), project = %config.project_id, "workspace initialized");
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Workspace initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: wireframe template new");
    println!("  2. Run: wireframe template import <id> mobile components.json");
    println!("  3. Run: wireframe versions create <id> -m \"first draft\"");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(force: bool) -> InitArgs {
        InitArgs {
            project: "acme".to_string(),
            user: Some("ada".to_string()),
            name: None,
            force,
        }
    }

    #[test]
    fn test_init_writes_config_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        init(args(false), dir.path()).unwrap();

        let config = WorkspaceConfig::load(dir.path()).unwrap();
        assert_eq!(config.project_id, "acme");
        assert_eq!(config.user.id, "ada");
        assert_eq!(config.user.display_name, "Local User");
        assert!(config.get_store_dir(dir.path()).is_dir());
        assert!(config.get_draft_dir(dir.path()).is_dir());
    }

    #[test]
    fn test_init_keeps_existing_config_without_force() {
        let dir = tempfile::tempdir().unwrap();
        init(args(false), dir.path()).unwrap();

        let mut second = args(false);
        second.project = "other".to_string();
        init(second, dir.path()).unwrap();
        assert_eq!(WorkspaceConfig::load(dir.path()).unwrap().project_id, "acme");

        let mut forced = args(true);
        forced.project = "other".to_string();
        init(forced, dir.path()).unwrap();
        assert_eq!(WorkspaceConfig::load(dir.path()).unwrap().project_id, "other");
    }
}
