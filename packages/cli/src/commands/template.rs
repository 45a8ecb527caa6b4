use super::{format_time, open_for_write};
use crate::config::Context;
use anyhow::{Context as _, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use wireframe_common::{Clock, SystemClock};
use wireframe_editor::{
    Component, ComponentKind, ComponentPayload, ContainerSize, Document, DraftKey, Edit, Rect,
    Style, Viewport,
};
use wireframe_workspace::{sort_templates, DocumentStore, TemplateRef, TemplateSort, TemplateUpdate};

#[derive(Debug, Subcommand)]
pub enum TemplateCommand {
    /// Create an empty template
    New {
        /// Display name; left untitled when omitted
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List templates in the project, most recently updated first
    List {
        /// Sort alphabetically instead
        #[arg(long)]
        by_name: bool,

        /// Only templates whose name or id contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Summarize a template's viewports
    Show {
        template: String,
    },

    /// Replace one viewport's components with a JSON array from a file
    Import {
        template: String,

        /// desktop, tablet or mobile
        viewport: Viewport,

        /// JSON file holding an array of components
        file: PathBuf,
    },

    /// Insert a component from a box drawn on screen. The box is snapped
    /// to the preferred grid unless snapping is turned off.
    Add {
        template: String,

        /// desktop, tablet or mobile
        viewport: Viewport,

        /// button, text, image, ...
        kind: ComponentKind,

        x: f64,
        y: f64,
        width: f64,
        height: f64,

        /// Screen pixels per canvas unit
        #[arg(long, default_value = "1.0")]
        scale: f64,
    },

    /// Give a template a new display name
    Rename { template: String, name: String },

    /// Delete a template with its history, versions and local draft
    Delete {
        template: String,

        /// Required; deletion cannot be undone
        #[arg(long)]
        yes: bool,
    },
}

pub async fn template(command: TemplateCommand, ctx: &Context) -> Result<()> {
    match command {
        TemplateCommand::New { name } => create(ctx, name.as_deref()).await.map(|_| ()),
        TemplateCommand::List { by_name, search } => {
            let sort = if by_name {
                TemplateSort::Name
            } else {
                TemplateSort::Recent
            };
            list(ctx, sort, search.as_deref()).await
        }
        TemplateCommand::Show { template } => show(ctx, &template).await,
        TemplateCommand::Import {
            template,
            viewport,
            file,
        } => import(ctx, &template, viewport, &file).await,
        TemplateCommand::Add {
            template,
            viewport,
            kind,
            x,
            y,
            width,
            height,
            scale,
        } => add(ctx, &template, viewport, kind, Rect::new(x, y, width, height), scale).await,
        TemplateCommand::Rename { template, name } => rename(ctx, &template, &name).await,
        TemplateCommand::Delete { template, yes } => delete(ctx, &template, yes).await,
    }
}

async fn create(ctx: &Context, name: Option<&str>) -> Result<TemplateRef> {
    let now = SystemClock.now_millis();
    let update = TemplateUpdate::from_document(&Document::new(now), Viewport::Desktop);
    let store = ctx.store();
    let template = store.create_template(&ctx.config.project_id, &update).await?;
    if let Some(name) = name {
        store.rename_template(&template, name, now).await?;
    }

    info!(%template, "template created");
    println!("  {} Created template {}", "✓".green(), template.template_id.bright_white());
    Ok(template)
}

async fn list(ctx: &Context, sort: TemplateSort, search: Option<&str>) -> Result<()> {
    let mut templates = ctx.store().recent_templates(&ctx.config.project_id).await?;
    if let Some(query) = search {
        templates.retain(|t| t.matches(query));
    }
    sort_templates(&mut templates, sort);

    if templates.is_empty() {
        println!("{}", "No templates yet".yellow());
        return Ok(());
    }

    for summary in templates {
        println!(
            "  {:<24} {}  {}",
            summary.display_name().bright_white(),
            summary.template.template_id.dimmed(),
            format_time(summary.updated_at).dimmed()
        );
    }
    Ok(())
}

async fn show(ctx: &Context, template_id: &str) -> Result<()> {
    let record = ctx.store().load_template(&ctx.template(template_id)).await?;
    let document = record.to_document();

    let name = if record.name.is_empty() {
        wireframe_workspace::UNTITLED
    } else {
        record.name.as_str()
    };
    println!("{} {} ({})", "Template".bold(), name.bright_white(), template_id);
    println!("  theme:   {} ({})", document.theme.name, document.theme.mode);
    println!("  updated: {}", format_time(record.updated_at));
    println!(
        "  tasks:   {}   comments: {}",
        entry_count(&record.tasks),
        entry_count(&record.comments)
    );
    println!();

    for viewport in Viewport::ALL {
        let size = document.canvas_size(viewport);
        let components = document.components(viewport);
        println!(
            "  {:<8} {:>3} components  canvas {}x{}",
            viewport.to_string().cyan(),
            components.len(),
            size.width,
            size.height
        );
        for component in components {
            println!(
                "           {} {} @ ({}, {}) {}x{}",
                component.id.dimmed(),
                component.kind(),
                component.rect.x,
                component.rect.y,
                component.rect.width,
                component.rect.height
            );
        }
    }
    Ok(())
}

fn entry_count(value: &serde_json::Value) -> usize {
    value.as_array().map_or(0, Vec::len)
}

async fn import(ctx: &Context, template_id: &str, viewport: Viewport, file: &Path) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Cannot read {}", file.display()))?;
    let components: Vec<Component> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a component array", file.display()))?;

    let mut client = ctx.client()?;
    open_for_write(&mut client, template_id).await?;

    let outcome = client
        .edit(Edit::ReplaceViewport {
            viewport,
            components,
        })
        .await?;
    let template = client.save().await?;
    client.close().await;

    info!(%template, %viewport, changes = outcome.applied.entries.len(), "imported components");
    println!(
        "  {} {} on {}: {} changes",
        "✓".green(),
        outcome.applied.description,
        viewport.to_string().cyan(),
        outcome.applied.entries.len()
    );
    Ok(())
}

async fn add(
    ctx: &Context,
    template_id: &str,
    viewport: Viewport,
    kind: ComponentKind,
    drawn: Rect,
    scale: f64,
) -> Result<()> {
    let mut client = ctx.client()?;
    open_for_write(&mut client, template_id).await?;
    client.switch_viewport(viewport);

    let canvas = client
        .document()
        .map(|doc| doc.canvas_size(viewport))
        .context("Template did not load")?;
    let container = ContainerSize::new(canvas.width * scale, canvas.height * scale);
    let rect = client.place(drawn, container)?;

    let outcome = client
        .edit(Edit::Insert {
            viewport,
            rect,
            payload: ComponentPayload::default_for(kind),
            style: Style::new(),
        })
        .await?;
    let template = client.save().await?;
    client.close().await;

    let id = outcome.applied.inserted_id.unwrap_or_default();
    info!(%template, %viewport, component = %id, "component added");
    println!(
        "  {} Added {} {} at ({}, {}) {}x{}",
        "✓".green(),
        kind,
        id.bright_white(),
        rect.x,
        rect.y,
        rect.width,
        rect.height
    );
    Ok(())
}

async fn rename(ctx: &Context, template_id: &str, name: &str) -> Result<()> {
    let template = ctx.template(template_id);
    ctx.store()
        .rename_template(&template, name, SystemClock.now_millis())
        .await?;

    info!(%template, new_name = name.trim(), "template renamed");
    println!("  {} Renamed {} to {}", "✓".green(), template_id, name.trim().bright_white());
    Ok(())
}

async fn delete(ctx: &Context, template_id: &str, confirmed: bool) -> Result<()> {
    if !confirmed {
        println!(
            "{} Deleting {} cannot be undone",
            "⚠️".yellow(),
            template_id.bright_white()
        );
        println!("Use --yes to delete");
        return Ok(());
    }

    let template = ctx.template(template_id);
    ctx.store().delete_template(&template).await?;
    let drafts = ctx.drafts()?;
    if let Err(e) = drafts.discard(&DraftKey::for_document(Some(template_id))) {
        warn!(%template, error = %e, "could not remove local draft");
    }

    info!(%template, "template deleted");
    println!("  {} Deleted {}", "✓".green(), template_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_then_import_components() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::load(dir.path()).unwrap();

        let template = create(&ctx, None).await.unwrap();
        let templates = ctx.store().list_templates("default").await.unwrap();
        assert_eq!(templates, vec![template.clone()]);

        let file = dir.path().join("components.json");
        std::fs::write(
            &file,
            r#"[
                {"id": "", "box": [0, 0, 100, 40], "kind": "divider"},
                {"id": "hero", "box": [0, 60, 300, 200], "kind": "divider"}
            ]"#,
        )
        .unwrap();
        import(&ctx, &template.template_id, Viewport::Mobile, &file).await.unwrap();

        let record = ctx.store().load_template(&template).await.unwrap();
        let ids: Vec<_> = record
            .to_document()
            .components(Viewport::Mobile)
            .iter()
            .map(|c| c.id.clone())
            .collect();
        assert_eq!(ids, vec!["generated-0", "hero"]);
        assert!(ctx.drafts().unwrap().keys().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_snaps_to_preferred_grid() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::load(dir.path()).unwrap();
        let template = create(&ctx, None).await.unwrap();
        ctx.preferences().unwrap().update(|p| p.grid_size = 8.0).unwrap();

        let drawn = Rect::new(13.0, 29.0, 117.0, 42.0);
        add(&ctx, &template.template_id, Viewport::Mobile, ComponentKind::Button, drawn, 1.0)
            .await
            .unwrap();
        ctx.preferences().unwrap().update(|p| p.snap_to_grid = false).unwrap();
        add(&ctx, &template.template_id, Viewport::Mobile, ComponentKind::Text, drawn, 1.0)
            .await
            .unwrap();

        let record = ctx.store().load_template(&template).await.unwrap();
        let document = record.to_document();
        let components = document.components(Viewport::Mobile);
        assert_eq!(components[0].rect, Rect::new(16.0, 32.0, 120.0, 40.0));
        assert_eq!(components[1].rect, drawn);
    }

    #[tokio::test]
    async fn test_rename_list_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::load(dir.path()).unwrap();
        let first = create(&ctx, Some("Landing")).await.unwrap();
        let second = create(&ctx, None).await.unwrap();

        let store = ctx.store();
        let listed = store.recent_templates("default").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|t| t.template == first && t.name == "Landing"));

        rename(&ctx, &second.template_id, " Pricing ").await.unwrap();
        let listed = store.recent_templates("default").await.unwrap();
        let renamed = listed.iter().find(|t| t.template == second).unwrap();
        assert_eq!(renamed.name, "Pricing");
        assert!(listed[0].updated_at >= listed[1].updated_at);

        delete(&ctx, &first.template_id, false).await.unwrap();
        assert_eq!(store.list_templates("default").await.unwrap().len(), 2);

        delete(&ctx, &first.template_id, true).await.unwrap();
        assert_eq!(store.list_templates("default").await.unwrap(), vec![second]);
        assert!(delete(&ctx, &first.template_id, true).await.is_err());
    }
}
