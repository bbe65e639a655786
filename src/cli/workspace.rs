//! Workspace commands.
//!
//! Mutations go through `WorkspaceManager` so the CLI gets the same
//! client-side guards as any other front-end: personal workspaces refuse
//! modification, member invites are validated before any network call.

use anyhow::bail;
use console::style;

use crate::workspaces::WorkspaceManager;

use super::helpers::AppContext;

async fn loaded_manager(ctx: &AppContext) -> anyhow::Result<WorkspaceManager> {
    let manager = WorkspaceManager::new(ctx.client.clone());
    manager.init().await;
    if let Some(err) = manager.error() {
        bail!(err);
    }
    Ok(manager)
}

pub async fn list(ctx: &AppContext) -> anyhow::Result<()> {
    let manager = loaded_manager(ctx).await?;
    let current = manager.current_workspace().map(|w| w.id);
    for workspace in manager.workspaces() {
        let marker = if Some(workspace.id) == current { "*" } else { " " };
        let kind = if workspace.is_personal { "personal" } else { "team" };
        println!(
            "{} {:>5}  {:<10}  {}",
            marker,
            workspace.id,
            kind,
            style(&workspace.name).bold()
        );
    }
    Ok(())
}

pub async fn create(ctx: &AppContext, name: &str) -> anyhow::Result<()> {
    let manager = loaded_manager(ctx).await?;
    manager.create(name).await;
    if let Some(err) = manager.error() {
        bail!(err);
    }
    println!("Created workspace {}", style(name).bold());
    Ok(())
}

pub async fn rename(ctx: &AppContext, id: i64, name: &str) -> anyhow::Result<()> {
    let manager = loaded_manager(ctx).await?;
    manager.rename(id, name).await;
    if let Some(err) = manager.error() {
        bail!(err);
    }
    println!("Renamed workspace {} to {}", id, name);
    Ok(())
}

pub async fn delete(ctx: &AppContext, id: i64) -> anyhow::Result<()> {
    let manager = loaded_manager(ctx).await?;
    manager.delete(id).await;
    if let Some(err) = manager.error() {
        bail!(err);
    }
    println!("Deleted workspace {}", id);
    Ok(())
}

pub async fn members(ctx: &AppContext, id: i64) -> anyhow::Result<()> {
    let manager = loaded_manager(ctx).await?;
    if !manager.switch(id).await {
        bail!("Unknown workspace {}", id);
    }
    let Some(workspace) = manager.current_workspace() else {
        bail!("Unknown workspace {}", id);
    };
    if workspace.members.is_empty() {
        println!("No members.");
        return Ok(());
    }
    for member in &workspace.members {
        println!(
            "{:>5}  {:<8}  {} <{}>",
            member.id,
            member.role.as_str(),
            style(&member.name).bold(),
            member.email
        );
    }
    Ok(())
}

pub async fn add_member(ctx: &AppContext, id: i64, email: &str) -> anyhow::Result<()> {
    let manager = loaded_manager(ctx).await?;
    if !manager.switch(id).await {
        bail!("Unknown workspace {}", id);
    }
    manager.add_member(id, email).await;
    if let Some(err) = manager.error() {
        bail!(err);
    }
    println!("Invited {} to workspace {}", email, id);
    Ok(())
}

pub async fn remove_member(ctx: &AppContext, id: i64, member_id: i64) -> anyhow::Result<()> {
    let manager = loaded_manager(ctx).await?;
    if !manager.switch(id).await {
        bail!("Unknown workspace {}", id);
    }
    manager.remove_member(id, member_id).await;
    if let Some(err) = manager.error() {
        bail!(err);
    }
    println!("Removed member {} from workspace {}", member_id, id);
    Ok(())
}
