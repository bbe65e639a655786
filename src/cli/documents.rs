//! Document commands: upload, list, status, watch, report, rename, delete.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::{ApiClient, Backend};
use crate::models::{unit_symbol, DocumentStatus, Report};
use crate::poller::{PollConfig, StatusPoller};
use crate::registry::DocumentRegistry;

use super::helpers::{document_line, styled_status, AppContext};

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}").expect("spinner template"),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(message);
    pb
}

/// Upload a file, optionally watching it through processing.
pub async fn upload(
    ctx: &AppContext,
    file: &Path,
    workspace: Option<i64>,
    watch: bool,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");

    // Large files can exceed the ordinary request timeout.
    let client = Arc::new(ApiClient::with_timeout(
        &ctx.settings,
        ctx.session.clone(),
        Duration::from_secs(600),
    )?);
    let registry = DocumentRegistry::new(
        client,
        ctx.session.clone(),
        PollConfig::from(&ctx.settings),
    );
    registry.set_workspace_scope(workspace);

    let pb = spinner(format!("Uploading {}...", filename));
    let client_id = registry.upload(filename, bytes).await;

    if let Some(err) = registry.error() {
        pb.finish_and_clear();
        bail!("Upload failed: {}", err);
    }

    let uploaded = registry
        .documents()
        .into_iter()
        .find(|d| d.client_id == client_id)
        .context("Uploaded document vanished from the registry")?;
    let document_id = uploaded.id.context("Backend did not assign a document id")?;

    if !watch {
        pb.finish_and_clear();
        println!(
            "Uploaded {} as document {} ({})",
            filename,
            style(document_id).bold(),
            styled_status(&uploaded.status)
        );
        println!("Run `docsight watch {}` to follow processing.", document_id);
        return Ok(());
    }

    pb.set_message(format!("Processing document {}...", document_id));
    let waiter = registry.wait_for_poll(document_id);
    tokio::pin!(waiter);
    loop {
        tokio::select! {
            _ = &mut waiter => break,
            _ = tokio::time::sleep(Duration::from_millis(300)) => {
                if let Some(doc) = registry
                    .documents()
                    .into_iter()
                    .find(|d| d.id == Some(document_id))
                {
                    pb.set_message(format!(
                        "Document {}: {}",
                        document_id,
                        doc.status.as_str()
                    ));
                }
            }
        }
    }
    pb.finish_and_clear();

    let final_status = registry
        .documents()
        .into_iter()
        .find(|d| d.id == Some(document_id))
        .map(|d| d.status)
        .unwrap_or(DocumentStatus::Processing);
    report_outcome(document_id, &final_status);
    Ok(())
}

fn report_outcome(document_id: i64, status: &DocumentStatus) {
    match status {
        DocumentStatus::Completed => println!(
            "Document {} {}. Run `docsight report {}` to view the report.",
            document_id,
            style("completed").green(),
            document_id
        ),
        DocumentStatus::Failed => {
            println!("Document {} {}.", document_id, style("failed").red())
        }
        DocumentStatus::ParsedEmpty => println!(
            "Document {} parsed to {} content.",
            document_id,
            style("empty").yellow()
        ),
        other => println!(
            "Stopped watching document {}; last status was {}.",
            document_id,
            styled_status(other)
        ),
    }
}

/// List documents, optionally scoped to a workspace.
pub async fn list(ctx: &AppContext, workspace: Option<i64>) -> anyhow::Result<()> {
    let snapshots = ctx.client.list_documents(workspace).await?;
    if snapshots.is_empty() {
        println!("No documents.");
        return Ok(());
    }
    println!(
        "{:>6}  {:<18}  {:>10}  {}",
        style("id").bold(),
        style("status").bold(),
        style("size").bold(),
        style("filename").bold()
    );
    for snapshot in snapshots {
        println!(
            "{}",
            document_line(&crate::models::DocumentRecord::from_snapshot(snapshot))
        );
    }
    Ok(())
}

/// Show a single status snapshot.
pub async fn status(ctx: &AppContext, id: i64) -> anyhow::Result<()> {
    let snapshot = ctx.client.get_document(id).await?;
    println!("{}: {}", snapshot.filename, styled_status(&snapshot.status));
    println!("created: {}", snapshot.created_at);
    Ok(())
}

/// Follow a document's status until it reaches a terminal state or the
/// poll window closes.
pub async fn watch(ctx: &AppContext, id: i64) -> anyhow::Result<()> {
    let initial = ctx.client.get_document(id).await?;
    if initial.status.is_terminal() {
        report_outcome(id, &initial.status);
        return Ok(());
    }

    let pb = spinner(format!("Document {}: {}", id, initial.status.as_str()));
    let last_status = Arc::new(Mutex::new(initial.status));

    let poller = StatusPoller::new(
        ctx.client.clone() as Arc<dyn Backend>,
        PollConfig::from(&ctx.settings),
    );
    let pb_updates = pb.clone();
    let status_sink = last_status.clone();
    let handle = poller.spawn(id, move |snapshot| {
        pb_updates.set_message(format!("Document {}: {}", id, snapshot.status.as_str()));
        *status_sink.lock().expect("status lock") = snapshot.status;
    });
    handle.join().await;
    pb.finish_and_clear();

    let final_status = last_status.lock().expect("status lock").clone();
    report_outcome(id, &final_status);
    Ok(())
}

/// Fetch and render the report for a completed document.
pub async fn report(ctx: &AppContext, document_id: i64) -> anyhow::Result<()> {
    let report = ctx.client.fetch_report(document_id).await?;
    render_report(&report);
    Ok(())
}

fn render_report(report: &Report) {
    if let Some(title) = &report.title {
        println!("{}", style(title).bold().underlined());
    } else {
        println!(
            "{}",
            style(format!("Report for document {}", report.document_id))
                .bold()
                .underlined()
        );
    }
    if let Some(generated_at) = &report.generated_at {
        println!("{}", style(format!("generated {}", generated_at)).dim());
    }

    if let Some(summary) = &report.summary {
        println!("\n{}", style("Summary").bold());
        println!("{}", summary);
    }

    if !report.key_figures.is_empty() {
        println!("\n{}", style("Key figures").bold());
        for figure in &report.key_figures {
            let unit = unit_symbol(&figure.unit);
            let mut line = format!("  {}: {}", figure.name, figure.value);
            if !unit.is_empty() {
                line.push(' ');
                line.push_str(unit);
            }
            if let Some(context) = &figure.context {
                line.push_str(&format!(" ({})", context));
            }
            println!("{}", line);
        }
    }

    for (index, section) in report.sections.iter().enumerate() {
        println!(
            "\n{} {}",
            style(format!("{:02}", index + 1)).dim(),
            style(&section.heading).bold()
        );
        println!("{}", section.content);
        if !section.sources.is_empty() {
            println!("{}", style(format!("sources: {}", section.sources.join(", "))).dim());
        }
    }

    if let Some(conclusion) = &report.conclusion {
        println!("\n{}", style("Conclusion").bold());
        println!("{}", conclusion);
    }
}

pub async fn rename(ctx: &AppContext, id: i64, name: &str) -> anyhow::Result<()> {
    ctx.client.rename_document(id, name).await?;
    println!("Renamed document {} to {}", id, name);
    Ok(())
}

pub async fn delete(ctx: &AppContext, id: i64) -> anyhow::Result<()> {
    ctx.client.delete_document(id).await?;
    println!("Deleted document {}", id);
    Ok(())
}
