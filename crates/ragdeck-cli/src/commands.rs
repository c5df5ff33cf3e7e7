//! One-shot commands.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{eyre, Result};
use indicatif::{ProgressBar, ProgressStyle};
use ragdeck_core::api::{QueryMode, RagApi, UploadKind};
use ragdeck_core::config::UploadConfig;
use ragdeck_core::graph::{adapt, AdapterOptions};
use ragdeck_core::session::{QueryController, SessionEvent};
use ragdeck_core::{validate_upload, Config};
use tokio::sync::mpsc;

fn spinner(message: impl Into<String>) -> Result<ProgressBar> {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    bar.set_message(message.into());
    bar.enable_steady_tick(Duration::from_millis(80));
    Ok(bar)
}

pub async fn health(api: &dyn RagApi) -> Result<()> {
    let health = api.check_health().await;
    if health.is_healthy() {
        println!("● backend is {}", health.status);
        Ok(())
    } else {
        Err(eyre!("backend is {}", health.status))
    }
}

/// Ask one question, printing the answer as it streams in.
pub async fn query(api: Arc<dyn RagApi>, text: &str, mode: QueryMode, stream: bool) -> Result<()> {
    let controller = QueryController::new(api);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let printer = tokio::spawn(async move {
        let mut stdout = std::io::stdout();
        while let Some(event) = rx.recv().await {
            if let SessionEvent::Chunk { text, .. } = event {
                let _ = write!(stdout, "{text}");
                let _ = stdout.flush();
            }
        }
        let _ = writeln!(stdout);
    });

    let result = controller.submit(text, mode, stream, Some(tx)).await;
    printer.await?;

    let exchange = result?;
    if let (Some(context_build), Some(total)) =
        (exchange.metrics.context_build, exchange.metrics.total)
    {
        eprintln!(
            "[{}] first chunk after {:.2}s, complete after {:.2}s",
            mode,
            context_build.as_secs_f64(),
            total.as_secs_f64()
        );
    }
    Ok(())
}

pub async fn graph(api: &dyn RagApi, options: AdapterOptions, json: bool) -> Result<()> {
    let bar = spinner("Fetching knowledge graph...")?;
    let data = api.fetch_graph().await;
    bar.finish_and_clear();
    let data = data?;

    let adapted = adapt(&data, &options);
    if json {
        println!("{}", serde_json::to_string_pretty(&adapted)?);
        return Ok(());
    }

    println!("Nodes:          {}", adapted.nodes.len());
    println!("  visible:      {}", adapted.visible_nodes().count());
    println!("  hidden:       {}", adapted.hidden_count());
    println!("Edges:          {}", adapted.edges.len());
    println!("  dropped:      {}", adapted.dropped_edges);

    let mut ranked: Vec<_> = adapted.visible_nodes().collect();
    ranked.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.id.cmp(&b.id)));
    if !ranked.is_empty() {
        println!("\nMost connected:");
        for node in ranked.iter().take(10) {
            let label = data
                .node(&node.id)
                .map(|n| n.label.as_str())
                .unwrap_or(node.id.as_str());
            println!("  {:<40} {}", label, node.id);
        }
    }
    Ok(())
}

pub async fn docs_list(api: &dyn RagApi) -> Result<()> {
    let response = api.list_documents().await?;
    let docs = response.data.unwrap_or_default();
    if docs.is_empty() {
        println!("No documents found. Use 'ragdeck upload <files>' to add some.");
        return Ok(());
    }

    println!("{:<38} {:<12} {:>7}  {}", "DOC ID", "STATUS", "CHUNKS", "PREVIEW");
    for doc in &docs {
        let preview: String = doc.preview().chars().take(60).collect();
        println!(
            "{:<38} {:<12} {:>7}  {}",
            doc.doc_id,
            doc.status,
            doc.chunks_count.map(|c| c.to_string()).unwrap_or_default(),
            preview
        );
    }
    println!("\n{} document(s)", docs.len());
    Ok(())
}

pub async fn docs_delete(api: &dyn RagApi, doc_id: &str) -> Result<()> {
    let response = api.delete_document(doc_id).await?;
    println!(
        "Deleted {}{}",
        doc_id,
        response
            .message
            .map(|m| format!(": {m}"))
            .unwrap_or_default()
    );
    Ok(())
}

pub async fn upload(
    api: &dyn RagApi,
    rules: &UploadConfig,
    files: &[PathBuf],
    kind: UploadKind,
) -> Result<()> {
    let files = validate_upload(files, rules)?;

    let bar = spinner(format!("Uploading {} file(s)...", files.len()))?;
    let response = api.upload_files(&files, kind).await;
    bar.finish_and_clear();

    let response = response?;
    println!(
        "Uploaded {} file(s) to {}: {}",
        files.len(),
        kind.endpoint(),
        response.message_or_default()
    );
    Ok(())
}

pub fn show_config(config: &Config, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => println!("# Loaded from {}", path.display()),
        None => println!("# Effective configuration (files, environment, defaults)"),
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
