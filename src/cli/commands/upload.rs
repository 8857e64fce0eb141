//! One-off upload command.

use std::path::Path;
use std::sync::Arc;

use console::style;

use crate::config::Settings;
use crate::repository::PageStore;

/// Run an image file through the enrichment pipeline for `username`.
pub async fn cmd_upload(settings: &Settings, username: &str, file: &Path) -> anyhow::Result<()> {
    let image = tokio::fs::read(file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;

    settings.ensure_directories()?;
    let ctx = settings.create_db_context()?;
    ctx.init_schema().await?;

    if settings.check_summarizer().await? == Some(false) {
        tracing::warn!("Summarizer endpoint {} is not reachable", settings.llm.endpoint);
        println!(
            "  {} Summarizer at {} is not reachable; summaries will fail",
            style("!").yellow(),
            settings.llm.endpoint
        );
    }

    let store: Arc<dyn PageStore> = Arc::new(ctx);
    let service = settings.create_enrichment_service(store)?;

    println!(
        "{} Uploading {} ({} bytes) for {}",
        style("→").cyan(),
        file.display(),
        image.len(),
        style(username).bold()
    );

    let result = match service.enrich(username, &image).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("  {} {}", style("✗").red(), e);
            return Err(e.into());
        }
    };

    println!("  User: {}", result.user_id);
    println!("  Page: {}", result.page_id);
    if result.summaries.is_empty() {
        println!("  {} No text found", style("!").yellow());
    }
    for (i, (page_id, summary)) in result.page_ids.iter().zip(&result.summaries).enumerate() {
        let page = page_id.as_deref().unwrap_or("-");
        match summary {
            Some(summary) => println!(
                "  {} [{}] {} {}",
                style("✓").green(),
                i,
                page,
                style(summary).dim()
            ),
            None => println!("  {} [{}] {} (no summary)", style("✗").red(), i, page),
        }
    }

    let result = result.into_result()?;
    println!(
        "{} Enriched {} segment(s)",
        style("✓").green(),
        result.summaries.len()
    );
    Ok(())
}
