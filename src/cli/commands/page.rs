//! Page inspection commands.

use console::style;

use crate::config::Settings;
use crate::repository::{PageStore, StorageError};

/// Print a single page.
pub async fn cmd_show(settings: &Settings, page_id: &str) -> anyhow::Result<()> {
    let ctx = settings.create_db_context()?;

    let page = match ctx.get_page(page_id).await {
        Ok(page) => page,
        Err(StorageError::NotFound(_)) => {
            println!("{} Page not found: {}", style("✗").red(), page_id);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", style(&page.id).bold());
    println!("  User:     {}", page.user_id);
    println!("  Image:    {}", ctx.images_dir().join(&page.image_path).display());
    println!("  Segment:  {}", page.segment_index);
    println!("  Status:   {}", page.status());
    println!("  Created:  {}", page.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!(
        "  Text:     {}",
        page.extracted_text.as_deref().unwrap_or("-")
    );
    println!("  Summary:  {}", page.summary.as_deref().unwrap_or("-"));

    Ok(())
}

/// List the pages of a user.
pub async fn cmd_pages(settings: &Settings, username: &str) -> anyhow::Result<()> {
    let ctx = settings.create_db_context()?;

    let user_id = match ctx.find_user(username).await? {
        Some(id) => id,
        None => {
            println!("{} Unknown user: {}", style("!").yellow(), username);
            return Ok(());
        }
    };

    let ids = ctx.list_page_ids(&user_id).await?;
    if ids.is_empty() {
        println!("{} No pages for {}", style("!").yellow(), username);
        return Ok(());
    }

    println!("{} {} page(s) for {}", style("→").cyan(), ids.len(), username);
    for id in ids {
        println!("  {}", id);
    }

    Ok(())
}
