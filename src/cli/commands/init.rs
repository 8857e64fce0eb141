//! Initialize command.

use console::style;

use crate::config::{Config, Settings};

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context()?;
    ctx.init_schema().await?;

    for table in ctx.list_tables().await? {
        println!("  {} Table: {}", style("✓").green(), table);
    }

    match config.source_path {
        Some(ref path) => println!("  Config: {}", path.display()),
        None => println!(
            "{} No config file found, using defaults",
            style("!").yellow()
        ),
    }

    println!(
        "{} Initialized pagesum in {}",
        style("✓").green(),
        settings.data_dir.display()
    );

    Ok(())
}
