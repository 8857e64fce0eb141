//! Web server command.

use console::style;

use crate::config::Settings;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let bind = normalize_bind_address(bind);

    settings.ensure_directories()?;

    println!("{} Preparing database...", style("→").cyan());
    let ctx = settings.create_db_context()?;
    match ctx.init_schema().await {
        Ok(()) => {
            println!("  {} Database ready", style("✓").green());
        }
        Err(e) => {
            eprintln!("  {} Schema setup failed: {}", style("✗").red(), e);
            return Err(anyhow::anyhow!("Database setup failed: {}", e));
        }
    }

    if settings.check_summarizer().await? == Some(false) {
        tracing::warn!("Summarizer endpoint {} is not reachable", settings.llm.endpoint);
        println!(
            "  {} Summarizer at {} is not reachable; summaries will fail",
            style("!").yellow(),
            settings.llm.endpoint
        );
    }

    println!(
        "{} Starting pagesum server at http://{}",
        style("→").cyan(),
        bind
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &bind).await
}

/// Normalize a bind address that can be:
/// - Just a port: "8000" -> 127.0.0.1:8000
/// - Just a host: "0.0.0.0" -> 0.0.0.0:8000
/// - Host and port: "0.0.0.0:8000" -> 0.0.0.0:8000
fn normalize_bind_address(bind: &str) -> String {
    if let Ok(port) = bind.parse::<u16>() {
        return format!("127.0.0.1:{}", port);
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if port_str.parse::<u16>().is_ok() {
            return format!("{}:{}", host, port_str);
        }
    }

    format!("{}:8000", bind)
}
