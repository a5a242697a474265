use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cheatsheet::{shell, Cheatsheet, Config, HttpFragmentSource};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Logs go to stderr; stdout may carry the printed document.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting cheatsheet assembler v{}", env!("CARGO_PKG_VERSION"));

    let source = HttpFragmentSource::new(&config.base_url, &config.pages_dir)
        .context("Failed to build HTTP client")?;
    info!(
        "Fetching {} pages from {}",
        config.manifest.len(),
        source.pages_url()
    );

    let cheatsheet = Cheatsheet::new(config.assembler_config(), Arc::new(source));
    let mut document = shell::load_shell(config.shell_path.as_deref(), &config.container_id)
        .await
        .context("Failed to load shell document")?;

    let report = cheatsheet.on_document_ready(&mut document).await;
    info!("Assembly finished: {}", serde_json::to_string(&report)?);

    if config.reveal_spoilers {
        cheatsheet.reveal_all_spoilers(&mut document);
    }

    match &config.output_path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            cheatsheet.print_cheatsheet(&document, BufWriter::new(file))?;
            info!("Cheatsheet written to {}", path.display());
        }
        None => cheatsheet.print_cheatsheet(&document, std::io::stdout().lock())?,
    }

    Ok(())
}
