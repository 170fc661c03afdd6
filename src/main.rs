//! AutoReply - mention auto-reply agent for web chat workspaces.
//!
//! Main entry point for the AutoReply CLI.

mod cli;
mod control;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use autoreply_config::{BackendKind, Config, ConfigLoader, ConfigValidator};
use autoreply_export::{ExportFormat, Exporter, SavedItemCollector};
use autoreply_page::PageDriver;
use autoreply_page_cdp::{CdpPage, CdpPageConfig};
use autoreply_protocols::{GenerationBackend, GenerationRequest};
use autoreply_provider_ollama::OllamaBackend;
use autoreply_provider_openai::OpenAiBackend;
use autoreply_watch::{WatchOptions, Watcher};

use cli::{Cli, Commands, ExportFormatArg, DEFAULT_ENDPOINT, DEFAULT_PAGE_FRAGMENT};
use control::ControlChannel;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref());

    let config_path = cli.config.clone().unwrap_or_else(ConfigLoader::default_path);
    let config = ConfigLoader::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let validation = ConfigValidator::validate(&config);
    if !validation.is_valid() {
        let details: Vec<String> = validation
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect();
        anyhow::bail!("invalid configuration: {}", details.join("; "));
    }

    let command = cli.command.unwrap_or(Commands::Run {
        endpoint: DEFAULT_ENDPOINT.to_string(),
        page: DEFAULT_PAGE_FRAGMENT.to_string(),
    });

    match command {
        Commands::Run { endpoint, page } => run(config, endpoint, page).await,
        Commands::TestConnection => test_connection(config).await,
        Commands::Generate {
            message,
            sender,
            context,
        } => generate(config, message, sender, context).await,
        Commands::Export {
            format,
            detailed,
            limit,
            output,
            endpoint,
            page,
        } => export(config, format, detailed, limit, output, endpoint, page).await,
    }
}

/// Logs go to stderr (or rolling files) so stdout stays a clean control
/// channel.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "autoreply.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

fn build_backend(config: &Config) -> anyhow::Result<Arc<dyn GenerationBackend>> {
    let backend = &config.backend;
    match backend.kind {
        BackendKind::Ollama => Ok(Arc::new(
            OllamaBackend::new(backend.base_url.clone(), backend.model.clone())
                .with_options(backend.temperature, backend.max_output_tokens),
        )),
        BackendKind::OpenAi => {
            let api_key = backend
                .api_key
                .clone()
                .context("backend.api_key is required for the openai backend")?;
            Ok(Arc::new(
                OpenAiBackend::with_url(api_key, backend.base_url.clone())
                    .with_model(backend.model.clone())
                    .with_options(backend.temperature, backend.max_output_tokens),
            ))
        }
    }
}

fn watch_options(config: &Config) -> WatchOptions {
    WatchOptions {
        settle_delay: Duration::from_millis(config.watcher.settle_delay_ms),
        context_before: config.reply.context_window,
        feed_attach_retry: Duration::from_millis(config.watcher.feed_attach_retry_ms),
        feed_poll_interval: config
            .watcher
            .feed_poll_interval_ms
            .map(Duration::from_millis),
        ..WatchOptions::default()
    }
}

async fn attach_page(endpoint: String, page: String) -> anyhow::Result<Arc<dyn PageDriver>> {
    let page = CdpPage::attach(CdpPageConfig {
        endpoint,
        page_url_fragment: page,
    })
    .await?;
    Ok(Arc::new(page))
}

async fn run(config: Config, endpoint: String, page: String) -> anyhow::Result<()> {
    let driver = attach_page(endpoint, page).await?;
    let backend = build_backend(&config)?;
    let watcher = Arc::new(Watcher::new(
        driver.clone(),
        backend.clone(),
        watch_options(&config),
    ));

    if config.reply.auto_reply_enabled {
        // Grace delay: let the workspace finish its own startup churn.
        info!(
            delay_ms = config.watcher.startup_delay_ms,
            "auto-reply enabled from settings"
        );
        tokio::time::sleep(Duration::from_millis(config.watcher.startup_delay_ms)).await;
        watcher
            .start(config.reply.auto_send_enabled, config.reply.test_mode)
            .await?;
    }

    let channel = ControlChannel {
        watcher: watcher.clone(),
        driver,
        backend,
        config,
    };
    let outcome = channel.serve().await;
    watcher.stop().await;
    outcome
}

async fn test_connection(config: Config) -> anyhow::Result<()> {
    let backend = build_backend(&config)?;
    match backend.test_connection().await {
        Ok(status) => {
            println!("{} reachable, model {} available", backend.id(), backend.model());
            for model in status.available_models {
                println!("  {model}");
            }
            Ok(())
        }
        Err(e) => anyhow::bail!("connection test failed: {e}"),
    }
}

async fn generate(
    config: Config,
    message: String,
    sender: String,
    context: String,
) -> anyhow::Result<()> {
    let backend = build_backend(&config)?;
    let request = GenerationRequest::new(message)
        .with_context(context)
        .with_sender(sender);
    let reply = backend.generate(&request).await?;
    println!("{reply}");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn export(
    config: Config,
    format: ExportFormatArg,
    detailed: bool,
    limit: Option<usize>,
    output: Option<std::path::PathBuf>,
    endpoint: String,
    page: String,
) -> anyhow::Result<()> {
    let driver = attach_page(endpoint, page).await?;
    let tree = driver.snapshot().await?;
    let items = SavedItemCollector::default().collect(&tree, limit);

    let exporter = if detailed {
        Exporter::with_backend(build_backend(&config)?)
    } else {
        Exporter::new()
    };
    let format = match format {
        ExportFormatArg::Csv => ExportFormat::Csv,
        ExportFormatArg::Tsv => ExportFormat::Tsv,
    };
    let result = exporter.export(&items, format, detailed, None).await;

    match output {
        Some(path) => {
            tokio::fs::write(&path, &result.data)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            info!(count = result.count, path = %path.display(), "export written");
        }
        None => print!("{}", result.data),
    }
    Ok(())
}
