//! Control surface over stdio.
//!
//! The control collaborator (popup, script, operator) writes one JSON
//! request per line on stdin; responses and export progress events come
//! back one JSON object per line on stdout. Logging stays on stderr so
//! the channel carries nothing else.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use autoreply_config::Config;
use autoreply_export::{ExportFormat, Exporter, SavedItemCollector};
use autoreply_page::PageDriver;
use autoreply_protocols::{
    ConnectionReport, ControlRequest, ExportOutcome, ExportParams, GeneratedReply,
    GenerationBackend, GenerationRequest, ToggleAck,
};
use autoreply_watch::Watcher;

/// Default file name for control-surface CSV exports.
const EXPORT_FILE: &str = "autoreply_export.csv";

pub(crate) struct ControlChannel {
    pub watcher: Arc<Watcher>,
    pub driver: Arc<dyn PageDriver>,
    pub backend: Arc<dyn GenerationBackend>,
    pub config: Config,
}

impl ControlChannel {
    /// Serve control requests until stdin closes.
    pub async fn serve(&self) -> anyhow::Result<()> {
        info!("control surface listening on stdio");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let request: ControlRequest = match serde_json::from_str(line) {
                Ok(request) => request,
                Err(e) => {
                    warn!(error = %e, "unparseable control request");
                    println!(
                        "{}",
                        serde_json::json!({ "success": false, "error": e.to_string() })
                    );
                    continue;
                }
            };
            let response = self.handle(request).await;
            println!("{response}");
        }
        info!("control surface closed");
        Ok(())
    }

    async fn handle(&self, request: ControlRequest) -> serde_json::Value {
        match request {
            ControlRequest::ToggleAutoReply { enabled, auto_send } => {
                let success = if enabled {
                    match self
                        .watcher
                        .start(auto_send, self.config.reply.test_mode)
                        .await
                    {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(error = %e, "watcher start failed");
                            false
                        }
                    }
                } else {
                    self.watcher.stop().await;
                    true
                };
                serde_json::json!(ToggleAck { success })
            }

            ControlRequest::GenerateAutoReply {
                message_text,
                surrounding_messages,
                sender_name,
            } => {
                let request = GenerationRequest::new(message_text)
                    .with_context(surrounding_messages)
                    .with_sender(sender_name);
                let response = match self.backend.generate(&request).await {
                    Ok(reply) => GeneratedReply {
                        reply: Some(reply),
                        error: None,
                    },
                    Err(e) => GeneratedReply {
                        reply: None,
                        error: Some(e.to_string()),
                    },
                };
                serde_json::json!(response)
            }

            ControlRequest::TestConnection => {
                let report = match self.backend.test_connection().await {
                    Ok(status) => ConnectionReport {
                        success: true,
                        models: Some(status.available_models),
                        error: None,
                    },
                    Err(e) => ConnectionReport {
                        success: false,
                        models: None,
                        error: Some(e.to_string()),
                    },
                };
                serde_json::json!(report)
            }

            ControlRequest::ExportCsv(params) => {
                self.export(params, ExportFormat::Csv, false).await
            }
            ControlRequest::CopyTsv(params) => self.export(params, ExportFormat::Tsv, false).await,
            ControlRequest::ExportCsvDetailed(params) => {
                self.export(params, ExportFormat::Csv, true).await
            }
            ControlRequest::CopyTsvDetailed(params) => {
                self.export(params, ExportFormat::Tsv, true).await
            }
        }
    }

    async fn export(
        &self,
        params: ExportParams,
        format: ExportFormat,
        detailed: bool,
    ) -> serde_json::Value {
        let tree = match self.driver.snapshot().await {
            Ok(tree) => tree,
            Err(e) => {
                return serde_json::json!(ExportOutcome {
                    success: false,
                    count: 0,
                    tsv_data: None,
                    error: Some(e.to_string()),
                });
            }
        };
        let items = SavedItemCollector::default().collect(&tree, params.limit);

        let exporter = if detailed {
            Exporter::with_backend(self.backend.clone())
        } else {
            Exporter::new()
        };

        // Progress events interleave with the final response, one JSON
        // object per line.
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let progress_task = tokio::spawn(async move {
            while let Some(event) = progress_rx.recv().await {
                println!("{}", serde_json::json!(event));
            }
        });
        let output = exporter
            .export(&items, format, detailed, Some(progress_tx))
            .await;
        let _ = progress_task.await;

        let outcome = match format {
            ExportFormat::Csv => match tokio::fs::write(EXPORT_FILE, &output.data).await {
                Ok(()) => ExportOutcome {
                    success: true,
                    count: output.count,
                    tsv_data: None,
                    error: None,
                },
                Err(e) => ExportOutcome {
                    success: false,
                    count: output.count,
                    tsv_data: None,
                    error: Some(e.to_string()),
                },
            },
            ExportFormat::Tsv => ExportOutcome {
                success: true,
                count: output.count,
                tsv_data: Some(output.data),
                error: None,
            },
        };
        serde_json::json!(outcome)
    }
}
