//! The export pipeline.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use autoreply_core::{enrichment_prompt, parse_action_summary, ActionSummary};
use autoreply_protocols::{ExportProgress, GenerationBackend};

use crate::collect::SavedItem;
use crate::table::{basic_row, detailed_row, to_csv, to_tsv, BASIC_HEADER, DETAILED_HEADER};

/// Output flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Tsv,
}

/// Finished export data.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub data: String,
    pub count: usize,
}

/// Formats saved items, optionally enriching each row through the
/// generation backend.
#[derive(Default)]
pub struct Exporter {
    backend: Option<Arc<dyn GenerationBackend>>,
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Run the export.
    ///
    /// `detailed` adds the context and AI title/detail columns; a failed
    /// enrichment leaves that row's title/detail as empty strings rather
    /// than dropping the row. Progress events fire once per item.
    pub async fn export(
        &self,
        items: &[SavedItem],
        format: ExportFormat,
        detailed: bool,
        progress: Option<mpsc::UnboundedSender<ExportProgress>>,
    ) -> ExportOutput {
        let total = items.len();
        let mut rows = Vec::with_capacity(total);

        for (index, item) in items.iter().enumerate() {
            if let Some(progress) = &progress {
                let _ = progress.send(ExportProgress {
                    current: index + 1,
                    total,
                    message: format!("処理中: {}/{}", index + 1, total),
                });
            }
            let row = if detailed {
                let summary = self.enrich(item).await;
                detailed_row(item, &summary)
            } else {
                basic_row(item)
            };
            rows.push(row);
        }

        let header: &[&str] = if detailed {
            &DETAILED_HEADER
        } else {
            &BASIC_HEADER
        };
        let data = match format {
            ExportFormat::Csv => to_csv(header, &rows),
            ExportFormat::Tsv => to_tsv(header, &rows),
        };
        debug!(count = total, detailed, "export rendered");
        ExportOutput { data, count: total }
    }

    async fn enrich(&self, item: &SavedItem) -> ActionSummary {
        let Some(backend) = &self.backend else {
            return ActionSummary::default();
        };
        let prompt = enrichment_prompt(&item.channel, &item.sender, &item.message, &item.context);
        match backend.complete(&prompt).await {
            Ok(text) => parse_action_summary(&text),
            Err(e) => {
                warn!(error = %e, sender = %item.sender, "enrichment failed; columns left empty");
                ActionSummary::default()
            }
        }
    }
}

#[cfg(test)]
#[path = "exporter_tests.rs"]
mod tests;
