//! CSV/TSV table formatting.
//!
//! The comma variant follows standard CSV quoting and carries a UTF-8
//! byte-order marker so spreadsheet applications pick the encoding up.
//! The tab variant flattens embedded tabs and newlines to spaces instead
//! of quoting.

use chrono::{DateTime, Utc};

use autoreply_core::ActionSummary;

use crate::collect::SavedItem;

/// Column set of the basic export.
pub const BASIC_HEADER: [&str; 5] = ["チャンネル", "送信者", "メッセージ", "リンク", "日時"];

/// Column set of the detailed export.
pub const DETAILED_HEADER: [&str; 8] = [
    "チャンネル",
    "送信者",
    "メッセージ",
    "前後の会話",
    "タイトル",
    "詳細",
    "リンク",
    "日時",
];

/// Byte-order marker prefixed to CSV output.
pub const CSV_BOM: &str = "\u{feff}";

/// Timestamp column rendering.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

pub fn basic_row(item: &SavedItem) -> Vec<String> {
    vec![
        item.channel.clone(),
        item.sender.clone(),
        item.message.clone(),
        item.link.clone(),
        format_timestamp(item.saved_at),
    ]
}

/// A detailed row. A failed enrichment passes the default (empty)
/// summary: the title/detail columns stay present as empty strings.
pub fn detailed_row(item: &SavedItem, summary: &ActionSummary) -> Vec<String> {
    vec![
        item.channel.clone(),
        item.sender.clone(),
        item.message.clone(),
        item.context.clone(),
        summary.title.clone(),
        summary.detail.clone(),
        item.link.clone(),
        format_timestamp(item.saved_at),
    ]
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn tsv_flatten(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}

pub fn to_csv(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::from(CSV_BOM);
    out.push_str(&header.join(","));
    out.push('\n');
    for row in rows {
        let line: Vec<String> = row.iter().map(|f| csv_escape(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

pub fn to_tsv(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = header.join("\t");
    out.push('\n');
    for row in rows {
        let line: Vec<String> = row.iter().map(|f| tsv_flatten(f)).collect();
        out.push_str(&line.join("\t"));
        out.push('\n');
    }
    out
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
