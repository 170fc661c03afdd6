//! Prompt templates.
//!
//! Reply drafts and export enrichment use fixed Japanese instruction
//! templates. The style policy lives in the template text itself: concise,
//! polite, concrete, no filler around the reply body.

use autoreply_protocols::GenerationRequest;

/// Build the auto-reply prompt for a generation request.
pub fn reply_prompt(request: &GenerationRequest) -> String {
    let mut prompt = format!(
        "あなたはワークスペースのチャットで自動返信を行うアシスタントです。\
         以下のメッセージに対して、適切な返信を日本語で生成してください。\n\n\
         【送信者】\n{}\n\n\
         【メッセージ】\n{}\n\n",
        if request.sender_name.is_empty() {
            "不明"
        } else {
            &request.sender_name
        },
        request.message_text,
    );

    if !request.context_text.is_empty() {
        prompt.push_str(&format!("【前後の会話】\n{}\n\n", request.context_text));
    }

    prompt.push_str(
        "返信のガイドライン:\n\
         - 簡潔に(1-3文程度)\n\
         - 丁寧な口調で\n\
         - 質問には具体的に答える\n\
         - 必要に応じて確認や追加情報を求める\n\
         - 絵文字は使わない\n\
         - 返信文のみを出力し、説明文は不要\n\n\
         返信:",
    );
    prompt
}

/// AI-generated "next action" summary for an exported item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSummary {
    pub title: String,
    pub detail: String,
}

/// Build the enrichment prompt for one saved item.
pub fn enrichment_prompt(channel: &str, sender: &str, message: &str, context: &str) -> String {
    let mut prompt = format!(
        "以下の保存済みメッセージについて、必要なネクストアクションを要約してください。\n\n\
         【チャンネル】\n{channel}\n\n\
         【送信者】\n{sender}\n\n\
         【メッセージ】\n{message}\n\n",
    );
    if !context.is_empty() {
        prompt.push_str(&format!("【前後の会話】\n{context}\n\n"));
    }
    prompt.push_str(
        "出力形式(この2行のみ):\n\
         タイトル: アクションの短い見出し\n\
         詳細: 具体的に何をすべきかの1-2文\n",
    );
    prompt
}

/// Strip a `ラベル:` prefix, accepting both ASCII and fullwidth colons.
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(label)?;
    let rest = rest
        .strip_prefix(':')
        .or_else(|| rest.strip_prefix('\u{ff1a}'))?;
    Some(rest.trim())
}

/// Parse the two-line enrichment output leniently.
///
/// Missing or unrecognized lines yield empty strings; extra prose around
/// the expected lines is ignored and the first match per label wins.
pub fn parse_action_summary(text: &str) -> ActionSummary {
    let mut summary = ActionSummary::default();
    for line in text.lines() {
        let line = line.trim();
        if summary.title.is_empty() {
            if let Some(value) = strip_label(line, "タイトル") {
                if !value.is_empty() {
                    summary.title = value.to_string();
                }
            }
        }
        if summary.detail.is_empty() {
            if let Some(value) = strip_label(line, "詳細") {
                if !value.is_empty() {
                    summary.detail = value.to_string();
                }
            }
        }
    }
    summary
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
