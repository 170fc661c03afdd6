use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex as SyncMutex;
use tokio::time::sleep;

use autoreply_core::OUTBOX_KEY;
use autoreply_page::{NodeKey, NodeSpec, PageTree, SimEvent, SimPage};
use autoreply_protocols::{
    clean_completion, ConnectionStatus, GenerationBackend, GenerationError, GenerationRequest,
    KvStore, PendingReply,
};

use crate::poll::PollPolicy;

use super::*;

// ---------------------------------------------------------------------
// Test doubles and fixtures
// ---------------------------------------------------------------------

#[derive(Default)]
struct FakeBackend {
    replies: SyncMutex<VecDeque<Result<String, GenerationError>>>,
    requests: SyncMutex<Vec<GenerationRequest>>,
}

impl FakeBackend {
    fn fresh() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn scripted(replies: Vec<Result<String, GenerationError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: SyncMutex::new(replies.into()),
            requests: SyncMutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    fn next_reply(&self) -> Result<String, GenerationError> {
        match self.replies.lock().pop_front() {
            Some(Ok(raw)) => {
                let cleaned = clean_completion(&raw);
                if cleaned.is_empty() {
                    Err(GenerationError::EmptyResponse)
                } else {
                    Ok(cleaned)
                }
            }
            Some(Err(e)) => Err(e),
            None => Ok("了解しました。".to_string()),
        }
    }
}

#[async_trait]
impl GenerationBackend for FakeBackend {
    fn id(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        "fake-model"
    }

    async fn complete(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.next_reply()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().push(request.clone());
        self.next_reply()
    }

    async fn test_connection(&self) -> Result<ConnectionStatus, GenerationError> {
        Ok(ConnectionStatus {
            available_models: vec!["fake-model".to_string()],
        })
    }
}

fn fast_options() -> WatchOptions {
    WatchOptions {
        settle_delay: Duration::from_millis(2),
        step_delay: Duration::from_millis(1),
        feed_attach_retry: Duration::from_millis(10),
        send_poll: PollPolicy::new(5, Duration::from_millis(2)),
        thread_poll: PollPolicy::new(25, Duration::from_millis(2)),
        ..WatchOptions::default()
    }
}

fn message_spec(key: &str, sender: &str, body: &str) -> NodeSpec {
    NodeSpec::new("div").attr("data-item-key", key).child(
        NodeSpec::new("div")
            .class("c-message_kit__background")
            .child(NodeSpec::new("span").class("c-message_kit__sender").text(sender))
            .child(NodeSpec::new("div").class("c-message_kit__blocks").text(body)),
    )
}

fn mention_spec(key: &str, sender: &str, body: &str, mention_uid: &str) -> NodeSpec {
    NodeSpec::new("div").attr("data-item-key", key).child(
        NodeSpec::new("div")
            .class("c-message_kit__background")
            .child(NodeSpec::new("span").class("c-message_kit__sender").text(sender))
            .child(
                NodeSpec::new("div")
                    .class("c-message_kit__blocks")
                    .text(body)
                    .child(
                        NodeSpec::new("span")
                            .class("c-mention")
                            .attr("data-user-id", mention_uid)
                            .text("@自分"),
                    ),
            ),
    )
}

struct Fixture {
    page: Arc<SimPage>,
    list: NodeKey,
    composer: NodeKey,
}

/// A workspace page: identity button, main timeline with three seeded
/// messages, and a composer.
fn workspace_page() -> Fixture {
    let mut tree = PageTree::new();
    tree.attach(
        tree.root(),
        NodeSpec::new("button")
            .attr("data-qa", "user-button")
            .attr("data-user-id", "U123"),
    );
    let main = tree.attach(tree.root(), NodeSpec::new("div").attr("role", "main"));
    let list = tree.attach(main, NodeSpec::new("div").attr("role", "list"));
    tree.attach(list, message_spec("1000.1", "鈴木", "資料を共有しました"));
    tree.attach(list, message_spec("1000.2", "佐藤", "ありがとうございます"));
    tree.attach(list, message_spec("1000.3", "鈴木", "明日までに確認お願いします"));
    let composer = tree.attach(
        tree.root(),
        NodeSpec::new("div").attr("data-qa", "message_input"),
    );
    Fixture {
        page: Arc::new(SimPage::new(tree)),
        list,
        composer,
    }
}

async fn eventually(mut cond: impl FnMut() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        sleep(Duration::from_millis(2)).await;
    }
    panic!("condition not met within deadline");
}

/// Long enough for the watcher to have done anything it was going to do.
async fn settle() {
    sleep(Duration::from_millis(50)).await;
}

/// Wait for the pending reply record to land in page storage.
async fn wait_for_record(storage: &autoreply_protocols::MemoryKvStore) -> String {
    for _ in 0..500 {
        if let Some(raw) = storage.get(OUTBOX_KEY).await.unwrap() {
            return raw;
        }
        sleep(Duration::from_millis(2)).await;
    }
    panic!("pending reply record never appeared");
}

// ---------------------------------------------------------------------
// Timeline flow
// ---------------------------------------------------------------------

#[tokio::test]
async fn test_mention_triggers_drafted_reply() {
    let fx = workspace_page();
    let backend = FakeBackend::scripted(vec![Ok(
        "<think>plan...</think>了解しました、対応します。".to_string(),
    )]);
    let watcher = Watcher::new(fx.page.clone(), backend.clone(), fast_options());
    watcher.start(false, false).await.unwrap();

    fx.page.append(
        fx.list,
        mention_spec("2000.1", "田中", "明日の会議の件、確認お願いします", "U123"),
    );

    let composer = fx.composer;
    let page = fx.page.clone();
    eventually(move || page.node_text(composer) == "了解しました、対応します。").await;

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    // The body is the block's full rendered text, mention markup included.
    assert!(requests[0].message_text.contains("明日の会議の件、確認お願いします"));
    assert_eq!(requests[0].sender_name, "田中");
    assert!(requests[0].context_text.contains("鈴木: 資料を共有しました"));
    assert!(requests[0]
        .context_text
        .contains("鈴木: 明日までに確認お願いします"));

    // Auto-send off: the draft stays, nothing was clicked or submitted.
    let events = fx.page.events();
    assert!(!events
        .iter()
        .any(|e| matches!(e, SimEvent::Click(_) | SimEvent::PressSubmit(_))));

    watcher.stop().await;
}

#[tokio::test]
async fn test_auto_send_clicks_send_control_exactly_once() {
    let fx = workspace_page();
    let send_button = fx.page.append(
        fx.page.tree().root(),
        NodeSpec::new("button").attr("data-qa", "texty_send_button"),
    );
    let backend = FakeBackend::fresh();
    let watcher = Watcher::new(fx.page.clone(), backend.clone(), fast_options());
    watcher.start(true, false).await.unwrap();

    fx.page.append(
        fx.list,
        mention_spec("2000.2", "田中", "確認お願いします", "U123"),
    );

    let page = fx.page.clone();
    eventually(move || {
        page.events()
            .iter()
            .any(|e| matches!(e, SimEvent::Click(_)))
    })
    .await;
    settle().await;

    let clicks: Vec<_> = fx
        .page
        .events()
        .into_iter()
        .filter(|e| matches!(e, SimEvent::Click(_)))
        .collect();
    assert_eq!(clicks, vec![SimEvent::Click(send_button)]);

    watcher.stop().await;
}

#[tokio::test]
async fn test_same_item_key_processed_once() {
    let fx = workspace_page();
    let backend = FakeBackend::fresh();
    let watcher = Watcher::new(fx.page.clone(), backend.clone(), fast_options());
    watcher.start(false, false).await.unwrap();

    fx.page.append(
        fx.list,
        mention_spec("2000.3", "田中", "確認お願いします", "U123"),
    );
    let b = backend.clone();
    eventually(move || b.requests().len() == 1).await;

    // The page re-renders the same item into a fresh batch.
    fx.page.append(
        fx.list,
        mention_spec("2000.3", "田中", "確認お願いします", "U123"),
    );
    settle().await;
    assert_eq!(backend.requests().len(), 1);

    watcher.stop().await;
}

#[tokio::test]
async fn test_generation_failure_is_not_retried() {
    let fx = workspace_page();
    let backend = FakeBackend::scripted(vec![Err(GenerationError::BackendUnavailable(
        "connection refused".to_string(),
    ))]);
    let watcher = Watcher::new(fx.page.clone(), backend.clone(), fast_options());
    watcher.start(false, false).await.unwrap();

    fx.page.append(
        fx.list,
        mention_spec("2000.4", "田中", "確認お願いします", "U123"),
    );
    let b = backend.clone();
    eventually(move || b.requests().len() == 1).await;
    settle().await;

    // Nothing written, and the failed item stays processed.
    assert_eq!(fx.page.node_text(fx.composer), "");
    fx.page.append(
        fx.list,
        mention_spec("2000.4", "田中", "確認お願いします", "U123"),
    );
    settle().await;
    assert_eq!(backend.requests().len(), 1);

    // The watcher itself survived: a different mention still goes through.
    fx.page.append(
        fx.list,
        mention_spec("2000.5", "鈴木", "こちらもお願いします", "U123"),
    );
    let b = backend.clone();
    eventually(move || b.requests().len() == 2).await;

    watcher.stop().await;
}

#[tokio::test]
async fn test_mention_for_other_user_ignored() {
    let fx = workspace_page();
    let backend = FakeBackend::fresh();
    let watcher = Watcher::new(fx.page.clone(), backend.clone(), fast_options());
    watcher.start(false, false).await.unwrap();

    fx.page.append(
        fx.list,
        mention_spec("2000.6", "田中", "別の人あてです", "U999"),
    );
    settle().await;
    assert!(backend.requests().is_empty());

    watcher.stop().await;
}

#[tokio::test]
async fn test_test_mode_matches_any_mention() {
    let fx = workspace_page();
    let backend = FakeBackend::fresh();
    let watcher = Watcher::new(fx.page.clone(), backend.clone(), fast_options());
    watcher.start(false, true).await.unwrap();

    fx.page.append(
        fx.list,
        mention_spec("2000.7", "田中", "別の人あてです", "U999"),
    );
    let b = backend.clone();
    eventually(move || b.requests().len() == 1).await;

    watcher.stop().await;
}

#[tokio::test]
async fn test_unresolved_identity_takes_no_action() {
    // No user button, no config blob, no script: identity stays unknown.
    let mut tree = PageTree::new();
    let main = tree.attach(tree.root(), NodeSpec::new("div").attr("role", "main"));
    let list = tree.attach(main, NodeSpec::new("div").attr("role", "list"));
    tree.attach(
        tree.root(),
        NodeSpec::new("div").attr("data-qa", "message_input"),
    );
    let page = Arc::new(SimPage::new(tree));
    let backend = FakeBackend::fresh();
    let watcher = Watcher::new(page.clone(), backend.clone(), fast_options());
    watcher.start(false, false).await.unwrap();

    page.append(
        list,
        mention_spec("2000.8", "田中", "確認お願いします", "U123"),
    );
    settle().await;
    assert!(backend.requests().is_empty());

    watcher.stop().await;
}

// ---------------------------------------------------------------------
// Activity feed flow
// ---------------------------------------------------------------------

fn feed_entry_spec(key: &str, sender: &str, body: &str, mention_uid: &str) -> NodeSpec {
    NodeSpec::new("div")
        .attr("data-qa", "activity_item")
        .attr("data-item-key", key)
        .child(
            NodeSpec::new("div")
                .class("c-message_kit__background")
                .child(NodeSpec::new("span").class("c-message_kit__sender").text(sender))
                .child(
                    NodeSpec::new("div")
                        .class("c-message_kit__blocks")
                        .text(body)
                        .child(
                            NodeSpec::new("span")
                                .class("c-mention")
                                .attr("data-user-id", mention_uid)
                                .text("@自分"),
                        ),
                ),
        )
}

#[tokio::test]
async fn test_feed_mention_writes_handoff_and_opens_entry() {
    let fx = workspace_page();
    let feed = fx.page.append(
        fx.page.tree().root(),
        NodeSpec::new("div").attr("data-qa", "activity_feed"),
    );
    let backend = FakeBackend::fresh();
    let watcher = Watcher::new(fx.page.clone(), backend.clone(), fast_options());
    watcher.start(false, false).await.unwrap();
    // Give the task a beat to attach the feed subscription.
    settle().await;

    let entry = fx.page.append(
        feed,
        feed_entry_spec("feed.1", "田中", "会議の件どうなりましたか", "U123"),
    );

    let storage = fx.page.storage_handle();
    let raw = wait_for_record(&storage).await;
    let record: PendingReply = serde_json::from_str(&raw).unwrap();
    assert!(record.message_text.contains("会議の件どうなりましたか"));
    assert_eq!(record.sender_name, "田中");
    assert!(record.return_to_feed);

    let page = fx.page.clone();
    eventually(move || {
        page.events()
            .iter()
            .any(|e| *e == SimEvent::Click(entry))
    })
    .await;

    // A re-render of the same top entry does not act again.
    fx.page.append(
        feed,
        feed_entry_spec("feed.1", "田中", "会議の件どうなりましたか", "U123"),
    );
    settle().await;
    let clicks = fx
        .page
        .events()
        .into_iter()
        .filter(|e| matches!(e, SimEvent::Click(_)))
        .count();
    assert_eq!(clicks, 1);

    watcher.stop().await;
}

#[tokio::test]
async fn test_feed_container_attached_after_start() {
    let fx = workspace_page();
    let backend = FakeBackend::fresh();
    let watcher = Watcher::new(fx.page.clone(), backend.clone(), fast_options());
    watcher.start(false, false).await.unwrap();

    // The secondary view renders only now; the retry timer attaches it.
    let feed = fx.page.append(
        fx.page.tree().root(),
        NodeSpec::new("div").attr("data-qa", "activity_feed"),
    );
    sleep(Duration::from_millis(40)).await;

    fx.page.append(
        feed,
        feed_entry_spec("feed.2", "佐藤", "レビューお願いします", "U123"),
    );

    let storage = fx.page.storage_handle();
    wait_for_record(&storage).await;

    watcher.stop().await;
}

// ---------------------------------------------------------------------
// Cross-navigation handoff
// ---------------------------------------------------------------------

/// A conversation view as it looks right after navigating from the feed:
/// highlighted target message with a thread control, plus surrounding
/// messages.
fn conversation_after_navigation() -> (Arc<SimPage>, NodeKey) {
    let mut tree = PageTree::new();
    tree.attach(
        tree.root(),
        NodeSpec::new("button")
            .attr("data-qa", "user-button")
            .attr("data-user-id", "U123"),
    );
    let main = tree.attach(tree.root(), NodeSpec::new("div").attr("role", "main"));
    let list = tree.attach(main, NodeSpec::new("div").attr("role", "list"));
    tree.attach(list, message_spec("3000.1", "鈴木", "先週の議事録です"));
    let target_wrapper = tree.attach(
        list,
        NodeSpec::new("div").attr("data-item-key", "3000.2").child(
            NodeSpec::new("div")
                .class("c-message_kit__background")
                .attr("data-qa", "highlighted_message")
                .child(NodeSpec::new("span").class("c-message_kit__sender").text("田中"))
                .child(
                    NodeSpec::new("div")
                        .class("c-message_kit__blocks")
                        .text("会議の件どうなりましたか")
                        .child(
                            NodeSpec::new("span")
                                .class("c-mention")
                                .attr("data-user-id", "U123")
                                .text("@自分"),
                        ),
                )
                .child(NodeSpec::new("button").attr("data-qa", "start_thread")),
        ),
    );
    tree.attach(list, message_spec("3000.3", "佐藤", "資料はこちらです"));
    tree.attach(
        tree.root(),
        NodeSpec::new("div").attr("data-qa", "message_input"),
    );

    let thread_button = tree
        .descendants(target_wrapper)
        .into_iter()
        .find(|k| tree.get(*k).map(|n| n.attr("data-qa") == Some("start_thread")) == Some(true))
        .unwrap();

    let page = Arc::new(SimPage::new(tree));
    (page, thread_button)
}

async fn put_record(page: &SimPage, record: &PendingReply) {
    page.storage()
        .set(OUTBOX_KEY, &serde_json::to_string(record).unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_handoff_consumed_into_thread_reply() {
    let (page, thread_button) = conversation_after_navigation();
    page.on_click(thread_button, |tree| {
        let pane = tree.attach(
            tree.root(),
            NodeSpec::new("div")
                .attr("data-qa", "threads_flexpane")
                .child(NodeSpec::new("div").attr("data-qa", "message_input")),
        );
        vec![pane]
    });

    let record =
        PendingReply::new("会議の件どうなりましたか", "田中").with_return_to_feed(true);
    put_record(&page, &record).await;

    let backend = FakeBackend::fresh();
    let watcher = Watcher::new(page.clone(), backend.clone(), fast_options());
    watcher.start(false, false).await.unwrap();

    let p = page.clone();
    eventually(move || {
        p.events()
            .iter()
            .any(|e| *e == SimEvent::Navigate("activity".to_string()))
    })
    .await;

    // The record was consumed exactly once and is gone from storage.
    assert!(page
        .storage_handle()
        .get(OUTBOX_KEY)
        .await
        .unwrap()
        .is_none());

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].message_text, "会議の件どうなりましたか");
    assert_eq!(requests[0].sender_name, "田中");
    // Context around the highlighted target, both directions.
    assert!(requests[0].context_text.contains("鈴木: 先週の議事録です"));
    assert!(requests[0].context_text.contains("佐藤: 資料はこちらです"));

    // The reply landed in the thread composer, not the primary one.
    let tree = page.tree();
    let injected = page
        .events()
        .into_iter()
        .find_map(|e| match e {
            SimEvent::InsertText(node, text) => Some((node, text)),
            _ => None,
        })
        .expect("a reply should have been injected");
    assert_eq!(injected.1, "了解しました。");
    assert!(tree
        .closest(injected.0, |n| n.attr("data-qa") == Some("threads_flexpane"))
        .is_some());

    watcher.stop().await;
}

#[tokio::test]
async fn test_stale_handoff_never_triggers_injection() {
    let (page, _thread_button) = conversation_after_navigation();
    let mut record = PendingReply::new("古い依頼です", "田中");
    record.created_at = Utc::now() - chrono::Duration::minutes(6);
    put_record(&page, &record).await;

    let backend = FakeBackend::fresh();
    let watcher = Watcher::new(page.clone(), backend.clone(), fast_options());
    watcher.start(false, false).await.unwrap();
    settle().await;

    assert!(backend.requests().is_empty());
    assert!(!page
        .events()
        .iter()
        .any(|e| matches!(e, SimEvent::InsertText(_, _))));
    // Discarded, not left behind.
    assert!(page
        .storage_handle()
        .get(OUTBOX_KEY)
        .await
        .unwrap()
        .is_none());

    watcher.stop().await;
}

// ---------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------

#[tokio::test]
async fn test_stop_tears_down_and_clears_record() {
    let fx = workspace_page();
    let backend = FakeBackend::fresh();
    let watcher = Watcher::new(fx.page.clone(), backend.clone(), fast_options());
    watcher.start(false, false).await.unwrap();
    assert!(watcher.is_watching());

    fx.page
        .storage()
        .set(OUTBOX_KEY, "{\"stale\":\"record\"}")
        .await
        .unwrap();
    watcher.stop().await;
    assert!(!watcher.is_watching());
    assert!(fx
        .page
        .storage_handle()
        .get(OUTBOX_KEY)
        .await
        .unwrap()
        .is_none());

    // Disabled: new mentions are ignored.
    fx.page.append(
        fx.list,
        mention_spec("4000.1", "田中", "確認お願いします", "U123"),
    );
    settle().await;
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_start_is_idempotent_while_watching() {
    let fx = workspace_page();
    let backend = FakeBackend::fresh();
    let watcher = Watcher::new(fx.page.clone(), backend.clone(), fast_options());
    watcher.start(false, false).await.unwrap();
    watcher.start(true, true).await.unwrap();
    assert!(watcher.is_watching());
    watcher.stop().await;
}
