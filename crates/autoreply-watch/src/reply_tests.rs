use std::time::Duration;

use autoreply_page::{NodeSpec, PageTree, SimEvent, SimPage};

use crate::poll::PollPolicy;

use super::*;

fn fast_options() -> WatchOptions {
    WatchOptions {
        settle_delay: Duration::from_millis(1),
        step_delay: Duration::from_millis(1),
        send_poll: PollPolicy::new(25, Duration::from_millis(2)),
        thread_poll: PollPolicy::new(25, Duration::from_millis(2)),
        ..WatchOptions::default()
    }
}

fn writer_over(page: Arc<SimPage>) -> ReplyWriter {
    ReplyWriter::new(page, Arc::new(Extractor::default()), fast_options())
}

fn page_with_composer() -> (Arc<SimPage>, NodeKey) {
    let mut tree = PageTree::new();
    let composer = tree.attach(
        tree.root(),
        NodeSpec::new("div").attr("data-qa", "message_input"),
    );
    (Arc::new(SimPage::new(tree)), composer)
}

#[tokio::test]
async fn test_inject_step_order() {
    let (page, composer) = page_with_composer();
    let writer = writer_over(page.clone());

    writer.inject(composer, "了解です").await.unwrap();

    assert_eq!(
        page.events(),
        vec![
            SimEvent::Focus(composer),
            SimEvent::ClearText(composer),
            SimEvent::InsertText(composer, "了解です".to_string()),
            SimEvent::EmitInput(composer),
        ]
    );
    assert_eq!(page.node_text(composer), "了解です");
}

#[tokio::test]
async fn test_inject_replaces_existing_draft() {
    let (page, composer) = page_with_composer();
    page.mutate(|tree| {
        tree.set_text(composer, "old draft");
        vec![]
    });
    let writer = writer_over(page.clone());

    writer.inject(composer, "new reply").await.unwrap();
    assert_eq!(page.node_text(composer), "new reply");
}

#[tokio::test]
async fn test_dispatch_semi_auto_leaves_draft() {
    let (page, composer) = page_with_composer();
    let writer = writer_over(page.clone());

    let outcome = writer.dispatch(composer, false).await;
    assert_eq!(outcome, DispatchOutcome::Drafted);
    // No click, no key event.
    assert!(page.events().is_empty());
}

#[tokio::test]
async fn test_dispatch_clicks_enabled_send_button() {
    let (page, composer) = page_with_composer();
    let button = page.append(
        page.tree().root(),
        NodeSpec::new("button").attr("data-qa", "texty_send_button"),
    );
    let writer = writer_over(page.clone());

    let outcome = writer.dispatch(composer, true).await;
    assert_eq!(outcome, DispatchOutcome::Sent);
    assert_eq!(page.events(), vec![SimEvent::Click(button)]);
}

#[tokio::test]
async fn test_dispatch_falls_back_to_submit_key_when_disabled() {
    let (page, composer) = page_with_composer();
    page.append(
        page.tree().root(),
        NodeSpec::new("button")
            .attr("data-qa", "texty_send_button")
            .attr("disabled", ""),
    );
    let writer = writer_over(page.clone());

    let outcome = writer.dispatch(composer, true).await;
    assert_eq!(outcome, DispatchOutcome::SentViaKeyboard);
    assert_eq!(page.events(), vec![SimEvent::PressSubmit(composer)]);
}

#[tokio::test]
async fn test_dispatch_waits_for_button_to_enable() {
    let (page, composer) = page_with_composer();
    let button = page.append(
        page.tree().root(),
        NodeSpec::new("button")
            .attr("data-qa", "texty_send_button")
            .attr("aria-disabled", "true"),
    );
    // The page enables the control a beat later.
    let enabler = {
        let page = page.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2)).await;
            page.mutate(|tree| {
                tree.set_attr(button, "aria-disabled", "false");
                vec![]
            });
        })
    };

    let writer = writer_over(page.clone());
    let outcome = writer.dispatch(composer, true).await;
    enabler.await.unwrap();

    assert_eq!(outcome, DispatchOutcome::Sent);
}

#[tokio::test]
async fn test_open_thread_composer() {
    let mut tree = PageTree::new();
    let list = tree.attach(tree.root(), NodeSpec::new("div").attr("role", "list"));
    let message = tree.attach(
        list,
        NodeSpec::new("div")
            .class("c-message_kit__background")
            .child(NodeSpec::new("button").attr("data-qa", "start_thread")),
    );
    let page = Arc::new(SimPage::new(tree));

    let snapshot = page.tree();
    let button = snapshot.children(message)[0];
    page.on_click(button, |tree| {
        let pane = tree.attach(
            tree.root(),
            NodeSpec::new("div").attr("data-qa", "threads_flexpane").child(
                NodeSpec::new("div").attr("data-qa", "message_input"),
            ),
        );
        vec![pane]
    });

    let writer = writer_over(page.clone());
    let composer = writer.open_thread_composer(message).await.unwrap();

    let tree = page.tree();
    let pane = tree
        .closest(composer, |n| n.attr("data-qa") == Some("threads_flexpane"))
        .expect("composer should live in the thread pane");
    assert_ne!(pane, composer);
}

#[tokio::test]
async fn test_open_thread_falls_back_to_primary_composer() {
    let mut tree = PageTree::new();
    let primary = tree.attach(
        tree.root(),
        NodeSpec::new("div").attr("data-qa", "message_input"),
    );
    let list = tree.attach(tree.root(), NodeSpec::new("div").attr("role", "list"));
    // Message without a thread control.
    let message = tree.attach(list, NodeSpec::new("div").class("c-message_kit__background"));
    let page = Arc::new(SimPage::new(tree));

    let writer = writer_over(page.clone());
    let composer = writer.open_thread_composer(message).await.unwrap();
    assert_eq!(composer, primary);
}

#[tokio::test]
async fn test_open_thread_composer_missing_everywhere() {
    let tree = PageTree::new();
    let page = Arc::new(SimPage::new(tree));
    let writer = writer_over(page.clone());

    let result = writer.open_thread_composer(NodeKey(999)).await;
    assert!(matches!(result, Err(AutomationError::ElementNotFound(_))));
}
