//! The watcher's sequential processing task.
//!
//! One task consumes every mutation batch, in arrival order, to
//! completion: tracker mutations never race and a reply attempt in
//! flight finishes before the next batch is considered.

use std::sync::Arc;

use tokio::select;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, sleep, Interval};
use tracing::{debug, info, warn};

use autoreply_core::{ReplyOutbox, Session};
use autoreply_page::{Extractor, MutationBatch, NodeKey, PageDriver, PageTree};
use autoreply_protocols::{
    AutomationError, GenerationBackend, GenerationRequest, MessageSource, PendingReply,
};

use crate::config::WatchOptions;
use crate::reply::ReplyWriter;

/// Navigation target bringing the activity feed back into view.
const FEED_VIEW_TARGET: &str = "activity";

pub(crate) struct WatcherTask {
    pub driver: Arc<dyn PageDriver>,
    pub backend: Arc<dyn GenerationBackend>,
    pub extractor: Arc<Extractor>,
    pub options: WatchOptions,
    pub session: Session,
    pub writer: ReplyWriter,
    pub outbox: ReplyOutbox,
    pub primary_rx: mpsc::UnboundedReceiver<MutationBatch>,
    pub shutdown_rx: watch::Receiver<bool>,
}

impl WatcherTask {
    pub(crate) async fn run(mut self) {
        // Resume any reply interrupted by a navigation before watching
        // for new mutations.
        self.consume_handoff().await;

        let mut feed_rx = self.try_attach_feed().await;
        let mut feed_retry = interval(self.options.feed_attach_retry);
        let mut fallback = self.options.feed_poll_interval.map(interval);

        loop {
            select! {
                _ = self.shutdown_rx.changed() => break,
                batch = self.primary_rx.recv() => match batch {
                    Some(batch) => self.handle_timeline_batch(batch).await,
                    None => {
                        debug!("primary subscription closed");
                        break;
                    }
                },
                batch = Self::recv_opt(&mut feed_rx) => match batch {
                    Some(_) => self.handle_feed_batch().await,
                    None => feed_rx = None,
                },
                _ = feed_retry.tick(), if feed_rx.is_none() => {
                    feed_rx = self.try_attach_feed().await;
                }
                _ = Self::tick_opt(&mut fallback) => {
                    // Safety net when event delivery is unreliable.
                    self.scan_feed_top().await;
                }
            }
        }
        debug!("watcher task finished");
    }

    async fn recv_opt(
        rx: &mut Option<mpsc::UnboundedReceiver<MutationBatch>>,
    ) -> Option<MutationBatch> {
        match rx {
            Some(rx) => rx.recv().await,
            None => std::future::pending().await,
        }
    }

    async fn tick_opt(interval: &mut Option<Interval>) {
        match interval {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Attach to the activity container once it exists. The secondary
    /// view may not be rendered at enable time; the retry timer keeps
    /// calling this until it is.
    async fn try_attach_feed(&self) -> Option<mpsc::UnboundedReceiver<MutationBatch>> {
        let tree = self.driver.snapshot().await.ok()?;
        let container = self.extractor.feed_container(&tree)?;
        match self.driver.subscribe(container).await {
            Ok(rx) => {
                debug!("activity feed subscription attached");
                Some(rx)
            }
            Err(e) => {
                warn!(error = %e, "activity feed subscription failed");
                None
            }
        }
    }

    async fn handle_timeline_batch(&mut self, batch: MutationBatch) {
        sleep(self.options.settle_delay).await;
        let tree = match self.driver.snapshot().await {
            Ok(tree) => tree,
            Err(e) => {
                warn!(error = %e, "snapshot failed; batch dropped");
                return;
            }
        };
        for added in batch.added {
            if tree.get(added).is_none() {
                // Gone again before the batch settled.
                continue;
            }
            for message in self.extractor.messages_within(&tree, added) {
                self.process_timeline_message(&tree, message).await;
            }
        }
    }

    async fn process_timeline_message(&mut self, tree: &PageTree, message: NodeKey) {
        if !self.session.mention_matching_enabled() {
            return;
        }
        let Some(observed) = self.extractor.observe(
            tree,
            message,
            self.session.user_id.as_deref(),
            self.session.test_mode,
            MessageSource::Timeline,
        ) else {
            return;
        };
        if !observed.addressed_to_me {
            return;
        }
        if !self.session.timeline.should_process(&observed.item_key) {
            debug!(item_key = %observed.item_key, "already processed");
            return;
        }
        // Marked before any asynchronous work begins: a re-delivered
        // batch cannot double-process, and a failed attempt is skipped
        // for good rather than retried.
        self.session.timeline.mark_processed(&observed.item_key);
        info!(
            item_key = %observed.item_key,
            sender = %observed.sender,
            "mention detected"
        );

        if observed.body.is_empty() {
            warn!(item_key = %observed.item_key, "mention has no body text; skipped");
            return;
        }
        let context = self
            .extractor
            .context_before(tree, message, self.options.context_before);
        let request = GenerationRequest::new(observed.body)
            .with_context(context.render())
            .with_sender(observed.sender);
        self.draft_and_send(request, None).await;
    }

    async fn handle_feed_batch(&mut self) {
        sleep(self.options.settle_delay).await;
        self.scan_feed_top().await;
    }

    /// Act on the newest unprocessed top entry of the activity feed, at
    /// most one per scan.
    async fn scan_feed_top(&mut self) {
        if !self.session.mention_matching_enabled() {
            return;
        }
        let tree = match self.driver.snapshot().await {
            Ok(tree) => tree,
            Err(e) => {
                warn!(error = %e, "snapshot failed; feed scan dropped");
                return;
            }
        };
        let Some(entry) = self.extractor.feed_top_entry(&tree) else {
            return;
        };
        let Some(key) = self.extractor.item_key(&tree, entry) else {
            return;
        };
        if !self.session.feed.observe_top(&key) {
            return;
        }

        let message = self
            .extractor
            .messages_within(&tree, entry)
            .into_iter()
            .next()
            .unwrap_or(entry);
        let Some(observed) = self.extractor.observe(
            &tree,
            message,
            self.session.user_id.as_deref(),
            self.session.test_mode,
            MessageSource::ActivityFeed,
        ) else {
            return;
        };
        if !observed.addressed_to_me {
            debug!(item_key = %key, "feed top entry not addressed to us");
            return;
        }

        self.session.feed.mark_processed(&key);
        info!(item_key = %key, sender = %observed.sender, "new activity feed mention");

        if observed.body.is_empty() {
            warn!(item_key = %key, "feed entry has no body text; skipped");
            return;
        }

        // Replying requires leaving the feed. Persist the handoff first,
        // then navigate into the conversation by opening the entry; the
        // post-navigation cycle consumes the record.
        let record =
            PendingReply::new(observed.body, observed.sender).with_return_to_feed(true);
        if let Err(e) = self.outbox.put(&record).await {
            warn!(error = %e, "pending reply record not written; feed entry skipped");
            return;
        }
        if let Err(e) = self.driver.click(entry).await {
            warn!(error = %e, "feed entry click failed");
            let _ = self.outbox.clear().await;
        }
    }

    /// Consume a cross-navigation handoff, if one is pending and fresh.
    async fn consume_handoff(&mut self) {
        let max_age = chrono::Duration::from_std(self.options.handoff_max_age)
            .unwrap_or_else(|_| chrono::Duration::minutes(5));
        let record = match self.outbox.take(max_age).await {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(AutomationError::StaleHandoff { age_seconds }) => {
                warn!(age_seconds, "stale pending reply discarded");
                return;
            }
            Err(e) => {
                warn!(error = %e, "pending reply record unreadable");
                return;
            }
        };
        info!(sender = %record.sender_name, "resuming reply after navigation");

        let tree = match self.driver.snapshot().await {
            Ok(tree) => tree,
            Err(e) => {
                warn!(error = %e, "snapshot failed; handoff dropped");
                return;
            }
        };

        // The host page highlights the target message right after the
        // navigation; the most recent mention is the fallback.
        let target = self
            .extractor
            .find_highlighted_message(&tree)
            .or_else(|| self.extractor.last_mention_message(&tree));

        let context = match target {
            Some(target) => self
                .extractor
                .context_around(
                    &tree,
                    target,
                    self.options.context_before,
                    self.options.feed_context_after,
                )
                .render(),
            None => String::new(),
        };

        let request = GenerationRequest::new(record.message_text.clone())
            .with_context(context)
            .with_sender(record.sender_name.clone());

        let composer = match target {
            Some(target) => match self.writer.open_thread_composer(target).await {
                Ok(composer) => Some(composer),
                Err(e) => {
                    warn!(error = %e, "thread composer unavailable");
                    None
                }
            },
            None => None,
        };
        self.draft_and_send(request, composer).await;

        if record.return_to_feed {
            if let Err(e) = self.driver.navigate(FEED_VIEW_TARGET).await {
                debug!(error = %e, "return navigation failed");
            }
        }
    }

    /// Generate a reply and write it into the composer. All failures are
    /// logged and abandon this one attempt.
    async fn draft_and_send(&self, request: GenerationRequest, composer: Option<NodeKey>) {
        let reply = match self.backend.generate(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "generation failed; attempt abandoned");
                return;
            }
        };

        let composer = match composer {
            Some(composer) => composer,
            None => {
                let tree = match self.driver.snapshot().await {
                    Ok(tree) => tree,
                    Err(e) => {
                        warn!(error = %e, "snapshot failed; reply dropped");
                        return;
                    }
                };
                match self.extractor.find_composer(&tree) {
                    Some(composer) => composer,
                    None => {
                        warn!("composer not found; reply dropped");
                        return;
                    }
                }
            }
        };

        if let Err(e) = self.writer.inject(composer, &reply).await {
            warn!(error = %e, "reply injection failed");
            return;
        }
        let outcome = self.writer.dispatch(composer, self.session.auto_send).await;
        debug!(outcome = ?outcome, "reply attempt finished");
    }
}
