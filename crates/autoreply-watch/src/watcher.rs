//! The watcher state machine.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use autoreply_core::{ReplyOutbox, Session};
use autoreply_page::{resolve_user_id, Extractor, PageDriver};
use autoreply_protocols::{AutomationError, GenerationBackend};

use crate::config::WatchOptions;
use crate::reply::ReplyWriter;
use crate::task::WatcherTask;

enum State {
    Stopped,
    Watching {
        shutdown: watch::Sender<bool>,
        handle: JoinHandle<()>,
    },
}

/// Watches a page for mentions and orchestrates replies.
///
/// `Stopped → Watching` on [`start`](Watcher::start): identity is
/// resolved, the session state is created, and the processing task
/// attaches its subscriptions. `Watching → Stopped` on
/// [`stop`](Watcher::stop): subscriptions are torn down and any pending
/// cross-navigation record is cleared.
pub struct Watcher {
    driver: Arc<dyn PageDriver>,
    backend: Arc<dyn GenerationBackend>,
    extractor: Arc<Extractor>,
    options: WatchOptions,
    state: Mutex<State>,
}

impl Watcher {
    pub fn new(
        driver: Arc<dyn PageDriver>,
        backend: Arc<dyn GenerationBackend>,
        options: WatchOptions,
    ) -> Self {
        Self {
            driver,
            backend,
            extractor: Arc::new(Extractor::default()),
            options,
            state: Mutex::new(State::Stopped),
        }
    }

    /// Replace the default selector strategies.
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn is_watching(&self) -> bool {
        matches!(*self.state.lock(), State::Watching { .. })
    }

    /// Enable auto-reply. Idempotent while already watching.
    pub async fn start(&self, auto_send: bool, test_mode: bool) -> Result<(), AutomationError> {
        if self.is_watching() {
            debug!("watcher already running");
            return Ok(());
        }

        let tree = self.driver.snapshot().await?;
        let mut session = Session::new(auto_send, test_mode);
        let storage = self.driver.storage();
        match resolve_user_id(&tree, self.extractor.selectors(), storage.as_ref()).await {
            Ok(id) => session.user_id = Some(id),
            Err(e) => warn!(error = %e, "mention matching disabled for this session"),
        }

        let container = self.extractor.message_container(&tree);
        let primary_rx = self.driver.subscribe(container).await?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = WatcherTask {
            driver: self.driver.clone(),
            backend: self.backend.clone(),
            extractor: self.extractor.clone(),
            options: self.options.clone(),
            writer: ReplyWriter::new(
                self.driver.clone(),
                self.extractor.clone(),
                self.options.clone(),
            ),
            outbox: ReplyOutbox::new(self.driver.storage()),
            session,
            primary_rx,
            shutdown_rx,
        };
        let handle = tokio::spawn(task.run());

        *self.state.lock() = State::Watching {
            shutdown: shutdown_tx,
            handle,
        };
        info!(auto_send, test_mode, "auto-reply watching");
        Ok(())
    }

    /// Disable auto-reply.
    ///
    /// A reply attempt in flight runs to completion first; there is no
    /// mid-flight cancellation.
    pub async fn stop(&self) {
        let state = std::mem::replace(&mut *self.state.lock(), State::Stopped);
        if let State::Watching { shutdown, handle } = state {
            let _ = shutdown.send(true);
            let _ = handle.await;
            let outbox = ReplyOutbox::new(self.driver.storage());
            if let Err(e) = outbox.clear().await {
                warn!(error = %e, "pending reply record not cleared");
            }
            info!("auto-reply stopped");
        }
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
