//! Reply injection and dispatch.
//!
//! The composer's enabled/disabled state is asynchronous and unreliable,
//! so dispatch carries fallbacks: an enabled send control is clicked;
//! otherwise the platform submit key event is synthesized on the
//! composer; if neither works the draft stays for manual review and the
//! attempt counts as a partial success. Nothing is retried.

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use autoreply_page::{Extractor, NodeKey, PageDriver};
use autoreply_protocols::AutomationError;

use crate::config::WatchOptions;
use crate::poll::poll_until;

/// How a dispatch attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Auto-send off: the draft is left for manual review.
    Drafted,
    /// The send control was clicked.
    Sent,
    /// The submit key event was synthesized on the composer.
    SentViaKeyboard,
    /// Neither send path worked; the draft stays unsent.
    DraftLeft,
}

/// Writes generated replies into the page.
pub struct ReplyWriter {
    driver: Arc<dyn PageDriver>,
    extractor: Arc<Extractor>,
    options: WatchOptions,
}

impl ReplyWriter {
    pub fn new(driver: Arc<dyn PageDriver>, extractor: Arc<Extractor>, options: WatchOptions) -> Self {
        Self {
            driver,
            extractor,
            options,
        }
    }

    /// Clear the composer and insert `text`, emitting the input event the
    /// host page expects, with short settling delays between steps.
    pub async fn inject(&self, composer: NodeKey, text: &str) -> Result<(), AutomationError> {
        self.driver.focus(composer).await?;
        sleep(self.options.step_delay).await;
        self.driver.clear_text(composer).await?;
        self.driver.insert_text(composer, text).await?;
        self.driver.emit_input(composer).await?;
        sleep(self.options.step_delay).await;
        Ok(())
    }

    /// Send the drafted reply, or leave it for manual review.
    pub async fn dispatch(&self, composer: NodeKey, should_send: bool) -> DispatchOutcome {
        if !should_send {
            info!("reply drafted; manual send required");
            return DispatchOutcome::Drafted;
        }

        // The send control reports enabled asynchronously after the input
        // event; poll briefly before falling back.
        let button = poll_until(&self.options.send_poll, || async {
            let tree = self.driver.snapshot().await.ok()?;
            let button = self.extractor.find_send_button(&tree)?;
            (!tree.get(button)?.is_disabled()).then_some(button)
        })
        .await;

        if let Some(button) = button {
            match self.driver.click(button).await {
                Ok(()) => {
                    info!("reply sent via send control");
                    return DispatchOutcome::Sent;
                }
                Err(e) => warn!(error = %e, "send control click failed"),
            }
        } else {
            debug!("send control missing or disabled; falling back to submit key");
        }

        match self.driver.press_submit(composer).await {
            Ok(()) => {
                info!("reply sent via submit key");
                DispatchOutcome::SentViaKeyboard
            }
            Err(e) => {
                warn!(error = %e, "submit key failed; leaving draft unsent");
                DispatchOutcome::DraftLeft
            }
        }
    }

    /// Open the reply-thread view for `message` and return its composer.
    ///
    /// Falls back to the primary composer when the message has no thread
    /// control or the thread composer never appears.
    pub async fn open_thread_composer(
        &self,
        message: NodeKey,
    ) -> Result<NodeKey, AutomationError> {
        let tree = self.driver.snapshot().await?;

        if let Some(button) = self.extractor.find_thread_button(&tree, message) {
            self.driver.click(button).await?;
            let composer = poll_until(&self.options.thread_poll, || async {
                let tree = self.driver.snapshot().await.ok()?;
                let pane = self.extractor.find_thread_pane(&tree)?;
                self.extractor.find_composer_within(&tree, pane)
            })
            .await;
            if let Some(composer) = composer {
                return Ok(composer);
            }
            debug!("thread composer never appeared; using primary composer");
        } else {
            debug!("no thread control on message; using primary composer");
        }

        let tree = self.driver.snapshot().await?;
        self.extractor
            .find_composer(&tree)
            .ok_or_else(|| AutomationError::ElementNotFound("composer".to_string()))
    }
}

#[cfg(test)]
#[path = "reply_tests.rs"]
mod tests;
