//! Page driver over the Chrome DevTools Protocol.
//!
//! The original automation ran inside the page; this driver attaches to
//! an already-running Chromium started with `--remote-debugging-port`,
//! injects a collector script that mirrors the DOM and relays mutation
//! batches through a CDP binding, and executes the reply gestures
//! in-page.

mod client;
mod collector;
mod driver;
mod error;
mod protocol;

pub use client::CdpClient;
pub use driver::{CdpPage, CdpPageConfig};
pub use error::CdpError;
