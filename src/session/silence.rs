use std::time::Duration;

use tokio::sync::mpsc::WeakSender;
use tokio::task::JoinHandle;
use tracing::debug;

use super::controller::Command;

/// Arms and cancels the single delayed auto-stop for the live session.
///
/// A continuous-listening engine may never say "no further input expected";
/// this is the policy layer that turns a quiet window into an explicit
/// stop. At most one timer is armed at a time: arming replaces the previous
/// one, and every teardown path disarms unconditionally so a stray timer
/// can never fire against a superseded session. The posted message carries
/// the session epoch, so even a timer that slips through is fenced off by
/// the controller.
pub(crate) struct SilenceTimeoutManager {
    window: Duration,
    mailbox: WeakSender<Command>,
    armed: Option<JoinHandle<()>>,
}

impl SilenceTimeoutManager {
    pub(crate) fn new(window: Duration, mailbox: WeakSender<Command>) -> Self {
        Self {
            window,
            mailbox,
            armed: None,
        }
    }

    /// (Re)arm the auto-stop window for the given session.
    pub(crate) fn arm(&mut self, epoch: u64) {
        self.disarm();

        let window = self.window;
        let mailbox = self.mailbox.clone();

        debug!(window_ms = window.as_millis() as u64, "silence timer armed");

        self.armed = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if let Some(tx) = mailbox.upgrade() {
                let _ = tx.send(Command::SilenceElapsed { epoch }).await;
            }
        }));
    }

    /// Cancel the outstanding timer, if any. Called on speech activity and
    /// on every session teardown.
    pub(crate) fn disarm(&mut self) {
        if let Some(handle) = self.armed.take() {
            handle.abort();
        }
    }
}

impl Drop for SilenceTimeoutManager {
    fn drop(&mut self) {
        self.disarm();
    }
}
