//! Transient status text with an expiry.
//!
//! Engine-level failures (invalid positions, refused operations) are
//! never hard errors in the view; they surface here and age out on
//! their own. The line holds at most one message and a newer one
//! replaces whatever is showing.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct StatusLine {
    linger: Duration,
    message: Option<(String, Instant)>,
}

impl StatusLine {
    pub fn new(linger: Duration) -> Self {
        Self {
            linger,
            message: None,
        }
    }

    pub fn show(&mut self, message: impl Into<String>) {
        self.message = Some((message.into(), Instant::now()));
    }

    /// The message, if it has not aged out yet.
    pub fn current(&self) -> Option<&str> {
        match &self.message {
            Some((text, since)) if since.elapsed() < self.linger => Some(text),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn message_ages_out_after_linger() {
        let mut status = StatusLine::new(Duration::from_secs(3));
        status.show("image paste failed");
        assert_eq!(status.current(), Some("image paste failed"));
        advance(Duration::from_millis(2999)).await;
        assert!(status.current().is_some());
        advance(Duration::from_millis(2)).await;
        assert_eq!(status.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_message_restarts_the_clock() {
        let mut status = StatusLine::new(Duration::from_secs(3));
        status.show("first");
        advance(Duration::from_secs(2)).await;
        status.show("second");
        advance(Duration::from_secs(2)).await;
        assert_eq!(status.current(), Some("second"));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_drops_immediately() {
        let mut status = StatusLine::new(Duration::from_secs(3));
        status.show("gone");
        status.clear();
        assert_eq!(status.current(), None);
    }
}
