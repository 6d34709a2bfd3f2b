//! Outbound notification and inbound command channels.
//!
//! Both traits are infallible. Implementations keep their own
//! `Result`-returning methods and log failures at this edge.

pub mod telegram;

use async_trait::async_trait;

pub use telegram::TelegramChannel;

/// A command received from a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    /// Monotonic update id from the source, used to advance the offset.
    pub update_id: i64,
    /// Where replies go (chat id).
    pub recipient: String,
    pub text: String,
}

/// Best-effort message delivery.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, text: &str);
}

/// Polls for commands received since `offset`.
#[async_trait]
pub trait CommandSource: Send + Sync {
    /// Returns an empty list on failure.
    async fn poll(&self, offset: Option<i64>, wait_secs: u32) -> Vec<InboundCommand>;
}

/// Prints notifications to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, _recipient: &str, text: &str) {
        println!("{}", text);
    }
}

/// Sends every notification to each inner notifier in order.
///
/// Each inner notifier may carry a fixed recipient that overrides the one
/// given by the caller (the CLI routes console detections to a configured chat).
#[derive(Default)]
pub struct FanoutNotifier {
    targets: Vec<(Box<dyn Notifier>, Option<String>)>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.targets.push((notifier, None));
        self
    }

    pub fn push_to(mut self, notifier: Box<dyn Notifier>, recipient: &str) -> Self {
        self.targets.push((notifier, Some(recipient.to_string())));
        self
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    async fn send(&self, recipient: &str, text: &str) {
        for (notifier, fixed) in &self.targets {
            let to = fixed.as_deref().unwrap_or(recipient);
            notifier.send(to, text).await;
        }
    }
}
