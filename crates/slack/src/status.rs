use std::sync::Arc;

use tracing::warn;

use crate::api::{post_or_log, update_or_log, ChatApi, MessageBody, MessageHandle};

/// Posts the "in progress" line for an invocation and later rewrites that
/// same line with the terminal outcome.
#[derive(Clone)]
pub struct StatusReporter {
    api: Arc<dyn ChatApi>,
}

impl StatusReporter {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self { api }
    }

    pub async fn progress(&self, channel: &str, text: impl Into<String>) -> ProgressMessage {
        let handle = post_or_log(self.api.as_ref(), channel, MessageBody::text(text)).await;
        if handle.is_none() {
            warn!(channel, "progress message was not delivered; terminal update will be lost too");
        }
        ProgressMessage { api: Arc::clone(&self.api), channel: channel.to_string(), handle }
    }
}

/// The in-flight status line of one invocation. Resolution consumes the
/// value, so each invocation gets exactly one terminal update; a message
/// whose initial post failed resolves into a log entry only.
pub struct ProgressMessage {
    api: Arc<dyn ChatApi>,
    channel: String,
    handle: Option<MessageHandle>,
}

impl ProgressMessage {
    pub async fn resolve(self, success: bool, success_text: &str, failure_text: &str) {
        let text = if success { success_text } else { failure_text };
        match &self.handle {
            Some(handle) => {
                update_or_log(self.api.as_ref(), &self.channel, handle, MessageBody::text(text))
                    .await;
            }
            None => warn!(channel = %self.channel, outcome = text, "terminal status had no message to update"),
        }
    }
}
