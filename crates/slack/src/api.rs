use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;
use tracing::error;

use crate::blocks::MessageTemplate;

/// Opaque reference to a posted message, used to update that same message
/// later. The transport hands it back from the first post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageHandle {
    pub timestamp: String,
}

/// Metadata attached to a posted message and echoed back by the transport
/// on interactions with that message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageMetadata {
    pub event_type: String,
    pub payload: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MessageBody {
    Text(String),
    Blocks { template: MessageTemplate, metadata: Option<MessageMetadata> },
}

impl MessageBody {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn blocks(template: MessageTemplate) -> Self {
        Self::Blocks { template, metadata: None }
    }

    pub fn blocks_with_metadata(template: MessageTemplate, metadata: MessageMetadata) -> Self {
        Self::Blocks { template, metadata: Some(metadata) }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatApiError {
    #[error("post to channel `{channel}` failed: {detail}")]
    Post { channel: String, detail: String },
    #[error("update in channel `{channel}` failed: {detail}")]
    Update { channel: String, detail: String },
    #[error("replacement via response url failed: {detail}")]
    Replace { detail: String },
}

/// The chat transport's message surface. Every call is fallible but never
/// fatal to the relay; callers go through the `*_or_log` helpers which log
/// failures and continue.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn post_message(
        &self,
        channel: &str,
        body: MessageBody,
    ) -> Result<MessageHandle, ChatApiError>;

    async fn update_message(
        &self,
        channel: &str,
        handle: &MessageHandle,
        body: MessageBody,
    ) -> Result<(), ChatApiError>;

    /// Replace the message a user interacted with, addressed by its
    /// response URL rather than a channel/timestamp pair.
    async fn replace_original(
        &self,
        response_url: &str,
        body: MessageBody,
    ) -> Result<(), ChatApiError>;
}

pub async fn post_or_log(
    api: &dyn ChatApi,
    channel: &str,
    body: MessageBody,
) -> Option<MessageHandle> {
    match api.post_message(channel, body).await {
        Ok(handle) => Some(handle),
        Err(error) => {
            error!(channel, error = %error, "unable to post message to slack channel");
            None
        }
    }
}

pub async fn update_or_log(
    api: &dyn ChatApi,
    channel: &str,
    handle: &MessageHandle,
    body: MessageBody,
) {
    if let Err(error) = api.update_message(channel, handle, body).await {
        error!(channel, error = %error, "unable to update message in slack channel");
    }
}

pub async fn replace_or_log(api: &dyn ChatApi, response_url: &str, body: MessageBody) {
    if let Err(error) = api.replace_original(response_url, body).await {
        error!(error = %error, "unable to replace original slack message");
    }
}

/// Plain-text broadcast, most often into the configured notify channel.
pub async fn notify(api: &dyn ChatApi, channel: &str, text: impl Into<String>) {
    let _ = post_or_log(api, channel, MessageBody::Text(text.into())).await;
}

/// Transport stand-in that accepts everything and delivers nothing. Wired
/// by default at bootstrap until a concrete transport is configured.
#[derive(Default)]
pub struct NoopChatApi;

#[async_trait]
impl ChatApi for NoopChatApi {
    async fn post_message(
        &self,
        _channel: &str,
        _body: MessageBody,
    ) -> Result<MessageHandle, ChatApiError> {
        Ok(MessageHandle { timestamp: "0".to_string() })
    }

    async fn update_message(
        &self,
        _channel: &str,
        _handle: &MessageHandle,
        _body: MessageBody,
    ) -> Result<(), ChatApiError> {
        Ok(())
    }

    async fn replace_original(
        &self,
        _response_url: &str,
        _body: MessageBody,
    ) -> Result<(), ChatApiError> {
        Ok(())
    }
}
