use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use relay_core::config::AppConfig;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    api::{notify, ChatApi},
    blocks::{project_select_message, Block, MessageTemplate},
};

#[derive(Clone, Debug, PartialEq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SlackEvent {
    SlashCommand(SlashCommandEvent),
    AppMention(AppMentionEvent),
    Interactive(InteractionPayload),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::SlashCommand(_) => SlackEventType::SlashCommand,
            Self::AppMention(_) => SlackEventType::AppMention,
            Self::Interactive(_) => SlackEventType::Interactive,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    SlashCommand,
    AppMention,
    Interactive,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandEvent {
    pub command: String,
    pub user_name: String,
    pub channel_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppMentionEvent {
    pub channel_id: String,
    pub user_id: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionKind {
    BlockActions,
    Other(String),
}

/// One submitted value inside an interactive payload: text inputs carry
/// `value`, select menus carry `selected_option`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionValue {
    pub value: Option<String>,
    pub selected_option: Option<String>,
}

/// A user interaction with a previously posted message, as delivered by the
/// transport. `state` is keyed by originating block id, then by the action
/// id of the input within that block.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionPayload {
    pub interaction_type: InteractionKind,
    pub channel_id: String,
    pub user_name: String,
    pub response_url: String,
    pub message_ts: String,
    pub message_blocks: Vec<Block>,
    pub metadata: BTreeMap<String, String>,
    pub state: BTreeMap<String, BTreeMap<String, ActionValue>>,
}

/// What the router sends back when acknowledging an envelope. Most events
/// ack empty; a slash command acks with the response the transport renders
/// in place.
#[derive(Clone, Debug, PartialEq)]
pub enum AckPayload {
    Empty,
    Blocks(MessageTemplate),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error("app mention handler failure: {0}")]
    Mention(String),
    #[error("interactive handler failure: {0}")]
    Interaction(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<AckPayload, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    /// Route one envelope to its handler and produce the acknowledgment
    /// payload. Events nothing is registered for still resolve to an empty
    /// ack so the transport's redelivery never loops on them.
    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<AckPayload, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            warn!(
                envelope_id = %envelope.envelope_id,
                event_type = ?envelope.event.event_type(),
                "no handler for event; acknowledging and moving on"
            );
            return Ok(AckPayload::Empty);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Handles `/release`: announce who is starting a release flow, then answer
/// with the project-select prompt built from the configured targets.
pub struct SlashCommandHandler {
    api: Arc<dyn ChatApi>,
    config: Arc<AppConfig>,
}

impl SlashCommandHandler {
    pub fn new(api: Arc<dyn ChatApi>, config: Arc<AppConfig>) -> Self {
        Self { api, config }
    }
}

#[async_trait]
impl EventHandler for SlashCommandHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::SlashCommand
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<AckPayload, EventHandlerError> {
        let SlackEvent::SlashCommand(command) = &envelope.event else {
            return Ok(AckPayload::Empty);
        };

        info!(
            user_name = %command.user_name,
            command = %command.command,
            channel_id = %command.channel_id,
            "slash command received"
        );

        notify(
            self.api.as_ref(),
            &self.config.notify_channel,
            format!("User {} is preparing a release via `{}`", command.user_name, command.command),
        )
        .await;

        Ok(AckPayload::Blocks(project_select_message(&self.config.project_names())))
    }
}

#[async_trait]
pub trait MentionService: Send + Sync {
    async fn handle_mention(
        &self,
        event: &AppMentionEvent,
        ctx: &EventContext,
    ) -> Result<(), EventHandlerError>;
}

pub struct AppMentionHandler<S> {
    service: S,
}

impl<S> AppMentionHandler<S>
where
    S: MentionService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for AppMentionHandler<S>
where
    S: MentionService + 'static,
{
    fn event_type(&self) -> SlackEventType {
        SlackEventType::AppMention
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<AckPayload, EventHandlerError> {
        let SlackEvent::AppMention(event) = &envelope.event else {
            return Ok(AckPayload::Empty);
        };

        self.service.handle_mention(event, ctx).await?;
        Ok(AckPayload::Empty)
    }
}

#[async_trait]
pub trait InteractionService: Send + Sync {
    async fn handle_interaction(
        &self,
        payload: &InteractionPayload,
        ctx: &EventContext,
    ) -> Result<(), EventHandlerError>;
}

/// Interactive events are acknowledged with an empty payload as soon as the
/// service has spawned the work they describe; the router never waits for
/// the launched command.
pub struct InteractiveHandler<S> {
    service: S,
}

impl<S> InteractiveHandler<S>
where
    S: InteractionService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for InteractiveHandler<S>
where
    S: InteractionService + 'static,
{
    fn event_type(&self) -> SlackEventType {
        SlackEventType::Interactive
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<AckPayload, EventHandlerError> {
        let SlackEvent::Interactive(payload) = &envelope.event else {
            return Ok(AckPayload::Empty);
        };

        self.service.handle_interaction(payload, ctx).await?;
        Ok(AckPayload::Empty)
    }
}

pub struct NoopMentionService;

#[async_trait]
impl MentionService for NoopMentionService {
    async fn handle_mention(
        &self,
        _event: &AppMentionEvent,
        _ctx: &EventContext,
    ) -> Result<(), EventHandlerError> {
        Ok(())
    }
}

pub struct NoopInteractionService;

#[async_trait]
impl InteractionService for NoopInteractionService {
    async fn handle_interaction(
        &self,
        _payload: &InteractionPayload,
        _ctx: &EventContext,
    ) -> Result<(), EventHandlerError> {
        Ok(())
    }
}

/// Dispatcher wired with no-op collaborators; used by the default socket
/// runner and in tests.
pub fn default_dispatcher() -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(SlashCommandHandler::new(
        Arc::new(crate::api::NoopChatApi),
        Arc::new(AppConfig::default()),
    ));
    dispatcher.register(AppMentionHandler::new(NoopMentionService));
    dispatcher.register(InteractiveHandler::new(NoopInteractionService));
    dispatcher
}
