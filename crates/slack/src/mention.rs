use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use relay_runner::{workflow_invocation, CommandRunner, RunOutcome};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use relay_core::config::AppConfig;

use crate::{
    actions::{METADATA_TAG_KEY, SIGNING_METADATA_EVENT},
    api::{notify, post_or_log, ChatApi, MessageBody, MessageMetadata},
    blocks::{mention_help_message, signing_approval_message},
    events::{AppMentionEvent, EventContext, EventHandlerError, MentionService},
    status::StatusReporter,
};

/// A CLI signing request spells out the version and the build that produced
/// the artifacts: `@relay sign_cli VERSION BUILD_LINK`.
const SIGN_CLI_TOKEN_COUNT: usize = 4;

const SIGN_CLI_USAGE: &str = "I was expecting a message with the following format:\n\n\
                              > @relay sign_cli VERSION BUILD_LINK";
const TRIGGER_ACTION_USAGE: &str = "I was expecting a message with the following format:\n\n\
                                    > @relay trigger_action:WORKFLOW_ID --repo [HOST/]OWNER/REPO";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MentionRequest {
    SignCli { tag: String, build_link: String },
    MalformedSignCli,
    TriggerWorkflow { raw_args: String },
    MalformedTriggerWorkflow,
    Help,
}

/// Classify free-form mention text. The leading token is the bot mention
/// itself, so the sign_cli form is exactly four whitespace tokens and the
/// trigger form is exactly one `:` away from its argument string.
pub fn parse_mention(text: &str) -> MentionRequest {
    if text.contains("sign_cli") {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() != SIGN_CLI_TOKEN_COUNT {
            return MentionRequest::MalformedSignCli;
        }
        return MentionRequest::SignCli {
            tag: tokens[2].to_string(),
            build_link: tokens[3].to_string(),
        };
    }

    if text.contains("trigger_action") {
        let parts: Vec<&str> = text.split(':').collect();
        if parts.len() != 2 {
            return MentionRequest::MalformedTriggerWorkflow;
        }
        return MentionRequest::TriggerWorkflow { raw_args: parts[1].to_string() };
    }

    MentionRequest::Help
}

/// Broadcast line describing who poked the relay, with what, and where.
/// Webhook-originated mentions have no user attached.
pub fn mention_notice(user_id: &str, channel_id: &str, text: &str) -> String {
    let mut msg = if user_id.is_empty() {
        "Incoming webhook interacting with the release relay! :tada:".to_string()
    } else {
        format!("User <@{user_id}> is interacting with the release relay! :tada:")
    };

    msg = format!("{msg}\n\n*Message:*\n> {text}");

    if !channel_id.is_empty() {
        msg = format!("{msg}\n\n*Channel:* <#{channel_id}>");
    }

    msg
}

/// Routes mention text to the signing prompt, a free-form workflow run, a
/// usage correction, or the help card.
pub struct MentionRouter {
    api: Arc<dyn ChatApi>,
    config: Arc<AppConfig>,
    runner: Arc<dyn CommandRunner>,
}

impl MentionRouter {
    pub fn new(
        api: Arc<dyn ChatApi>,
        config: Arc<AppConfig>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self { api, config, runner }
    }

    fn spawn_workflow_run(&self, channel_id: &str, raw_args: String) -> JoinHandle<()> {
        let api = Arc::clone(&self.api);
        let runner = Arc::clone(&self.runner);
        let channel = channel_id.to_string();
        tokio::spawn(run_workflow_flow(api, runner, channel, raw_args))
    }
}

#[async_trait]
impl MentionService for MentionRouter {
    async fn handle_mention(
        &self,
        event: &AppMentionEvent,
        _ctx: &EventContext,
    ) -> Result<(), EventHandlerError> {
        notify(
            self.api.as_ref(),
            &self.config.notify_channel,
            mention_notice(&event.user_id, &event.channel_id, &event.text),
        )
        .await;

        match parse_mention(&event.text) {
            MentionRequest::SignCli { tag, build_link } => {
                let mut payload = BTreeMap::new();
                payload.insert(METADATA_TAG_KEY.to_string(), tag.clone());
                let body = MessageBody::blocks_with_metadata(
                    signing_approval_message(&tag, &build_link),
                    MessageMetadata { event_type: SIGNING_METADATA_EVENT.to_string(), payload },
                );
                let _ = post_or_log(self.api.as_ref(), &event.channel_id, body).await;
            }
            MentionRequest::MalformedSignCli => {
                notify(self.api.as_ref(), &event.channel_id, SIGN_CLI_USAGE).await;
            }
            MentionRequest::TriggerWorkflow { raw_args } => {
                // Detached: the router keeps consuming events while gh runs.
                let _ = self.spawn_workflow_run(&event.channel_id, raw_args);
            }
            MentionRequest::MalformedTriggerWorkflow => {
                notify(self.api.as_ref(), &event.channel_id, TRIGGER_ACTION_USAGE).await;
            }
            MentionRequest::Help => {
                let _ = post_or_log(
                    self.api.as_ref(),
                    &event.channel_id,
                    MessageBody::blocks(mention_help_message()),
                )
                .await;
            }
        }

        Ok(())
    }
}

pub(crate) async fn run_workflow_flow(
    api: Arc<dyn ChatApi>,
    runner: Arc<dyn CommandRunner>,
    channel: String,
    raw_args: String,
) {
    let invocation = workflow_invocation(&raw_args);
    info!(command = %invocation.rendered(), "running github workflow");

    let progress = StatusReporter::new(Arc::clone(&api))
        .progress(
            &channel,
            format!(":hourglass_flowing_sand: Running Github Action with args: '{}' :rocket:", raw_args.trim()),
        )
        .await;

    let outcome = runner.run(&invocation).await;
    if let RunOutcome::Failure { detail } | RunOutcome::LaunchError { detail } = &outcome {
        warn!(command = %invocation.rendered(), detail = %detail, "github workflow run failed");
    }

    progress
        .resolve(
            outcome.is_success(),
            ":white_check_mark: That was a success!",
            ":x: Something went wrong while running the Github Action!",
        )
        .await;
}
