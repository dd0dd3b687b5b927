use std::sync::Arc;

use async_trait::async_trait;
use relay_core::config::AppConfig;
use relay_runner::{pipeline_invocation, signing_invocation, CommandRunner, RunOutcome};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{
    api::{notify, replace_or_log, ChatApi, MessageBody},
    blocks::{
        approval_granted_message, Block, MFA_TOKEN_ACTION_ID, SELECT_PROJECT_ACTION_ID,
        SIGN_CLI_BLOCK_ID, TRIGGER_RELEASE_BLOCK_ID,
    },
    events::{
        EventContext, EventHandlerError, InteractionKind, InteractionPayload, InteractionService,
    },
    status::StatusReporter,
};

/// Metadata event type stamped on the signing prompt when it is posted.
pub const SIGNING_METADATA_EVENT: &str = "sign_cli_metadata";
/// Metadata key that carries the tag being signed across the prompt round
/// trip.
pub const METADATA_TAG_KEY: &str = "tag";

/// A recognized, fully validated interactive submission. Decoding happens
/// once at the boundary; everything downstream works with these variants
/// instead of poking at the raw state mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionSubmission {
    ReleaseTrigger { target: String },
    SigningApproval { mfa_token: String, tag: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("release trigger had no selected project")]
    MissingTarget,
    #[error("signing approval is missing the MFA token")]
    MissingMfaToken,
    #[error("signing approval message carried no `tag` metadata")]
    MissingTag,
    #[error("unknown or not yet implemented interactive block `{0}`")]
    UnknownBlock(String),
}

/// Interpret the block-id → action-id state of an interactive payload.
/// Each recognized block id yields one submission or one decode error;
/// decode errors never launch anything.
pub fn decode_submissions(
    payload: &InteractionPayload,
) -> Vec<Result<ActionSubmission, SubmissionError>> {
    payload
        .state
        .iter()
        .map(|(block_id, actions)| match block_id.as_str() {
            TRIGGER_RELEASE_BLOCK_ID => {
                let target = actions
                    .get(SELECT_PROJECT_ACTION_ID)
                    .and_then(|action| action.selected_option.clone())
                    .filter(|target| !target.is_empty())
                    .ok_or(SubmissionError::MissingTarget)?;
                Ok(ActionSubmission::ReleaseTrigger { target })
            }
            SIGN_CLI_BLOCK_ID => {
                let mfa_token = actions
                    .get(MFA_TOKEN_ACTION_ID)
                    .and_then(|action| action.value.clone())
                    .filter(|token| !token.is_empty())
                    .ok_or(SubmissionError::MissingMfaToken)?;
                let tag = payload
                    .metadata
                    .get(METADATA_TAG_KEY)
                    .cloned()
                    .filter(|tag| !tag.is_empty())
                    .ok_or(SubmissionError::MissingTag)?;
                Ok(ActionSubmission::SigningApproval { mfa_token, tag })
            }
            other => Err(SubmissionError::UnknownBlock(other.to_string())),
        })
        .collect()
}

/// Launches one detached unit of work per recognized submission. Each unit
/// owns its own status message; the only state shared between units is the
/// read-only configuration.
pub struct ActionDispatcher {
    api: Arc<dyn ChatApi>,
    config: Arc<AppConfig>,
    runner: Arc<dyn CommandRunner>,
}

impl ActionDispatcher {
    pub fn new(
        api: Arc<dyn ChatApi>,
        config: Arc<AppConfig>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self { api, config, runner }
    }

    pub async fn dispatch(&self, payload: &InteractionPayload) -> Vec<JoinHandle<()>> {
        if let InteractionKind::Other(kind) = &payload.interaction_type {
            warn!(kind = %kind, "unsupported interaction type");
            notify(
                self.api.as_ref(),
                &self.config.notify_channel,
                format!("Some weird interaction type just showed up: *{kind}*"),
            )
            .await;
            return Vec::new();
        }

        if payload.state.is_empty() {
            warn!("interactive payload carried no action state; dropping it");
            return Vec::new();
        }

        let mut launched = Vec::new();
        for decoded in decode_submissions(payload) {
            match decoded {
                Ok(ActionSubmission::ReleaseTrigger { target }) => {
                    launched.push(tokio::spawn(run_release_flow(
                        Arc::clone(&self.api),
                        Arc::clone(&self.config),
                        Arc::clone(&self.runner),
                        payload.channel_id.clone(),
                        payload.response_url.clone(),
                        target,
                    )));
                }
                Ok(ActionSubmission::SigningApproval { mfa_token, tag }) => {
                    launched.push(tokio::spawn(run_signing_flow(
                        Arc::clone(&self.api),
                        Arc::clone(&self.config),
                        Arc::clone(&self.runner),
                        payload.channel_id.clone(),
                        payload.response_url.clone(),
                        payload.message_blocks.clone(),
                        payload.user_name.clone(),
                        mfa_token,
                        tag,
                    )));
                }
                Err(error) => {
                    warn!(error = %error, "interactive submission dropped");
                }
            }
        }
        launched
    }
}

#[async_trait]
impl InteractionService for ActionDispatcher {
    async fn handle_interaction(
        &self,
        payload: &InteractionPayload,
        _ctx: &EventContext,
    ) -> Result<(), EventHandlerError> {
        // The join handles are dropped on purpose: the work is detached and
        // reports its own outcome through the status message.
        let _ = self.dispatch(payload).await;
        Ok(())
    }
}

pub(crate) async fn run_release_flow(
    api: Arc<dyn ChatApi>,
    config: Arc<AppConfig>,
    runner: Arc<dyn CommandRunner>,
    channel: String,
    response_url: String,
    target: String,
) {
    notify(
        api.as_ref(),
        &config.notify_channel,
        format!("A release has been triggered for the *{target}* project. :tada:"),
    )
    .await;

    replace_or_log(api.as_ref(), &response_url, MessageBody::text("Roger that! :metal:")).await;

    let progress = StatusReporter::new(Arc::clone(&api))
        .progress(
            &channel,
            format!(
                ":hourglass_flowing_sand: Triggering the release PR of the *{target}* project :rocket:"
            ),
        )
        .await;

    let failure_text =
        format!(":x: Something went wrong while triggering the release! (project: *{target}*)");

    let Some(invocation) = pipeline_invocation(&config, &target) else {
        warn!(target = %target, "no release pipeline configured for target");
        progress.resolve(false, "", &failure_text).await;
        return;
    };

    info!(command = %invocation.rendered(), "running codefresh pipeline");
    let outcome = runner.run(&invocation).await;
    if let RunOutcome::Failure { detail } | RunOutcome::LaunchError { detail } = &outcome {
        warn!(command = %invocation.rendered(), detail = %detail, "codefresh pipeline failed");
    }

    let success = outcome.is_success();
    progress
        .resolve(
            success,
            &format!(":white_check_mark: Triggered! (project: *{target}*)"),
            &failure_text,
        )
        .await;

    if success {
        notify(
            api.as_ref(),
            &channel,
            format!("_:eyes: Look at <#{}> for the release PR._", config.notify_channel),
        )
        .await;
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) async fn run_signing_flow(
    api: Arc<dyn ChatApi>,
    config: Arc<AppConfig>,
    runner: Arc<dyn CommandRunner>,
    channel: String,
    response_url: String,
    original_blocks: Vec<Block>,
    user_name: String,
    mfa_token: String,
    tag: String,
) {
    notify(
        api.as_ref(),
        &config.notify_channel,
        format!("User {user_name} approved signing of the *CLI {tag}* :tada:"),
    )
    .await;

    // Tell everyone who approved it: same message, interactive blocks
    // swapped for the approval notice.
    replace_or_log(
        api.as_ref(),
        &response_url,
        MessageBody::blocks(approval_granted_message(&original_blocks, &user_name)),
    )
    .await;

    let progress = StatusReporter::new(Arc::clone(&api))
        .progress(
            &channel,
            format!(":hourglass_flowing_sand: Running Github Action to sign the *CLI {tag}* :rocket:"),
        )
        .await;

    let invocation = signing_invocation(&mfa_token, &tag);
    info!(command = %invocation.rendered(), "running github signing workflow");
    let outcome = runner.run(&invocation).await;
    if let RunOutcome::Failure { detail } | RunOutcome::LaunchError { detail } = &outcome {
        warn!(command = %invocation.rendered(), detail = %detail, "github signing workflow failed");
    }

    progress
        .resolve(
            outcome.is_success(),
            "That was a success! :tada:",
            ":x: Something went wrong while running the Github Action!",
        )
        .await;
}
