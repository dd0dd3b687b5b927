//! Slack integration for the release relay - Socket Mode bot interface.
//!
//! - **Socket Mode** (`socket`) - one ordered event loop over the transport,
//!   ack-exactly-once, reconnection with bounded backoff
//! - **Events** (`events`) - envelope model and per-event-type dispatch
//! - **Mentions** (`mention`) - `sign_cli` and `trigger_action` request
//!   grammar plus the help fallback
//! - **Interactive actions** (`actions`) - boundary decode of block-action
//!   payloads and the detached release/signing flows
//! - **Status** (`status`) - per-invocation progress line with exactly one
//!   terminal update
//! - **Block Kit** (`blocks`) - message builders (select prompt, signing
//!   approval, help)
//! - **Chat API** (`api`) - the transport's message surface; failures are
//!   logged and never fatal
//!
//! # Architecture
//!
//! ```text
//! Slack envelopes → SocketModeRunner → EventDispatcher → handlers
//!                                                         ├─ slash: ack with project select
//!                                                         ├─ mention: MentionRouter
//!                                                         └─ interactive: ActionDispatcher
//!                                                              └─ spawn → build → run → status
//! ```

pub mod actions;
pub mod api;
pub mod blocks;
pub mod events;
pub mod mention;
pub mod socket;
pub mod status;
