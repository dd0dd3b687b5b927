//! External command execution for the release relay.
//!
//! Two programs are ever invoked: the `codefresh` CLI for release pipelines
//! and the `gh` CLI for Github workflows. This crate builds their argument
//! vectors from configuration (`command`) and runs them with merged
//! stdout/stderr line streaming (`process`). Commands are always executed as
//! discrete argument tokens; nothing is ever passed through a shell.

pub mod command;
pub mod process;

pub use command::{
    codefresh_auth_invocation, pipeline_invocation, signing_invocation, workflow_invocation,
    CODEFRESH_PROGRAM, GITHUB_PROGRAM, SIGNING_REPOSITORY, SIGNING_WORKFLOW_ID,
};
pub use process::{binary_on_path, CommandRunner, Invocation, ProcessRunner, RunOutcome};
