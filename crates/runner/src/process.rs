use std::env;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// A fully resolved external command: program name plus discrete argument
/// tokens. The program is resolved against `PATH` at spawn time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }

    /// Space-joined form, for log lines only. Execution always uses the
    /// argument vector.
    pub fn rendered(&self) -> String {
        let mut rendered = self.program.clone();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// The process ran and exited non-zero.
    Failure { detail: String },
    /// The process never started: binary not found or pipe setup failed.
    LaunchError { detail: String },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Seam between dispatch logic and real process execution. Flows hold a
/// `dyn CommandRunner` so tests can observe which invocations were launched
/// without spawning anything.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> RunOutcome;
}

/// Production runner backed by `tokio::process`. Stdout and stderr are
/// drained concurrently with the wait on the child, so a verbose pipeline
/// cannot deadlock against a full pipe buffer, and every output line is
/// logged as it arrives.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub async fn run_with<F>(&self, invocation: &Invocation, mut on_line: F) -> RunOutcome
    where
        F: FnMut(String) + Send,
    {
        let mut child = match Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(source) => {
                return RunOutcome::LaunchError {
                    detail: format!("unable to spawn `{}`: {source}", invocation.program),
                }
            }
        };

        let Some(stdout) = child.stdout.take() else {
            return RunOutcome::LaunchError { detail: "stdout pipe was not captured".to_string() };
        };
        let Some(stderr) = child.stderr.take() else {
            return RunOutcome::LaunchError { detail: "stderr pipe was not captured".to_string() };
        };

        // Both readers feed one channel. Lines keep their own stream's order;
        // interleaving between the two streams is arbitrary.
        let (line_tx, mut line_rx) = mpsc::unbounded_channel();
        let stdout_reader = tokio::spawn(forward_lines(stdout, line_tx.clone()));
        let stderr_reader = tokio::spawn(forward_lines(stderr, line_tx));

        while let Some(line) = line_rx.recv().await {
            on_line(line);
        }

        let _ = stdout_reader.await;
        let _ = stderr_reader.await;

        match child.wait().await {
            Ok(status) if status.success() => RunOutcome::Success,
            Ok(status) => RunOutcome::Failure {
                detail: match status.code() {
                    Some(code) => format!("exited with status {code}"),
                    None => "terminated by signal".to_string(),
                },
            },
            Err(source) => {
                RunOutcome::Failure { detail: format!("could not reap process: {source}") }
            }
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> RunOutcome {
        info!(command = %invocation.rendered(), "running external command");
        let program = invocation.program.clone();
        self.run_with(invocation, move |line| info!(program = %program, "{line}")).await
    }
}

async fn forward_lines<R>(reader: R, sink: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin + Send,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if sink.send(line).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(error) => {
                warn!(error = %error, "output stream read failed");
                break;
            }
        }
    }
}

/// `PATH` presence probe for startup validation.
pub fn binary_on_path(name: &str) -> bool {
    let Some(path) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&path).any(|dir| is_executable(&dir.join(name)))
}

#[cfg(unix)]
fn is_executable(candidate: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    candidate
        .metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(candidate: &Path) -> bool {
    candidate.is_file()
}

#[cfg(test)]
mod tests {
    use super::{binary_on_path, CommandRunner, Invocation, ProcessRunner, RunOutcome};

    fn sh(script: &str) -> Invocation {
        Invocation::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn zero_exit_is_success_and_both_streams_are_captured() {
        let mut lines = Vec::new();
        let outcome = ProcessRunner
            .run_with(&sh("echo to-stdout; echo to-stderr 1>&2"), |line| lines.push(line))
            .await;

        assert_eq!(outcome, RunOutcome::Success);
        assert!(lines.contains(&"to-stdout".to_string()));
        assert!(lines.contains(&"to-stderr".to_string()));
    }

    #[tokio::test]
    async fn nonzero_exit_is_failure_with_exit_detail() {
        let outcome = ProcessRunner.run_with(&sh("exit 3"), |_| {}).await;

        assert_eq!(outcome, RunOutcome::Failure { detail: "exited with status 3".to_string() });
    }

    #[tokio::test]
    async fn missing_binary_is_a_launch_error() {
        let invocation = Invocation::new("relay-test-no-such-binary", vec![]);
        let outcome = ProcessRunner.run(&invocation).await;

        assert!(matches!(outcome, RunOutcome::LaunchError { .. }));
    }

    #[tokio::test]
    async fn chatty_process_does_not_deadlock_and_keeps_per_stream_order() {
        // Enough output to overflow a pipe buffer if nothing drained it.
        let script = "i=0; while [ $i -lt 2000 ]; do echo out-$i; echo err-$i 1>&2; i=$((i+1)); done";
        let mut lines = Vec::new();
        let outcome = ProcessRunner.run_with(&sh(script), |line| lines.push(line)).await;

        assert_eq!(outcome, RunOutcome::Success);
        assert_eq!(lines.len(), 4000);

        let stdout_lines: Vec<&String> =
            lines.iter().filter(|line| line.starts_with("out-")).collect();
        let expected: Vec<String> = (0..2000).map(|i| format!("out-{i}")).collect();
        assert_eq!(stdout_lines.len(), 2000);
        for (line, want) in stdout_lines.iter().zip(expected.iter()) {
            assert_eq!(*line, want);
        }
    }

    #[test]
    fn rendered_joins_program_and_args() {
        let invocation = Invocation::new(
            "codefresh",
            vec!["run".to_string(), "go-sdk/prepare-release".to_string()],
        );
        assert_eq!(invocation.rendered(), "codefresh run go-sdk/prepare-release");
    }

    #[test]
    fn path_probe_finds_sh_but_not_nonsense() {
        assert!(binary_on_path("sh"));
        assert!(!binary_on_path("relay-test-no-such-binary"));
    }
}
