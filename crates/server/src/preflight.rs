use std::env;
use std::path::Path;

use relay_core::config::AppConfig;
use relay_runner::{
    binary_on_path, codefresh_auth_invocation, ProcessRunner, RunOutcome, CODEFRESH_PROGRAM,
    GITHUB_PROGRAM,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("missing dependency: the `{0}` CLI was not found on PATH")]
    MissingBinary(&'static str),
    #[error("GH_TOKEN must be set so the Github CLI can authenticate")]
    MissingGithubToken,
    #[error("CODEFRESH_API_KEY must be set to create `{0}`")]
    MissingCodefreshApiKey(String),
    #[error("unable to configure the codefresh CLI: {0}")]
    CodefreshAuth(String),
}

/// Startup validation of the external tooling the relay drives. Every
/// failure here is fatal; nothing past this point is allowed to assume less
/// than a fully working environment.
pub async fn run(config: &AppConfig) -> Result<(), PreflightError> {
    if !binary_on_path(CODEFRESH_PROGRAM) {
        return Err(PreflightError::MissingBinary(CODEFRESH_PROGRAM));
    }
    if !binary_on_path(GITHUB_PROGRAM) {
        return Err(PreflightError::MissingBinary(GITHUB_PROGRAM));
    }

    // The gh CLI reads its token straight from the environment.
    if read_env("GH_TOKEN").is_none() {
        return Err(PreflightError::MissingGithubToken);
    }

    verify_codefresh_config(&config.codefresh.config_path).await?;

    info!(
        cfconfig = %config.codefresh.config_path.display(),
        "preflight checks passed"
    );
    Ok(())
}

/// A codefresh config on disk is taken as-is; a missing one is created by
/// the CLI's own auth bootstrap, gated on `CODEFRESH_API_KEY`.
async fn verify_codefresh_config(config_path: &Path) -> Result<(), PreflightError> {
    if config_path.is_file() {
        return Ok(());
    }

    let api_key = read_env("CODEFRESH_API_KEY")
        .ok_or_else(|| PreflightError::MissingCodefreshApiKey(config_path.display().to_string()))?;

    info!(cfconfig = %config_path.display(), "configuring the codefresh CLI");
    let invocation = codefresh_auth_invocation(&api_key, config_path);
    match ProcessRunner.run_with(&invocation, |line| info!(program = "codefresh", "{line}")).await {
        RunOutcome::Success => Ok(()),
        RunOutcome::Failure { detail } | RunOutcome::LaunchError { detail } => {
            Err(PreflightError::CodefreshAuth(detail))
        }
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::sync::{Mutex, OnceLock};

    use relay_core::config::{AppConfig, CodefreshConfig};
    use tempfile::TempDir;

    use super::{run, PreflightError};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    #[cfg(unix)]
    fn install_fake_cli(dir: &std::path::Path, name: &str, script: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{script}\n")).expect("write fake cli");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake cli");
    }

    fn config_with_cfconfig(path: std::path::PathBuf) -> AppConfig {
        AppConfig { codefresh: CodefreshConfig { config_path: path }, ..AppConfig::default() }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn passes_with_both_clis_token_and_existing_cfconfig() {
        let _guard = env_lock().lock().expect("env lock");

        let bin_dir = TempDir::new().expect("tempdir");
        install_fake_cli(bin_dir.path(), "codefresh", "exit 0");
        install_fake_cli(bin_dir.path(), "gh", "exit 0");

        let cfconfig = bin_dir.path().join(".cfconfig");
        fs::write(&cfconfig, "contexts: {}\n").expect("write cfconfig");

        let old_path = env::var("PATH").unwrap_or_default();
        env::set_var("PATH", bin_dir.path());
        env::set_var("GH_TOKEN", "ghp_test");

        let result = run(&config_with_cfconfig(cfconfig)).await;

        env::set_var("PATH", old_path);
        env::remove_var("GH_TOKEN");

        result.expect("preflight should pass");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_codefresh_cli_is_fatal() {
        let _guard = env_lock().lock().expect("env lock");

        let bin_dir = TempDir::new().expect("tempdir");
        install_fake_cli(bin_dir.path(), "gh", "exit 0");

        let old_path = env::var("PATH").unwrap_or_default();
        env::set_var("PATH", bin_dir.path());

        let result = run(&config_with_cfconfig(bin_dir.path().join(".cfconfig"))).await;

        env::set_var("PATH", old_path);

        assert!(matches!(result, Err(PreflightError::MissingBinary("codefresh"))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_gh_token_is_fatal() {
        let _guard = env_lock().lock().expect("env lock");

        let bin_dir = TempDir::new().expect("tempdir");
        install_fake_cli(bin_dir.path(), "codefresh", "exit 0");
        install_fake_cli(bin_dir.path(), "gh", "exit 0");

        let old_path = env::var("PATH").unwrap_or_default();
        env::set_var("PATH", bin_dir.path());
        env::remove_var("GH_TOKEN");

        let result = run(&config_with_cfconfig(bin_dir.path().join(".cfconfig"))).await;

        env::set_var("PATH", old_path);

        assert!(matches!(result, Err(PreflightError::MissingGithubToken)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn absent_cfconfig_without_api_key_is_fatal() {
        let _guard = env_lock().lock().expect("env lock");

        let bin_dir = TempDir::new().expect("tempdir");
        install_fake_cli(bin_dir.path(), "codefresh", "exit 0");
        install_fake_cli(bin_dir.path(), "gh", "exit 0");

        let old_path = env::var("PATH").unwrap_or_default();
        env::set_var("PATH", bin_dir.path());
        env::set_var("GH_TOKEN", "ghp_test");
        env::remove_var("CODEFRESH_API_KEY");

        let result = run(&config_with_cfconfig(bin_dir.path().join("missing-cfconfig"))).await;

        env::set_var("PATH", old_path);
        env::remove_var("GH_TOKEN");

        assert!(matches!(result, Err(PreflightError::MissingCodefreshApiKey(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn absent_cfconfig_with_api_key_runs_the_auth_bootstrap() {
        let _guard = env_lock().lock().expect("env lock");

        let bin_dir = TempDir::new().expect("tempdir");
        // The fake codefresh CLI writes the cfconfig its `auth
        // create-context` call was pointed at (last argument).
        install_fake_cli(
            bin_dir.path(),
            "codefresh",
            "for arg; do last=$arg; done; echo configured > \"$last\"",
        );
        install_fake_cli(bin_dir.path(), "gh", "exit 0");

        let cfconfig = bin_dir.path().join(".cfconfig");

        let old_path = env::var("PATH").unwrap_or_default();
        env::set_var("PATH", bin_dir.path());
        env::set_var("GH_TOKEN", "ghp_test");
        env::set_var("CODEFRESH_API_KEY", "cf-key");

        let result = run(&config_with_cfconfig(cfconfig.clone())).await;

        env::set_var("PATH", old_path);
        env::remove_var("GH_TOKEN");
        env::remove_var("CODEFRESH_API_KEY");

        result.expect("auth bootstrap should satisfy preflight");
        assert!(cfconfig.is_file(), "the bootstrap invocation should have created the cfconfig");
    }
}
