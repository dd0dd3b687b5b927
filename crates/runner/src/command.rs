use std::path::Path;

use relay_core::config::AppConfig;

use crate::process::Invocation;

pub const CODEFRESH_PROGRAM: &str = "codefresh";
pub const GITHUB_PROGRAM: &str = "gh";

/// The CLI signing workflow is deliberately not configurable; approvals
/// always land on this one workflow in the signing repository.
pub const SIGNING_WORKFLOW_ID: &str = "32728677";
pub const SIGNING_REPOSITORY: &str = "relay-dev/cli-signing";

/// Resolve a release target against the configured project table.
///
/// Produces `codefresh run <pipeline> --cfconfig <path>` followed by one
/// `-v KEY=VALUE` pair per configured variable, in configuration order.
/// `None` means the target has no configured pipeline; the caller decides
/// how to tell the user.
pub fn pipeline_invocation(config: &AppConfig, repository: &str) -> Option<Invocation> {
    let project = config.project_for(repository)?;

    let mut args = vec![
        "run".to_string(),
        project.pipeline.clone(),
        "--cfconfig".to_string(),
        config.codefresh.config_path.display().to_string(),
    ];
    for variable in &project.variables {
        args.push("-v".to_string());
        args.push(variable.clone());
    }

    Some(Invocation::new(CODEFRESH_PROGRAM, args))
}

/// Free-form workflow trigger: the chat text supplies the workflow id and
/// every flag. The raw string is whitespace-split into discrete tokens
/// behind a fixed `workflow run` prefix.
pub fn workflow_invocation(raw_args: &str) -> Invocation {
    let mut args = vec!["workflow".to_string(), "run".to_string()];
    args.extend(raw_args.split_whitespace().map(str::to_string));
    Invocation::new(GITHUB_PROGRAM, args)
}

/// The fixed signing workflow, parameterized only by the one-time token and
/// the tag being signed.
pub fn signing_invocation(mfa_token: &str, tag: &str) -> Invocation {
    workflow_invocation(&format!(
        "{SIGNING_WORKFLOW_ID} -R {SIGNING_REPOSITORY} --field mfa_token={mfa_token} --field branch_or_tag={tag}"
    ))
}

/// Bootstrap invocation used at startup when no codefresh config exists on
/// disk yet.
pub fn codefresh_auth_invocation(api_key: &str, cfconfig: &Path) -> Invocation {
    Invocation::new(
        CODEFRESH_PROGRAM,
        vec![
            "auth".to_string(),
            "create-context".to_string(),
            "--api-key".to_string(),
            api_key.to_string(),
            "--cfconfig".to_string(),
            cfconfig.display().to_string(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use relay_core::config::{AppConfig, CodefreshConfig, ProjectConfig};

    use super::{
        codefresh_auth_invocation, pipeline_invocation, signing_invocation, workflow_invocation,
    };

    fn config_with_projects(projects: Vec<ProjectConfig>) -> AppConfig {
        AppConfig {
            codefresh: CodefreshConfig { config_path: PathBuf::from("/home/relay/.cfconfig") },
            projects,
            ..AppConfig::default()
        }
    }

    #[test]
    fn pipeline_invocation_starts_with_template_args_then_cfconfig() {
        let config = config_with_projects(vec![ProjectConfig {
            repository: "go-sdk".to_string(),
            pipeline: "go-sdk/prepare-release".to_string(),
            variables: vec![],
        }]);

        let invocation =
            pipeline_invocation(&config, "go-sdk").expect("go-sdk should be configured");

        assert_eq!(invocation.program, "codefresh");
        assert_eq!(
            invocation.args,
            vec!["run", "go-sdk/prepare-release", "--cfconfig", "/home/relay/.cfconfig"]
        );
    }

    #[test]
    fn pipeline_invocation_appends_variables_in_configuration_order() {
        let config = config_with_projects(vec![ProjectConfig {
            repository: "terraform-aws-ecr".to_string(),
            pipeline: "terraform-modules/prepare-release-for".to_string(),
            variables: vec!["TF_MODULE=terraform-aws-ecr".to_string(), "DRY_RUN=false".to_string()],
        }]);

        let invocation = pipeline_invocation(&config, "terraform-aws-ecr")
            .expect("terraform-aws-ecr should be configured");

        assert_eq!(
            invocation.args,
            vec![
                "run",
                "terraform-modules/prepare-release-for",
                "--cfconfig",
                "/home/relay/.cfconfig",
                "-v",
                "TF_MODULE=terraform-aws-ecr",
                "-v",
                "DRY_RUN=false",
            ]
        );
    }

    #[test]
    fn unknown_target_resolves_to_none() {
        let config = config_with_projects(vec![]);
        assert!(pipeline_invocation(&config, "not-configured").is_none());
    }

    #[test]
    fn workflow_invocation_splits_raw_args_behind_fixed_prefix() {
        let invocation = workflow_invocation("1234 --repo acme/widgets --ref main");

        assert_eq!(invocation.program, "gh");
        assert_eq!(
            invocation.args,
            vec!["workflow", "run", "1234", "--repo", "acme/widgets", "--ref", "main"]
        );
    }

    #[test]
    fn signing_invocation_carries_token_and_tag_fields() {
        let invocation = signing_invocation("123456", "v0.55.0");

        assert_eq!(invocation.program, "gh");
        let rendered = invocation.rendered();
        assert!(rendered.contains("--field mfa_token=123456"));
        assert!(rendered.contains("--field branch_or_tag=v0.55.0"));
        assert_eq!(invocation.args[..2], ["workflow".to_string(), "run".to_string()]);
        assert_eq!(invocation.args[2], super::SIGNING_WORKFLOW_ID);
    }

    #[test]
    fn auth_invocation_targets_the_configured_cfconfig() {
        let invocation =
            codefresh_auth_invocation("key-abc", &PathBuf::from("/home/relay/.cfconfig"));

        assert_eq!(
            invocation.args,
            vec![
                "auth",
                "create-context",
                "--api-key",
                "key-abc",
                "--cfconfig",
                "/home/relay/.cfconfig",
            ]
        );
    }
}
