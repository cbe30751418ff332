//! Per-run process configuration
//!
//! Everything the run needs to know about where it operates is carried in
//! an explicit `RunContext` handed to the orchestrator, rather than in
//! ambient globals.

use crate::cli::CliArgs;
use serde_json::json;

/// Username the resolver presents when cloning over HTTPS
const GIT_TOKEN_USERNAME: &str = "x-access-token";

/// Immutable configuration of one bot run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Organization label used in log output
    pub organization: String,
    /// Hostname of the GitLab instance
    pub host: String,
    /// Full `namespace/project` path of the repository to process
    pub repository: String,
    /// Maximum number of open bot merge requests per repository
    pub mr_limit: usize,
    /// Username the bot's merge requests are authored by
    pub bot_username: String,
    /// Repository path of the update policy document
    pub config_path: String,
    /// Whether to wait for pipelines to finish before arming auto-merge
    pub wait_for_pipeline_completion: bool,
    /// Credentials forwarded to the resolution engine
    pub credentials: Vec<serde_json::Value>,
}

/// Build a `git_source` credential entry
pub fn git_source_credential(host: &str, password: &str) -> serde_json::Value {
    json!({
        "type": "git_source",
        "host": host,
        "username": GIT_TOKEN_USERNAME,
        "password": password,
    })
}

impl RunContext {
    /// Assemble the run context from parsed CLI/environment arguments
    pub fn from_args(args: &CliArgs) -> anyhow::Result<Self> {
        let mut credentials = Vec::new();
        if let Some(github_token) = args.github_token.as_deref() {
            credentials.push(git_source_credential("github.com", github_token));
        }
        credentials.push(git_source_credential(&args.gitlab_hostname, &args.gitlab_token));

        if let Some(extra) = args.extra_credentials.as_deref() {
            let extra = extra.trim();
            if !extra.is_empty() {
                let parsed: Vec<serde_json::Value> = serde_json::from_str(extra)
                    .map_err(|e| anyhow::anyhow!("invalid extra credentials JSON: {}", e))?;
                credentials.extend(parsed);
            }
        }

        Ok(Self {
            organization: args.organization.clone(),
            host: args.gitlab_hostname.clone(),
            repository: args.project.clone(),
            mr_limit: args.mr_limit,
            bot_username: args.bot_username.clone(),
            config_path: args.config_path.clone(),
            wait_for_pipeline_completion: args.wait_for_pipeline_completion,
            credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec![
            "depbot",
            "--project",
            "acme/widgets",
            "--gitlab-token",
            "glpat-secret",
        ];
        argv.extend(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn test_git_source_credential_shape() {
        let credential = git_source_credential("gitlab.com", "secret");
        assert_eq!(credential["type"], "git_source");
        assert_eq!(credential["host"], "gitlab.com");
        assert_eq!(credential["username"], "x-access-token");
        assert_eq!(credential["password"], "secret");
    }

    #[test]
    fn test_from_args_defaults() {
        let context = RunContext::from_args(&args(&[])).unwrap();
        assert_eq!(context.repository, "acme/widgets");
        assert_eq!(context.host, "gitlab.com");
        assert_eq!(context.mr_limit, 5);
        assert_eq!(context.bot_username, "dependabot");
        assert_eq!(context.config_path, ".dependabot/config.yml");
        assert!(!context.wait_for_pipeline_completion);
        // Only the GitLab credential without a GitHub token
        assert_eq!(context.credentials.len(), 1);
        assert_eq!(context.credentials[0]["host"], "gitlab.com");
    }

    #[test]
    fn test_from_args_with_github_token() {
        let context =
            RunContext::from_args(&args(&["--github-token", "ghp-secret"])).unwrap();
        assert_eq!(context.credentials.len(), 2);
        assert_eq!(context.credentials[0]["host"], "github.com");
    }

    #[test]
    fn test_from_args_with_extra_credentials() {
        let context = RunContext::from_args(&args(&[
            "--extra-credentials",
            r#"[{"type":"npm_registry","registry":"registry.npmjs.org","token":"123"}]"#,
        ]))
        .unwrap();
        assert_eq!(context.credentials.len(), 2);
        assert_eq!(context.credentials[1]["type"], "npm_registry");
    }

    #[test]
    fn test_from_args_rejects_malformed_extra_credentials() {
        let result = RunContext::from_args(&args(&["--extra-credentials", "{not json"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_args_ignores_blank_extra_credentials() {
        let context = RunContext::from_args(&args(&["--extra-credentials", "  "])).unwrap();
        assert_eq!(context.credentials.len(), 1);
    }
}
