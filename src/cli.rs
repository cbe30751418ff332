//! CLI argument parsing module for depbot
//!
//! Every option can also be supplied through the environment, which is
//! how the bot is configured when running as a scheduled CI job.

use clap::Parser;

/// GitLab dependency update bot
#[derive(Parser, Debug, Clone)]
#[command(name = "depbot", version, about = "GitLab dependency update bot")]
pub struct CliArgs {
    /// Full namespace/project path of the repository to process
    #[arg(long, env = "PROJECT_PATH")]
    pub project: String,

    /// Organization label used in log output
    #[arg(long, env = "GITLAB_ORGANIZATION", default_value = "gitlab")]
    pub organization: String,

    /// Hostname of the GitLab instance
    #[arg(long, env = "GITLAB_HOSTNAME", default_value = "gitlab.com")]
    pub gitlab_hostname: String,

    /// Access token for the GitLab instance
    #[arg(long, env = "GITLAB_ACCESS_TOKEN", hide_env_values = true)]
    pub gitlab_token: String,

    /// GitHub access token forwarded to the resolver for public registry
    /// and changelog lookups
    #[arg(long, env = "GITHUB_ACCESS_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Extra resolver credentials as a JSON array, e.g. private registry
    /// tokens
    #[arg(long, env = "LOCAL_CONFIG_VARIABLES", hide_env_values = true)]
    pub extra_credentials: Option<String>,

    /// Maximum number of open bot merge requests per repository
    #[arg(long, env = "MR_LIMIT_PER_REPO", default_value_t = 5)]
    pub mr_limit: usize,

    /// Username the bot's merge requests are authored by
    #[arg(long, default_value = "dependabot")]
    pub bot_username: String,

    /// Resolver helper command invoked for dependency file operations
    #[arg(long, env = "DEPBOT_RESOLVER", default_value = "depbot-resolver")]
    pub resolver: String,

    /// Repository path of the update policy document
    #[arg(long, default_value = ".dependabot/config.yml")]
    pub config_path: String,

    /// Wait for a created merge request's pipelines to finish before
    /// arming auto-merge. This wait polls without an upper bound.
    #[arg(long)]
    pub wait_for_pipeline_completion: bool,
}
