//! Repository URL resolution
//!
//! Registry metadata points at package source repositories with a mix of
//! clone URLs, browse URLs and ssh remotes. The resolver turns those into
//! a normalized repository location. Self-hosted instances are supported
//! through an explicit strategy variant instead of patching the standard
//! resolver at runtime.

use regex::Regex;
use std::sync::OnceLock;

/// Normalized location of a package source repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocation {
    /// Source control provider, e.g. `github`
    pub provider: String,
    /// Hostname the repository lives on
    pub hostname: String,
    /// Full `namespace/project` path
    pub repo: String,
}

impl RepositoryLocation {
    /// Browse URL of the repository
    pub fn browse_url(&self) -> String {
        format!("https://{}/{}", self.hostname, self.repo)
    }
}

/// Strategy for recognizing repository URLs
pub trait RepositoryUrlResolver: Send + Sync {
    /// Resolve a URL-ish string into a repository location, if recognized
    fn resolve(&self, url: &str) -> Option<RepositoryLocation>;
}

fn known_host_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            (?P<host>github\.com|gitlab\.com|bitbucket\.org)
            [/:]
            (?P<repo>[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+)
            ",
        )
        .expect("known host regex is valid")
    })
}

fn trim_repo(repo: &str) -> String {
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    repo.trim_end_matches('.').to_string()
}

fn provider_for_host(host: &str) -> &'static str {
    match host {
        "github.com" => "github",
        "gitlab.com" => "gitlab",
        "bitbucket.org" => "bitbucket",
        _ => "gitlab",
    }
}

/// Resolver for the well-known public hosts
#[derive(Debug, Default)]
pub struct StandardUrlResolver;

impl StandardUrlResolver {
    /// Create a new standard resolver
    pub fn new() -> Self {
        Self
    }
}

impl RepositoryUrlResolver for StandardUrlResolver {
    fn resolve(&self, url: &str) -> Option<RepositoryLocation> {
        let captures = known_host_regex().captures(url)?;
        let host = captures.name("host")?.as_str();
        let repo = trim_repo(captures.name("repo")?.as_str());
        Some(RepositoryLocation {
            provider: provider_for_host(host).to_string(),
            hostname: host.to_string(),
            repo,
        })
    }
}

/// Resolver that additionally recognizes one self-hosted GitLab instance
pub struct CustomHostUrlResolver {
    hostname: String,
    host_regex: Regex,
    standard: StandardUrlResolver,
}

impl CustomHostUrlResolver {
    /// Create a resolver for the given self-hosted hostname
    pub fn new(hostname: impl Into<String>) -> Self {
        let hostname = hostname.into();
        let host_regex = Regex::new(&format!(
            r"(?x)
            {}
            [/:]
            (?P<repo>[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+)
            ",
            regex::escape(&hostname)
        ))
        .expect("escaped hostname regex is valid");
        Self {
            hostname,
            host_regex,
            standard: StandardUrlResolver::new(),
        }
    }
}

impl RepositoryUrlResolver for CustomHostUrlResolver {
    fn resolve(&self, url: &str) -> Option<RepositoryLocation> {
        if let Some(captures) = self.host_regex.captures(url) {
            let repo = trim_repo(&captures["repo"]);
            return Some(RepositoryLocation {
                provider: "gitlab".to_string(),
                hostname: self.hostname.clone(),
                repo,
            });
        }
        self.standard.resolve(url)
    }
}
