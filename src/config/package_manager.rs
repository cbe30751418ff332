//! Package manager identifier mapping
//!
//! Policy documents name ecosystems by a policy key (e.g. `javascript`);
//! the resolution engine expects its own identifier (e.g. `npm_and_yarn`).
//! Unknown keys are a configuration error for the affected entry.

use crate::error::ConfigError;
use std::fmt;

/// Resolver-side package manager identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    NpmAndYarn,
    Bundler,
    Composer,
    Pip,
    GoModules,
    Dep,
    Maven,
    Gradle,
    Nuget,
    Cargo,
    Hex,
    Docker,
    Terraform,
    Submodules,
    Elm,
    Cake,
}

impl PackageManager {
    /// Resolve a policy document key into a package manager identifier
    pub fn from_config_key(key: &str) -> Result<Self, ConfigError> {
        match key {
            "javascript" => Ok(PackageManager::NpmAndYarn),
            "ruby:bundler" => Ok(PackageManager::Bundler),
            "php:composer" => Ok(PackageManager::Composer),
            "python" => Ok(PackageManager::Pip),
            "go:modules" => Ok(PackageManager::GoModules),
            "go:dep" => Ok(PackageManager::Dep),
            "java:maven" => Ok(PackageManager::Maven),
            "java:gradle" => Ok(PackageManager::Gradle),
            "dotnet:nuget" => Ok(PackageManager::Nuget),
            "rust:cargo" => Ok(PackageManager::Cargo),
            "elixir:hex" => Ok(PackageManager::Hex),
            "docker" => Ok(PackageManager::Docker),
            "terraform" => Ok(PackageManager::Terraform),
            "submodules" => Ok(PackageManager::Submodules),
            "elm" => Ok(PackageManager::Elm),
            "cake" => Ok(PackageManager::Cake),
            other => Err(ConfigError::unsupported_package_manager(other)),
        }
    }

    /// Identifier used when talking to the resolution engine
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::NpmAndYarn => "npm_and_yarn",
            PackageManager::Bundler => "bundler",
            PackageManager::Composer => "composer",
            PackageManager::Pip => "pip",
            PackageManager::GoModules => "go_modules",
            PackageManager::Dep => "dep",
            PackageManager::Maven => "maven",
            PackageManager::Gradle => "gradle",
            PackageManager::Nuget => "nuget",
            PackageManager::Cargo => "cargo",
            PackageManager::Hex => "hex",
            PackageManager::Docker => "docker",
            PackageManager::Terraform => "terraform",
            PackageManager::Submodules => "submodules",
            PackageManager::Elm => "elm",
            PackageManager::Cake => "cake",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
