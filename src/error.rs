//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ConfigError: Issues with the update policy document
//! - ApiError: Issues with the source control API
//! - ResolverError: Issues with the dependency resolution helper

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Policy document related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Source control API related errors
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Dependency resolution related errors
    #[error(transparent)]
    Resolver(#[from] ResolverError),
}

/// Errors related to the update policy document
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Policy document could not be parsed
    #[error("failed to parse update configuration: {message}")]
    ParseError { message: String },

    /// Policy document has no update_configs entries
    #[error("update configuration contains no update_configs entries")]
    Empty,

    /// Unknown package manager key in an update config entry
    #[error("unsupported package manager: {key}")]
    UnsupportedPackageManager { key: String },

    /// Unknown update_schedule value in an update config entry
    #[error("unsupported update schedule: {value}")]
    UnsupportedSchedule { value: String },
}

/// Errors related to the source control API
#[derive(Error, Debug)]
pub enum ApiError {
    /// Resource does not exist
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Access to the resource was denied
    #[error("access to {resource} not granted")]
    Forbidden { resource: String },

    /// The API answered with an unexpected status
    #[error("source control API returned HTTP {status} for {resource}")]
    Http { status: u16, resource: String },

    /// Transport level failure
    #[error("source control request failed for {resource}: {message}")]
    Network { resource: String, message: String },

    /// Response body could not be decoded
    #[error("failed to decode response for {resource}: {message}")]
    Decode { resource: String, message: String },
}

/// Errors related to the dependency resolution helper
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Helper process could not be started
    #[error("failed to spawn resolver command '{command}': {message}")]
    Spawn { command: String, message: String },

    /// Helper process exited unsuccessfully
    #[error("resolver command failed for {operation}: {message}")]
    Failed { operation: String, message: String },

    /// Helper produced output that does not follow the protocol
    #[error("invalid resolver response for {operation}: {message}")]
    Protocol { operation: String, message: String },
}

impl ConfigError {
    /// Creates a new ParseError
    pub fn parse_error(message: impl Into<String>) -> Self {
        ConfigError::ParseError {
            message: message.into(),
        }
    }

    /// Creates a new UnsupportedPackageManager error
    pub fn unsupported_package_manager(key: impl Into<String>) -> Self {
        ConfigError::UnsupportedPackageManager { key: key.into() }
    }

    /// Creates a new UnsupportedSchedule error
    pub fn unsupported_schedule(value: impl Into<String>) -> Self {
        ConfigError::UnsupportedSchedule {
            value: value.into(),
        }
    }
}

impl ApiError {
    /// Creates a new NotFound error
    pub fn not_found(resource: impl Into<String>) -> Self {
        ApiError::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a new Forbidden error
    pub fn forbidden(resource: impl Into<String>) -> Self {
        ApiError::Forbidden {
            resource: resource.into(),
        }
    }

    /// Creates a new Http error
    pub fn http(status: u16, resource: impl Into<String>) -> Self {
        ApiError::Http {
            status,
            resource: resource.into(),
        }
    }

    /// Creates a new Network error
    pub fn network(resource: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Network {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Creates a new Decode error
    pub fn decode(resource: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Decode {
            resource: resource.into(),
            message: message.into(),
        }
    }
}

impl ResolverError {
    /// Creates a new Spawn error
    pub fn spawn(command: impl Into<String>, message: impl Into<String>) -> Self {
        ResolverError::Spawn {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Creates a new Failed error
    pub fn failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        ResolverError::Failed {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a new Protocol error
    pub fn protocol(operation: impl Into<String>, message: impl Into<String>) -> Self {
        ResolverError::Protocol {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
