//! Error taxonomy shared by every harness component.
//!
//! A missing record is not an error: [`crate::gateway::RecordGateway::get`] reports it as
//! `Ok(None)`.

use aws_sdk_dynamodb::error::DisplayErrorContext;
use std::{error, io, time};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the harness.
#[derive(Debug, Error)]
pub enum Error {
    /// The emulator could not be started, or a service it was asked for is not available.
    #[error("emulator startup failed: {0}")]
    Startup(String),
    /// A stack or table could not be provisioned.
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),
    /// A service call failed; `message` is the service's diagnostic text.
    #[error("{operation} failed: {message}")]
    Transport {
        /// The service operation that failed, e.g. `PutItem`.
        operation: &'static str,
        /// The full diagnostic reported by the SDK.
        message: String,
    },
    /// An item could not be translated to or from its domain type.
    #[error("attribute conversion failed: {0}")]
    Conversion(String),
    /// The harness configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// A template could not be read.
    #[error("failed to read template: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn transport<E: error::Error>(operation: &'static str, error: E) -> Self {
        Self::Transport {
            operation,
            message: DisplayErrorContext(&error).to_string(),
        }
    }
}

impl From<serde_dynamo::Error> for Error {
    fn from(error: serde_dynamo::Error) -> Self {
        Self::Conversion(error.to_string())
    }
}

/// Reasons a provisioning step did not reach its terminal success state.
#[derive(Debug, Error, PartialEq)]
pub enum ProvisioningError {
    /// A stack with this name is already in progress or complete.
    #[error("stack `{stack_name}` already exists with status {status}")]
    StackExists {
        /// The conflicting stack name.
        stack_name: String,
        /// The status the existing stack was found in.
        status: String,
    },
    /// The provisioning service refused the submission.
    #[error("stack `{stack_name}` was rejected: {message}")]
    Rejected {
        /// The submitted stack name.
        stack_name: String,
        /// The service's diagnostic text.
        message: String,
    },
    /// The stack reached a terminal failure state.
    #[error("stack `{stack_name}` ended in {status}: {reason}")]
    Failed {
        /// The failed stack name.
        stack_name: String,
        /// The terminal status.
        status: String,
        /// The status reason reported by the service, if any.
        reason: String,
    },
    /// The resource did not become ready within the wait bound.
    #[error("`{resource}` was not ready after {waited:?}")]
    Timeout {
        /// The stack or table being waited on.
        resource: String,
        /// How long the harness waited.
        waited: time::Duration,
    },
}
