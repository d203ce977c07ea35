//! Harness configuration.
//!
//! A scenario either starts its own emulator container or talks to one that is
//! already running (for example one started with `docker compose`). Both modes are
//! selected here, so test code never branches on them.

use crate::{credentials, emulator, error};

use indexmap::IndexSet;
use std::{env, future, time};

/// Endpoint of an externally managed LocalStack.
pub const EXTERNAL_ENDPOINT: &str = "http://localhost:4566";

/// Region used against an externally managed emulator.
pub const EXTERNAL_REGION: &str = "eu-central-1";

/// Region used against a harness-started container.
pub const CONTAINER_REGION: &str = "us-east-1";

/// Image of the emulator container.
pub const LOCALSTACK_IMAGE: &str = "localstack/localstack";

/// Tag of the emulator container image.
pub const LOCALSTACK_TAG: &str = "3.8";

const ENDPOINT_VARIABLE: &str = "HARNESS_ENDPOINT_URL";
const IMAGE_VARIABLE: &str = "HARNESS_LOCALSTACK_IMAGE";
const REGION_VARIABLE: &str = "HARNESS_REGION";
const SERVICES_VARIABLE: &str = "HARNESS_SERVICES";
const TAG_VARIABLE: &str = "HARNESS_LOCALSTACK_TAG";
const WAIT_TIMEOUT_VARIABLE: &str = "HARNESS_WAIT_TIMEOUT_SECS";

/// Container settings for a harness-started emulator.
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerConfig {
    /// Image name.
    pub image: String,
    /// Image tag.
    pub tag: String,
    /// How long to wait for the container to report ready.
    pub startup_timeout: time::Duration,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            image: LOCALSTACK_IMAGE.to_string(),
            tag: LOCALSTACK_TAG.to_string(),
            startup_timeout: time::Duration::from_secs(120),
        }
    }
}

/// Where the emulator comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum EmulatorMode {
    /// Start a container per scenario and discover its endpoint.
    Container(ContainerConfig),
    /// Use an emulator that is already running at a fixed endpoint.
    External {
        /// Base URL of the emulator.
        endpoint: String,
    },
}

/// Bound on waits for resources to reach a terminal state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaitPolicy {
    /// Give up after this long.
    pub timeout: time::Duration,
    /// Delay between two status polls.
    pub poll_interval: time::Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: time::Duration::from_secs(120),
            poll_interval: time::Duration::from_secs(1),
        }
    }
}

impl WaitPolicy {
    /// Poll `check` until it yields a value, an error, or the timeout elapses.
    pub(crate) async fn poll<T, F, Fut>(&self, resource: &str, mut check: F) -> error::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: future::Future<Output = error::Result<Option<T>>>,
    {
        let started = tokio::time::Instant::now();
        loop {
            if let Some(value) = check().await? {
                return Ok(value);
            }
            if started.elapsed() >= self.timeout {
                let timeout = error::ProvisioningError::Timeout {
                    resource: resource.to_string(),
                    waited: self.timeout,
                };
                return Err(timeout.into());
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(resource, "not ready yet");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Everything a scenario needs to reach its emulator.
///
/// ```rust
/// use dynamodb_harness::config;
///
/// let config = config::HarnessConfig::external();
/// assert_eq!(config.region, "eu-central-1");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct HarnessConfig {
    /// Credentials presented to the emulator.
    pub credentials: credentials::StaticCredentials,
    /// Container or external emulator.
    pub mode: EmulatorMode,
    /// Region clients are bound to.
    pub region: String,
    /// Services that must be available.
    pub services: IndexSet<emulator::Service>,
    /// Bound on provisioning waits.
    pub wait: WaitPolicy,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            credentials: credentials::StaticCredentials::default(),
            mode: EmulatorMode::Container(ContainerConfig::default()),
            region: CONTAINER_REGION.to_string(),
            services: IndexSet::from([
                emulator::Service::DynamoDb,
                emulator::Service::CloudFormation,
            ]),
            wait: WaitPolicy::default(),
        }
    }
}

impl HarnessConfig {
    /// Configuration for an emulator already listening on [`EXTERNAL_ENDPOINT`].
    pub fn external() -> Self {
        Self {
            mode: EmulatorMode::External {
                endpoint: EXTERNAL_ENDPOINT.to_string(),
            },
            region: EXTERNAL_REGION.to_string(),
            ..Default::default()
        }
    }

    /// Read the configuration from `HARNESS_*` environment variables.
    ///
    /// Setting `HARNESS_ENDPOINT_URL` selects the external mode. Blank variables count as unset.
    pub fn from_env() -> error::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> error::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = match lookup(ENDPOINT_VARIABLE) {
            Some(endpoint) => Self {
                mode: EmulatorMode::External { endpoint },
                ..Self::external()
            },
            None => Self::default(),
        };
        if let EmulatorMode::Container(container) = &mut config.mode {
            if let Some(image) = lookup(IMAGE_VARIABLE) {
                container.image = image;
            }
            if let Some(tag) = lookup(TAG_VARIABLE) {
                container.tag = tag;
            }
        }
        if let Some(region) = lookup(REGION_VARIABLE) {
            config.region = region;
        }
        if let Some(services) = lookup(SERVICES_VARIABLE) {
            config.services = services
                .split(',')
                .filter(|service| !service.trim().is_empty())
                .map(str::parse)
                .collect::<error::Result<_>>()?;
        }
        if let Some(timeout) = lookup(WAIT_TIMEOUT_VARIABLE) {
            let seconds = timeout.parse::<u64>().map_err(|error| {
                error::Error::Config(format!("{WAIT_TIMEOUT_VARIABLE}=`{timeout}`: {error}"))
            })?;
            config.wait.timeout = time::Duration::from_secs(seconds);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use std::collections;

    fn to_map(variables: &[(&str, &str)]) -> collections::HashMap<String, String> {
        variables
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[rstest]
    #[case::empty(
        &[],
        HarnessConfig::default()
    )]
    #[case::external(
        &[("HARNESS_ENDPOINT_URL", "http://localhost:4566")],
        HarnessConfig::external()
    )]
    #[case::blank_values_are_unset(
        &[
            ("HARNESS_ENDPOINT_URL", ""),
            ("HARNESS_REGION", "  "),
            ("HARNESS_SERVICES", ""),
        ],
        HarnessConfig::default()
    )]
    #[case::container_overrides(
        &[
            ("HARNESS_LOCALSTACK_IMAGE", "a"),
            ("HARNESS_LOCALSTACK_TAG", "b"),
            ("HARNESS_REGION", "c"),
            ("HARNESS_SERVICES", "dynamodb"),
            ("HARNESS_WAIT_TIMEOUT_SECS", "5"),
        ],
        HarnessConfig {
            mode: EmulatorMode::Container(
                ContainerConfig {
                    image: "a".to_string(),
                    tag: "b".to_string(),
                    ..Default::default()
                }
            ),
            region: "c".to_string(),
            services: IndexSet::from([emulator::Service::DynamoDb]),
            wait: WaitPolicy {
                timeout: time::Duration::from_secs(5),
                ..Default::default()
            },
            ..Default::default()
        }
    )]
    #[case::external_ignores_image(
        &[
            ("HARNESS_ENDPOINT_URL", "http://emulator:4566"),
            ("HARNESS_LOCALSTACK_IMAGE", "a"),
        ],
        HarnessConfig {
            mode: EmulatorMode::External {
                endpoint: "http://emulator:4566".to_string(),
            },
            ..HarnessConfig::external()
        }
    )]
    fn test_from_lookup(#[case] variables: &[(&str, &str)], #[case] expected: HarnessConfig) {
        let variables = to_map(variables);
        let actual = HarnessConfig::from_lookup(|name| variables.get(name).cloned()).unwrap();
        assert_eq!(actual, expected);
    }

    fn short_wait() -> WaitPolicy {
        WaitPolicy {
            timeout: time::Duration::from_millis(30),
            poll_interval: time::Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_poll_until_ready() {
        let mut attempts = 0;
        let actual = short_wait()
            .poll("a", || {
                attempts += 1;
                let ready = (attempts >= 3).then_some(attempts);
                async move { Ok(ready) }
            })
            .await
            .unwrap();
        assert_eq!(actual, 3);
    }

    #[tokio::test]
    async fn test_poll_times_out() {
        let actual = short_wait()
            .poll("a", || async { Ok(None::<()>) })
            .await;
        assert!(matches!(
            actual,
            Err(error::Error::Provisioning(error::ProvisioningError::Timeout { resource, .. })) if resource == "a"
        ));
    }

    #[tokio::test]
    async fn test_poll_propagates_errors() {
        let actual = short_wait()
            .poll("a", || async { Err::<Option<()>, _>(error::Error::Config("b".to_string())) })
            .await;
        assert!(matches!(actual, Err(error::Error::Config(_))));
    }

    #[rstest]
    #[case::bad_timeout(&[("HARNESS_WAIT_TIMEOUT_SECS", "soon")])]
    #[case::bad_service(&[("HARNESS_SERVICES", "dynamodb,sqs")])]
    fn test_from_lookup_invalid(#[case] variables: &[(&str, &str)]) {
        let variables = to_map(variables);
        let actual = HarnessConfig::from_lookup(|name| variables.get(name).cloned());
        assert!(matches!(actual, Err(error::Error::Config(_))));
    }
}
