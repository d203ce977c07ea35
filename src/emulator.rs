use crate::{config, error};

use indexmap::IndexSet;
use std::{fmt, str};
use testcontainers_modules::{
    localstack::LocalStack,
    testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner},
};

/// The port LocalStack serves every emulated service on.
const EDGE_PORT: u16 = 4566;

/// An emulated service the harness can enable.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Service {
    /// The stack-provisioning service (CloudFormation).
    CloudFormation,
    /// The key-value table service (DynamoDB).
    DynamoDb,
}

impl Service {
    /// The name LocalStack uses for the service in its `SERVICES` variable.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CloudFormation => "cloudformation",
            Self::DynamoDb => "dynamodb",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl str::FromStr for Service {
    type Err = error::Error;

    fn from_str(value: &str) -> error::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cloudformation" => Ok(Self::CloudFormation),
            "dynamodb" => Ok(Self::DynamoDb),
            other => Err(error::Error::Config(format!("unknown service `{other}`"))),
        }
    }
}

/// Render a service set the way LocalStack expects it (`dynamodb,cloudformation`).
pub(crate) fn services_variable(services: &IndexSet<Service>) -> String {
    services
        .iter()
        .map(Service::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// Lifecycle of a local emulator exposing the declared services.
///
/// The handle is owned by exactly one scenario. It is either backed by a container
/// started through testcontainers, or it points at an emulator someone else manages.
///
/// ```rust,no_run
/// use dynamodb_harness::{config, emulator};
///
/// # async fn example() -> dynamodb_harness::error::Result<()> {
/// let container = config::ContainerConfig::default();
/// let services = [emulator::Service::DynamoDb].into_iter().collect();
/// let mut handle = emulator::EmulatorHandle::start(&container, services).await?;
/// let endpoint = handle.endpoint_for(emulator::Service::DynamoDb)?;
/// # let _ = endpoint;
/// handle.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct EmulatorHandle {
    base_url: String,
    container: Option<ContainerAsync<LocalStack>>,
    running: bool,
    services: IndexSet<Service>,
}

impl fmt::Debug for EmulatorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmulatorHandle")
            .field("base_url", &self.base_url)
            .field("managed", &self.container.is_some())
            .field("running", &self.running)
            .field("services", &self.services)
            .finish()
    }
}

impl EmulatorHandle {
    /// Start a LocalStack container with `services` enabled.
    ///
    /// Returns once the container reports ready, so every declared service is usable.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_harness.emulator.start", skip(config), err)
    )]
    pub async fn start(
        config: &config::ContainerConfig,
        services: IndexSet<Service>,
    ) -> error::Result<Self> {
        if services.is_empty() {
            return Err(error::Error::Startup(
                "at least one service must be enabled".to_string(),
            ));
        }
        let request = LocalStack::default()
            .with_name(config.image.clone())
            .with_tag(config.tag.clone())
            .with_env_var("SERVICES", services_variable(&services))
            .with_startup_timeout(config.startup_timeout);
        let container = request
            .start()
            .await
            .map_err(|error| error::Error::Startup(error.to_string()))?;
        let host = container
            .get_host()
            .await
            .map_err(|error| error::Error::Startup(error.to_string()))?;
        let port = container
            .get_host_port_ipv4(EDGE_PORT)
            .await
            .map_err(|error| error::Error::Startup(error.to_string()))?;
        let base_url = format!("http://{host}:{port}");
        #[cfg(feature = "tracing")]
        tracing::info!(%base_url, id = container.id(), "emulator started");
        Ok(Self {
            base_url,
            container: Some(container),
            running: true,
            services,
        })
    }

    /// Wrap an emulator that is already running at `endpoint`.
    pub fn external(endpoint: impl Into<String>, services: IndexSet<Service>) -> Self {
        Self {
            base_url: endpoint.into().trim_end_matches('/').to_string(),
            container: None,
            running: true,
            services,
        }
    }

    /// Base URL of `service`.
    ///
    /// Fails when the service was not enabled or the emulator has been stopped.
    pub fn endpoint_for(&self, service: Service) -> error::Result<String> {
        if !self.running {
            return Err(error::Error::Startup("emulator is stopped".to_string()));
        }
        if !self.services.contains(&service) {
            return Err(error::Error::Startup(format!(
                "service `{service}` was not enabled"
            )));
        }
        Ok(self.base_url.clone())
    }

    /// Whether the emulator was started by this handle.
    pub fn is_managed(&self) -> bool {
        self.container.is_some()
    }

    /// Whether [`Self::stop`] has not been called yet.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The enabled services, in declaration order.
    pub fn services(&self) -> &IndexSet<Service> {
        &self.services
    }

    /// Release the emulator. Calling it again is a no-op.
    ///
    /// An external emulator is left running; only this handle stops using it.
    pub async fn stop(&mut self) -> error::Result<()> {
        self.running = false;
        if let Some(container) = self.container.take() {
            #[cfg(feature = "tracing")]
            tracing::info!(id = container.id(), "stopping emulator");
            container
                .rm()
                .await
                .map_err(|error| error::Error::Startup(error.to_string()))?;
        }
        Ok(())
    }
}
