use crate::{client, config, emulator, error, gateway, provisioner, table};

/// Everything one scenario needs, owned by that scenario.
///
/// Clients are built on demand from the emulator handle, so scenarios never share
/// clients through global state.
///
/// ```rust,no_run
/// use dynamodb_harness::{client::Flavor, config::HarnessConfig, harness::Harness, record::Record};
///
/// # async fn example() -> dynamodb_harness::error::Result<()> {
/// let mut harness = Harness::start(HarnessConfig::from_env()?).await?;
/// let gateway = harness.gateway(Flavor::Attribute, "Customer")?;
/// gateway.put(&Record::key_only("id146")).await?;
/// harness.stop().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Harness {
    config: config::HarnessConfig,
    emulator: emulator::EmulatorHandle,
}

impl Harness {
    /// Start or attach to the emulator `config` describes.
    pub async fn start(config: config::HarnessConfig) -> error::Result<Self> {
        let emulator = match &config.mode {
            config::EmulatorMode::Container(container) => {
                emulator::EmulatorHandle::start(container, config.services.clone()).await?
            }
            config::EmulatorMode::External { endpoint } => {
                emulator::EmulatorHandle::external(endpoint.clone(), config.services.clone())
            }
        };
        Ok(Self { config, emulator })
    }

    /// The configuration this harness was started with.
    pub fn config(&self) -> &config::HarnessConfig {
        &self.config
    }

    /// The emulator backing this harness.
    pub fn emulator(&self) -> &emulator::EmulatorHandle {
        &self.emulator
    }

    /// A client factory bound to `service`.
    pub fn client_factory(&self, service: emulator::Service) -> error::Result<client::ClientFactory> {
        client::ClientFactory::for_service(
            &self.emulator,
            service,
            self.config.region.clone(),
            self.config.credentials.clone(),
        )
    }

    /// A provisioner bounded by the configured wait policy.
    pub fn provisioner(&self) -> error::Result<provisioner::SchemaProvisioner> {
        let factory = self.client_factory(emulator::Service::CloudFormation)?;
        Ok(factory.provisioner(self.config.wait))
    }

    /// Table administration bounded by the configured wait policy.
    pub fn table_admin(&self) -> error::Result<table::TableAdmin> {
        let factory = self.client_factory(emulator::Service::DynamoDb)?;
        Ok(factory.table_admin(self.config.wait))
    }

    /// An asynchronous gateway over `table_name`.
    pub fn gateway(
        &self,
        flavor: client::Flavor,
        table_name: &str,
    ) -> error::Result<Box<dyn gateway::RecordGateway>> {
        let factory = self.client_factory(emulator::Service::DynamoDb)?;
        Ok(factory.gateway(flavor, table_name))
    }

    /// Release the emulator. Calling it again is a no-op.
    pub async fn stop(&mut self) -> error::Result<()> {
        self.emulator.stop().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use indexmap::IndexSet;

    #[tokio::test]
    async fn test_external_harness() {
        let config = config::HarnessConfig {
            services: IndexSet::from([emulator::Service::DynamoDb]),
            ..config::HarnessConfig::external()
        };
        let mut harness = Harness::start(config).await.unwrap();
        assert!(!harness.emulator().is_managed());
        let factory = harness.client_factory(emulator::Service::DynamoDb).unwrap();
        assert_eq!(factory.endpoint(), config::EXTERNAL_ENDPOINT);
        assert_eq!(factory.region(), config::EXTERNAL_REGION);
        assert!(harness.gateway(client::Flavor::Mapped, "Customer").is_ok());
        assert!(harness.table_admin().is_ok());
        assert!(matches!(
            harness.provisioner(),
            Err(error::Error::Startup(_))
        ));
        harness.stop().await.unwrap();
        harness.stop().await.unwrap();
        assert!(matches!(
            harness.gateway(client::Flavor::Attribute, "Customer"),
            Err(error::Error::Startup(_))
        ));
    }
}
