use crate::{config, credentials, emulator, error, gateway, provisioner, table};

use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};

/// How a gateway translates records.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flavor {
    /// Hand-written attribute translation over the low-level client.
    Attribute,
    /// Serde-mapped table.
    Mapped,
}

/// Builds service clients bound to one emulator endpoint.
///
/// Construction does no I/O. Every client it builds uses static credentials and a fixed
/// region, so nothing is read from the host's AWS configuration.
///
/// ```rust
/// use dynamodb_harness::{client::{ClientFactory, Flavor}, credentials::StaticCredentials};
///
/// let factory = ClientFactory::new(
///     "http://localhost:4566",
///     "eu-central-1",
///     StaticCredentials::default(),
/// );
/// let gateway = factory.gateway(Flavor::Mapped, "Customer");
/// assert_eq!(gateway.table_name(), "Customer");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ClientFactory {
    credentials: credentials::StaticCredentials,
    endpoint: String,
    region: String,
}

impl ClientFactory {
    /// Bind a factory to `endpoint`.
    pub fn new(
        endpoint: impl Into<String>,
        region: impl Into<String>,
        credentials: credentials::StaticCredentials,
    ) -> Self {
        Self {
            credentials,
            endpoint: endpoint.into(),
            region: region.into(),
        }
    }

    /// Bind a factory to the endpoint `emulator` exposes for `service`.
    pub fn for_service(
        emulator: &emulator::EmulatorHandle,
        service: emulator::Service,
        region: impl Into<String>,
        credentials: credentials::StaticCredentials,
    ) -> error::Result<Self> {
        let endpoint = emulator.endpoint_for(service)?;
        Ok(Self::new(endpoint, region, credentials))
    }

    /// The endpoint every client is bound to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The region every client is bound to.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// A low-level DynamoDB client.
    pub fn dynamodb(&self) -> aws_sdk_dynamodb::Client {
        let config = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .endpoint_url(&self.endpoint)
            .credentials_provider(Credentials::from(&self.credentials))
            .build();
        aws_sdk_dynamodb::Client::from_conf(config)
    }

    /// A CloudFormation client.
    pub fn cloudformation(&self) -> aws_sdk_cloudformation::Client {
        let config = aws_sdk_cloudformation::Config::builder()
            .behavior_version(aws_sdk_cloudformation::config::BehaviorVersion::latest())
            .region(aws_sdk_cloudformation::config::Region::new(
                self.region.clone(),
            ))
            .endpoint_url(&self.endpoint)
            .credentials_provider(Credentials::from(&self.credentials))
            .build();
        aws_sdk_cloudformation::Client::from_conf(config)
    }

    /// An asynchronous gateway over `table_name`.
    pub fn gateway(
        &self,
        flavor: Flavor,
        table_name: impl Into<String>,
    ) -> Box<dyn gateway::RecordGateway> {
        let client = self.dynamodb();
        match flavor {
            Flavor::Attribute => Box::new(gateway::attribute::AttributeGateway::new(
                client, table_name,
            )),
            Flavor::Mapped => Box::new(gateway::mapped::MappedTable::new(client, table_name)),
        }
    }

    /// A synchronous gateway over `table_name`, with its own runtime.
    pub fn blocking(
        &self,
        flavor: Flavor,
        table_name: impl Into<String>,
    ) -> error::Result<gateway::blocking::BlockingGateway> {
        gateway::blocking::BlockingGateway::new(self.gateway(flavor, table_name))
    }

    /// Table administration.
    pub fn table_admin(&self, wait: config::WaitPolicy) -> table::TableAdmin {
        table::TableAdmin::new(self.dynamodb(), wait)
    }

    /// Stack provisioning.
    pub fn provisioner(&self, wait: config::WaitPolicy) -> provisioner::SchemaProvisioner {
        provisioner::SchemaProvisioner::new(self.cloudformation(), wait)
    }
}
