#![deny(missing_docs)]
#![deny(warnings)]

//! # DynamoDB Harness
//!
//! A local service harness for integration-testing code against an emulated DynamoDB whose
//! schema is provisioned through CloudFormation.
//!
//! ## Overview
//!
//! Each scenario owns a [`harness::Harness`] that:
//! - Starts a LocalStack container, or attaches to one that is already running
//! - Builds clients bound to the emulator with static credentials
//! - Provisions tables from a CloudFormation template and waits until they are usable
//! - Hands out record gateways in several flavors that share one contract
//!
//! Nothing is global: dropping or stopping the harness releases everything it started.
//!
//! ## Quick Example
//!
//! ```no_run
//! use dynamodb_harness::{
//!     client::Flavor,
//!     config::HarnessConfig,
//!     expression::Filter,
//!     harness::Harness,
//!     provisioner::StackDescriptor,
//!     record::Record,
//! };
//! use futures::TryStreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut harness = Harness::start(HarnessConfig::default()).await?;
//! let descriptor = StackDescriptor::from_file("created-by-test", "templates/customer_table.yaml")?;
//! harness.provisioner()?.apply(&descriptor).await?;
//!
//! let gateway = harness.gateway(Flavor::Attribute, "Customer")?;
//! gateway
//!     .put(&Record {
//!         id: "id146".to_string(),
//!         email: Some("sred@noserver.com".to_string()),
//!         ..Default::default()
//!     })
//!     .await?;
//! let matching: Vec<Record> = gateway
//!     .scan_matching(Filter::equals("email", "sred@noserver.com".to_string()))
//!     .try_collect()
//!     .await?;
//! assert_eq!(matching.len(), 1);
//!
//! harness.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@harness`] - Per-scenario context object
//! - [`mod@emulator`] - Emulator lifecycle
//! - [`mod@client`] - Service clients and gateway flavors
//! - [`mod@provisioner`] - Stack provisioning
//! - [`mod@table`] - Direct table administration
//! - [`mod@gateway`] - Record read/write access
//! - [`mod@record`] - The record type and its attribute translation

/// Service clients bound to one emulator endpoint.
pub mod client;

/// Harness configuration for both emulator modes.
pub mod config;

/// Static credentials for the emulator.
pub mod credentials;

/// Emulator lifecycle.
pub mod emulator;

/// Error types.
pub mod error;

/// Filter expressions.
pub mod expression;

/// Record gateways.
pub mod gateway;

/// Per-scenario context object.
pub mod harness;

/// Stack provisioning.
pub mod provisioner;

/// The record type stored by the scenarios.
pub mod record;

/// Table administration.
pub mod table;
