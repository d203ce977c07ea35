#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use dynamodb_harness::{
    config::HarnessConfig,
    harness::Harness,
    provisioner::{StackDescriptor, StackSummary},
    record::Record,
};
use std::{
    collections, process,
    sync::atomic::{self, AtomicUsize},
};
use tracing_subscriber::EnvFilter;

pub const STACK_NAME: &str = "created-by-test";
pub const TABLE_NAME: &str = "Customer";
static SCENARIOS: AtomicUsize = AtomicUsize::new(0);

pub const TEMPLATE_PATH: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/templates/customer_table.yaml"
);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn start() -> Harness {
    init_tracing();
    let config = HarnessConfig::from_env().unwrap();
    Harness::start(config).await.unwrap()
}

/// Stack and table names owned by one scenario, unique so scenarios can share an emulator.
pub struct Scenario {
    pub descriptor: StackDescriptor,
    pub table_name: String,
}

impl Scenario {
    pub fn new() -> Self {
        let suffix = format!(
            "{}-{}-{}",
            process::id(),
            Utc::now().timestamp_micros(),
            SCENARIOS.fetch_add(1, atomic::Ordering::Relaxed)
        );
        let table_name = format!("{TABLE_NAME}-{suffix}");
        let descriptor =
            StackDescriptor::from_file(format!("{STACK_NAME}-{suffix}"), TEMPLATE_PATH)
                .unwrap()
                .with_parameter("TableName", &table_name);
        Self {
            descriptor,
            table_name,
        }
    }

    pub fn stack_name(&self) -> &str {
        &self.descriptor.stack_name
    }

    pub async fn provision(&self, harness: &Harness) -> StackSummary {
        harness
            .provisioner()
            .unwrap()
            .apply(&self.descriptor)
            .await
            .unwrap()
    }

    /// Delete the stack, and with it the table.
    pub async fn teardown(&self, harness: &Harness) {
        harness
            .provisioner()
            .unwrap()
            .delete(self.stack_name())
            .await
            .unwrap();
    }
}

pub fn customer() -> Record {
    Record {
        id: "id146".to_string(),
        name: Some("Susan red".to_string()),
        email: Some("sred@noserver.com".to_string()),
        registration_timestamp: Some(Utc.with_ymd_and_hms(2020, 4, 7, 0, 0, 0).unwrap()),
        attributes: Some(collections::BTreeMap::from([
            ("street".to_string(), "home".to_string()),
            ("city".to_string(), "Berlin".to_string()),
        ])),
        tags: Some(vec!["gold".to_string(), "newsletter".to_string()]),
    }
}

pub fn other_customer() -> Record {
    Record {
        id: "id147".to_string(),
        name: Some("Bob blue".to_string()),
        email: Some("bblue@noserver.com".to_string()),
        ..Default::default()
    }
}
