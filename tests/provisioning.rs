mod common;

use dynamodb_harness::{
    error::{Error, ProvisioningError},
    provisioner::{StackDescriptor, StackPhase},
    table::TableDefinition,
};

#[tokio::test]
#[ignore = "requires a container runtime"]
async fn test_apply_creates_table() {
    let mut harness = common::start().await;
    let scenario = common::Scenario::new();
    let summary = scenario.provision(&harness).await;
    assert_eq!(summary.stack_name, scenario.stack_name());
    assert_eq!(summary.status, "CREATE_COMPLETE");
    assert_eq!(summary.phase, StackPhase::Complete);
    let admin = harness.table_admin().unwrap();
    assert!(admin.exists(&scenario.table_name).await.unwrap());
    scenario.teardown(&harness).await;
    assert!(!admin.exists(&scenario.table_name).await.unwrap());
    harness.stop().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a container runtime"]
async fn test_apply_twice_is_rejected() {
    let mut harness = common::start().await;
    let scenario = common::Scenario::new();
    scenario.provision(&harness).await;
    let actual = harness
        .provisioner()
        .unwrap()
        .apply(&scenario.descriptor)
        .await;
    assert!(matches!(
        actual,
        Err(Error::Provisioning(ProvisioningError::StackExists { stack_name, .. }))
            if stack_name == scenario.stack_name()
    ));
    scenario.teardown(&harness).await;
    harness.stop().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a container runtime"]
async fn test_describe_list_delete() {
    let mut harness = common::start().await;
    let scenario = common::Scenario::new();
    let provisioner = harness.provisioner().unwrap();
    assert_eq!(provisioner.describe(scenario.stack_name()).await.unwrap(), None);
    scenario.provision(&harness).await;

    let described = provisioner
        .describe(scenario.stack_name())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(described.phase, StackPhase::Complete);
    let listed = provisioner.list().await.unwrap();
    assert!(listed.iter().any(|stack| stack.stack_name == scenario.stack_name()));

    provisioner.delete(scenario.stack_name()).await.unwrap();
    let after = provisioner.describe(scenario.stack_name()).await.unwrap();
    assert!(after.is_none_or(|stack| stack.phase == StackPhase::Deleted));
    provisioner.delete(scenario.stack_name()).await.unwrap();
    harness.stop().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a container runtime"]
async fn test_validate() {
    let mut harness = common::start().await;
    let scenario = common::Scenario::new();
    let provisioner = harness.provisioner().unwrap();
    provisioner.validate(&scenario.descriptor).await.unwrap();
    let actual = provisioner
        .validate(&StackDescriptor::new("broken", "not: [a template"))
        .await;
    assert!(matches!(
        actual,
        Err(Error::Provisioning(ProvisioningError::Rejected { .. }))
    ));
    harness.stop().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a container runtime"]
async fn test_table_admin() {
    let mut harness = common::start().await;
    let scenario = common::Scenario::new();
    let table_name = format!("Orders-{}", scenario.table_name);
    let admin = harness.table_admin().unwrap();
    assert!(!admin.exists(&table_name).await.unwrap());
    admin
        .create(&TableDefinition::for_record(&table_name))
        .await
        .unwrap();
    assert!(admin.list().await.unwrap().contains(&table_name));
    assert!(admin.exists(&table_name).await.unwrap());
    admin.delete(&table_name).await.unwrap();
    assert!(!admin.exists(&table_name).await.unwrap());
    assert!(!admin.list().await.unwrap().contains(&table_name));
    harness.stop().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a container runtime"]
async fn test_stop_releases_endpoints() {
    let mut harness = common::start().await;
    harness.stop().await.unwrap();
    harness.stop().await.unwrap();
    assert!(matches!(harness.provisioner(), Err(Error::Startup(_))));
}
