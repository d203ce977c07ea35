use crate::{config, error, record};

use aws_sdk_dynamodb::{Client, types};

/// A table with a single string partition key and on-demand billing.
#[derive(Clone, Debug, PartialEq)]
pub struct TableDefinition {
    /// Table name.
    pub table_name: String,
    /// Name of the string partition key.
    pub partition_key: String,
}

impl TableDefinition {
    /// The table holding [`record::Record`]s, as declared by `templates/customer_table.yaml`.
    pub fn for_record(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            partition_key: record::ID.to_string(),
        }
    }

    fn key_schema(&self) -> error::Result<(types::AttributeDefinition, types::KeySchemaElement)> {
        if self.table_name.is_empty() || self.partition_key.is_empty() {
            return Err(error::Error::Config(format!(
                "table `{}` needs a name and a partition key, got `{}`",
                self.table_name, self.partition_key
            )));
        }
        let attribute_definition = types::AttributeDefinition::builder()
            .attribute_name(&self.partition_key)
            .attribute_type(types::ScalarAttributeType::S)
            .build()
            .map_err(|error| error::Error::Config(error.to_string()))?;
        let key_schema = types::KeySchemaElement::builder()
            .attribute_name(&self.partition_key)
            .key_type(types::KeyType::Hash)
            .build()
            .map_err(|error| error::Error::Config(error.to_string()))?;
        Ok((attribute_definition, key_schema))
    }
}

/// Direct table administration, bypassing stack provisioning.
#[derive(Clone, Debug)]
pub struct TableAdmin {
    client: Client,
    wait: config::WaitPolicy,
}

impl TableAdmin {
    /// Wrap `client`; waits for new tables are bounded by `wait`.
    pub fn new(client: Client, wait: config::WaitPolicy) -> Self {
        Self { client, wait }
    }

    /// The names of every table, following pagination.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_harness.list_tables", skip(self), err)
    )]
    pub async fn list(&self) -> error::Result<Vec<String>> {
        let mut table_names = Vec::new();
        let mut pages = self.client.list_tables().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|error| error::Error::transport("ListTables", error))?;
            table_names.extend(page.table_names.unwrap_or_default());
        }
        Ok(table_names)
    }

    /// Create the table and wait until it is active.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_harness.create_table",
            skip(self, definition),
            fields(table = %definition.table_name),
            err
        )
    )]
    pub async fn create(&self, definition: &TableDefinition) -> error::Result<()> {
        let (attribute_definition, key_schema) = definition.key_schema()?;
        self.client
            .create_table()
            .table_name(&definition.table_name)
            .attribute_definitions(attribute_definition)
            .key_schema(key_schema)
            .billing_mode(types::BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|error| error::Error::transport("CreateTable", error))?;
        self.wait_for_active(&definition.table_name).await
    }

    async fn wait_for_active(&self, table_name: &str) -> error::Result<()> {
        self.wait
            .poll(table_name, move || async move {
                let output = self
                    .client
                    .describe_table()
                    .table_name(table_name)
                    .send()
                    .await
                    .map_err(|error| error::Error::transport("DescribeTable", error))?;
                let status = output.table.and_then(|table| table.table_status);
                Ok((status == Some(types::TableStatus::Active)).then_some(()))
            })
            .await
    }

    /// Delete the table. Items in it are lost.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_harness.delete_table", skip(self), err)
    )]
    pub async fn delete(&self, table_name: &str) -> error::Result<()> {
        self.client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|error| error::Error::transport("DeleteTable", error))?;
        Ok(())
    }

    /// Whether a table with this name exists.
    pub async fn exists(&self, table_name: &str) -> error::Result<bool> {
        match self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(error)
                if error
                    .as_service_error()
                    .is_some_and(|error| error.is_resource_not_found_exception()) =>
            {
                Ok(false)
            }
            Err(error) => Err(error::Error::transport("DescribeTable", error)),
        }
    }
}
