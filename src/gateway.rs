//! Record gateways: read/write access to a single table of [`Record`]s.
//!
//! Every flavor implements the same contract, so scenarios can be run unchanged against
//! each of them:
//! - [`attribute::AttributeGateway`] translates records by hand
//! - [`mapped::MappedTable`] maps any serde type
//! - [`blocking::BlockingGateway`] wraps either of them behind a synchronous API

/// Asynchronous gateway with hand-written attribute translation.
pub mod attribute;

/// Synchronous facade over an asynchronous gateway.
pub mod blocking;

/// Serde-mapped tables.
pub mod mapped;

use crate::{error, expression, record::Record};

use async_stream::try_stream;
use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, types};
use futures::{StreamExt, stream::BoxStream};
use serde::Serialize;
use std::collections;

pub(crate) type Item = collections::HashMap<String, types::AttributeValue>;

/// Read/write access to a table of records.
///
/// Errors from the service are reported as [`error::Error::Transport`] and never retried by
/// the gateway itself.
#[async_trait]
pub trait RecordGateway: Send + Sync {
    /// The table this gateway reads and writes.
    fn table_name(&self) -> &str;

    /// Insert or replace the record with the same `id`.
    async fn put(&self, record: &Record) -> error::Result<()>;

    /// The stored record, or `None` when no record has this `id`.
    async fn get(&self, id: &str) -> error::Result<Option<Record>>;

    /// Every stored record, in no particular order.
    ///
    /// Pages are fetched as the stream is polled; calling it again re-reads the table.
    fn scan(&self) -> BoxStream<'_, error::Result<Record>>;

    /// The stored records matching `filter`, which may test non-key attributes.
    fn scan_matching(&self, filter: expression::Filter) -> BoxStream<'_, error::Result<Record>>;

    /// Remove the record, returning whether one existed.
    async fn delete(&self, id: &str) -> error::Result<bool>;
}

/// Raw item access shared by the gateway flavors.
#[derive(Clone, Debug)]
pub(crate) struct ItemTable {
    client: Client,
    table_name: String,
}

impl ItemTable {
    pub(crate) fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    pub(crate) fn table_name(&self) -> &str {
        &self.table_name
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_harness.put_item",
            skip(self, item),
            fields(table = %self.table_name),
            err
        )
    )]
    pub(crate) async fn put_item(&self, item: Item) -> error::Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|error| error::Error::transport("PutItem", error))?;
        Ok(())
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_harness.get_item",
            skip(self, key),
            fields(table = %self.table_name),
            err
        )
    )]
    pub(crate) async fn get_item(&self, key: Item) -> error::Result<Option<Item>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key))
            .consistent_read(true)
            .send()
            .await
            .map_err(|error| error::Error::transport("GetItem", error))?;
        Ok(output.item)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_harness.delete_item",
            skip(self, key),
            fields(table = %self.table_name),
            err
        )
    )]
    pub(crate) async fn delete_item(&self, key: Item) -> error::Result<bool> {
        let output = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key))
            .return_values(types::ReturnValue::AllOld)
            .send()
            .await
            .map_err(|error| error::Error::transport("DeleteItem", error))?;
        Ok(output
            .attributes
            .is_some_and(|attributes| !attributes.is_empty()))
    }

    pub(crate) fn scan_items<T>(
        &self,
        filter: Option<expression::Filter<T>>,
    ) -> BoxStream<'static, error::Result<Item>>
    where
        T: Serialize + Send + 'static,
    {
        let client = self.client.clone();
        let table_name = self.table_name.clone();
        let stream = try_stream! {
            let filter = filter
                .map(expression::ExpressionInput::try_from)
                .transpose()
                .map_err(error::Error::from)?;
            let builder = client.scan().table_name(table_name).consistent_read(true);
            let builder = match filter {
                Some(input) if !input.is_empty() => {
                    let values = Some(input.expression_attribute_values)
                        .filter(|values| !values.is_empty());
                    builder
                        .filter_expression(input.expression)
                        .set_expression_attribute_names(Some(input.expression_attribute_names))
                        .set_expression_attribute_values(values)
                }
                _ => builder,
            };
            let mut pages = builder.into_paginator().send();
            while let Some(page) = pages.next().await {
                let page = page.map_err(|error| error::Error::transport("Scan", error))?;
                #[cfg(feature = "tracing")]
                tracing::debug!(count = page.count, "scanned page");
                for item in page.items.unwrap_or_default() {
                    yield item;
                }
            }
        };
        stream.boxed()
    }
}

pub(crate) fn empty_key_error() -> error::Error {
    error::Error::Conversion("partition key must not be empty".to_string())
}
