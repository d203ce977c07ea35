use crate::{error, expression, gateway, record};

use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, types};
use futures::{StreamExt, stream::BoxStream};
use serde::{Serialize, de::DeserializeOwned};
use std::{collections, marker};

/// A type stored in a table keyed by a single string partition key.
pub trait Keyed {
    /// Attribute name of the partition key.
    const PARTITION_KEY: &'static str;

    /// The partition key value of this instance.
    fn partition_key(&self) -> &str;
}

impl Keyed for record::Record {
    const PARTITION_KEY: &'static str = record::ID;

    fn partition_key(&self) -> &str {
        &self.id
    }
}

fn key<T: Keyed>(partition_key: &str) -> gateway::Item {
    collections::HashMap::from([(
        T::PARTITION_KEY.to_string(),
        types::AttributeValue::S(partition_key.to_string()),
    )])
}

/// Table of serde-mapped values.
///
/// Attribute names come from the type's serde representation, so a [`record::Record`]
/// written here is readable by [`gateway::attribute::AttributeGateway`] and vice versa.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_harness::{gateway::mapped::MappedTable, record::Record};
///
/// # async fn example(client: Client) -> dynamodb_harness::error::Result<()> {
/// let table = MappedTable::<Record>::new(client, "Customer");
/// table.put_item(&Record::key_only("id146")).await?;
/// let record = table.get_item("id146").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MappedTable<T> {
    table: gateway::ItemTable,
    _marker: marker::PhantomData<fn() -> T>,
}

impl<T> Clone for MappedTable<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            _marker: marker::PhantomData,
        }
    }
}

impl<T> MappedTable<T>
where
    T: Keyed + Serialize + DeserializeOwned + Send + 'static,
{
    /// Bind a table of `T` to `table_name`.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            table: gateway::ItemTable::new(client, table_name),
            _marker: marker::PhantomData,
        }
    }

    /// The table this mapping reads and writes.
    pub fn table_name(&self) -> &str {
        self.table.table_name()
    }

    /// Insert or replace `value`.
    pub async fn put_item(&self, value: &T) -> error::Result<()> {
        if value.partition_key().is_empty() {
            return Err(gateway::empty_key_error());
        }
        self.table.put_item(serde_dynamo::to_item(value)?).await
    }

    /// The stored value with this key, if any.
    pub async fn get_item(&self, partition_key: &str) -> error::Result<Option<T>> {
        if partition_key.is_empty() {
            return Ok(None);
        }
        let item = self.table.get_item(key::<T>(partition_key)).await?;
        Ok(item.map(serde_dynamo::from_item).transpose()?)
    }

    /// Every stored value.
    pub fn scan_items(&self) -> BoxStream<'static, error::Result<T>> {
        self.table
            .scan_items::<String>(None)
            .map(|item| Ok(serde_dynamo::from_item(item?)?))
            .boxed()
    }

    /// The stored values matching `filter`.
    pub fn scan_items_matching<V>(
        &self,
        filter: expression::Filter<V>,
    ) -> BoxStream<'static, error::Result<T>>
    where
        V: Serialize + Send + 'static,
    {
        self.table
            .scan_items(Some(filter))
            .map(|item| Ok(serde_dynamo::from_item(item?)?))
            .boxed()
    }

    /// Remove the value with this key, returning whether one existed.
    pub async fn delete_item(&self, partition_key: &str) -> error::Result<bool> {
        if partition_key.is_empty() {
            return Ok(false);
        }
        self.table.delete_item(key::<T>(partition_key)).await
    }
}

#[async_trait]
impl gateway::RecordGateway for MappedTable<record::Record> {
    fn table_name(&self) -> &str {
        self.table.table_name()
    }

    async fn put(&self, record: &record::Record) -> error::Result<()> {
        self.put_item(record).await
    }

    async fn get(&self, id: &str) -> error::Result<Option<record::Record>> {
        self.get_item(id).await
    }

    fn scan(&self) -> BoxStream<'_, error::Result<record::Record>> {
        self.scan_items()
    }

    fn scan_matching(
        &self,
        filter: expression::Filter,
    ) -> BoxStream<'_, error::Result<record::Record>> {
        self.scan_items_matching(filter)
    }

    async fn delete(&self, id: &str) -> error::Result<bool> {
        self.delete_item(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Order {
        order_id: String,
        quantity: u32,
    }

    impl Keyed for Order {
        const PARTITION_KEY: &'static str = "orderId";

        fn partition_key(&self) -> &str {
            &self.order_id
        }
    }

    #[rstest]
    #[case::record(
        key::<record::Record>("id146"),
        record::key("id146")
    )]
    #[case::custom_type(
        key::<Order>("o1"),
        collections::HashMap::from(
            [(
                "orderId".to_string(),
                types::AttributeValue::S(
                    "o1".to_string()
                ),
            )]
        )
    )]
    fn test_key(#[case] actual: gateway::Item, #[case] expected: gateway::Item) {
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_custom_type_item_contains_its_key() {
        let order = Order {
            order_id: "o1".to_string(),
            quantity: 2,
        };
        let item: gateway::Item = serde_dynamo::to_item(&order).unwrap();
        assert_eq!(item.get(Order::PARTITION_KEY), key::<Order>("o1").get("orderId"));
        let actual: Order = serde_dynamo::from_item(item).unwrap();
        assert_eq!(actual, order);
    }
}
