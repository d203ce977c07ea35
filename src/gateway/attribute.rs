use crate::{error, expression, gateway, record};

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use futures::{StreamExt, stream::BoxStream};

/// Gateway over the low-level client, translating records with [`record::to_item`] and
/// [`record::from_item`].
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_harness::gateway::{RecordGateway, attribute::AttributeGateway};
/// use dynamodb_harness::record::Record;
///
/// # async fn example(client: Client) -> dynamodb_harness::error::Result<()> {
/// let gateway = AttributeGateway::new(client, "Customer");
/// gateway.put(&Record::key_only("id146")).await?;
/// assert!(gateway.get("id146").await?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct AttributeGateway {
    table: gateway::ItemTable,
}

impl AttributeGateway {
    /// Bind a gateway to `table_name`.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            table: gateway::ItemTable::new(client, table_name),
        }
    }
}

#[async_trait]
impl gateway::RecordGateway for AttributeGateway {
    fn table_name(&self) -> &str {
        self.table.table_name()
    }

    async fn put(&self, record: &record::Record) -> error::Result<()> {
        if record.id.is_empty() {
            return Err(gateway::empty_key_error());
        }
        self.table.put_item(record::to_item(record)).await
    }

    async fn get(&self, id: &str) -> error::Result<Option<record::Record>> {
        if id.is_empty() {
            return Ok(None);
        }
        self.table
            .get_item(record::key(id))
            .await?
            .map(record::from_item)
            .transpose()
    }

    fn scan(&self) -> BoxStream<'_, error::Result<record::Record>> {
        self.table
            .scan_items::<String>(None)
            .map(|item| item.and_then(record::from_item))
            .boxed()
    }

    fn scan_matching(
        &self,
        filter: expression::Filter,
    ) -> BoxStream<'_, error::Result<record::Record>> {
        self.table
            .scan_items(Some(filter))
            .map(|item| item.and_then(record::from_item))
            .boxed()
    }

    async fn delete(&self, id: &str) -> error::Result<bool> {
        if id.is_empty() {
            return Ok(false);
        }
        self.table.delete_item(record::key(id)).await
    }
}
