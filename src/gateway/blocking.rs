use crate::{error, expression, gateway, record};

use futures::StreamExt;
use std::{fmt, iter};
use tokio::runtime;

/// Synchronous gateway for callers without an async runtime.
///
/// Owns a current-thread runtime and blocks on every call, so it must not be used from
/// inside an async context.
///
/// ```rust,no_run
/// use dynamodb_harness::{client::{ClientFactory, Flavor}, record::Record};
///
/// # fn example(factory: ClientFactory) -> dynamodb_harness::error::Result<()> {
/// let gateway = factory.blocking(Flavor::Attribute, "Customer")?;
/// gateway.put(&Record::key_only("id146"))?;
/// let ids: Vec<String> = gateway
///     .scan()
///     .map(|record| record.map(|record| record.id))
///     .collect::<Result<_, _>>()?;
/// # Ok(())
/// # }
/// ```
pub struct BlockingGateway {
    inner: Box<dyn gateway::RecordGateway>,
    runtime: runtime::Runtime,
}

impl fmt::Debug for BlockingGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingGateway")
            .field("table_name", &self.inner.table_name())
            .finish_non_exhaustive()
    }
}

impl BlockingGateway {
    /// Wrap `inner` with a dedicated runtime.
    pub fn new(inner: Box<dyn gateway::RecordGateway>) -> error::Result<Self> {
        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { inner, runtime })
    }

    /// The table this gateway reads and writes.
    pub fn table_name(&self) -> &str {
        self.inner.table_name()
    }

    /// Insert or replace the record with the same `id`.
    pub fn put(&self, record: &record::Record) -> error::Result<()> {
        self.runtime.block_on(self.inner.put(record))
    }

    /// The stored record, or `None` when no record has this `id`.
    pub fn get(&self, id: &str) -> error::Result<Option<record::Record>> {
        self.runtime.block_on(self.inner.get(id))
    }

    /// Every stored record; pages are fetched as the iterator advances.
    pub fn scan(&self) -> impl Iterator<Item = error::Result<record::Record>> + '_ {
        let mut records = self.inner.scan();
        iter::from_fn(move || self.runtime.block_on(records.next()))
    }

    /// The stored records matching `filter`.
    pub fn scan_matching(
        &self,
        filter: expression::Filter,
    ) -> impl Iterator<Item = error::Result<record::Record>> + '_ {
        let mut records = self.inner.scan_matching(filter);
        iter::from_fn(move || self.runtime.block_on(records.next()))
    }

    /// Remove the record, returning whether one existed.
    pub fn delete(&self, id: &str) -> error::Result<bool> {
        self.runtime.block_on(self.inner.delete(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use futures::stream::{self, BoxStream};
    use std::{collections, sync};

    #[derive(Default)]
    struct InMemory {
        records: sync::Mutex<collections::BTreeMap<String, record::Record>>,
    }

    #[async_trait]
    impl gateway::RecordGateway for InMemory {
        fn table_name(&self) -> &str {
            "Customer"
        }

        async fn put(&self, record: &record::Record) -> error::Result<()> {
            let mut records = self.records.lock().unwrap();
            records.insert(record.id.clone(), record.clone());
            Ok(())
        }

        async fn get(&self, id: &str) -> error::Result<Option<record::Record>> {
            Ok(self.records.lock().unwrap().get(id).cloned())
        }

        fn scan(&self) -> BoxStream<'_, error::Result<record::Record>> {
            let records: Vec<_> = self.records.lock().unwrap().values().cloned().collect();
            stream::iter(records.into_iter().map(Ok)).boxed()
        }

        fn scan_matching(
            &self,
            _filter: expression::Filter,
        ) -> BoxStream<'_, error::Result<record::Record>> {
            stream::iter(vec![Err(error::Error::Conversion("a".to_string()))]).boxed()
        }

        async fn delete(&self, id: &str) -> error::Result<bool> {
            Ok(self.records.lock().unwrap().remove(id).is_some())
        }
    }

    fn gateway() -> BlockingGateway {
        BlockingGateway::new(Box::new(InMemory::default())).unwrap()
    }

    #[test]
    fn test_put_get_delete() {
        let gateway = gateway();
        assert_eq!(gateway.table_name(), "Customer");
        assert_eq!(gateway.get("id146").unwrap(), None);
        gateway.put(&record::Record::key_only("id146")).unwrap();
        gateway.put(&record::Record::key_only("id146")).unwrap();
        assert_eq!(
            gateway.get("id146").unwrap(),
            Some(record::Record::key_only("id146"))
        );
        assert!(gateway.delete("id146").unwrap());
        assert!(!gateway.delete("id146").unwrap());
        assert_eq!(gateway.get("id146").unwrap(), None);
    }

    #[test]
    fn test_scan_is_lazy_and_restartable() {
        let gateway = gateway();
        for id in ["a", "b", "c"] {
            gateway.put(&record::Record::key_only(id)).unwrap();
        }
        let first = gateway.scan().next().unwrap().unwrap();
        assert_eq!(first.id, "a");
        let ids: Vec<String> = gateway
            .scan()
            .map(|record| record.unwrap().id)
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_scan_matching_propagates_errors() {
        let actual: Vec<_> = gateway()
            .scan_matching(expression::Filter::equals("email", "a".to_string()))
            .collect();
        assert!(matches!(actual.as_slice(), [Err(error::Error::Conversion(_))]));
    }
}
