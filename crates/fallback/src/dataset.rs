use tokio::sync::RwLock;

use orderdesk_core::domain::record::Record;

use crate::FallbackError;

/// Process-lifetime records for one entity kind, in insertion order.
pub struct MockDataset<T: Record> {
    records: RwLock<Vec<T>>,
}

impl<T: Record> Default for MockDataset<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Record> MockDataset<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self { records: RwLock::new(records) }
    }

    pub async fn snapshot(&self) -> Vec<T> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn find(&self, id: i64) -> Option<T> {
        let records = self.records.read().await;
        records.iter().find(|record| record.id() == id).cloned()
    }

    pub async fn list_where<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool + Send,
    {
        let records = self.records.read().await;
        records.iter().filter(|record| predicate(record)).cloned().collect()
    }

    /// Stores `record` under `max(existing ids, 0) + 1`.
    pub async fn insert(&self, mut record: T) -> T {
        let mut records = self.records.write().await;
        let next_id = records.iter().map(Record::id).max().unwrap_or(0).max(0) + 1;
        record.set_id(next_id);
        records.push(record.clone());
        record
    }

    pub async fn update(&self, id: i64, mut record: T) -> Result<T, FallbackError> {
        let mut records = self.records.write().await;
        let slot = records
            .iter_mut()
            .find(|existing| existing.id() == id)
            .ok_or(FallbackError::NotFound { entity: T::KIND, id })?;
        record.set_id(id);
        *slot = record.clone();
        Ok(record)
    }

    pub async fn delete(&self, id: i64) -> Result<T, FallbackError> {
        let mut records = self.records.write().await;
        let position = records
            .iter()
            .position(|existing| existing.id() == id)
            .ok_or(FallbackError::NotFound { entity: T::KIND, id })?;
        Ok(records.remove(position))
    }
}
