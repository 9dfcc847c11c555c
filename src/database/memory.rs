// src/database/memory.rs
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{PositionUpdate, RecordStore};
use crate::{
    errors::{StoreError, ValidationError},
    models::FlightInfo,
};

/// In-process record store
///
/// Every write takes the lock once, so readers see either the state before
/// or after a whole replace or commit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<FlightInfo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check_constraints(record: &FlightInfo) -> Result<(), StoreError> {
        let fields = record.validate();
        if fields.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Constraint(ValidationError {
                id: record.id.clone(),
                fields,
            }))
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn replace_all(&self, records: Vec<FlightInfo>) -> Result<usize, StoreError> {
        {
            let mut seen = HashSet::with_capacity(records.len());
            for record in &records {
                Self::check_constraints(record)?;
                if !seen.insert(record.id.as_str()) {
                    return Err(StoreError::Duplicate(record.id.clone()));
                }
            }
        }

        let count = records.len();
        *self.records.write().await = records;
        Ok(count)
    }

    async fn insert(&self, record: FlightInfo) -> Result<(), StoreError> {
        Self::check_constraints(&record)?;

        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::Duplicate(record.id));
        }
        records.push(record);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<FlightInfo>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn all_records(&self) -> Result<Vec<FlightInfo>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn commit_positions(&self, updates: Vec<PositionUpdate>) -> Result<usize, StoreError> {
        let mut records = self.records.write().await;
        let index: HashMap<String, usize> = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();

        let mut changed = HashSet::new();
        for update in updates {
            let Some(&i) = index.get(&update.id) else {
                continue;
            };
            let record = &mut records[i];
            if record.latitude != update.latitude || record.longitude != update.longitude {
                record.latitude = update.latitude;
                record.longitude = update.longitude;
                changed.insert(i);
            }
        }

        Ok(changed.len())
    }
}
