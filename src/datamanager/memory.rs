//! In-memory [`Store`]

use crate::common::record_id;
use crate::datamanager::{IdGenerator, Store, StoreType};
use crate::error::{PipeError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

/// Records kept in a map ordered by id
pub struct MemoryStorage<T> {
    records: RwLock<BTreeMap<String, T>>,
    id_generator: Arc<dyn IdGenerator>,
    record_id: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> MemoryStorage<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(id_generator: Arc<dyn IdGenerator>) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            id_generator,
            record_id: "id".to_string(),
            _marker: PhantomData,
        }
    }

    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = record_id.into();
        self
    }

    /// Ensure the record carries an id, returning it with the record
    fn identify(&self, item: T) -> Result<(String, T)> {
        let mut value = serde_json::to_value(&item)?;
        if !value.is_object() {
            return Err(PipeError::Validation(
                "Only records serializing to JSON objects can be stored".to_string(),
            ));
        }

        match record_id(&value, &self.record_id) {
            Some(id) => Ok((id, item)),
            None => {
                let id = self.id_generator.generate();
                if let Some(object) = value.as_object_mut() {
                    object.insert(
                        self.record_id.clone(),
                        serde_json::Value::String(id.clone()),
                    );
                }
                Ok((id, serde_json::from_value(value)?))
            }
        }
    }
}

impl<T> Store<T> for MemoryStorage<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn store_type(&self) -> StoreType {
        StoreType::Memory
    }

    fn read_all(&self) -> Vec<T> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn read(&self, id: &str) -> Option<T> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn save(&self, item: T) -> Result<T> {
        let (id, item) = self.identify(item)?;
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, item.clone());
        Ok(item)
    }

    fn remove(&self, id: &str) -> Option<T> {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    fn reset(&self) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn is_empty(&self) -> bool {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}
