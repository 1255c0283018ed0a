//! Local object stores
//!
//! Stores keep records keyed by their id field. Records saved without an id get
//! one from the store's [`IdGenerator`].

pub mod memory;

pub use memory::MemoryStorage;

use crate::error::{PipeError, Result};
use std::fmt;
use std::str::FromStr;

/// Kind of local store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum StoreType {
    #[default]
    Memory,
    Other(String),
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreType::Memory => write!(f, "MEMORY"),
            StoreType::Other(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for StoreType {
    type Err = PipeError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PipeError::Validation("Store type cannot be empty".to_string()));
        }
        if trimmed.eq_ignore_ascii_case("memory") {
            Ok(StoreType::Memory)
        } else {
            Ok(StoreType::Other(trimmed.to_string()))
        }
    }
}

/// Source of identifiers for records saved without one
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultIdGenerator;

impl IdGenerator for DefaultIdGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Synchronous local storage for records of type `T`
pub trait Store<T>: Send + Sync {
    fn store_type(&self) -> StoreType;

    fn read_all(&self) -> Vec<T>;

    fn read(&self, id: &str) -> Option<T>;

    /// Insert or replace, returning the record as stored (with its id)
    fn save(&self, item: T) -> Result<T>;

    fn remove(&self, id: &str) -> Option<T>;

    fn reset(&self);

    fn is_empty(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_id_generator_is_unique() {
        let generator = DefaultIdGenerator;
        let first = generator.generate();
        let second = generator.generate();
        assert_ne!(first, second);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn test_store_type_parsing() {
        assert_eq!("memory".parse::<StoreType>().unwrap(), StoreType::Memory);
        assert_eq!(
            "sqlite".parse::<StoreType>().unwrap(),
            StoreType::Other("sqlite".to_string())
        );
    }
}
