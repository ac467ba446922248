pub mod json_backend;
pub mod memory;

use serde_json::Value;

use crate::errors::StoreError;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Opaque persistence medium holding whole JSON blobs under string keys.
///
/// Writes replace the previous blob entirely; there are no partial updates.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: &Value) -> Result<()>;
}

pub use json_backend::JsonFileStore;
pub use memory::MemoryStore;
