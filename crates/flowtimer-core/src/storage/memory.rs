//! In-process store for embedders that keep state in memory, and for tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::Store;
use crate::error::StorageError;

/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    values: RefCell<HashMap<String, String>>,
    version: Cell<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored value, bypassing the `Store` error type.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.values.borrow().get(key).cloned()
    }

    fn bump(&self) {
        self.inner.version.set(self.inner.version.get() + 1);
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner
            .values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.bump();
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.inner.values.borrow_mut().remove(key).is_some() {
            self.bump();
        }
        Ok(())
    }

    fn version(&self) -> Result<u64, StorageError> {
        Ok(self.inner.version.get())
    }
}
