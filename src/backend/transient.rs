use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::storage::Clock;

/// Expiring server-side key-value store.
pub trait TransientStore {
    /// `None` when the key was never set or its entry has expired.
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value, ttl: Duration);
}

struct Entry {
    value: Value,
    expires_at: DateTime<Utc>,
}

pub struct MemoryTransientStore {
    entries: RefCell<HashMap<String, Entry>>,
    clock: Rc<dyn Clock>,
}

impl MemoryTransientStore {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            clock,
        }
    }
}

impl TransientStore for MemoryTransientStore {
    fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        let mut entries = self.entries.borrow_mut();
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), Entry { value, expires_at });
    }
}
