//! Single-flight cache shared by concurrent file tasks.
//!
//! Each key owns a [`OnceCell`]; the first caller for a key runs the
//! computation and every concurrent caller for the same key awaits that same
//! computation instead of starting its own. The outer lock is only held to
//! find or insert the cell, never across an `.await`.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

/// Process-lifetime cache computing each key at most once.
pub struct SingleFlight<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }

    fn cell(&self, key: &K) -> Arc<OnceCell<V>> {
        let mut cells = self.cells.lock();
        match cells.get(key) {
            Some(cell) => Arc::clone(cell),
            None => {
                let cell = Arc::new(OnceCell::new());
                cells.insert(key.clone(), Arc::clone(&cell));
                cell
            }
        }
    }

    /// Return the cached value for `key`, computing it with `init` if no
    /// value exists yet. Concurrent callers observe the same value.
    pub async fn get_or_init<F, Fut>(&self, key: &K, init: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = self.cell(key);
        cell.get_or_init(init).await.clone()
    }

    /// Store a value for `key` unless one is already present or in flight.
    pub fn seed(&self, key: K, value: V) {
        let mut cells = self.cells.lock();
        cells
            .entry(key)
            .or_insert_with(|| Arc::new(OnceCell::new_with(Some(value))));
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
