// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Memory pooling for per-frame maps
//!
//! Snapshots are rebuilt every frame. Instead of allocating a fresh map each
//! time, the bridge borrows one from a [`HashMapPool`]; the guard empties the
//! map and hands it back when dropped, so a snapshot can never outlive the
//! frame that consumed it with stale contents.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Configuration for buffer pool behavior
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Initial capacity for each buffer in the pool
    pub initial_capacity: usize,
    /// Maximum number of idle buffers to keep
    pub max_pool_size: usize,
    /// Whether to log when the pool has to allocate
    pub log_resize_events: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            initial_capacity: 64,
            max_pool_size: 8,
            log_resize_events: false,
        }
    }
}

impl PoolConfig {
    /// Create a new pool configuration with custom settings
    pub fn new(initial_capacity: usize, max_pool_size: usize) -> Self {
        PoolConfig {
            initial_capacity,
            max_pool_size,
            log_resize_events: false,
        }
    }

    /// Enable logging for allocation events
    pub fn with_logging(mut self) -> Self {
        self.log_resize_events = true;
        self
    }
}

/// Statistics for monitoring pool performance
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of times a buffer was reused from the pool
    pub hits: usize,
    /// Number of times a new buffer had to be allocated
    pub misses: usize,
    /// Current number of idle buffers in the pool
    pub pool_size: usize,
    /// Peak number of idle buffers
    pub peak_size: usize,
}

impl PoolStats {
    /// Calculate the hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

struct PoolInner<K, V> {
    idle: Vec<HashMap<K, V>>,
    stats: PoolStats,
}

/// A thread-safe pool of HashMap buffers
pub struct HashMapPool<K, V> {
    inner: Arc<Mutex<PoolInner<K, V>>>,
    config: PoolConfig,
}

impl<K: Eq + Hash, V> HashMapPool<K, V> {
    /// Create a new HashMap pool with default configuration
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create a new HashMap pool with custom configuration
    pub fn with_config(config: PoolConfig) -> Self {
        HashMapPool {
            inner: Arc::new(Mutex::new(PoolInner {
                idle: Vec::new(),
                stats: PoolStats::default(),
            })),
            config,
        }
    }

    /// Acquire an empty buffer
    ///
    /// Reuses an idle buffer when one exists, otherwise allocates. The buffer
    /// is cleared and returned to the pool when the guard is dropped.
    pub fn acquire(&self) -> HashMapGuard<K, V> {
        let mut inner = self.inner.lock();
        let buffer = match inner.idle.pop() {
            Some(buffer) => {
                inner.stats.hits += 1;
                buffer
            }
            None => {
                inner.stats.misses += 1;
                if self.config.log_resize_events {
                    log::debug!(
                        "HashMapPool: allocating new buffer (hit rate: {:.1}%)",
                        inner.stats.hit_rate()
                    );
                }
                HashMap::with_capacity(self.config.initial_capacity)
            }
        };
        inner.stats.pool_size = inner.idle.len();
        debug_assert!(buffer.is_empty());

        HashMapGuard {
            buffer,
            inner: Arc::clone(&self.inner),
            max_pool_size: self.config.max_pool_size,
        }
    }

    /// Get current pool statistics
    pub fn stats(&self) -> PoolStats {
        self.inner.lock().stats.clone()
    }

    /// Drop every idle buffer
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.idle.clear();
        inner.stats.pool_size = 0;
    }

    /// Get the current number of idle buffers
    pub fn len(&self) -> usize {
        self.inner.lock().idle.len()
    }

    /// Check if no buffer is idle
    pub fn is_empty(&self) -> bool {
        self.inner.lock().idle.is_empty()
    }
}

impl<K: Eq + Hash, V> Default for HashMapPool<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for HashMapPool<K, V> {
    fn clone(&self) -> Self {
        HashMapPool {
            inner: Arc::clone(&self.inner),
            config: self.config.clone(),
        }
    }
}

/// RAII guard for a pooled HashMap
///
/// When dropped, the map is cleared and returned to the pool.
pub struct HashMapGuard<K, V> {
    buffer: HashMap<K, V>,
    inner: Arc<Mutex<PoolInner<K, V>>>,
    max_pool_size: usize,
}

impl<K, V> std::ops::Deref for HashMapGuard<K, V> {
    type Target = HashMap<K, V>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl<K, V> std::ops::DerefMut for HashMapGuard<K, V> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl<K, V> std::fmt::Debug for HashMapGuard<K, V>
where
    K: std::fmt::Debug,
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.buffer.iter()).finish()
    }
}

impl<K, V> Drop for HashMapGuard<K, V> {
    fn drop(&mut self) {
        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.clear();

        let mut inner = self.inner.lock();
        if inner.idle.len() < self.max_pool_size {
            inner.idle.push(buffer);
            inner.stats.pool_size = inner.idle.len();
            if inner.stats.pool_size > inner.stats.peak_size {
                inner.stats.peak_size = inner.stats.pool_size;
            }
        }
        // If pool is full, buffer is dropped (deallocated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::EntityId;

    #[test]
    fn test_pool_config_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.initial_capacity, 64);
        assert_eq!(config.max_pool_size, 8);
        assert!(!config.log_resize_events);
    }

    #[test]
    fn test_acquire_and_return() {
        let pool: HashMapPool<EntityId, i32> = HashMapPool::new();

        {
            let mut guard = pool.acquire();
            guard.insert(EntityId::new(1), 42);
            assert_eq!(guard.len(), 1);
        }

        assert_eq!(pool.len(), 1);
        let stats = pool.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_returned_buffer_is_empty() {
        let pool: HashMapPool<EntityId, i32> = HashMapPool::new();

        {
            let mut guard = pool.acquire();
            guard.insert(EntityId::new(1), 42);
        }

        let guard = pool.acquire();
        assert!(guard.is_empty());

        let stats = pool.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.hit_rate(), 50.0);
    }

    #[test]
    fn test_max_pool_size() {
        let pool: HashMapPool<usize, i32> = HashMapPool::with_config(PoolConfig::new(32, 2));

        {
            let _g1 = pool.acquire();
            let _g2 = pool.acquire();
            let _g3 = pool.acquire();
        }

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.stats().peak_size, 2);
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let pool: HashMapPool<usize, i32> = HashMapPool::new();
        let pool_clone = pool.clone();

        let handle = thread::spawn(move || {
            let mut guard = pool_clone.acquire();
            guard.insert(1, 100);
        });

        let mut guard = pool.acquire();
        guard.insert(2, 200);
        drop(guard);

        handle.join().unwrap();
        assert_eq!(pool.stats().hits + pool.stats().misses, 2);
    }

    #[test]
    fn test_clear() {
        let pool: HashMapPool<usize, i32> = HashMapPool::new();
        {
            let _g1 = pool.acquire();
            let _g2 = pool.acquire();
        }
        assert_eq!(pool.len(), 2);

        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.stats().pool_size, 0);
    }
}
