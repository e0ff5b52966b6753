//! Size-bounded transcription cache keyed by audio content hash.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

struct Entry {
    inserted: u64,
    result: Value,
}

struct Inner {
    entries: HashMap<String, Entry>,
    next_seq: u64,
}

/// Transcription results keyed by the MD5 of the audio bytes.
///
/// Once the cache holds more than `max_size` entries, the next insert first
/// drops the oldest `max_size / 5` of them.
pub struct TranscriptionCache {
    max_size: usize,
    inner: Mutex<Inner>,
}

impl TranscriptionCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                next_seq: 0,
            }),
        }
    }

    /// Cache key for a piece of audio.
    pub fn key_for(audio: &[u8]) -> String {
        format!("{:x}", md5::compute(audio))
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let inner = self.inner.lock().ok()?;
        inner.entries.get(key).map(|entry| entry.result.clone())
    }

    pub fn insert(&self, key: String, result: Value) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };

        if inner.entries.len() > self.max_size {
            let mut by_age: Vec<(u64, String)> = inner
                .entries
                .iter()
                .map(|(key, entry)| (entry.inserted, key.clone()))
                .collect();
            by_age.sort_unstable();

            let evict = (self.max_size / 5).max(1);
            for (_, key) in by_age.into_iter().take(evict) {
                inner.entries.remove(&key);
            }
            debug!(evicted = evict, "Transcription cache trimmed");
        }

        let inserted = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(key, Entry { inserted, result });
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.entries.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for TranscriptionCache {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_is_content_hash() {
        assert_eq!(TranscriptionCache::key_for(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(TranscriptionCache::key_for(b"abc"), TranscriptionCache::key_for(b"abc"));
        assert_ne!(TranscriptionCache::key_for(b"abc"), TranscriptionCache::key_for(b"abd"));
    }

    #[test]
    fn test_get_after_insert() {
        let cache = TranscriptionCache::new(5);
        cache.insert("k".to_string(), json!({"text": "oi"}));
        assert_eq!(cache.get("k"), Some(json!({"text": "oi"})));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_oldest_fifth_is_evicted_past_max() {
        let cache = TranscriptionCache::new(10);
        // Eviction only triggers once the cache holds more than max_size.
        for i in 0..11 {
            cache.insert(format!("k{i}"), json!(i));
        }
        assert_eq!(cache.len(), 11);

        cache.insert("k11".to_string(), json!(11));
        assert_eq!(cache.len(), 10);
        assert!(cache.get("k0").is_none());
        assert!(cache.get("k1").is_none());
        assert!(cache.get("k2").is_some());
        assert!(cache.get("k11").is_some());
    }

    #[test]
    fn test_small_cache_stays_bounded() {
        let cache = TranscriptionCache::new(3);
        for i in 0..100 {
            cache.insert(format!("k{i}"), json!(i));
        }
        assert!(cache.len() <= 4);
        assert!(cache.get("k99").is_some());
        assert!(cache.get("k0").is_none());
    }
}
