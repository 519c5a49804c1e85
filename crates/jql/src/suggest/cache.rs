//! Per-session cache of lookup responses.
//!
//! Entries are keyed by the full request and never invalidated; a session
//! that needs fresh values starts over with a new cache.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::lookup::LookupRequest;
use super::Suggestion;

#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<LookupRequest, Vec<Suggestion>>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<LookupRequest, Vec<Suggestion>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, request: &LookupRequest) -> Option<Vec<Suggestion>> {
        self.entries().get(request).cloned()
    }

    pub fn insert(&self, request: LookupRequest, results: Vec<Suggestion>) {
        self.entries().insert(request, results);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(value: &str) -> LookupRequest {
        LookupRequest::Field {
            field_name: "status".to_string(),
            field_value: Some(value.to_string()),
        }
    }

    #[test]
    fn test_cache_keys_on_whole_request() {
        let cache = ResponseCache::new();
        assert!(cache.is_empty());

        cache.insert(request("Op"), vec![Suggestion::new("Open", "Open")]);
        assert_eq!(cache.get(&request("Op")).map(|r| r.len()), Some(1));
        assert!(cache.get(&request("O")).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_empty_results_are_cached() {
        let cache = ResponseCache::new();
        cache.insert(request("zz"), Vec::new());
        assert_eq!(cache.get(&request("zz")), Some(Vec::new()));
    }
}
