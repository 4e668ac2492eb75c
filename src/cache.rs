use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::{debug, info};

use crate::domain::{Organism, Query};
use crate::record::GeneRecord;

#[derive(Debug, Default)]
struct TierStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TierStats {
    fn record<T>(&self, found: &Option<T>) {
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub id_lists: usize,
    pub records: usize,
    pub mappings: usize,
    pub id_hits: u64,
    pub id_misses: u64,
    pub record_hits: u64,
    pub record_misses: u64,
}

#[derive(Default)]
pub struct CacheLayer {
    ids: DashMap<String, Vec<String>>,
    records: DashMap<String, GeneRecord>,
    mappings: DashMap<String, Vec<String>>,
    id_stats: TierStats,
    record_stats: TierStats,
}

impl CacheLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_key(query: &Query, organism: &Organism) -> String {
        if organism.is_all() || query.is_advanced() {
            query.normalized()
        } else {
            format!("{}-{}", query.normalized(), organism.normalized())
        }
    }

    pub fn ids(&self, key: &str) -> Option<Vec<String>> {
        debug!(key, "checking id cache");
        let found = self.ids.get(key).map(|entry| entry.value().clone());
        self.id_stats.record(&found);
        if let Some(ids) = &found {
            debug!(key, size = ids.len(), "id cache hit");
        }
        found
    }

    pub fn put_ids(&self, key: &str, ids: Vec<String>) {
        debug!(key, size = ids.len(), "storing ids");
        self.ids.insert(key.to_string(), ids);
    }

    // Folds in mapping codes the record does not carry yet and writes it back.
    pub fn record(&self, id: &str) -> Option<GeneRecord> {
        debug!(id, "checking record cache");
        let found = self.records.get(id).map(|entry| entry.value().clone());
        self.record_stats.record(&found);
        let mut record = found?;

        if let Some(codes) = self.mapping(id) {
            if record.merge_mapping(codes.iter().map(String::as_str)) {
                debug!(id, mapping = ?record.mapping, "folded mapping into record");
                self.put_record(record.clone());
            }
        }
        Some(record)
    }

    pub fn contains_record(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn put_record(&self, record: GeneRecord) {
        debug!(id = %record.id, "storing record");
        self.records.insert(record.id.clone(), record);
    }

    pub fn mapping(&self, id: &str) -> Option<Vec<String>> {
        self.mappings.get(id).map(|entry| entry.value().clone())
    }

    pub fn put_mapping(&self, id: &str, code: &str) {
        let mut entry = self.mappings.entry(id.to_string()).or_default();
        if !entry.iter().any(|existing| existing == code) {
            entry.push(code.to_string());
        }
    }

    pub fn clear(&self) {
        info!("resetting all caches");
        self.ids.clear();
        self.records.clear();
        self.mappings.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let (id_hits, id_misses) = self.id_stats.snapshot();
        let (record_hits, record_misses) = self.record_stats.snapshot();
        CacheStats {
            id_lists: self.ids.len(),
            records: self.records.len(),
            mappings: self.mappings.len(),
            id_hits,
            id_misses,
            record_hits,
            record_misses,
        }
    }
}

impl std::fmt::Debug for CacheLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLayer")
            .field("stats", &self.stats())
            .finish()
    }
}
