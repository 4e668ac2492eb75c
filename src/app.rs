use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheLayer, CacheStats};
use crate::domain::{Organism, Query};
use crate::error::BiogeneError;
use crate::eutils::{FetchClient, SearchClient};
use crate::parser::fetch_gene_record;
use crate::populate::{PopulateHandle, PopulateSettings, PopulateTask};
use crate::record::GeneRecord;
use crate::resolver::QueryResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnCode {
    Success,
    Failure,
    IdNotFound,
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnCode::Success => write!(f, "SUCCESS"),
            ReturnCode::Failure => write!(f, "FAILURE"),
            ReturnCode::IdNotFound => write!(f, "ID_NOT_FOUND"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneLookup {
    pub code: ReturnCode,
    pub count: usize,
    pub records: Vec<GeneRecord>,
}

impl GeneLookup {
    fn empty(code: ReturnCode) -> Self {
        Self {
            code,
            count: 0,
            records: Vec::new(),
        }
    }
}

pub struct GeneService<S: SearchClient, F: FetchClient> {
    resolver: QueryResolver<S>,
    fetch: F,
    cache: Arc<CacheLayer>,
}

impl<S: SearchClient, F: FetchClient> GeneService<S, F> {
    pub fn new(search: S, fetch: F, cache: Arc<CacheLayer>) -> Self {
        Self {
            resolver: QueryResolver::new(search, Arc::clone(&cache)),
            fetch,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<CacheLayer> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn resolve_and_fetch(
        &self,
        query: &Query,
        organism: &Organism,
        offset: usize,
        limit: usize,
    ) -> GeneLookup {
        debug!(%query, %organism, offset, limit, "lookup");
        let resolution = match self.resolver.resolve(query, organism) {
            Ok(resolution) => resolution,
            Err(err) => {
                warn!(%query, %organism, error = %err, "query resolution failed");
                return GeneLookup::empty(ReturnCode::Failure);
            }
        };
        if resolution.ids.is_empty() {
            return GeneLookup::empty(ReturnCode::IdNotFound);
        }

        let records = resolution
            .ids
            .iter()
            .skip(offset)
            .take(limit)
            .filter_map(|id| self.record(id, organism))
            .collect::<Vec<_>>();

        GeneLookup {
            code: if records.is_empty() {
                ReturnCode::Failure
            } else {
                ReturnCode::Success
            },
            count: resolution.ids.len(),
            records,
        }
    }

    fn record(&self, id: &str, organism: &Organism) -> Option<GeneRecord> {
        if let Some(record) = self.cache.record(id) {
            return Some(record);
        }
        let mut record = fetch_gene_record(&self.fetch, id)?;
        if let Some(codes) = self.cache.mapping(id) {
            record.merge_mapping(codes.iter().map(String::as_str));
        }
        if !organism.is_all() {
            self.cache.put_record(record.clone());
        }
        Some(record)
    }
}

impl<S, F> GeneService<S, F>
where
    S: SearchClient + Clone + 'static,
    F: FetchClient + Clone + 'static,
{
    pub fn populate(&self, settings: PopulateSettings) -> Result<PopulateHandle, BiogeneError> {
        PopulateTask::new(
            settings,
            self.resolver.search_client().clone(),
            self.fetch.clone(),
            Arc::clone(&self.cache),
        )
        .spawn()
    }

    pub fn populate_organisms(
        &self,
        organisms: &[Organism],
        template: &PopulateSettings,
    ) -> Result<Vec<PopulateHandle>, BiogeneError> {
        organisms
            .iter()
            .map(|organism| {
                self.populate(PopulateSettings {
                    organism: organism.clone(),
                    ..template.clone()
                })
            })
            .collect()
    }
}
