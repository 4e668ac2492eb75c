use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::CacheLayer;
use crate::domain::{Organism, Query};
use crate::error::BiogeneError;
use crate::eutils::SearchClient;
use crate::strategy::{self, SearchMode, SearchTemplate};

// ESearch rejects any retstart above this.
pub const ESEARCH_MAX_RETSTART: usize = 9998;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub ids: Vec<String>,
    pub mode: Option<SearchMode>,
    pub from_cache: bool,
}

pub struct QueryResolver<S: SearchClient> {
    search: S,
    cache: Arc<CacheLayer>,
}

impl<S: SearchClient> QueryResolver<S> {
    pub fn new(search: S, cache: Arc<CacheLayer>) -> Self {
        Self { search, cache }
    }

    pub fn search_client(&self) -> &S {
        &self.search
    }

    pub fn resolve(
        &self,
        query: &Query,
        organism: &Organism,
    ) -> Result<Resolution, BiogeneError> {
        let key = CacheLayer::id_key(query, organism);
        if let Some(ids) = self.cache.ids(&key) {
            return Ok(Resolution {
                ids,
                mode: None,
                from_cache: true,
            });
        }

        let mut last_error = None;
        for strategy in strategy::cascade(query) {
            let template = strategy.render(query);
            match self.collect_ids(&template, organism) {
                Ok(ids) if ids.is_empty() => {
                    debug!(mode = %strategy.mode, %query, "no ids found");
                    last_error = None;
                }
                Ok(ids) => {
                    info!(mode = %strategy.mode, %query, %organism, count = ids.len(), "resolved query");
                    if !organism.is_all() {
                        self.cache.put_ids(&key, ids.clone());
                    }
                    return Ok(Resolution {
                        ids,
                        mode: Some(strategy.mode),
                        from_cache: false,
                    });
                }
                Err(err) => {
                    debug!(mode = %strategy.mode, %query, error = %err, "search failed");
                    last_error = Some(err);
                }
            }
        }

        // The outcome of the last strategy tried decides between failure and no match.
        match last_error {
            Some(err) => Err(err),
            None => Ok(Resolution {
                ids: Vec::new(),
                mode: None,
                from_cache: false,
            }),
        }
    }

    fn collect_ids(
        &self,
        template: &SearchTemplate,
        organism: &Organism,
    ) -> Result<Vec<String>, BiogeneError> {
        let mut ids = Vec::new();
        while ids.len() <= ESEARCH_MAX_RETSTART {
            let page = match self
                .search
                .search(template, organism, ids.len(), template.page_ceiling)
            {
                Ok(page) => page,
                Err(err) if ids.is_empty() => return Err(err),
                Err(err) => {
                    warn!(mode = %template.mode, collected = ids.len(), error = %err, "search page failed, keeping collected ids");
                    break;
                }
            };
            if page.ids.is_empty() {
                break;
            }
            ids.extend(page.ids);
            if ids.len() >= page.total {
                break;
            }
        }
        Ok(ids)
    }
}
