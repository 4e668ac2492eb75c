#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use biogene::domain::Organism;
use biogene::error::BiogeneError;
use biogene::eutils::{FetchClient, SearchClient, SearchPage};
use biogene::strategy::{SearchMode, SearchTemplate};

pub const BRCA1_XML: &str = include_str!("../fixtures/efetch_672.xml");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCall {
    pub mode: SearchMode,
    pub term: String,
    pub page_start: usize,
    pub page_size: usize,
}

#[derive(Clone)]
pub enum Reply {
    Ids(Vec<String>),
    Fail,
    // Serves `ids` until a page starts past `limit`, then fails like ESearch does.
    FailsPast { ids: Vec<String>, limit: usize },
}

impl Reply {
    pub fn ids(ids: &[&str]) -> Self {
        Reply::Ids(ids.iter().map(|id| id.to_string()).collect())
    }}

pub fn numbered_ids(count: usize) -> Vec<String> {
    (0..count).map(|n| n.to_string()).collect()
}

// Answers per search mode; modes without a reply get `otherwise`, or an empty page.
#[derive(Default)]
pub struct MockSearch {
    replies: HashMap<SearchMode, Reply>,
    otherwise: Option<Reply>,
    pub calls: Mutex<Vec<SearchCall>>,
}

impl MockSearch {
    pub fn with(mut self, mode: SearchMode, reply: Reply) -> Self {
        self.replies.insert(mode, reply);
        self
    }

    pub fn failing() -> Self {
        Self {
            otherwise: Some(Reply::Fail),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<SearchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn modes(&self) -> Vec<SearchMode> {
        self.calls().into_iter().map(|call| call.mode).collect()
    }
}

impl SearchClient for MockSearch {
    fn search(
        &self,
        template: &SearchTemplate,
        organism: &Organism,
        page_start: usize,
        page_size: usize,
    ) -> Result<SearchPage, BiogeneError> {
        self.calls.lock().unwrap().push(SearchCall {
            mode: template.mode,
            term: template.term_for(organism),
            page_start,
            page_size,
        });
        match self.replies.get(&template.mode).or(self.otherwise.as_ref()) {
            Some(Reply::Fail) => Err(BiogeneError::EutilsStatus {
                status: 503,
                message: "service unavailable".to_string(),
            }),
            Some(Reply::Ids(ids)) => Ok(page_of(ids, page_start, page_size)),
            Some(Reply::FailsPast { limit, .. }) if page_start > *limit => {
                Err(BiogeneError::Parse(format!(
                    "retstart cannot be larger than {limit}, got {page_start}"
                )))
            }
            Some(Reply::FailsPast { ids, .. }) => Ok(page_of(ids, page_start, page_size)),
            None => Ok(SearchPage::default()),
        }
    }
}

fn page_of(ids: &[String], page_start: usize, page_size: usize) -> SearchPage {
    SearchPage {
        ids: ids.iter().skip(page_start).take(page_size).cloned().collect(),
        total: ids.len(),
    }
}

// `ALL_IDS` id space of `total` synthetic ids, optionally failing a number
// of requests first.
pub struct MockIdSpace {
    pub total: usize,
    pub failures_left: Mutex<usize>,
    pub calls: Mutex<Vec<(usize, usize)>>,
}

impl MockIdSpace {
    pub fn new(total: usize) -> Self {
        Self::failing(total, 0)
    }

    pub fn failing(total: usize, failures: usize) -> Self {
        Self {
            total,
            failures_left: Mutex::new(failures),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(usize, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

impl SearchClient for MockIdSpace {
    fn search(
        &self,
        template: &SearchTemplate,
        _organism: &Organism,
        page_start: usize,
        page_size: usize,
    ) -> Result<SearchPage, BiogeneError> {
        assert_eq!(template.mode, SearchMode::AllIds);
        self.calls.lock().unwrap().push((page_start, page_size));
        let mut failures = self.failures_left.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(BiogeneError::EutilsHttp("connection reset".to_string()));
        }
        let end = (page_start + page_size).min(self.total);
        Ok(SearchPage {
            ids: (page_start..end).map(|n| (100_000 + n).to_string()).collect(),
            total: self.total,
        })
    }
}

// Serves the BRCA1 fixture for every id except the ones marked broken.
#[derive(Default)]
pub struct MockFetch {
    broken: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl MockFetch {
    pub fn broken(ids: &[&str]) -> Self {
        Self {
            broken: ids.iter().map(|id| id.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl FetchClient for MockFetch {
    fn fetch_gene(&self, id: &str) -> Result<Option<String>, BiogeneError> {
        self.calls.lock().unwrap().push(id.to_string());
        if self.broken.contains(id) {
            return Ok(Some("<html>rate limited</html>".to_string()));
        }
        Ok(Some(BRCA1_XML.to_string()))
    }
}
