use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::debug;

use crate::config::EutilsConfig;
use crate::domain::Organism;
use crate::error::BiogeneError;
use crate::strategy::{GENE_DB, SearchTemplate};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub ids: Vec<String>,
    pub total: usize,
}

pub trait SearchClient: Send + Sync {
    fn search(
        &self,
        template: &SearchTemplate,
        organism: &Organism,
        page_start: usize,
        page_size: usize,
    ) -> Result<SearchPage, BiogeneError>;
}

pub trait FetchClient: Send + Sync {
    fn fetch_gene(&self, id: &str) -> Result<Option<String>, BiogeneError>;
}

impl<T: SearchClient + ?Sized> SearchClient for std::sync::Arc<T> {
    fn search(
        &self,
        template: &SearchTemplate,
        organism: &Organism,
        page_start: usize,
        page_size: usize,
    ) -> Result<SearchPage, BiogeneError> {
        (**self).search(template, organism, page_start, page_size)
    }
}

impl<T: FetchClient + ?Sized> FetchClient for std::sync::Arc<T> {
    fn fetch_gene(&self, id: &str) -> Result<Option<String>, BiogeneError> {
        (**self).fetch_gene(id)
    }
}

#[derive(Clone)]
pub struct EutilsHttpClient {
    client: Client,
    base_url: String,
    tool: String,
    email: Option<String>,
    api_key: Option<String>,
}

impl EutilsHttpClient {
    pub fn new(config: &EutilsConfig) -> Result<Self, BiogeneError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("biogene/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| BiogeneError::EutilsHttp(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| BiogeneError::EutilsHttp(err.to_string()))?;

        let api_key = std::env::var("NCBI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| config.api_key.clone())
            .map(|key| key.trim().to_string());

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tool: config.tool.clone(),
            email: config.email.clone(),
            api_key,
        })
    }

    pub fn fetch_abstract(&self, pubmed_id: &str) -> Result<String, BiogeneError> {
        let params = vec![
            ("db", "pubmed".to_string()),
            ("retmode", "xml".to_string()),
            ("id", pubmed_id.trim().to_string()),
        ];
        self.get_text("efetch.fcgi", params)
    }

    fn get_text(
        &self,
        endpoint: &str,
        mut params: Vec<(&'static str, String)>,
    ) -> Result<String, BiogeneError> {
        params.push(("tool", self.tool.clone()));
        if let Some(email) = &self.email {
            params.push(("email", email.clone()));
        }
        if let Some(api_key) = &self.api_key {
            params.push(("api_key", api_key.clone()));
        }

        let url = format!("{}/{endpoint}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .map_err(|err| BiogeneError::EutilsHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "Entrez request failed".to_string());
            return Err(BiogeneError::EutilsStatus { status, message });
        }
        let body = response
            .text()
            .map_err(|err| BiogeneError::EutilsHttp(err.to_string()))?;
        debug!(endpoint, bytes = body.len(), "entrez response");
        Ok(body)
    }
}

impl SearchClient for EutilsHttpClient {
    fn search(
        &self,
        template: &SearchTemplate,
        organism: &Organism,
        page_start: usize,
        page_size: usize,
    ) -> Result<SearchPage, BiogeneError> {
        let term = template.term_for(organism);
        debug!(mode = %template.mode, %term, page_start, "esearch");
        let params = vec![
            ("db", template.database.to_string()),
            ("term", term),
            ("retstart", page_start.to_string()),
            ("retmax", template.page_size(page_size).to_string()),
            ("retmode", "json".to_string()),
        ];
        let body = self.get_text("esearch.fcgi", params)?;
        parse_search_response(&body)
    }
}

impl FetchClient for EutilsHttpClient {
    fn fetch_gene(&self, id: &str) -> Result<Option<String>, BiogeneError> {
        let params = vec![
            ("db", GENE_DB.to_string()),
            ("retmode", "xml".to_string()),
            ("id", id.to_string()),
        ];
        let body = self.get_text("efetch.fcgi", params)?;
        Ok((!body.trim().is_empty()).then_some(body))
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    esearchresult: Option<SearchResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    count: Option<String>,
    #[serde(default)]
    idlist: Vec<String>,
    #[serde(rename = "ERROR")]
    error: Option<String>,
}

// A missing count means ESearch sent an error document.
pub fn parse_search_response(body: &str) -> Result<SearchPage, BiogeneError> {
    let envelope: SearchEnvelope =
        serde_json::from_str(body).map_err(|err| BiogeneError::Parse(err.to_string()))?;
    if let Some(error) = envelope.error {
        return Err(BiogeneError::Parse(error));
    }
    let result = envelope
        .esearchresult
        .ok_or_else(|| BiogeneError::Parse("esearchresult element not found".to_string()))?;
    if let Some(error) = result.error {
        return Err(BiogeneError::Parse(error));
    }
    let total = result
        .count
        .as_deref()
        .ok_or_else(|| BiogeneError::Parse("cannot parse count".to_string()))?
        .trim()
        .parse::<usize>()
        .map_err(|err| BiogeneError::Parse(format!("cannot parse count: {err}")))?;
    if total == 0 {
        return Ok(SearchPage::default());
    }
    let ids = result
        .idlist
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    Ok(SearchPage { ids, total })
}
