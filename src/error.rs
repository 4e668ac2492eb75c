use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum BiogeneError {
    #[error("invalid query: {0:?}")]
    InvalidQuery(String),

    #[error("invalid organism: {0:?}")]
    InvalidOrganism(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("no gene matches {0:?}")]
    GeneNotFound(String),

    #[error("lookup for {0:?} produced no records")]
    LookupFailed(String),

    #[error("Entrez request failed: {0}")]
    EutilsHttp(String),

    #[error("Entrez returned status {status}: {message}")]
    EutilsStatus { status: u16, message: String },

    #[error("malformed Entrez payload: {0}")]
    Parse(String),

    #[error("search failed {attempts} times at offset {offset}, giving up")]
    RetriesExhausted { attempts: u32, offset: usize },

    #[error("malformed mapping line {line}: {content:?}")]
    MappingFormat { line: usize, content: String },

    #[error("populate task failed: {0}")]
    Task(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl BiogeneError {
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BiogeneError::EutilsHttp(_) | BiogeneError::EutilsStatus { .. }
        )
    }
}
