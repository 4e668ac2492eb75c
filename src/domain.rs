use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::BiogeneError;

pub const ALL_ORGANISMS: &str = "all organisms";

static BOOLEAN_OPERATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i) (and|or|not) ").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    text: String,
    advanced: bool,
    multi_term: bool,
}

impl Query {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_advanced(&self) -> bool {
        self.advanced
    }

    pub fn is_multi_term(&self) -> bool {
        self.multi_term
    }

    pub fn normalized(&self) -> String {
        self.text.to_lowercase()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.text.split_whitespace()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl FromStr for Query {
    type Err = BiogeneError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let text = value.trim().to_string();
        if text.is_empty() {
            return Err(BiogeneError::InvalidQuery(value.to_string()));
        }
        let advanced = is_advanced_query(&text);
        let multi_term = text.chars().any(char::is_whitespace);
        Ok(Self {
            text,
            advanced,
            multi_term,
        })
    }
}

pub fn is_advanced_query(query: &str) -> bool {
    query.contains('[')
        || query.contains(']')
        || query.contains('*')
        || BOOLEAN_OPERATOR.is_match(query)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Organism {
    All,
    Named(String),
}

impl Organism {
    pub fn is_all(&self) -> bool {
        matches!(self, Organism::All)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Organism::All => ALL_ORGANISMS,
            Organism::Named(name) => name,
        }
    }

    pub fn normalized(&self) -> String {
        self.as_str().to_lowercase()
    }
}

impl fmt::Display for Organism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Organism {
    type Err = BiogeneError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let name = value.trim();
        if name.is_empty() {
            return Err(BiogeneError::InvalidOrganism(value.to_string()));
        }
        if name.eq_ignore_ascii_case(ALL_ORGANISMS) {
            return Ok(Organism::All);
        }
        Ok(Organism::Named(name.to_string()))
    }
}

impl From<Organism> for String {
    fn from(value: Organism) -> Self {
        value.as_str().to_string()
    }
}

impl TryFrom<String> for Organism {
    type Error = BiogeneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

pub fn parse_organism_list(value: &str) -> Result<Vec<Organism>, BiogeneError> {
    value
        .split(':')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_operators_need_surrounding_spaces() {
        assert!(is_advanced_query("brca1 and tp53"));
        assert!(is_advanced_query("brca1 Not tp53"));
        assert!(!is_advanced_query("android"));
        assert!(!is_advanced_query("cannot bind"));
    }

    #[test]
    fn sentinel_is_case_insensitive() {
        let organism: Organism = "All Organisms".parse().unwrap();
        assert!(organism.is_all());
    }
}
