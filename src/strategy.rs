use std::fmt;

use serde::Serialize;

use crate::domain::{Organism, Query};

pub const GENE_DB: &str = "gene";

const TERM: &str = "{term}";
const ORGANISM: &str = "{organism}";
const ORGANISM_CLAUSE: &str = " AND {organism}[orgn]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchMode {
    AllIds,
    Advanced,
    Pref,
    Symbol,
    FullName,
    SymbolWildcardRight,
    SymbolWildcard,
    FreeText,
    FreeTextWildcardRight,
    FreeTextWildcard,
    FreeTextOr,
}

impl SearchMode {
    pub fn label(self) -> &'static str {
        match self {
            SearchMode::AllIds => "ALL_IDS",
            SearchMode::Advanced => "ADVANCED",
            SearchMode::Pref => "PREF",
            SearchMode::Symbol => "SYMBOL",
            SearchMode::FullName => "FULL_NAME",
            SearchMode::SymbolWildcardRight => "SYMBOL_WILDCARD_RIGHT",
            SearchMode::SymbolWildcard => "SYMBOL_WILDCARD",
            SearchMode::FreeText => "FREE_TEXT",
            SearchMode::FreeTextWildcardRight => "FREE_TEXT_WILDCARD_RIGHT",
            SearchMode::FreeTextWildcard => "FREE_TEXT_WILDCARD",
            SearchMode::FreeTextOr => "FREE_TEXT_OR",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug)]
pub struct SearchStrategy {
    pub mode: SearchMode,
    pub template: &'static str,
    pub database: &'static str,
    pub page_ceiling: usize,
    applies: fn(&Query) -> bool,
}

impl SearchStrategy {
    pub fn applies_to(&self, query: &Query) -> bool {
        (self.applies)(query)
    }

    pub fn render(&self, query: &Query) -> SearchTemplate {
        let term = match self.mode {
            SearchMode::FreeTextOr => {
                let parts = query
                    .terms()
                    .map(|part| format!("{part}[All Fields]"))
                    .collect::<Vec<_>>();
                format!("({})", parts.join(" OR "))
            }
            _ => query.as_str().to_string(),
        };
        self.template_with(self.template.replace(TERM, &term))
    }

    pub fn unscoped(&self) -> SearchTemplate {
        self.template_with(self.template.to_string())
    }

    fn template_with(&self, pattern: String) -> SearchTemplate {
        SearchTemplate {
            mode: self.mode,
            database: self.database,
            page_ceiling: self.page_ceiling,
            pattern,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTemplate {
    pub mode: SearchMode,
    pub database: &'static str,
    pub page_ceiling: usize,
    pattern: String,
}

impl SearchTemplate {
    pub fn term_for(&self, organism: &Organism) -> String {
        match organism {
            Organism::All => self.pattern.replace(ORGANISM_CLAUSE, ""),
            Organism::Named(name) => self.pattern.replace(ORGANISM, name),
        }
    }

    pub fn page_size(&self, requested: usize) -> usize {
        requested.clamp(1, self.page_ceiling)
    }
}

fn bulk_only(_: &Query) -> bool {
    false
}

fn advanced(query: &Query) -> bool {
    query.is_advanced()
}

fn simple(query: &Query) -> bool {
    !query.is_advanced()
}

fn single_term(query: &Query) -> bool {
    !query.is_advanced() && !query.is_multi_term()
}

fn multi_term(query: &Query) -> bool {
    !query.is_advanced() && query.is_multi_term()
}

const CASCADE_CEILING: usize = 1000;

pub static STRATEGIES: [SearchStrategy; 11] = [
    SearchStrategy {
        mode: SearchMode::AllIds,
        template: "alive[prop] NOT newentry[title] AND {organism}[orgn]",
        database: GENE_DB,
        page_ceiling: 500,
        applies: bulk_only,
    },
    SearchStrategy {
        mode: SearchMode::Advanced,
        template: "alive[prop] NOT newentry[title] AND ({term})",
        database: GENE_DB,
        page_ceiling: CASCADE_CEILING,
        applies: advanced,
    },
    SearchStrategy {
        mode: SearchMode::Pref,
        template: "alive[prop] NOT newentry[title] AND {term}[pref] AND {organism}[orgn]",
        database: GENE_DB,
        page_ceiling: CASCADE_CEILING,
        applies: single_term,
    },
    SearchStrategy {
        mode: SearchMode::Symbol,
        template: "alive[prop] NOT newentry[title] AND ({term}*[pref] OR {term}[sym]) AND {organism}[orgn]",
        database: GENE_DB,
        page_ceiling: CASCADE_CEILING,
        applies: single_term,
    },
    SearchStrategy {
        mode: SearchMode::FullName,
        template: "alive[prop] NOT newentry[title] AND {term}[gene full name] AND {organism}[orgn]",
        database: GENE_DB,
        page_ceiling: CASCADE_CEILING,
        applies: multi_term,
    },
    SearchStrategy {
        mode: SearchMode::SymbolWildcardRight,
        template: "alive[prop] NOT newentry[title] AND {term}*[sym] AND {organism}[orgn]",
        database: GENE_DB,
        page_ceiling: CASCADE_CEILING,
        applies: single_term,
    },
    SearchStrategy {
        mode: SearchMode::SymbolWildcard,
        template: "alive[prop] NOT newentry[title] AND *{term}*[sym] AND {organism}[orgn]",
        database: GENE_DB,
        page_ceiling: CASCADE_CEILING,
        applies: single_term,
    },
    SearchStrategy {
        mode: SearchMode::FreeText,
        template: "alive[prop] NOT newentry[title] AND {term}[All Fields] AND {organism}[orgn]",
        database: GENE_DB,
        page_ceiling: CASCADE_CEILING,
        applies: simple,
    },
    SearchStrategy {
        mode: SearchMode::FreeTextWildcardRight,
        template: "alive[prop] NOT newentry[title] AND {term}*[All Fields] AND {organism}[orgn]",
        database: GENE_DB,
        page_ceiling: CASCADE_CEILING,
        applies: single_term,
    },
    SearchStrategy {
        mode: SearchMode::FreeTextWildcard,
        template: "alive[prop] NOT newentry[title] AND *{term}*[All Fields] AND {organism}[orgn]",
        database: GENE_DB,
        page_ceiling: CASCADE_CEILING,
        applies: single_term,
    },
    SearchStrategy {
        mode: SearchMode::FreeTextOr,
        template: "alive[prop] NOT newentry[title] AND {term} AND {organism}[orgn]",
        database: GENE_DB,
        page_ceiling: CASCADE_CEILING,
        applies: multi_term,
    },
];

pub fn strategy(mode: SearchMode) -> &'static SearchStrategy {
    STRATEGIES
        .iter()
        .find(|strategy| strategy.mode == mode)
        .unwrap_or(&STRATEGIES[0])
}

pub fn cascade(query: &Query) -> impl Iterator<Item = &'static SearchStrategy> + '_ {
    STRATEGIES
        .iter()
        .filter(move |strategy| strategy.applies_to(query))
}
