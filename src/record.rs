use serde::{Deserialize, Serialize};

pub const DELIMITER: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneRif {
    pub text: String,
    pub pubmed_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneRecord {
    pub id: String,
    pub organism: Option<String>,
    pub chromosome: Option<String>,
    pub symbol: Option<String>,
    pub locus_tag: Option<String>,
    pub map_location: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub aliases: Option<String>,
    pub mim: Option<String>,
    pub designations: Option<String>,
    pub rifs: Vec<GeneRif>,
    pub mapping: Option<String>,
}

impl GeneRecord {
    pub fn mapping_codes(&self) -> impl Iterator<Item = &str> {
        self.mapping
            .as_deref()
            .unwrap_or("")
            .split(DELIMITER)
            .filter(|code| !code.is_empty())
    }

    pub fn merge_mapping<'a, I>(&mut self, codes: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut merged: Vec<String> = self.mapping_codes().map(str::to_string).collect();
        let before = merged.len();
        for code in codes {
            if !code.is_empty() && !merged.iter().any(|existing| existing == code) {
                merged.push(code.to_string());
            }
        }
        if merged.len() == before {
            return false;
        }
        self.mapping = join_delimited(merged);
        true
    }
}

pub fn join_delimited<I, S>(values: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = values
        .into_iter()
        .filter(|value| !value.as_ref().is_empty())
        .fold(String::new(), |mut acc, value| {
            if !acc.is_empty() {
                acc.push(DELIMITER);
            }
            acc.push_str(value.as_ref());
            acc
        });
    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_skips_empty_values() {
        assert_eq!(
            join_delimited(["BRCAI", "", "BRCC1"]),
            Some("BRCAI:BRCC1".to_string())
        );
        assert_eq!(join_delimited(Vec::<String>::new()), None);
    }

    #[test]
    fn merge_mapping_appends_only_new_codes() {
        let mut record = GeneRecord {
            id: "672".to_string(),
            mapping: Some("P38398".to_string()),
            ..GeneRecord::default()
        };
        assert!(!record.merge_mapping(["P38398"]));
        assert!(record.merge_mapping(["P38398", "Q99728"]));
        assert_eq!(record.mapping.as_deref(), Some("P38398:Q99728"));
    }
}
