use std::io::{self, Write};

use serde::Serialize;

use crate::app::GeneLookup;
use crate::cache::CacheStats;
use crate::mapping::MappingReport;
use crate::populate::PopulateReport;

#[derive(Debug, Serialize)]
pub struct LookupOutput<'a> {
    #[serde(flatten)]
    pub lookup: &'a GeneLookup,
    pub cache: CacheStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<MappingReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub populate: Vec<PopulateReport>,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_lookup(output: &LookupOutput<'_>) -> io::Result<()> {
        Self::print_json(output)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
