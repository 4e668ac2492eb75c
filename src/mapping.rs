use std::fs::File;
use std::io::{BufRead, BufReader, Read};

use camino::Utf8Path;
use flate2::read::GzDecoder;
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::CacheLayer;
use crate::error::BiogeneError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MappingReport {
    pub applied: usize,
    pub skipped: usize,
}

pub fn load_mapping_file(path: &Utf8Path, cache: &CacheLayer) -> Result<MappingReport, BiogeneError> {
    let file = File::open(path).map_err(|err| BiogeneError::Filesystem(format!("{path}: {err}")))?;
    let report = if path.extension() == Some("gz") {
        load_mapping(GzDecoder::new(file), cache)?
    } else {
        load_mapping(file, cache)?
    };
    info!(%path, applied = report.applied, skipped = report.skipped, "loaded uniprot mapping");
    Ok(report)
}

pub fn load_mapping<R: Read>(reader: R, cache: &CacheLayer) -> Result<MappingReport, BiogeneError> {
    let mut report = MappingReport::default();
    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.map_err(|err| BiogeneError::Filesystem(err.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match parse_mapping_line(index + 1, trimmed) {
            Ok((id, code)) => {
                cache.put_mapping(id, code);
                report.applied += 1;
            }
            Err(err) => {
                warn!(error = %err, "skipping mapping line");
                report.skipped += 1;
            }
        }
    }
    Ok(report)
}

fn parse_mapping_line(line: usize, content: &str) -> Result<(&str, &str), BiogeneError> {
    let malformed = || BiogeneError::MappingFormat {
        line,
        content: content.to_string(),
    };
    let mut fields = content.split('\t').map(str::trim);
    let id = fields.next().filter(|id| !id.is_empty()).ok_or_else(malformed)?;
    let code = fields.next().filter(|code| !code.is_empty()).ok_or_else(malformed)?;
    if fields.next().is_some() || !id.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(malformed());
    }
    Ok((id, code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_tab_separated_pair() {
        assert_eq!(parse_mapping_line(1, "672\tP38398").unwrap(), ("672", "P38398"));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_mapping_line(1, "672 P38398").is_err());
        assert!(parse_mapping_line(2, "BRCA1\tP38398").is_err());
        assert!(parse_mapping_line(3, "672\tP38398\textra").is_err());
        assert!(parse_mapping_line(4, "672\t").is_err());
    }
}
