use serde::Deserialize;
use tracing::debug;

use crate::eutils::FetchClient;
use crate::record::{GeneRecord, GeneRif, join_delimited};

const MIM_DB: &str = "MIM";
const GENERIF_TYPE: &str = "generif";

#[derive(Debug, Deserialize)]
#[serde(rename = "Entrezgene-Set")]
struct EntrezgeneSetXml {
    #[serde(rename = "Entrezgene", default)]
    genes: Vec<EntrezgeneXml>,
}

#[derive(Debug, Deserialize)]
struct EntrezgeneXml {
    #[serde(rename = "Entrezgene_track-info")]
    track_info: Option<TrackInfoXml>,
    #[serde(rename = "Entrezgene_source")]
    source: Option<SourceXml>,
    #[serde(rename = "Entrezgene_gene")]
    gene: Option<GeneXml>,
    #[serde(rename = "Entrezgene_summary")]
    summary: Option<String>,
    #[serde(rename = "Entrezgene_prot")]
    prot: Option<ProtXml>,
    #[serde(rename = "Entrezgene_comments")]
    comments: Option<CommentsXml>,
}

#[derive(Debug, Deserialize)]
struct TrackInfoXml {
    #[serde(rename = "Gene-track")]
    track: Option<GeneTrackXml>,
}

#[derive(Debug, Deserialize)]
struct GeneTrackXml {
    #[serde(rename = "Gene-track_geneid")]
    gene_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourceXml {
    #[serde(rename = "BioSource")]
    bio_source: Option<BioSourceXml>,
}

#[derive(Debug, Deserialize)]
struct BioSourceXml {
    #[serde(rename = "BioSource_org")]
    org: Option<BioSourceOrgXml>,
    #[serde(rename = "BioSource_subtype")]
    subtype: Option<BioSourceSubtypeXml>,
}

#[derive(Debug, Deserialize)]
struct BioSourceOrgXml {
    #[serde(rename = "Org-ref")]
    org_ref: Option<OrgRefXml>,
}

#[derive(Debug, Deserialize)]
struct OrgRefXml {
    #[serde(rename = "Org-ref_taxname")]
    taxname: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BioSourceSubtypeXml {
    #[serde(rename = "SubSource", default)]
    sub_sources: Vec<SubSourceXml>,
}

#[derive(Debug, Deserialize)]
struct SubSourceXml {
    #[serde(rename = "SubSource_name")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeneXml {
    #[serde(rename = "Gene-ref")]
    gene_ref: Option<GeneRefXml>,
}

#[derive(Debug, Deserialize)]
struct GeneRefXml {
    #[serde(rename = "Gene-ref_locus")]
    locus: Option<String>,
    #[serde(rename = "Gene-ref_locus-tag")]
    locus_tag: Option<String>,
    #[serde(rename = "Gene-ref_maploc")]
    maploc: Option<String>,
    #[serde(rename = "Gene-ref_desc")]
    desc: Option<String>,
    #[serde(rename = "Gene-ref_syn")]
    synonyms: Option<SynonymsXml>,
    #[serde(rename = "Gene-ref_db")]
    db: Option<GeneRefDbXml>,
}

#[derive(Debug, Deserialize)]
struct SynonymsXml {
    #[serde(rename = "Gene-ref_syn_E", default)]
    values: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeneRefDbXml {
    #[serde(rename = "Dbtag", default)]
    tags: Vec<DbtagXml>,
}

#[derive(Debug, Deserialize)]
struct DbtagXml {
    #[serde(rename = "Dbtag_db")]
    db: Option<String>,
    #[serde(rename = "Dbtag_tag")]
    tag: Option<DbtagTagXml>,
}

#[derive(Debug, Deserialize)]
struct DbtagTagXml {
    #[serde(rename = "Object-id")]
    object_id: Option<ObjectIdXml>,
}

#[derive(Debug, Deserialize)]
struct ObjectIdXml {
    #[serde(rename = "Object-id_id")]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProtXml {
    #[serde(rename = "Prot-ref")]
    prot_ref: Option<ProtRefXml>,
}

#[derive(Debug, Deserialize)]
struct ProtRefXml {
    #[serde(rename = "Prot-ref_name")]
    name: Option<ProtRefNameXml>,
}

#[derive(Debug, Deserialize)]
struct ProtRefNameXml {
    #[serde(rename = "Prot-ref_name_E", default)]
    values: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CommentsXml {
    #[serde(rename = "Gene-commentary", default)]
    commentaries: Vec<CommentaryXml>,
}

#[derive(Debug, Deserialize)]
struct CommentaryXml {
    #[serde(rename = "Gene-commentary_type")]
    kind: Option<CommentaryTypeXml>,
    #[serde(rename = "Gene-commentary_text")]
    text: Option<String>,
    #[serde(rename = "Gene-commentary_refs")]
    refs: Option<CommentaryRefsXml>,
}

#[derive(Debug, Deserialize)]
struct CommentaryTypeXml {
    #[serde(rename = "@value")]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentaryRefsXml {
    #[serde(rename = "Pub", default)]
    pubs: Vec<PubXml>,
}

#[derive(Debug, Deserialize)]
struct PubXml {
    #[serde(rename = "Pub_pmid")]
    pmid: Option<PubPmidXml>,
}

#[derive(Debug, Deserialize)]
struct PubPmidXml {
    #[serde(rename = "PubMedId")]
    id: Option<String>,
}

pub fn parse_gene_record(payload: &str) -> Option<GeneRecord> {
    let set: EntrezgeneSetXml = match quick_xml::de::from_str(payload) {
        Ok(set) => set,
        Err(err) => {
            debug!(error = %err, "efetch payload is not parseable");
            return None;
        }
    };
    let Some(gene) = set.genes.into_iter().next() else {
        debug!("entrezgene element not found");
        return None;
    };
    Some(gene_record(gene))
}

pub fn fetch_gene_record<F>(client: &F, id: &str) -> Option<GeneRecord>
where
    F: FetchClient + ?Sized,
{
    let payload = match client.fetch_gene(id) {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            debug!(id, "efetch returned no content");
            return None;
        }
        Err(err) => {
            debug!(id, error = %err, "efetch failed");
            return None;
        }
    };
    let Some(mut record) = parse_gene_record(&payload) else {
        debug!(id, "efetch parse error");
        return None;
    };
    record.id = id.to_string();
    Some(record)
}

fn gene_record(gene: EntrezgeneXml) -> GeneRecord {
    let mut record = GeneRecord {
        id: gene
            .track_info
            .and_then(|info| info.track)
            .and_then(|track| normalize(track.gene_id))
            .unwrap_or_default(),
        summary: normalize(gene.summary),
        ..GeneRecord::default()
    };

    if let Some(gene_ref) = gene.gene.and_then(|gene| gene.gene_ref) {
        apply_gene_ref(gene_ref, &mut record);
    }

    if let Some(bio_source) = gene.source.and_then(|source| source.bio_source) {
        record.organism = bio_source
            .org
            .and_then(|org| org.org_ref)
            .and_then(|org_ref| normalize(org_ref.taxname));
        record.chromosome = bio_source
            .subtype
            .and_then(|subtype| subtype.sub_sources.into_iter().next())
            .and_then(|sub_source| normalize(sub_source.name));
    }

    record.designations = gene
        .prot
        .and_then(|prot| prot.prot_ref)
        .and_then(|prot_ref| prot_ref.name)
        .and_then(|name| join_delimited(name.values.into_iter().filter_map(|v| normalize(Some(v)))));

    if let Some(comments) = gene.comments {
        record.rifs = comments
            .commentaries
            .into_iter()
            .filter_map(gene_rif)
            .collect();
    }

    record
}

fn apply_gene_ref(gene_ref: GeneRefXml, record: &mut GeneRecord) {
    record.symbol = normalize(gene_ref.locus);
    record.locus_tag = normalize(gene_ref.locus_tag);
    record.map_location = normalize(gene_ref.maploc);
    record.description = normalize(gene_ref.desc);
    record.aliases = gene_ref.synonyms.and_then(|synonyms| {
        join_delimited(
            synonyms
                .values
                .into_iter()
                .filter_map(|alias| normalize(Some(alias))),
        )
    });
    record.mim = gene_ref.db.and_then(|db| {
        db.tags
            .into_iter()
            .filter(|tag| normalize(tag.db.clone()).as_deref() == Some(MIM_DB))
            .filter_map(|tag| {
                tag.tag
                    .and_then(|tag| tag.object_id)
                    .and_then(|object_id| normalize(object_id.id))
            })
            .last()
    });
}

// Needs non-empty text and a positive PubMed id.
fn gene_rif(commentary: CommentaryXml) -> Option<GeneRif> {
    let kind = commentary.kind.and_then(|kind| kind.value)?;
    if kind.trim() != GENERIF_TYPE {
        return None;
    }
    let text = normalize(commentary.text)?;
    let pubmed_id = commentary
        .refs
        .and_then(|refs| refs.pubs.into_iter().next())
        .and_then(|publication| publication.pmid)
        .and_then(|pmid| normalize(pmid.id))
        .and_then(|id| id.parse::<u64>().ok())
        .filter(|id| *id > 0)?;
    Some(GeneRif { text, pubmed_id })
}

fn normalize(value: Option<String>) -> Option<String> {
    let value = value?;
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_payload_without_entrezgene() {
        assert!(parse_gene_record("<Entrezgene-Set></Entrezgene-Set>").is_none());
        assert!(parse_gene_record("not xml <<<").is_none());
    }

    #[test]
    fn bare_entrezgene_yields_empty_record() {
        let record =
            parse_gene_record("<Entrezgene-Set><Entrezgene></Entrezgene></Entrezgene-Set>")
                .unwrap();
        assert_eq!(record, GeneRecord::default());
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(
            normalize(Some("  BRCA1 DNA\n   repair ".to_string())),
            Some("BRCA1 DNA repair".to_string())
        );
        assert_eq!(normalize(Some("   ".to_string())), None);
    }
}
