mod common;

use biogene::eutils::parse_search_response;
use biogene::parser::{fetch_gene_record, parse_gene_record};
use biogene::record::GeneRif;

use common::{BRCA1_XML, MockFetch};

#[test]
fn parses_entrezgene_fields() {
    let record = parse_gene_record(BRCA1_XML).unwrap();
    assert_eq!(record.id, "672");
    assert_eq!(record.organism.as_deref(), Some("Homo sapiens"));
    assert_eq!(record.chromosome.as_deref(), Some("17"));
    assert_eq!(record.symbol.as_deref(), Some("BRCA1"));
    assert_eq!(record.locus_tag, None);
    assert_eq!(record.map_location.as_deref(), Some("17q21.31"));
    assert_eq!(
        record.description.as_deref(),
        Some("BRCA1 DNA repair associated")
    );
    assert_eq!(record.aliases.as_deref(), Some("IRIS:PSCP:RNF53"));
    assert_eq!(record.mim.as_deref(), Some("113705"));
    assert_eq!(
        record.designations.as_deref(),
        Some("breast cancer type 1 susceptibility protein:RING finger protein 53")
    );
    assert_eq!(
        record.summary.as_deref(),
        Some(
            "This gene encodes a 190 kD nuclear phosphoprotein that plays a role in \
             maintaining genomic stability, and it also acts as a tumor suppressor."
        )
    );
    assert_eq!(record.mapping, None);
}

#[test]
fn generifs_without_pubmed_id_are_dropped_in_order() {
    let record = parse_gene_record(BRCA1_XML).unwrap();
    assert_eq!(
        record.rifs,
        vec![
            GeneRif {
                text: "BRCA1 mutations predispose to early onset breast cancer.".to_string(),
                pubmed_id: 7545954,
            },
            GeneRif {
                text: "BRCA1 forms a complex with BARD1 that acts as an E3 ubiquitin ligase."
                    .to_string(),
                pubmed_id: 14976165,
            },
        ]
    );
}

#[test]
fn fetched_record_takes_requested_id() {
    let fetch = MockFetch::default();
    let record = fetch_gene_record(&fetch, "100672").unwrap();
    assert_eq!(record.id, "100672");
}

#[test]
fn unparseable_payload_is_skipped() {
    let fetch = MockFetch::broken(&["672"]);
    assert!(fetch_gene_record(&fetch, "672").is_none());
    assert_eq!(fetch.call_count(), 1);
}

#[test]
fn esearch_page_reports_server_total() {
    let page = parse_search_response(include_str!("fixtures/esearch_brca1.json")).unwrap();
    assert_eq!(page.ids, vec!["672", "12189"]);
    assert_eq!(page.total, 4);
}
