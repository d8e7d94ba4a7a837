//! Ingesta completa desde un directorio de informes en texto plano.

mod common;

use std::fs;
use std::path::Path;

use common::{HashEmbedder, PoisonedEmbedder};
use finsight_rag::config::AppConfig;
use finsight_rag::ingest::{self, IngestionSummary};
use finsight_rag::tagger::CompanyMap;
use finsight_rag::vector_store::VectorIndex;

fn config_for(filings: &Path, index: &Path, chunk_size: &str, overlap: &str) -> AppConfig {
    let filings = filings.to_string_lossy().to_string();
    let index = index.to_string_lossy().to_string();
    let chunk_size = chunk_size.to_string();
    let overlap = overlap.to_string();
    AppConfig::from_lookup(move |key: &str| match key {
        "FILINGS_DIR" => Some(filings.clone()),
        "INDEX_LOCATION" => Some(index.clone()),
        "CHUNK_SIZE" => Some(chunk_size.clone()),
        "CHUNK_OVERLAP" => Some(overlap.clone()),
        _ => None,
    })
    .unwrap()
}

fn words(prefix: &str, n: usize) -> String {
    (0..n).map(|i| format!("{prefix}{i}")).collect::<Vec<_>>().join(" ")
}

fn write_filings(dir: &Path) {
    fs::write(dir.join("pypl-2023-10k.txt"), words("paypal", 120)).unwrap();
    fs::write(dir.join("SQ-2023-10k.txt"), words("square", 40)).unwrap();
    fs::write(dir.join("acme-2023.md"), words("acme", 10)).unwrap();
    fs::write(dir.join("tost-2023-10k.txt"), "   \n ").unwrap();
    fs::write(dir.join("fi-2023.bin"), [0u8, 159, 146, 150]).unwrap();
    fs::write(dir.join("-2023-10k.txt"), words("anon", 10)).unwrap();
    fs::create_dir(dir.join("nested")).unwrap();
    fs::write(dir.join("nested").join("fi-2023.txt"), words("fiserv", 10)).unwrap();
}

#[test]
fn documents_are_tagged_from_their_filenames() {
    let dir = tempfile::tempdir().unwrap();
    write_filings(dir.path());

    let mut summary = IngestionSummary::default();
    let docs = ingest::load_documents(dir.path(), &CompanyMap::default(), &mut summary).unwrap();

    let tagged: Vec<(&str, &str)> = docs
        .iter()
        .map(|d| (d.metadata.source_filename.as_str(), d.metadata.company.as_str()))
        .collect();
    assert_eq!(
        tagged,
        vec![
            ("SQ-2023-10k.txt", "Square"),
            ("acme-2023.md", "acme"),
            ("pypl-2023-10k.txt", "PayPal"),
        ]
    );
    // Se omiten el fichero vacío, el binario y el que no tiene prefijo de
    // empresa; el subdirectorio no se recorre.
    assert_eq!(summary.files_scanned, 6);
    assert_eq!(summary.files_skipped, 3);
}

#[tokio::test]
async fn build_index_chunks_embeds_and_persists() {
    let filings = tempfile::tempdir().unwrap();
    let storage = tempfile::tempdir().unwrap();
    write_filings(filings.path());
    let location = storage.path().join("index.json");
    let cfg = config_for(filings.path(), &location, "50", "10");

    let summary = ingest::build_index(&cfg, &HashEmbedder::default()).await.unwrap();

    // paypal: 120 tokens → ventanas en 0, 40, 80 ; square: 40 → 1 ; acme: 10 → 1
    assert_eq!(summary.files_ingested, 3);
    assert_eq!(summary.chunks_created, 5);

    let index = VectorIndex::load(&location).unwrap();
    assert_eq!(index.len(), 5);
    assert_eq!(index.companies(), vec!["Square", "acme", "PayPal"]);
    assert!(index.entries().iter().all(|e| e.chunk.tokens <= 50));
}

#[tokio::test]
async fn failed_embedding_leaves_previous_index_untouched() {
    let filings = tempfile::tempdir().unwrap();
    let storage = tempfile::tempdir().unwrap();
    write_filings(filings.path());
    let location = storage.path().join("index.json");
    let cfg = config_for(filings.path(), &location, "50", "10");

    ingest::build_index(&cfg, &HashEmbedder::default()).await.unwrap();
    let before = fs::read(&location).unwrap();

    fs::write(filings.path().join("tost-2024.txt"), "toast poison pill").unwrap();
    let result = ingest::build_index(&cfg, &PoisonedEmbedder { poison: "poison" }).await;

    assert!(result.is_err());
    assert_eq!(fs::read(&location).unwrap(), before);
}

#[tokio::test]
async fn missing_filings_directory_is_an_error() {
    let storage = tempfile::tempdir().unwrap();
    let cfg = config_for(&storage.path().join("nope"), &storage.path().join("index.json"), "512", "50");
    assert!(ingest::build_index(&cfg, &HashEmbedder::default()).await.is_err());
}

#[test]
fn file_without_company_prefix_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("-2023-10k.txt"), words("anon", 10)).unwrap();

    let mut summary = IngestionSummary::default();
    let docs = ingest::load_documents(dir.path(), &CompanyMap::default(), &mut summary).unwrap();

    assert!(docs.is_empty());
    assert_eq!(summary.files_scanned, 1);
    assert_eq!(summary.files_skipped, 1);
}
