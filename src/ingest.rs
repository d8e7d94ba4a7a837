//! Ingesta del directorio de informes: extracción de texto, etiquetado por
//! empresa, troceado y construcción del índice vectorial persistido.

use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};
use mime_guess::MimeGuess;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::{
    chunker::Chunker,
    config::AppConfig,
    llm::Embedder,
    models::{Chunk, Document, DocumentMetadata},
    tagger::CompanyMap,
    vector_store::VectorIndex,
};

/// Resumen de los resultados de una operación de ingesta.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestionSummary {
    pub files_scanned: u32,
    pub files_ingested: u32,
    pub files_skipped: u32,
    pub chunks_created: usize,
}

/// Implementa cómo se mostrará el resumen como texto.
impl std::fmt::Display for IngestionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Resumen: {} ficheros escaneados, {} ingeridos, {} omitidos. {} chunks creados.",
            self.files_scanned, self.files_ingested, self.files_skipped, self.chunks_created
        )
    }
}

/// Lee los ficheros de primer nivel de `root` (en orden de nombre) y los
/// convierte en documentos etiquetados con su empresa. Los ficheros que no se
/// pueden leer se omiten con un aviso.
pub fn load_documents(
    root: &Path,
    company_map: &CompanyMap,
    summary: &mut IngestionSummary,
) -> Result<Vec<Document>> {
    if !root.is_dir() {
        return Err(anyhow!("La ruta no es un directorio: {}", root.display()));
    }

    let mut documents = Vec::new();
    let entries = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file());

    for entry in entries {
        summary.files_scanned += 1;
        let path = entry.path();

        match load_document(path, company_map) {
            Ok(Some(doc)) => {
                info!("Leído {} ({})", doc.metadata.source_filename, doc.metadata.company);
                documents.push(doc);
            }
            Ok(None) => summary.files_skipped += 1,
            Err(err) => {
                summary.files_skipped += 1;
                error!("Error leyendo {}: {err}", path.display());
            }
        }
    }

    Ok(documents)
}

fn load_document(path: &Path, company_map: &CompanyMap) -> Result<Option<Document>> {
    let Some(text) = extract_text(path)? else {
        return Ok(None);
    };

    if text.trim().is_empty() {
        warn!("Fichero vacío o sin texto útil: {}", path.display());
        return Ok(None);
    }

    let source_filename = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("Ruta sin nombre de fichero: {}", path.display()))?;

    let company = company_map.company_for(&source_filename);
    if company.is_empty() {
        warn!("No se puede derivar la empresa de '{}'. Saltando fichero.", source_filename);
        return Ok(None);
    }

    Ok(Some(Document {
        text,
        metadata: DocumentMetadata { source_filename, company },
    }))
}

/// Texto de un fichero según su tipo. `None` si el tipo no está soportado o
/// el PDF no se puede extraer.
fn extract_text(path: &Path) -> Result<Option<String>> {
    let mime = MimeGuess::from_path(path).first_or_octet_stream();

    match (mime.type_().as_str(), mime.subtype().as_str()) {
        ("application", "pdf") => match pdf_extract::extract_text(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) => {
                warn!("No se pudo extraer texto del PDF {}: {}. Saltando fichero.", path.display(), e);
                Ok(None)
            }
        },
        ("text", _) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Fichero no-UTF8: {}", path.display()))?;
            Ok(Some(content))
        }
        _ => {
            info!("Saltando fichero con tipo no soportado ({}): {}", mime, path.display());
            Ok(None)
        }
    }
}

/// Trocea todos los documentos, en orden, con el mismo chunker.
pub fn chunk_documents(documents: &[Document], chunker: &Chunker) -> Vec<Chunk> {
    documents.iter().flat_map(|doc| chunker.chunks(doc)).collect()
}

/// Reconstruye el índice completo a partir de `cfg.filings_dir` y lo persiste
/// en `cfg.index_location`. Si falla algún embedding no se escribe nada.
pub async fn build_index(cfg: &AppConfig, embedder: &dyn Embedder) -> Result<IngestionSummary> {
    let mut summary = IngestionSummary::default();
    let chunker = Chunker::new(cfg.chunk);

    let documents = load_documents(&cfg.filings_dir, &cfg.company_map, &mut summary)?;
    summary.files_ingested = documents.len() as u32;

    let chunks = chunk_documents(&documents, &chunker);
    summary.chunks_created = chunks.len();
    info!(
        "{} documentos troceados en {} chunks (tamaño {}, solape {})",
        documents.len(),
        chunks.len(),
        cfg.chunk.chunk_size(),
        cfg.chunk.chunk_overlap()
    );

    let index = VectorIndex::build(chunks, embedder).await?;
    index.persist(&cfg.index_location)?;

    Ok(summary)
}
