//! Índice vectorial de chunks con persistencia en un snapshot JSON.
//!
//! API pública:
//!   - `VectorIndex::build(chunks, &dyn Embedder)`
//!   - `VectorIndex::persist(&Path)` / `VectorIndex::load(&Path)`
//!   - `VectorIndex::search(&dyn Embedder, &str, usize, &str)`.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{IndexBuildError, IndexLoadError, RetrievalError};
use crate::llm::Embedder;
use crate::models::{Chunk, RetrievedChunk};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Chunks por petición al servicio de embeddings.
const EMBED_BATCH_SIZE: usize = 64;

/// Un chunk junto a su embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f64>,
}

/// Colección inmutable de (chunk, embedding). Sólo lectura tras `build`/`load`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    version: u32,
    embedding_model: String,
    dimensions: usize,
    built_at: DateTime<Utc>,
    entries: Vec<IndexedChunk>,
}

impl VectorIndex {
    /// Embebe cada chunk exactamente una vez. Cualquier fallo aborta la
    /// construcción completa.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
    ) -> Result<Self, IndexBuildError> {
        if chunks.is_empty() {
            return Err(IndexBuildError::Empty);
        }
        if let Some(chunk) = chunks.iter().find(|c| c.company().is_empty()) {
            return Err(IndexBuildError::MissingCompany { id: chunk.id.clone() });
        }

        let mut entries = Vec::with_capacity(chunks.len());
        let mut dimensions = None;
        let total_batches = chunks.len().div_ceil(EMBED_BATCH_SIZE);

        for (batch_no, batch) in chunks.chunks(EMBED_BATCH_SIZE).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = embedder.embed_texts(texts).await?;

            if vectors.len() != batch.len() {
                return Err(IndexBuildError::CountMismatch {
                    expected: batch.len(),
                    got: vectors.len(),
                });
            }

            for (chunk, embedding) in batch.iter().zip(vectors) {
                let expected = *dimensions.get_or_insert(embedding.len());
                if embedding.len() != expected || expected == 0 {
                    return Err(IndexBuildError::DimensionMismatch {
                        expected,
                        got: embedding.len(),
                    });
                }
                if !embedding.iter().all(|x| x.is_finite()) {
                    return Err(IndexBuildError::NonFiniteEmbedding { id: chunk.id.clone() });
                }
                entries.push(IndexedChunk { chunk: chunk.clone(), embedding });
            }
            debug!("Lote de embeddings {}/{} completado", batch_no + 1, total_batches);
        }

        let index = Self {
            version: SNAPSHOT_VERSION,
            embedding_model: embedder.model_name().to_string(),
            dimensions: dimensions.unwrap_or_default(),
            built_at: Utc::now(),
            entries,
        };
        info!(
            "Índice construido: {} chunks, dimensión {}",
            index.len(),
            index.dimensions
        );
        Ok(index)
    }

    /// Escribe el snapshot completo. Se escribe a un fichero temporal en el
    /// mismo directorio y se renombra, así que el destino queda o bien
    /// completo o bien intacto.
    pub fn persist(&self, location: &Path) -> Result<(), IndexBuildError> {
        let persist_err = |source: std::io::Error| IndexBuildError::Persist {
            path: location.to_path_buf(),
            source,
        };

        let parent = match location.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(persist_err)?;

        let tmp = NamedTempFile::new_in(&parent).map_err(persist_err)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(&mut writer, self)
                .map_err(|e| persist_err(std::io::Error::from(e)))?;
            writer.flush().map_err(persist_err)?;
        }
        tmp.as_file().sync_all().map_err(persist_err)?;
        tmp.persist(location).map_err(|e| persist_err(e.error))?;

        info!("Índice persistido en {}", location.display());
        Ok(())
    }

    /// Carga un snapshot y valida su estructura. Nunca re-embebe.
    pub fn load(location: &Path) -> Result<Self, IndexLoadError> {
        if !location.is_file() {
            return Err(IndexLoadError::Missing(location.to_path_buf()));
        }

        let bytes = fs::read(location).map_err(|source| IndexLoadError::Io {
            path: location.to_path_buf(),
            source,
        })?;
        let index: Self =
            serde_json::from_slice(&bytes).map_err(|source| IndexLoadError::Malformed {
                path: location.to_path_buf(),
                source,
            })?;

        index.validate()?;
        info!(
            "Índice cargado desde {}: {} chunks ({})",
            location.display(),
            index.len(),
            index.embedding_model
        );
        Ok(index)
    }

    fn validate(&self) -> Result<(), IndexLoadError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(IndexLoadError::UnsupportedVersion(self.version));
        }
        for entry in &self.entries {
            if entry.embedding.len() != self.dimensions {
                return Err(IndexLoadError::DimensionMismatch {
                    id: entry.chunk.id.clone(),
                    expected: self.dimensions,
                    got: entry.embedding.len(),
                });
            }
            if entry.chunk.company().is_empty() {
                return Err(IndexLoadError::MissingCompany { id: entry.chunk.id.clone() });
            }
        }
        Ok(())
    }

    /// Búsqueda semántica filtrada por empresa a partir del texto de la consulta.
    pub async fn search(
        &self,
        embedder: &dyn Embedder,
        query_text: &str,
        k: usize,
        company: &str,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        let query = embedder
            .embed_query(query_text)
            .await
            .map_err(|e| RetrievalError {
                company: company.to_string(),
                message: e.to_string(),
            })?;
        self.search_embedding(&query, k, company)
    }

    /// Hasta `k` chunks cuya empresa es exactamente `company`, por similitud
    /// descendente. Los empates conservan el orden de inserción.
    pub fn search_embedding(
        &self,
        query: &[f64],
        k: usize,
        company: &str,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        if query.len() != self.dimensions {
            return Err(RetrievalError {
                company: company.to_string(),
                message: format!(
                    "la consulta tiene dimensión {}, el índice {}",
                    query.len(),
                    self.dimensions
                ),
            });
        }
        if !query.iter().all(|x| x.is_finite()) {
            return Err(RetrievalError {
                company: company.to_string(),
                message: "el embedding de la consulta contiene valores no finitos".to_string(),
            });
        }

        let mut scored: Vec<(&IndexedChunk, f64)> = self
            .entries
            .iter()
            .filter(|entry| entry.chunk.company() == company)
            .map(|entry| (entry, cosine_similarity(&entry.embedding, query)))
            .collect();

        // `sort_by` es estable.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(rank, (entry, score))| RetrievedChunk {
                chunk: entry.chunk.clone(),
                score,
                rank,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn entries(&self) -> &[IndexedChunk] {
        &self.entries
    }

    /// Empresas presentes en el índice, en orden de primera aparición.
    pub fn companies(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !seen.iter().any(|c| c == entry.chunk.company()) {
                seen.push(entry.chunk.company().to_string());
            }
        }
        seen
    }
}

/// Similitud coseno; 0.0 si alguno de los vectores tiene norma cero.
fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        let score = cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]);
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cosine_with_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
