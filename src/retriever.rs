//! Recuperación con cupo por empresa: una búsqueda filtrada por cada empresa
//! conocida, concatenadas en el orden de la lista (sin re-ranking global).
//!
//! Así cada empresa aporta hasta `per_company_k` chunks aunque la similitud
//! global favorezca a otra, y el total queda acotado por
//! `per_company_k × empresas`.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::config::RetrievalFailurePolicy;
use crate::error::RetrievalError;
use crate::llm::Embedder;
use crate::models::RetrievedChunk;
use crate::vector_store::VectorIndex;

/// Búsqueda semántica filtrada por empresa.
#[async_trait]
pub trait ChunkSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        k: usize,
        company: &str,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError>;
}

/// [`ChunkSearch`] sobre un [`VectorIndex`] ya cargado.
#[derive(Clone)]
pub struct IndexSearcher {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

impl IndexSearcher {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder }
    }
}

#[async_trait]
impl ChunkSearch for IndexSearcher {
    async fn search(
        &self,
        query: &str,
        k: usize,
        company: &str,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        self.index.search(self.embedder.as_ref(), query, k, company).await
    }
}

#[derive(Debug, Clone)]
pub struct PerCompanyRetriever {
    companies: Vec<String>,
    per_company_k: usize,
    policy: RetrievalFailurePolicy,
}

impl PerCompanyRetriever {
    pub fn new(companies: Vec<String>, per_company_k: usize, policy: RetrievalFailurePolicy) -> Self {
        Self { companies, per_company_k, policy }
    }

    pub fn companies(&self) -> &[String] {
        &self.companies
    }

    /// Máximo de chunks que puede devolver [`PerCompanyRetriever::retrieve`].
    pub fn max_results(&self) -> usize {
        self.per_company_k * self.companies.len()
    }

    /// Lanza las búsquedas de todas las empresas a la vez y concatena los
    /// resultados en el orden de `companies`, sea cual sea el orden en que
    /// terminen.
    pub async fn retrieve(
        &self,
        searcher: &dyn ChunkSearch,
        query: &str,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        let searches = self
            .companies
            .iter()
            .map(|company| searcher.search(query, self.per_company_k, company));
        let outcomes = join_all(searches).await;

        let mut all = Vec::with_capacity(self.max_results());
        for (company, outcome) in self.companies.iter().zip(outcomes) {
            match outcome {
                Ok(mut hits) => {
                    hits.truncate(self.per_company_k);
                    debug!("{} chunks recuperados para {}", hits.len(), company);
                    all.extend(hits);
                }
                Err(err) => match self.policy {
                    RetrievalFailurePolicy::Abort => return Err(err),
                    RetrievalFailurePolicy::Degrade => {
                        warn!("Se omite {} en esta consulta: {}", company, err);
                    }
                },
            }
        }

        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Chunk, DocumentMetadata};

    /// Devuelve siempre más resultados de los pedidos.
    struct Greedy;

    #[async_trait]
    impl ChunkSearch for Greedy {
        async fn search(
            &self,
            _query: &str,
            k: usize,
            company: &str,
        ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
            Ok((0..k + 3)
                .map(|rank| RetrievedChunk {
                    chunk: Chunk {
                        id: format!("{company}#{rank}"),
                        index: rank,
                        start_token: 0,
                        tokens: 1,
                        overlap_tokens: 0,
                        text: "x".to_string(),
                        metadata: DocumentMetadata {
                            source_filename: format!("{company}.pdf"),
                            company: company.to_string(),
                        },
                    },
                    score: 1.0,
                    rank,
                })
                .collect())
        }
    }

    #[test]
    fn cap_is_enforced_even_if_the_search_overshoots() {
        let retriever = PerCompanyRetriever::new(
            vec!["PayPal".to_string(), "Toast".to_string()],
            2,
            RetrievalFailurePolicy::Degrade,
        );
        assert_eq!(retriever.companies(), ["PayPal", "Toast"]);
        let hits = tokio_test::block_on(retriever.retrieve(&Greedy, "q")).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["PayPal#0", "PayPal#1", "Toast#0", "Toast#1"]);
    }
}
