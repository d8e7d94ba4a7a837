//! Colaboradores falsos y utilidades compartidas por los tests de integración.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use finsight_rag::error::{LlmError, RetrievalError};
use finsight_rag::llm::{ChatModel, Embedder};
use finsight_rag::models::{Chunk, DocumentMetadata, RetrievedChunk};
use finsight_rag::retriever::ChunkSearch;

pub const DIM: usize = 32;

/// Embedding determinista: bolsa de palabras proyectada con FNV-1a.
pub fn hash_embedding(text: &str) -> Vec<f64> {
    let mut v = vec![0.0; DIM];
    for token in text.split_whitespace() {
        let mut h: u64 = 0xcbf29ce484222325;
        for b in token.to_lowercase().bytes() {
            h ^= b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        v[(h % DIM as u64) as usize] += 1.0;
    }
    v
}

#[derive(Default)]
pub struct HashEmbedder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash-bow-32"
    }

    async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vec<f64>>, LlmError> {
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| hash_embedding(t)).collect())
    }
}

/// Falla al embeber cualquier texto que contenga `poison`.
pub struct PoisonedEmbedder {
    pub poison: &'static str,
}

#[async_trait]
impl Embedder for PoisonedEmbedder {
    fn model_name(&self) -> &str {
        "poisoned"
    }

    async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vec<f64>>, LlmError> {
        if texts.iter().any(|t| t.contains(self.poison)) {
            return Err(LlmError::embedding("servicio no disponible"));
        }
        Ok(texts.iter().map(|t| hash_embedding(t)).collect())
    }
}

/// Modelo de chat que guarda el último prompt y responde con un texto fijo.
#[derive(Default)]
pub struct RecordingChat {
    pub last_prompt: Mutex<Option<String>>,
    pub fail: bool,
}

#[async_trait]
impl ChatModel for RecordingChat {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        if self.fail {
            return Err(LlmError::chat("rate limit"));
        }
        Ok("respuesta".to_string())
    }
}

/// Envuelve otro buscador y hace fallar a una empresa concreta.
pub struct FailingFor<S> {
    pub inner: S,
    pub company: &'static str,
}

#[async_trait]
impl<S: ChunkSearch> ChunkSearch for FailingFor<S> {
    async fn search(
        &self,
        query: &str,
        k: usize,
        company: &str,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        if company == self.company {
            return Err(RetrievalError {
                company: company.to_string(),
                message: "timeout".to_string(),
            });
        }
        self.inner.search(query, k, company).await
    }
}

pub fn chunk(company: &str, filename: &str, index: usize, text: &str) -> Chunk {
    Chunk {
        id: format!("{filename}#{index}"),
        index,
        start_token: 0,
        tokens: text.split_whitespace().count(),
        overlap_tokens: 0,
        text: text.to_string(),
        metadata: DocumentMetadata {
            source_filename: filename.to_string(),
            company: company.to_string(),
        },
    }
}

/// Corpus pequeño: seis chunks por empresa conocida.
pub fn corpus() -> Vec<Chunk> {
    let topics = [
        "payment volume grew across merchants",
        "risk factors include regulation and competition",
        "revenue from transaction fees increased",
        "restaurants use point of sale hardware",
        "consumer wallet and peer to peer transfers",
        "credit losses and loan portfolio",
    ];
    let companies = [("PayPal", "pypl"), ("Square", "sq"), ("Toast", "tost"), ("Fiserv", "fi")];

    let mut chunks = Vec::new();
    for (company, prefix) in companies {
        for (i, topic) in topics.iter().enumerate() {
            chunks.push(chunk(company, &format!("{prefix}-2023-10k.pdf"), i, &format!("{company} {topic}")));
        }
    }
    chunks
}

/// Devuelve un vector con NaN para cualquier texto que contenga `marker`.
pub struct NanEmbedder {
    pub marker: &'static str,
}

#[async_trait]
impl Embedder for NanEmbedder {
    fn model_name(&self) -> &str {
        "nan"
    }

    async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vec<f64>>, LlmError> {
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = hash_embedding(t);
                if t.contains(self.marker) {
                    v[0] = f64::NAN;
                }
                v
            })
            .collect())
    }
}
