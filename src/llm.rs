//! Abstracción sobre Rig para trabajar con distintos proveedores de LLM.
//! De momento se implementa OpenAI; Gemini/Ollama quedan preparados para el futuro.
//!
//! El resto de la aplicación sólo ve los traits [`Embedder`] y [`ChatModel`],
//! de modo que el índice y las consultas no dependen del proveedor.

use async_trait::async_trait;

use crate::config::{AppConfig, LlmProvider};
use crate::error::LlmError;

/// Servicio de embeddings: texto → vector de dimensión fija.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Nombre del modelo, se guarda en el snapshot del índice.
    fn model_name(&self) -> &str;

    /// Embeddings en bloque, en el mismo orden que `texts`.
    async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vec<f64>>, LlmError>;

    /// Embedding de una única consulta.
    async fn embed_query(&self, text: &str) -> Result<Vec<f64>, LlmError> {
        self.embed_texts(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::embedding("No se pudo generar embedding de la query"))
    }
}

/// Servicio de chat: prompt completo → respuesta en texto libre.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Gestor de LLMs y embeddings.
#[derive(Debug, Clone)]
pub struct LlmManager {
    pub provider: LlmProvider,
    pub embedding_model: String,
    pub chat_model: String,
}

impl LlmManager {
    /// Construye el manager a partir de la configuración.
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            provider: cfg.llm_provider.clone(),
            embedding_model: cfg.llm_embedding_model.clone(),
            chat_model: cfg.llm_chat_model.clone(),
        }
    }

    // ---------------------------------------------------------------------
    // EMBEDDINGS
    // ---------------------------------------------------------------------

    async fn embed_with_openai(&self, texts: Vec<String>) -> Result<Vec<Vec<f64>>, LlmError> {
        use rig::providers::openai::{self, TEXT_EMBEDDING_3_SMALL};
        // Trait para client.embedding_model(...)
        use rig::client::EmbeddingsClient as _;
        use rig::embeddings::EmbeddingModel as _;

        let client = openai::Client::from_env();

        let model_name = if self.embedding_model.is_empty() {
            TEXT_EMBEDDING_3_SMALL
        } else {
            self.embedding_model.as_str()
        };

        let embedding_model = client.embedding_model(model_name);
        let expected = texts.len();

        let embeddings = embedding_model
            .embed_texts(texts)
            .await
            .map_err(|e| LlmError::embedding(e.to_string()))?;

        if embeddings.len() != expected {
            return Err(LlmError::embedding(format!(
                "Número de embeddings ({}) distinto al número de textos ({})",
                embeddings.len(),
                expected
            )));
        }

        Ok(embeddings.into_iter().map(|emb| emb.vec).collect())
    }

    // ---------------------------------------------------------------------
    // CHAT / COMPLETION
    // ---------------------------------------------------------------------

    async fn complete_with_openai(&self, prompt: &str) -> Result<String, LlmError> {
        use rig::completion::Prompt;
        use rig::providers::openai;
        // Trait para client.agent(...)
        use rig::client::CompletionClient as _;

        let client = openai::Client::from_env();

        let model_name = if self.chat_model.is_empty() {
            "gpt-4"
        } else {
            self.chat_model.as_str()
        };

        let agent = client.agent(model_name).build();

        agent
            .prompt(prompt)
            .await
            .map_err(|e| LlmError::chat(e.to_string()))
    }
}

#[async_trait]
impl Embedder for LlmManager {
    fn model_name(&self) -> &str {
        &self.embedding_model
    }

    async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vec<f64>>, LlmError> {
        match self.provider {
            LlmProvider::OpenAI => self.embed_with_openai(texts).await,
            ref other => Err(LlmError::embedding(format!(
                "Proveedor LLM {:?} aún no implementado para embeddings",
                other
            ))),
        }
    }
}

#[async_trait]
impl ChatModel for LlmManager {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        match self.provider {
            LlmProvider::OpenAI => self.complete_with_openai(prompt).await,
            ref other => Err(LlmError::chat(format!(
                "Proveedor LLM {:?} aún no implementado para chat",
                other
            ))),
        }
    }
}
