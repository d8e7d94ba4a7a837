//! Carga y gestión de configuración de la aplicación (chunking, índice, LLM).

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::error::ChunkConfigError;
use crate::tagger::CompanyMap;

pub const DEFAULT_CHUNK_SIZE: usize = 512;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;
pub const DEFAULT_PER_COMPANY_K: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Gemini,
    Ollama,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(anyhow!("Proveedor LLM no soportado: {other}")),
        }
    }
}

/// Qué hacer cuando falla la búsqueda de una empresa durante una consulta.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RetrievalFailurePolicy {
    /// Se omite la empresa y se sigue con el resto.
    #[default]
    Degrade,
    /// Se aborta la consulta completa.
    Abort,
}

impl RetrievalFailurePolicy {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "degrade" => Ok(Self::Degrade),
            "abort" => Ok(Self::Abort),
            other => Err(anyhow!("Política de recuperación no soportada: {other}")),
        }
    }
}

/// Tamaño de ventana y solape del chunker, ya validados.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkConfig {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl ChunkConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkConfigError> {
        if chunk_size == 0 {
            return Err(ChunkConfigError::ZeroSize);
        }
        if chunk_overlap == 0 {
            return Err(ChunkConfigError::ZeroOverlap);
        }
        if chunk_overlap >= chunk_size {
            return Err(ChunkConfigError::OverlapTooLarge {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Distancia entre el inicio de dos chunks consecutivos.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub filings_dir: PathBuf,
    pub index_location: PathBuf,
    pub chunk: ChunkConfig,
    pub per_company_k: usize,
    pub company_map: CompanyMap,
    pub retrieval_policy: RetrievalFailurePolicy,
    pub server_addr: String,

    pub llm_provider: LlmProvider,
    pub llm_embedding_model: String,
    pub llm_chat_model: String,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que [`AppConfig::from_env`] pero leyendo de una función arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let filings_dir = PathBuf::from(var_or("FILINGS_DIR", "filings"));
        let index_location = PathBuf::from(var_or("INDEX_LOCATION", "index_storage/index.json"));

        let chunk_size = parse_usize(&lookup, "CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        let chunk_overlap = parse_usize(&lookup, "CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?;
        let chunk = ChunkConfig::new(chunk_size, chunk_overlap)?;

        let per_company_k = parse_usize(&lookup, "PER_COMPANY_K", DEFAULT_PER_COMPANY_K)?;
        if per_company_k == 0 {
            return Err(anyhow!("PER_COMPANY_K debe ser mayor que 0"));
        }

        let company_map = match lookup("COMPANY_MAP") {
            Some(raw) => CompanyMap::parse(&raw)?,
            None => CompanyMap::default(),
        };

        let retrieval_policy =
            RetrievalFailurePolicy::from_str(&var_or("RETRIEVAL_FAILURE_POLICY", "degrade"))?;

        let server_addr = var_or("SERVER_ADDR", "127.0.0.1:3322");

        let llm_provider = LlmProvider::from_str(&var_or("LLM_PROVIDER", "openai"))?;
        let llm_embedding_model = var_or("LLM_EMBEDDING_MODEL", "text-embedding-3-small");
        let llm_chat_model = var_or("LLM_CHAT_MODEL", "gpt-4");

        Ok(Self {
            filings_dir,
            index_location,
            chunk,
            per_company_k,
            company_map,
            retrieval_policy,
            server_addr,
            llm_provider,
            llm_embedding_model,
            llm_chat_model,
        })
    }
}

fn parse_usize<F>(lookup: &F, key: &str, default: usize) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} no es un entero válido: '{raw}'")),
        None => Ok(default),
    }
}
