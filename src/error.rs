//! Tipos de error del dominio: configuración de chunking, construcción y carga
//! del índice, recuperación por empresa y llamadas a los colaboradores LLM.

use std::path::PathBuf;

use thiserror::Error;

/// Configuración de chunking inválida. Se detecta al arrancar, antes de leer
/// ningún documento.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChunkConfigError {
    #[error("chunk_size debe ser mayor que 0")]
    ZeroSize,

    #[error("chunk_overlap debe ser mayor que 0")]
    ZeroOverlap,

    #[error("chunk_overlap ({overlap}) debe ser menor que chunk_size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}

/// Fallo de un colaborador externo (servicio de embeddings o de chat).
#[derive(Debug, Error)]
#[error("{service}: {message}")]
pub struct LlmError {
    pub service: &'static str,
    pub message: String,
}

impl LlmError {
    pub fn embedding(message: impl Into<String>) -> Self {
        Self { service: "embeddings", message: message.into() }
    }

    pub fn chat(message: impl Into<String>) -> Self {
        Self { service: "chat", message: message.into() }
    }
}

/// La construcción del índice aborta por completo: nunca se persiste un índice parcial.
#[derive(Debug, Error)]
pub enum IndexBuildError {
    #[error("no hay chunks que indexar")]
    Empty,

    #[error("fallo al generar embeddings: {0}")]
    Embedding(#[from] LlmError),

    #[error("número de embeddings ({got}) distinto al número de chunks ({expected})")]
    CountMismatch { expected: usize, got: usize },

    #[error("dimensión de embedding inconsistente: se esperaba {expected}, llegó {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("chunk '{id}' sin empresa asignada")]
    MissingCompany { id: String },

    #[error("el embedding del chunk '{id}' contiene valores no finitos")]
    NonFiniteEmbedding { id: String },

    #[error("no se pudo persistir el índice en {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// El snapshot no existe o no es estructuralmente válido.
#[derive(Debug, Error)]
pub enum IndexLoadError {
    #[error("no existe ningún índice en {0}")]
    Missing(PathBuf),

    #[error("error de E/S leyendo {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot mal formado en {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("versión de snapshot no soportada: {0}")]
    UnsupportedVersion(u32),

    #[error("chunk '{id}': dimensión {got}, el índice declara {expected}")]
    DimensionMismatch { id: String, expected: usize, got: usize },

    #[error("chunk '{id}' sin empresa asignada")]
    MissingCompany { id: String },
}

/// Fallo de la búsqueda filtrada para una empresa concreta.
#[derive(Debug, Error)]
#[error("búsqueda fallida para {company}: {message}")]
pub struct RetrievalError {
    pub company: String,
    pub message: String,
}

/// Fallo terminal de una consulta; no hay respuesta parcial.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("la pregunta está vacía")]
    EmptyQuestion,

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("el modelo de lenguaje falló: {0}")]
    Llm(#[from] LlmError),
}
