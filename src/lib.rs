//! RAG sobre informes 10-K de PayPal, Square, Toast y Fiserv.
//!
//! Fase offline (`build_index`): ficheros → documentos etiquetados por empresa
//! → chunks con solape → índice vectorial persistido.
//!
//! Fase online (`finsight_rag`): pregunta → búsqueda con cupo por empresa →
//! contexto etiquetado → LLM → respuesta con sus fuentes.

pub mod api;
pub mod app_state;
pub mod chunker;
pub mod config;
pub mod context;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod rag;
pub mod retriever;
pub mod tagger;
pub mod vector_store;
