//! Consulta RAG contra el índice vectorial.
//!
//! Flujo:
//!   1. Búsqueda filtrada por cada empresa conocida (cupo por empresa).
//!   2. Construcción del contexto etiquetado en el orden de las empresas.
//!   3. El LLM responde usando sólo ese contexto.
//!   4. Se devuelven la respuesta y los chunks usados como fuentes.

use tracing::info;

use crate::{
    context,
    error::QueryError,
    llm::ChatModel,
    models::QueryAnswer,
    retriever::{ChunkSearch, PerCompanyRetriever},
};

/// Lanza una consulta RAG. Un fallo del modelo es terminal: no hay respuesta
/// parcial ni reintentos.
pub async fn rag_query(
    searcher: &dyn ChunkSearch,
    chat: &dyn ChatModel,
    retriever: &PerCompanyRetriever,
    question: &str,
) -> Result<QueryAnswer, QueryError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(QueryError::EmptyQuestion);
    }

    // 1) Mejores chunks por empresa
    let sources = retriever.retrieve(searcher, question).await?;

    // 2) Contexto etiquetado. Vacío es válido: el modelo dirá que no hay información.
    let context_block = context::assemble(&sources);
    if context_block.is_empty() {
        info!("Ninguna empresa devolvió chunks para la pregunta; se consulta sin contexto.");
    }

    // 3) Preguntar al LLM
    let prompt = context::build_prompt(&context_block, question);
    let answer = chat.complete(&prompt).await?;

    info!("Consulta respondida con {} fuentes", sources.len());
    Ok(QueryAnswer { answer, sources })
}
