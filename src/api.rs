use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::{app_state::AppState, error::QueryError, models::RetrievedChunk, rag};

/// Caracteres de cada fuente que se devuelven como vista previa.
pub const PREVIEW_CHARS: usize = 500;

// --- Payloads y Respuestas de la API ---

#[derive(Deserialize)]
pub struct RagQueryPayload {
    question: String,
}

#[derive(Serialize)]
pub struct SourceView {
    company: String,
    source_filename: String,
    score: f64,
    preview: String,
}

impl From<&RetrievedChunk> for SourceView {
    fn from(rc: &RetrievedChunk) -> Self {
        Self {
            company: rc.company().to_string(),
            source_filename: rc.chunk.metadata.source_filename.clone(),
            score: rc.score,
            preview: rc.preview(PREVIEW_CHARS).to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct RagQueryResponse {
    answer: String,
    sources: Vec<SourceView>,
}

#[derive(Serialize)]
pub struct IndexStatus {
    chunks: usize,
    companies: Vec<String>,
    queried_companies: Vec<String>,
    embedding_model: String,
    dimensions: usize,
    built_at: DateTime<Utc>,
    per_company_k: usize,
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/rag-query", post(rag_query_handler))
        .route("/api/status", get(status_handler))
        .route("/api/shutdown", post(shutdown_handler))
        .with_state(app_state)
}

// --- Handlers ---

#[axum::debug_handler]
async fn rag_query_handler(
    State(state): State<AppState>,
    Json(payload): Json<RagQueryPayload>,
) -> Result<Json<RagQueryResponse>, (StatusCode, Json<serde_json::Value>)> {
    let rag_result = rag::rag_query(
        state.searcher.as_ref(),
        state.chat.as_ref(),
        &state.retriever,
        &payload.question,
    )
    .await;

    match rag_result {
        Ok(result) => Ok(Json(RagQueryResponse {
            answer: result.answer,
            sources: result.sources.iter().map(SourceView::from).collect(),
        })),
        Err(QueryError::EmptyQuestion) => {
            warn!("Consulta rechazada: pregunta vacía");
            Err((
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Please enter a question!"})),
            ))
        }
        Err(e) => {
            error!("Error al procesar la consulta RAG: {}", e);
            let code = match e {
                QueryError::Llm(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((
                code,
                Json(json!({"error": format!("Error al procesar la consulta RAG: {}", e)})),
            ))
        }
    }
}

#[axum::debug_handler]
async fn status_handler(State(state): State<AppState>) -> Json<IndexStatus> {
    let index = &state.index;
    Json(IndexStatus {
        chunks: index.len(),
        companies: index.companies(),
        queried_companies: state.retriever.companies().to_vec(),
        embedding_model: index.embedding_model().to_string(),
        dimensions: index.dimensions(),
        built_at: index.built_at(),
        per_company_k: state.config.per_company_k,
    })
}

// --- Handler de Apagado ---

#[axum::debug_handler]
async fn shutdown_handler(State(state): State<AppState>) -> impl IntoResponse {
    info!("Petición de apagado recibida.");
    if let Ok(mut guard) = state.shutdown_sender.lock() {
        if let Some(sender) = guard.take() {
            let _ = sender.send(());
        }
    }
    StatusCode::OK
}
