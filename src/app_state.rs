use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::{
    config::AppConfig,
    llm::ChatModel,
    retriever::{ChunkSearch, PerCompanyRetriever},
    vector_store::VectorIndex,
};

/// Estado compartido del servidor. El índice se carga una vez al arrancar y
/// se inyecta aquí; es de sólo lectura, así que no necesita cerrojo.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub index: Arc<VectorIndex>,
    pub searcher: Arc<dyn ChunkSearch>,
    pub chat: Arc<dyn ChatModel>,
    pub retriever: PerCompanyRetriever,
    pub shutdown_sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}
