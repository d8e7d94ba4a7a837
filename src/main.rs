use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::Router;
use finsight_rag::{
    api,
    app_state::AppState,
    config::AppConfig,
    llm::LlmManager,
    retriever::{IndexSearcher, PerCompanyRetriever},
    vector_store::VectorIndex,
};
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Cargar configuración (.env incluido) e inicializar logging
    let cfg = AppConfig::from_env().context("Error al cargar la configuración")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Cargar el índice una sola vez; sin índice válido no se puede consultar
    let index = Arc::new(
        VectorIndex::load(&cfg.index_location).context("Error cargando el índice vectorial")?,
    );
    if index.embedding_model() != cfg.llm_embedding_model {
        warn!(
            "El índice se construyó con '{}' pero el modelo configurado es '{}'. Reconstruye el índice.",
            index.embedding_model(),
            cfg.llm_embedding_model
        );
    }

    // 3. Inicializar gestor de LLMs y el recuperador por empresa
    let llm_manager = Arc::new(LlmManager::from_config(&cfg));
    let searcher = Arc::new(IndexSearcher::new(index.clone(), llm_manager.clone()));
    let retriever = PerCompanyRetriever::new(
        cfg.company_map.companies(),
        cfg.per_company_k,
        cfg.retrieval_policy,
    );

    // Crear canal para la señal de apagado.
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // 4. Crear estado compartido de la aplicación
    let app_state = AppState {
        config: cfg.clone(),
        index,
        searcher,
        chat: llm_manager,
        retriever,
        shutdown_sender: Arc::new(Mutex::new(Some(shutdown_tx))),
    };

    // 5. Configurar el router de la API
    let app = Router::new().merge(api::create_router(app_state)).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    // 6. Iniciar el servidor
    let listener = tokio::net::TcpListener::bind(&cfg.server_addr)
        .await
        .with_context(|| format!("No se pudo escuchar en {}", cfg.server_addr))?;
    info!("🚀 Servidor escuchando en http://{}", cfg.server_addr);

    // Configurar el apagado ordenado.
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await?;

    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}
