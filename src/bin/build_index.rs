//! Reconstruye el índice vectorial a partir del directorio de informes.

use anyhow::{Context, Result};
use finsight_rag::{config::AppConfig, ingest, llm::LlmManager};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Cargar configuración (.env incluido) e inicializar logging
    let cfg = AppConfig::from_env().context("Error al cargar la configuración")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Inicializar el servicio de embeddings
    let llm_manager = LlmManager::from_config(&cfg);

    // 3. Ingesta completa y persistencia
    info!("Indexando {} ...", cfg.filings_dir.display());
    let summary = ingest::build_index(&cfg, &llm_manager)
        .await
        .context("Error construyendo el índice")?;

    info!("✅ Índice vectorial con metadatos de empresa guardado en {}. {}", cfg.index_location.display(), summary);
    Ok(())
}
