//! API сервер подбора вентиляторов

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fan_select_ml::{
    api::{self, AppState},
    catalog::Catalog,
    config::ServiceConfig,
    report::{ReportStore, TextReportRenderer},
    service::PredictionService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::parse();

    // Каталог и обучение — один раз до приёма запросов
    let (catalog, _) = Catalog::load(&config.catalog_path)
        .with_context(|| format!("failed to load catalog {}", config.catalog_path.display()))?;
    let training = config.training();
    let service = tokio::task::spawn_blocking(move || PredictionService::train(catalog, &training))
        .await
        .context("training task panicked")?
        .context("failed to train models")?;

    let reports = ReportStore::new(config.report_dir(), Box::new(TextReportRenderer));
    tracing::info!("Reports directory: {}", reports.dir().display());

    let app = api::router(AppState::new(service, reports));

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    tracing::info!("Server listening on http://{}", config.addr);
    axum::serve(listener, app).await?;

    Ok(())
}
