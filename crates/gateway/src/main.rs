use anyhow::Context;
use common::{TelemetryGuard, setup_logging};
use gateway::{AppState, config::get_configuration, router};
use segmentation::{SegmentationBackend, SegmentationService, backend::ort::OrtBackend};
use std::sync::Arc;

const SERVICE_NAME: &str = "road-segmentation";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_configuration().context("failed to load configuration")?;
    config.validate()?;

    let _telemetry = match &config.otel_endpoint {
        Some(endpoint) => Some(TelemetryGuard::init(SERVICE_NAME, endpoint)?),
        None => None,
    };
    setup_logging(SERVICE_NAME, config.environment);

    tracing::info!(
        model = %config.model.path.display(),
        device = ?config.model.device,
        environment = config.environment.as_str(),
        "Loading segmentation model"
    );

    let input_resolution = config.model.input_resolution()?;
    let backend = match OrtBackend::load(&config.model) {
        Ok(backend) => backend,
        Err(e) => {
            tracing::error!(error = %e, "Model failed to load, refusing to serve");
            return Err(e.into());
        }
    };
    let backend: Box<dyn SegmentationBackend> = Box::new(backend);
    let service = SegmentationService::new(backend).with_input_resolution(input_resolution);

    let state = AppState::new(Arc::new(service), config.jpeg_quality);
    let app = router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
