use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method};
use pharos::{
    cli::Cli,
    events::EventBus,
    normalize::TermNormalizer,
    orchestrator::{Collaborators, Orchestrator, OrchestratorSettings, WorkerSet},
    report::TextReportRenderer,
    store::JobStore,
    synthesis::EvidenceSynthesizer,
    utils::Config,
    workers::{ClinicalTrialsWorker, LiteratureWorker, PatentWorker},
    AppState,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let default_filter = if cli.verbose {
        "pharos=debug,tower_http=debug"
    } else {
        "pharos=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env().map_err(|e| anyhow::anyhow!("config error: {}", e))?;
    cli.apply(&mut config);
    let config = Arc::new(config);

    info!(
        host = %config.server.host,
        port = config.server.port,
        "PHAROS starting"
    );

    // Stores and bus are constructed once and threaded through everything.
    let jobs = Arc::new(JobStore::new(&config.storage.data_dir)?);
    let recovered = jobs.load_existing().await?;
    if recovered > 0 {
        info!(count = recovered, "recovered persisted jobs");
    }
    let events = Arc::new(EventBus::new());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(
            config.orchestrator.worker_timeout_secs,
        ))
        .user_agent(concat!("pharos-server/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let normalizer = Arc::new(TermNormalizer::new());
    let orchestrator = Orchestrator::new(
        Arc::clone(&jobs),
        Arc::clone(&events),
        Collaborators {
            normalizer: normalizer.clone(),
            synthesizer: Arc::new(EvidenceSynthesizer::new(normalizer)),
            renderer: Arc::new(TextReportRenderer::new(&config.storage.reports_dir)?),
        },
        WorkerSet {
            clinical: Arc::new(ClinicalTrialsWorker::new(client.clone())),
            patents: Arc::new(PatentWorker::new(client.clone())),
            literature: Arc::new(LiteratureWorker::new(client)),
        },
        OrchestratorSettings {
            worker_timeout: Duration::from_secs(config.orchestrator.worker_timeout_secs),
            max_results: config.orchestrator.max_results,
        },
    );

    let state = AppState {
        config: Arc::clone(&config),
        jobs,
        events,
        orchestrator,
    };

    let cors = build_cors(&config.server.allowed_origins);
    let app = pharos::api::routes::create_router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", pharos::api::ApiDoc::openapi()),
        )
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("PHAROS shut down");
    Ok(())
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
