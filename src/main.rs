use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use hostplane::config::{Config, LogFormat};
use hostplane::handlers::{
    CacheResetRequest, DeleteEnvironmentResponse, LookupConfig, LookupResponse,
};
use hostplane::pubsub::spawn_invalidation_listener;
use hostplane::state::AppState;
use hostplane::{build_router, handlers};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::hosting::lookup,
        handlers::cache::reset_cache,
        handlers::environment::delete_environment,
    ),
    components(schemas(
        LookupResponse,
        LookupConfig,
        CacheResetRequest,
        DeleteEnvironmentResponse,
    )),
    tags(
        (name = "Hosting", description = "Host to deployment resolution"),
        (name = "Cache", description = "Hosting cache invalidation"),
        (name = "Environments", description = "Environment lifecycle")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,sqlx=warn"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let addr = config.server_addr();
    let redis_client = redis::Client::open(config.redis_url.as_str())?;

    // Initialize application state (connects to all databases)
    tracing::info!("Connecting to databases...");
    let state = AppState::new(config).await?;
    tracing::info!("Database connections established");

    spawn_invalidation_listener(redis_client, state.cache.clone());

    // Build the main application router
    let app = build_router(state)
        // Add Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server started on http://{}", addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
