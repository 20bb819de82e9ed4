use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let config = server::config::load_config();
    let flags = &config.features;

    if flags.telemetry {
        if let Err(e) = server::telemetry::init_telemetry() {
            tracing::warn!(error = %e, "Telemetry disabled");
        }
    }
    server::health::record_start_time();

    let pool = match server::db::create_pool() {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to configure database pool");
            std::process::exit(1);
        }
    };
    if let Err(e) = server::db::run_migrations(&pool).await {
        tracing::error!(error = %e, "Database migrations failed");
        std::process::exit(1);
    }

    if flags.s3 {
        match server::storage::S3ObjectStore::from_env() {
            Ok(store) => store.ensure_bucket().await,
            Err(e) => tracing::warn!(error = %e.message, "Attachments bucket not checked"),
        }
    }

    let mut router = server::openapi::api_router(pool);

    if flags.telemetry {
        router = router.layer(server::telemetry::OtelTraceLayer);
    }

    // Max request body (default 10 MB); uploads go straight to object storage.
    let max_body: usize = std::env::var("MAX_BODY_BYTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10 * 1024 * 1024);

    let router = router
        .layer(axum::extract::DefaultBodyLimit::max(max_body))
        .layer(axum::middleware::from_fn(server::auth::middleware::auth_middleware))
        .layer(tower_http::request_id::PropagateRequestIdLayer::x_request_id())
        .layer(tower_http::request_id::SetRequestIdLayer::x_request_id(
            tower_http::request_id::MakeRequestUuid,
        ));

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "Wakeel API listening");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutting down");
    };

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!(error = %e, "Server error");
    }
}
