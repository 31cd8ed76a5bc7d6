use funnel_api::{
    app, bootstrap_tables, build_state, connect_pool, ensure_database_exists, load_catalog, Settings,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("funnel_api=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    if settings.create_database {
        ensure_database_exists(&settings.database_url).await?;
    }
    let pool = connect_pool(&settings).await?;
    tracing::info!("connected to database");

    let catalog = load_catalog(&settings).await?;
    if settings.bootstrap_tables {
        bootstrap_tables(
            &pool,
            &settings.db_schema,
            &catalog,
            &[settings.created_at_column.as_str(), settings.updated_at_column.as_str()],
        )
        .await?;
    }

    let addr = settings.bind_addr()?;
    let state = build_state(settings, catalog, pool);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
