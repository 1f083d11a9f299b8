use actix_web::{web, App, HttpServer};
use db_pool::{create_pool, DbConfig};
use posts_service::config::StoreBackend;
use posts_service::db::{MemoryStore, PgStore, Store};
use posts_service::handlers;
use posts_service::media::MediaStorage;
use posts_service::middleware::{JwtKeys, ViewerIdentity};
use posts_service::{AppState, Config};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,posts_service=debug,actix_web=info".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn build_store(config: &Config) -> io::Result<Arc<dyn Store>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let mut db_cfg = DbConfig::from_env("posts-service", &config.store.database_url);
            db_cfg.max_connections = db_cfg.max_connections.max(config.store.max_connections);
            db_cfg.log_config();

            let pool = create_pool(db_cfg).await.map_err(|e| {
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("Failed to create database pool: {}", e),
                )
            })?;

            let store = PgStore::new(pool);
            store.migrate().await.map_err(|e| {
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("Failed to run migrations: {}", e),
                )
            })?;
            Ok(Arc::new(store))
        }
    }
}

/// Posts Service
///
/// Serves the Yatube pages (feeds, profiles, post detail) and the write
/// endpoints for posts, comments and follows.
///
/// Listens on POSTS_SERVICE_HOST:POSTS_SERVICE_PORT (default 0.0.0.0:8000).
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting posts-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let store = build_store(&config).await?;

    let media = MediaStorage::new(config.media.root.clone());
    tokio::fs::create_dir_all(media.root()).await?;
    tracing::info!(root = %media.root().display(), "Media storage ready");

    let state = web::Data::new(AppState::new(store, &config.feed, media));
    let keys = Arc::new(JwtKeys::from_secret(&config.auth.jwt_secret));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(ViewerIdentity::new(keys.clone()))
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .run();

    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);

    let joined = tokio::select! {
        joined = &mut server_task => joined,
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received, stopping HTTP server");
            server_handle.stop(true).await;
            server_task.await
        }
    };

    match joined {
        Ok(result) => result,
        Err(e) => Err(io::Error::new(
            io::ErrorKind::Other,
            format!("HTTP server task failed: {}", e),
        )),
    }
}
