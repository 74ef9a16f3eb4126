//! fedblog server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use fedblog_api::{AppState, auth_middleware, router as api_router};
use fedblog_common::{AppError, Config, LocalStorage, config::KvBackend};
use fedblog_core::{AuthService, CommentService, MediaService, PostService, UserService};
use fedblog_db::repositories::{
    AccessTokenRepository, CommentRepository, LikeRepository, PostRepository, UserRepository,
};
use fedblog_federation::{
    Federation, Gatekeeper, InstanceInfo, KvStore, MemoryKvStore, RedisKvStore,
    gatekeeper_middleware,
};
use fred::prelude::*;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Key-value store selected by `federation.kv`.
async fn kv_store(config: &Config) -> Result<Arc<dyn KvStore>, AppError> {
    match config.federation.kv {
        KvBackend::Memory => {
            info!("Using in-memory federation key-value store");
            Ok(Arc::new(MemoryKvStore::new()))
        }
        KvBackend::Redis => {
            let redis = config.redis.as_ref().ok_or_else(|| {
                AppError::Config("federation.kv = \"redis\" needs a [redis] section".to_string())
            })?;

            let fred_config = fred::types::config::Config::from_url(&redis.url)
                .map_err(|e| AppError::Config(format!("Invalid Redis URL: {e}")))?;
            let client = fred::clients::Client::new(fred_config, None, None, None);
            client.connect();
            client
                .wait_for_connect()
                .await
                .map_err(|e| AppError::Redis(e.to_string()))?;
            info!("Connected to Redis for the federation key-value store");

            Ok(Arc::new(RedisKvStore::new(
                Arc::new(client),
                redis.prefix.clone(),
            )))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fedblog=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting fedblog server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = fedblog_db::init(&config.database).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    fedblog_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let token_repo = AccessTokenRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let like_repo = LikeRepository::new(Arc::clone(&db));

    // File storage
    let api_url = config.api_url();
    tokio::fs::create_dir_all(&config.storage.public_dir).await?;
    tokio::fs::create_dir_all(&config.storage.tmp_dir).await?;
    let public_storage = LocalStorage::new(
        config.storage.public_dir.clone(),
        format!("{api_url}/public"),
    );
    let tmp_storage = LocalStorage::new(config.storage.tmp_dir.clone(), format!("{api_url}/tmp"));

    // Initialize services
    let state = AppState {
        auth_service: AuthService::new(user_repo.clone(), token_repo),
        user_service: UserService::new(user_repo.clone(), post_repo.clone()),
        post_service: PostService::new(post_repo.clone(), comment_repo.clone(), like_repo),
        comment_service: CommentService::new(comment_repo, post_repo.clone()),
        media_service: MediaService::new(public_storage, tmp_storage, &api_url),
    };

    // Build router
    let mut app = Router::new()
        .merge(api_router())
        .nest_service("/public", ServeDir::new(&config.storage.public_dir))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    if config.federation.enabled {
        let federation = Federation::new(
            InstanceInfo {
                base_url: Url::parse(&config.server.url)?,
                name: config.federation.instance_name.clone(),
                description: config.federation.instance_description.clone(),
            },
            user_repo,
            post_repo,
            kv_store(&config).await?,
        );
        let gatekeeper = Arc::new(Gatekeeper::new(Arc::new(federation)));
        app = app.layer(middleware::from_fn_with_state(
            gatekeeper,
            gatekeeper_middleware,
        ));
        info!("Federation gatekeeper enabled");
    }

    let app = app.layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
