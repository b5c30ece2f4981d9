use std::net::SocketAddr;
use std::sync::Arc;

use auth::Authenticator;
use identity_service::config::Config;
use identity_service::domain::auth::service::AuthService;
use identity_service::domain::role::service::RoleService;
use identity_service::domain::session::sweeper::SessionSweeper;
use identity_service::domain::user::models::UserDraft;
use identity_service::domain::user::service::UserService;
use identity_service::inbound::http::router::create_router;
use identity_service::inbound::http::router::AppState;
use identity_service::outbound::repositories::PostgresReadinessProbe;
use identity_service::outbound::repositories::PostgresRoleRepository;
use identity_service::outbound::repositories::PostgresSessionRepository;
use identity_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;
    config.validate()?;

    tracing::info!(
        run_mode = config.run_mode.as_str(),
        host = %config.server.host,
        http_port = config.server.http_port,
        max_connections = config.database.max_connections,
        token_ttl_hours = config.jwt.expiration_hours,
        session_sweep_secs = config.sessions.cleanup_interval_secs,
        "Configuration loaded"
    );

    let authenticator = Arc::new(Authenticator::new(
        config.jwt.secret.as_bytes(),
        chrono::Duration::hours(config.jwt.expiration_hours),
    )?);

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
    let role_repository = Arc::new(PostgresRoleRepository::new(pg_pool.clone()));
    let session_repository = Arc::new(PostgresSessionRepository::new(pg_pool.clone()));

    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&user_repository),
        Arc::clone(&role_repository),
        Arc::clone(&session_repository),
        Arc::clone(&authenticator),
    ));
    if let Some(bootstrap) = config.bootstrap.clone() {
        let draft = UserDraft {
            username: bootstrap.admin_username,
            full_name: bootstrap.admin_full_name,
            email: bootstrap.admin_email,
            password: bootstrap.admin_password,
            role_id: None,
            active: Some(true),
        };
        auth_service.bootstrap_admin(draft).await?;
    }

    let user_service = Arc::new(UserService::new(Arc::clone(&user_repository)));
    let role_service = Arc::new(RoleService::new(Arc::clone(&role_repository)));
    let readiness = Arc::new(PostgresReadinessProbe::new(pg_pool.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = SessionSweeper::new(
        Arc::clone(&session_repository),
        config.sessions.cleanup_interval(),
    );
    let sweeper_task = tokio::spawn(sweeper.run(shutdown_rx));

    let state = AppState::new(
        auth_service,
        user_service,
        role_service,
        readiness,
        config.run_mode,
    );
    let http_application = create_router(state);

    let http_address = config.listen_address();
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    axum::serve(
        http_listener,
        http_application.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    tracing::info!("Http server stopped");

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper_task.await {
        tracing::error!(error = %e, "Session sweeper task failed");
    }

    pg_pool.close().await;
    tracing::info!("Database connection pool closed");

    Ok(())
}

/// Resolves on SIGINT or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
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
        _ = ctrl_c => tracing::info!(signal = "SIGINT", "Shutdown signal received"),
        _ = terminate => tracing::info!(signal = "SIGTERM", "Shutdown signal received"),
    }
}
