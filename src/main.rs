use std::net::SocketAddr;
use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use otpgate::{
    config::{Config, StoreBackend},
    create_router,
    repositories::{
        AuditSink, CredentialStore, InMemoryCredentialStore, PgAuditSink, PgCredentialStore,
        TracingAuditSink,
    },
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ログ初期化（JSON形式、環境変数でレベル制御）
    init_tracing();

    tracing::info!("otpgate 起動中...");

    // 設定読み込み
    let config = Config::load().map_err(|e| {
        tracing::error!(error = ?e, "設定の読み込みに失敗");
        anyhow::anyhow!("Failed to load config: {}", e)
    })?;

    tracing::info!(
        host = %config.host,
        port = %config.port,
        store_backend = ?config.store_backend,
        "設定読み込み完了"
    );

    // サーバーアドレスを先に構築（config が move される前に）
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| {
            tracing::error!(error = ?e, "アドレスのパースに失敗");
            anyhow::anyhow!("Failed to parse address: {}", e)
        })?;

    // 資格情報ストアと監査ログの構築
    let (store, audit) = build_store(&config).await?;

    // AppState 構築
    let state = AppState::new(store, audit, config).map_err(|e| {
        tracing::error!(error = ?e, "AppState の構築に失敗");
        anyhow::anyhow!("Failed to create AppState: {}", e)
    })?;

    // Router 構築
    let app = create_router(state);

    // サーバー起動
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        tracing::error!(error = ?e, addr = %addr, "ポートのバインドに失敗");
        anyhow::anyhow!("Failed to bind to {}: {}", addr, e)
    })?;

    tracing::info!(addr = %addr, "サーバー起動");

    // Graceful shutdown 対応
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "サーバーエラー");
            anyhow::anyhow!("Server error: {}", e)
        })?;

    tracing::info!("サーバー終了");

    Ok(())
}

/// tracing の初期化（JSON形式）
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,otpgate=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// バックエンド設定に応じてストアと監査ログを構築
async fn build_store(
    config: &Config,
) -> anyhow::Result<(Arc<dyn CredentialStore>, Arc<dyn AuditSink>)> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("メモリストアを使用（再起動でデータは消える）");
            let store: Arc<dyn CredentialStore> = Arc::new(InMemoryCredentialStore::new());
            let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);
            Ok((store, audit))
        }
        StoreBackend::Postgres => {
            let database_url = config.database_url.as_ref().ok_or_else(|| {
                tracing::error!("DATABASE_URL が未設定");
                anyhow::anyhow!("DATABASE_URL is required for the postgres store backend")
            })?;

            // データベース接続プール作成
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url.expose_secret())
                .await
                .map_err(|e| {
                    tracing::error!(error = ?e, "データベース接続に失敗");
                    anyhow::anyhow!("Failed to connect to database: {}", e)
                })?;

            sqlx::migrate!("./migrations")
                .run(&db_pool)
                .await
                .map_err(|e| {
                    tracing::error!(error = ?e, "マイグレーションに失敗");
                    anyhow::anyhow!("Failed to run migrations: {}", e)
                })?;

            tracing::info!("データベース接続完了");

            let store: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(db_pool.clone()));
            let audit: Arc<dyn AuditSink> = Arc::new(PgAuditSink::new(db_pool));
            Ok((store, audit))
        }
    }
}

/// Graceful shutdown シグナル待機
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?e, "Ctrl+C ハンドラーのインストールに失敗");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = ?e, "SIGTERM ハンドラーのインストールに失敗");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("SIGTERM received, starting graceful shutdown");
        }
    }
}
