use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use locallens::{
    AppState,
    cache::{MemoryRateLimitStore, RateLimitStore, RedisRateLimitStore},
    config::Config,
    create_router,
    middleware::RateLimiter,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::debug!(?config, "configuration loaded");

    if config.upstream_credentials().is_err() {
        tracing::warn!("Upstream API credentials are not configured; search requests will fail");
    }

    // 选择限流存储
    let store: Arc<dyn RateLimitStore> = match config.redis_url.as_deref() {
        Some(url) => {
            tracing::info!("Using Redis rate limit store");
            Arc::new(RedisRateLimitStore::open(url).expect("Failed to create Redis client"))
        }
        None => {
            tracing::info!("Using in-memory rate limit store");
            Arc::new(MemoryRateLimitStore::new())
        }
    };

    // 设置限流器
    let rate_limiter = Arc::new(RateLimiter::new(store, &config));
    let _sweeper = rate_limiter.clone().spawn_sweeper();

    // 设置应用状态
    let state = AppState::new(config).expect("Failed to build upstream HTTP client");
    let app = create_router(state.clone(), rate_limiter);

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
