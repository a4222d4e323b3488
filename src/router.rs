use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    AppState,
    error::AppError,
    middleware::{RateLimiter, log_errors, rate_limit},
    routes,
};

/// CORS 允许的来源：配置值，未配置时为 `*`
pub fn allow_origin(configured: Option<&str>) -> AllowOrigin {
    match configured.map(HeaderValue::from_str) {
        Some(Ok(origin)) => AllowOrigin::exact(origin),
        Some(Err(_)) => {
            tracing::warn!("ALLOWED_ORIGIN is not a valid header value, allowing any origin");
            AllowOrigin::any()
        }
        None => AllowOrigin::any(),
    }
}

fn cors(origin: AllowOrigin, methods: [Method; 2]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers([CONTENT_TYPE])
}

// 路由存在但方法不匹配
async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

// 未匹配的路径
async fn not_found() -> AppError {
    AppError::NotFound
}

// 搜索路由，经过限流
fn search_routes(origin: AllowOrigin, limiter: Arc<RateLimiter>) -> Router<AppState> {
    Router::new()
        .route(
            "/search",
            post(routes::search::search).fallback(method_not_allowed),
        )
        .layer(axum::middleware::from_fn_with_state(limiter, rate_limit))
        .layer(cors(origin, [Method::POST, Method::OPTIONS]))
}

// 商家详情路由
fn business_routes(origin: AllowOrigin) -> Router<AppState> {
    Router::new()
        .route(
            "/business/{id}",
            get(routes::business::get_business).fallback(method_not_allowed),
        )
        .layer(cors(origin, [Method::GET, Method::OPTIONS]))
}

// 创建主路由
pub fn create_router(state: AppState, limiter: Arc<RateLimiter>) -> Router {
    let origin = allow_origin(state.config.allowed_origin.as_deref());

    let api = Router::new()
        .merge(search_routes(origin.clone(), limiter))
        .merge(business_routes(origin))
        .route("/ping", get(routes::ping::ping).fallback(method_not_allowed));

    let base = state.config.api_base_uri.trim_matches('/');
    let router = if base.is_empty() {
        api
    } else {
        Router::new().nest(&format!("/{base}"), api)
    };

    router
        .fallback(not_found)
        .layer(axum::middleware::from_fn(log_errors))
        .with_state(state)
}
