use axum::{Json, response::IntoResponse};
use serde::Serialize;

/// Ping响应
#[derive(Serialize)]
pub struct PingResponse {
    /// 服务状态
    pub status: &'static str,
    /// 服务器时间
    pub timestamp: i64,
}

/// 健康检查接口
pub async fn ping() -> impl IntoResponse {
    Json(PingResponse {
        status: "ok",
        timestamp: chrono::Utc::now().timestamp(),
    })
}
