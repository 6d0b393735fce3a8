//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                  GET   健康检查
//! - /api/simplifier/health     GET   远程简化服务健康检查
//! - /api/simplify/document     POST  简化整页 HTML（同步返回汇总）
//! - /api/simplify/cancel       POST  取消会话的活跃运行
//! - /api/simplify/status       POST  查询会话最近一次运行
//! - /ws/session/{id}           WS    Session WebSocket（进度事件）

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/session/:session_id", get(handlers::websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/simplifier/health", get(handlers::simplifier_health))
        .nest("/simplify", simplify_routes())
}

/// Simplify 路由
fn simplify_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/document", post(handlers::simplify_document))
        .route("/cancel", post(handlers::cancel_run))
        .route("/status", post(handlers::run_status))
}
