//! Run Queries - 运行状态查询

use uuid::Uuid;

/// 查询会话运行状态
#[derive(Debug, Clone)]
pub struct GetRunStatusQuery {
    pub session_id: String,
}

/// 运行状态响应
#[derive(Debug, Clone)]
pub struct RunStatusResponse {
    pub session_id: String,
    pub run_id: Uuid,
    pub active: bool,
    pub cancel_requested: bool,
    pub percent: u8,
    pub completed_count: usize,
    pub total_count: usize,
    pub batches_completed: usize,
    pub total_batches: usize,
    pub eta_seconds: Option<f64>,
    pub started_at: String,
    pub finished_at: Option<String>,
}
