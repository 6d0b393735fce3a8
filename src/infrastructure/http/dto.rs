//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::{FailureInfo, RunStatusResponse};
use crate::domain::SeparatorMismatch;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Simplify DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SimplifyDocumentRequest {
    pub session_id: String,
    pub html: String,
    /// de | en，缺省使用配置
    #[serde(default)]
    pub target_lang: Option<String>,
    /// very_easy | easy | medium，缺省使用配置
    #[serde(default)]
    pub level: Option<String>,
    /// 页面域名，原样写入进度事件
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SegmentDto {
    /// 容器节点在文档树中的 ID
    pub node_id: usize,
    pub original: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simplified: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FailureDto {
    pub segment_id: String,
    pub reason: String,
    pub cancelled: bool,
}

impl From<FailureInfo> for FailureDto {
    fn from(f: FailureInfo) -> Self {
        Self {
            segment_id: f.segment_id.to_string(),
            reason: f.reason,
            cancelled: f.cancelled,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SimplifyDocumentResponseDto {
    pub run_id: Uuid,
    pub status: String,
    pub succeeded: usize,
    pub failed: usize,
    pub chunk_count: usize,
    pub batch_count: usize,
    pub segments: Vec<SegmentDto>,
    pub failures: Vec<FailureDto>,
    pub mismatches: Vec<SeparatorMismatch>,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct CancelRunResponseDto {
    pub session_id: String,
    pub run_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RunStatusDto {
    pub session_id: String,
    pub run_id: Uuid,
    pub active: bool,
    pub cancel_requested: bool,
    pub percent: u8,
    pub completed_count: usize,
    pub total_count: usize,
    pub batches_completed: usize,
    pub total_batches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<f64>,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
}

impl From<RunStatusResponse> for RunStatusDto {
    fn from(r: RunStatusResponse) -> Self {
        Self {
            session_id: r.session_id,
            run_id: r.run_id,
            active: r.active,
            cancel_requested: r.cancel_requested,
            percent: r.percent,
            completed_count: r.completed_count,
            total_count: r.total_count,
            batches_completed: r.batches_completed,
            total_batches: r.total_batches,
            eta_seconds: r.eta_seconds,
            started_at: r.started_at,
            finished_at: r.finished_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SimplifierHealthDto {
    pub healthy: bool,
}
