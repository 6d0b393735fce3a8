//! Simplification Commands - 简化运行相关命令

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::{DocumentTree, Level, Segment, SegmentId, SeparatorMismatch, TargetLang};

/// 运行简化命令
#[derive(Debug, Clone)]
pub struct RunSimplificationCommand {
    pub session_id: String,
    pub document: DocumentTree,
    pub target_lang: TargetLang,
    pub level: Level,
    /// 来源域名（仅用于进度事件）
    pub domain: Option<String>,
    /// 外部取消信号；为空时由运行自行创建
    pub cancel_token: Option<CancellationToken>,
}

impl RunSimplificationCommand {
    pub fn new(session_id: impl Into<String>, document: DocumentTree) -> Self {
        Self {
            session_id: session_id.into(),
            document,
            target_lang: TargetLang::default(),
            level: Level::default(),
            domain: None,
            cancel_token: None,
        }
    }
}

/// 运行退出状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitStatus {
    /// 全部简化成功
    Ok,
    /// 部分失败或出现分隔符不匹配
    Partial,
    Cancelled,
    /// 未收集到可简化的片段
    NoContent,
    /// 会话已有活跃运行
    AlreadyRunning,
}

impl ExitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitStatus::Ok => "ok",
            ExitStatus::Partial => "partial",
            ExitStatus::Cancelled => "cancelled",
            ExitStatus::NoContent => "no-content",
            ExitStatus::AlreadyRunning => "already-running",
        }
    }
}

/// 单个片段失败信息
#[derive(Debug, Clone, Serialize)]
pub struct FailureInfo {
    pub segment_id: SegmentId,
    pub reason: String,
    pub cancelled: bool,
}

/// 运行结果汇总
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub status: ExitStatus,
    pub succeeded: usize,
    pub failed: usize,
    pub segment_count: usize,
    pub chunk_count: usize,
    pub batch_count: usize,
    pub mismatches: Vec<SeparatorMismatch>,
    pub failures: Vec<FailureInfo>,
    /// 收集到的原始片段（文档顺序）
    pub segments: Vec<Segment>,
}

/// 取消运行命令
#[derive(Debug, Clone)]
pub struct CancelRunCommand {
    pub session_id: String,
}

/// 取消运行响应
#[derive(Debug, Clone)]
pub struct CancelRunResponse {
    pub session_id: String,
    pub run_id: Uuid,
}
