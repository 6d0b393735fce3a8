//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::application::ports::{ProgressEvent, ProgressReporterPort};
use crate::application::RunSummary;

const CHANNEL_CAPACITY: usize = 100;

/// WebSocket 事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum WsEvent {
    /// 运行进度
    Progress(ProgressEvent),
    /// 运行结束（含汇总）
    RunCompleted {
        session_id: String,
        run_id: Uuid,
        status: String,
        succeeded: usize,
        failed: usize,
    },
    /// 取消请求已受理
    RunCancelRequested { session_id: String, run_id: Uuid },
}

/// 事件发布器
pub struct EventPublisher {
    /// session_id -> broadcast sender
    session_channels: DashMap<String, broadcast::Sender<WsEvent>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            session_channels: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 注册会话的事件通道
    pub fn register_session(&self, session_id: &str) -> broadcast::Receiver<WsEvent> {
        self.session_channels
            .entry(session_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// 取消注册会话（仍有订阅者时保留）
    pub fn unregister_session(&self, session_id: &str) {
        self.session_channels
            .remove_if(session_id, |_, sender| sender.receiver_count() == 0);
    }

    /// 获取会话的事件接收器
    pub fn subscribe(&self, session_id: &str) -> Option<broadcast::Receiver<WsEvent>> {
        self.session_channels.get(session_id).map(|s| s.subscribe())
    }

    /// 发布进度事件
    pub fn publish_progress(&self, event: &ProgressEvent) {
        self.publish_to_session(&event.session_id, WsEvent::Progress(event.clone()));
    }

    /// 发布运行结束事件
    pub fn publish_run_completed(&self, session_id: &str, summary: &RunSummary) {
        self.publish_to_session(
            session_id,
            WsEvent::RunCompleted {
                session_id: session_id.to_string(),
                run_id: summary.run_id,
                status: summary.status.as_str().to_string(),
                succeeded: summary.succeeded,
                failed: summary.failed,
            },
        );
    }

    /// 发布取消请求事件
    pub fn publish_cancel_requested(&self, session_id: &str, run_id: Uuid) {
        self.publish_to_session(
            session_id,
            WsEvent::RunCancelRequested {
                session_id: session_id.to_string(),
                run_id,
            },
        );
    }

    /// 发布事件到指定会话
    fn publish_to_session(&self, session_id: &str, event: WsEvent) {
        if let Some(sender) = self.session_channels.get(session_id) {
            if let Err(e) = sender.send(event) {
                tracing::debug!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to publish event (no receivers)"
                );
            }
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporterPort for EventPublisher {
    fn report(&self, event: &ProgressEvent) {
        self.publish_progress(event);
    }
}
