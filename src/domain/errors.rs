//! Domain Errors

use thiserror::Error;

use super::document::NodeId;
use super::text::SegmentId;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("片段内容不能为空: {0}")]
    EmptySegment(SegmentId),

    #[error("无效的父节点: {0}")]
    InvalidParent(NodeId),

    #[error("文档解析错误: {0}")]
    DocumentParse(String),
}
