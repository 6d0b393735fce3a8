//! Text Context - Entities

use serde::Serialize;
use thiserror::Error;

use super::SegmentId;
use crate::domain::DomainError;

/// 合并片段时使用的固定分隔符
pub const SEPARATOR: &str = "\n\n";

const SEPARATOR_LEN: usize = 2;

/// 字符数（Unicode scalar），所有长度限制都按字符计算
#[inline]
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 文本片段 - 最小简化单位
///
/// 不变量:
/// - original_text 已 trim 且不为空
/// - 每个容器节点最多对应一个 Segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    id: SegmentId,
    original_text: String,
    #[serde(skip)]
    char_len: usize,
}

impl Segment {
    pub fn new(id: SegmentId, text: impl Into<String>) -> Result<Self, DomainError> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptySegment(id));
        }
        let original_text = trimmed.to_string();
        Ok(Self {
            id,
            char_len: char_len(&original_text),
            original_text,
        })
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn char_len(&self) -> usize {
        self.char_len
    }
}

/// 合并后的片段 - 一次远程调用中的单个文本
///
/// 不变量: sum(member_lengths) + 分隔符长度 * (成员数 - 1) == char_len
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedChunk {
    member_ids: Vec<SegmentId>,
    combined_text: String,
    member_lengths: Vec<usize>,
    char_len: usize,
}

impl CombinedChunk {
    /// 以单个 Segment 开始一个新的合并块
    pub fn single(segment: &Segment) -> Self {
        Self {
            member_ids: vec![segment.id()],
            combined_text: segment.original_text().to_string(),
            member_lengths: vec![segment.char_len()],
            char_len: segment.char_len(),
        }
    }

    /// 追加一个成员（以分隔符连接）
    pub fn push(&mut self, segment: &Segment) {
        self.combined_text.push_str(SEPARATOR);
        self.combined_text.push_str(segment.original_text());
        self.member_ids.push(segment.id());
        self.member_lengths.push(segment.char_len());
        self.char_len += SEPARATOR_LEN + segment.char_len();
    }

    /// 追加指定长度的成员后的总长度
    pub fn len_with(&self, member_len: usize) -> usize {
        self.char_len + SEPARATOR_LEN + member_len
    }

    pub fn member_ids(&self) -> &[SegmentId] {
        &self.member_ids
    }

    pub fn combined_text(&self) -> &str {
        &self.combined_text
    }

    pub fn member_lengths(&self) -> &[usize] {
        &self.member_lengths
    }

    pub fn member_count(&self) -> usize {
        self.member_ids.len()
    }

    pub fn char_len(&self) -> usize {
        self.char_len
    }

    pub fn is_combined(&self) -> bool {
        self.member_ids.len() > 1
    }
}

/// 单个载荷失败的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryFailure {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    Service(String),

    #[error("Rejected by simplifier: {0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Chunk too long: {0} chars")]
    ChunkTooLong(usize),

    #[error("Cancelled")]
    Cancelled,
}

/// 批量结果中的单个条目，与请求中的文本按下标一一对应
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEntry {
    Simplified(String),
    Failed(EntryFailure),
}

impl BatchEntry {
    pub fn is_success(&self) -> bool {
        matches!(self, BatchEntry::Simplified(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BatchEntry::Failed(EntryFailure::Cancelled))
    }
}
