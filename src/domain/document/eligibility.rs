//! 可简化判定
//!
//! 纯谓词函数，只看节点能力描述，不访问真实文档

use super::NodeCapabilities;
use crate::domain::text::char_len;

/// 默认最小片段字符数
/// 远程简化服务拒绝少于 10 个字符的文本，短于此值的片段不值得一次调用
pub const DEFAULT_MIN_SEGMENT_LENGTH: usize = 20;

/// 可简化判定策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityPolicy {
    /// 最小片段字符数（trim 后）
    pub min_segment_length: usize,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            min_segment_length: DEFAULT_MIN_SEGMENT_LENGTH,
        }
    }
}

impl EligibilityPolicy {
    pub fn new(min_segment_length: usize) -> Self {
        Self { min_segment_length }
    }

    /// 节点本身是否可参与简化
    ///
    /// 任一条件不满足即跳过整棵子树：
    /// 非正文类别、不可见、可编辑、已处理
    pub fn admits(&self, capabilities: &NodeCapabilities) -> bool {
        capabilities.category.is_content()
            && capabilities.visible
            && !capabilities.editable
            && !capabilities.processed
    }

    /// 文本长度是否达到下限
    pub fn admits_text(&self, text: &str) -> bool {
        char_len(text.trim()) >= self.min_segment_length
    }
}
