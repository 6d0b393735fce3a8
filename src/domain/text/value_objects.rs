//! Text Context - Value Objects

use serde::{Deserialize, Serialize};

use crate::domain::document::NodeId;

/// Segment 唯一标识
///
/// 取值为产生该 Segment 的容器节点 ID，因此同一容器最多产生一个 Segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(NodeId);

impl SegmentId {
    pub fn from_node(node: NodeId) -> Self {
        Self(node)
    }

    pub fn node(&self) -> NodeId {
        self.0
    }
}

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "seg-{}", self.0.index())
    }
}

/// 目标语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLang {
    #[default]
    De,
    En,
}

impl TargetLang {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetLang::De => "de",
            TargetLang::En => "en",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "de" => Some(TargetLang::De),
            "en" => Some(TargetLang::En),
            _ => None,
        }
    }
}

/// 简化等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// 极短句（8-10 词），解释所有生僻词
    VeryEasy,
    /// 短句（12-15 词），结构清晰
    #[default]
    Easy,
    /// 普通句长的平实语言
    Medium,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::VeryEasy => "very_easy",
            Level::Easy => "easy",
            Level::Medium => "medium",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "very_easy" => Some(Level::VeryEasy),
            "easy" => Some(Level::Easy),
            "medium" => Some(Level::Medium),
            _ => None,
        }
    }
}
