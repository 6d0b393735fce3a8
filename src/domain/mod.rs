//! Domain Layer - 领域层
//!
//! 纯同步逻辑，不依赖网络与时间:
//! - document: 内容树模型与可简化判定
//! - text: Segment / CombinedChunk / BatchEntry 等核心类型
//! - collector: 从内容树收集 Segment
//! - chunk_optimizer: 小片段合并（smart batching）
//! - reconciler: 批量结果回填到原始 Segment

pub mod document;
pub mod text;

mod chunk_optimizer;
mod collector;
mod errors;
mod reconciler;

pub use chunk_optimizer::{
    optimize, ChunkLimits, DEFAULT_MAX_CHUNK_LENGTH, DEFAULT_TARGET_CHUNK_LENGTH,
};
pub use collector::collect;
pub use document::{
    DocumentTree, EligibilityPolicy, ElementCategory, NodeCapabilities, NodeId,
    DEFAULT_MIN_SEGMENT_LENGTH,
};
pub use errors::DomainError;
pub use reconciler::{
    proportional_split, reconcile, ReconcileFailure, ReconcileReport, SegmentFailure,
    SeparatorMismatch,
};
pub use text::{
    BatchEntry, CombinedChunk, EntryFailure, Level, Segment, SegmentId, TargetLang, SEPARATOR,
};
