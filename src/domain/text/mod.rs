//! Text Context - 待简化文本
//!
//! 职责:
//! - Segment: 从单个容器收集的原始文本
//! - CombinedChunk: 合并后的远程调用载荷
//! - BatchEntry: 单个载荷的简化结果

mod entities;
mod value_objects;

pub use entities::{BatchEntry, CombinedChunk, EntryFailure, Segment, SEPARATOR};
pub use value_objects::{Level, SegmentId, TargetLang};

pub(crate) use entities::char_len;
