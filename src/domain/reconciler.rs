//! 结果回填
//!
//! 把批量结果映射回原始 Segment：
//! - 单成员块直接回填
//! - 合并块优先按分隔符拆分（数量一致时逐一对应）
//! - 分隔符丢失时按成员原始长度比例切分，并记录一次不匹配
//!
//! 每个成员要么恰好被回填一次，要么恰好记录一次失败。

use serde::Serialize;
use thiserror::Error;

use super::text::{BatchEntry, CombinedChunk, EntryFailure, SegmentId, SEPARATOR};

/// 比例切分时向空白处吸附的最大距离（字符）
const SNAP_WINDOW: usize = 12;

/// 单个成员未能回填的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileFailure {
    #[error("{0}")]
    Entry(EntryFailure),

    #[error("Simplifier returned empty text")]
    EmptyResult,

    #[error("Proportional split produced an empty slice")]
    EmptySlice,

    #[error("No result for chunk")]
    MissingResult,
}

impl ReconcileFailure {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReconcileFailure::Entry(EntryFailure::Cancelled))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFailure {
    pub segment_id: SegmentId,
    pub reason: ReconcileFailure,
}

/// 分隔符不匹配记录（质量告警）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeparatorMismatch {
    pub chunk_index: usize,
    /// 期望的部分数（成员数）
    pub expected: usize,
    /// 实际拆出的非空部分数
    pub found: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub applied: usize,
    pub failures: Vec<SegmentFailure>,
    pub mismatches: Vec<SeparatorMismatch>,
}

impl ReconcileReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    fn fail_all(&mut self, chunk: &CombinedChunk, reason: ReconcileFailure) {
        self.failures
            .extend(chunk.member_ids().iter().map(|id| SegmentFailure {
                segment_id: *id,
                reason: reason.clone(),
            }));
    }
}

/// 回填结果
///
/// results 与 chunks 按下标对应；results 较短时，多出的块记为 MissingResult。
pub fn reconcile<F>(chunks: &[CombinedChunk], results: &[BatchEntry], mut apply: F) -> ReconcileReport
where
    F: FnMut(SegmentId, &str),
{
    let mut report = ReconcileReport::default();

    for (index, chunk) in chunks.iter().enumerate() {
        let text = match results.get(index) {
            None => {
                report.fail_all(chunk, ReconcileFailure::MissingResult);
                continue;
            }
            Some(BatchEntry::Failed(failure)) => {
                report.fail_all(chunk, ReconcileFailure::Entry(failure.clone()));
                continue;
            }
            Some(BatchEntry::Simplified(text)) => text.trim(),
        };

        if text.is_empty() {
            report.fail_all(chunk, ReconcileFailure::EmptyResult);
            continue;
        }

        let members = chunk.member_ids();
        if members.len() == 1 {
            apply(members[0], text);
            report.applied += 1;
            continue;
        }

        let parts: Vec<&str> = text
            .split(SEPARATOR)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        if parts.len() == members.len() {
            for (id, part) in members.iter().zip(parts) {
                apply(*id, part);
                report.applied += 1;
            }
            continue;
        }

        tracing::warn!(
            chunk_index = index,
            expected = members.len(),
            found = parts.len(),
            "Separator not preserved, falling back to proportional split"
        );
        report.mismatches.push(SeparatorMismatch {
            chunk_index: index,
            expected: members.len(),
            found: parts.len(),
        });

        let slices = proportional_split(text, chunk.member_lengths());
        for (id, slice) in members.iter().zip(slices) {
            if slice.is_empty() {
                report.failures.push(SegmentFailure {
                    segment_id: *id,
                    reason: ReconcileFailure::EmptySlice,
                });
            } else {
                apply(*id, &slice);
                report.applied += 1;
            }
        }
    }

    report
}

/// 按权重把文本切成 weights.len() 个连续片段
///
/// 切点按字符计算：理想位置为 round(n * 累计权重 / 总权重)，
/// 随后在 SNAP_WINDOW 内吸附到最近的空白（距离相同时取左侧），
/// 找不到空白则保留理想位置。每个片段去除首尾空白。
/// 权重全为 0 时按等权处理。结果只取决于输入。
pub fn proportional_split(text: &str, weights: &[usize]) -> Vec<String> {
    let k = weights.len();
    if k == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();

    let total: usize = weights.iter().sum();
    let (weights, total): (Vec<usize>, usize) = if total == 0 {
        (vec![1; k], k)
    } else {
        (weights.to_vec(), total)
    };

    let mut slices = Vec::with_capacity(k);
    let mut start = 0usize;
    let mut cumulative = 0usize;

    for (i, weight) in weights.iter().enumerate() {
        let end = if i + 1 == k {
            n
        } else {
            cumulative += weight;
            let ideal = (n * cumulative + total / 2) / total;
            // 给后续每个片段至少留一个字符
            let lo = (start + 1).min(n);
            let hi = n.saturating_sub(k - 1 - i).max(lo);
            snap_to_whitespace(&chars, ideal.clamp(lo, hi), lo, hi)
        };

        let slice: String = chars[start..end].iter().collect();
        slices.push(slice.trim().to_string());
        start = end;
    }

    slices
}

fn snap_to_whitespace(chars: &[char], ideal: usize, lo: usize, hi: usize) -> usize {
    let is_break = |pos: usize| chars.get(pos).is_some_and(|c| c.is_whitespace());

    for distance in 0..=SNAP_WINDOW {
        if let Some(left) = ideal.checked_sub(distance) {
            if left >= lo && is_break(left) {
                return left;
            }
        }
        let right = ideal + distance;
        if right <= hi && is_break(right) {
            return right;
        }
    }
    ideal
}
