//! 合并优化器
//!
//! 贪心单遍扫描，把相邻的短 Segment 合并成 CombinedChunk 以减少远程调用次数。
//! 目标是线性时间和稳定的输出顺序，而不是最少的块数。
//!
//! 规则：
//! - 长度超过 target 的 Segment 独立成块（先输出累积块）
//! - 累积块非空且追加后不超过 max 时追加
//! - 否则输出累积块，以当前 Segment 开始新的累积块

use serde::{Deserialize, Serialize};

use super::text::{CombinedChunk, Segment};

pub const DEFAULT_TARGET_CHUNK_LENGTH: usize = 1500;

/// 远程服务单个文本的字符上限
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 5000;

/// 合并长度限制（字符数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkLimits {
    /// 超过此长度的 Segment 不参与合并
    pub target_size: usize,
    /// 合并块的硬上限
    pub max_size: usize,
}

impl Default for ChunkLimits {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_CHUNK_LENGTH,
            max_size: DEFAULT_MAX_CHUNK_LENGTH,
        }
    }
}

impl ChunkLimits {
    pub fn new(target_size: usize, max_size: usize) -> Self {
        Self {
            target_size,
            max_size,
        }
    }

    fn effective_target(&self) -> usize {
        self.target_size.min(self.max_size)
    }
}

/// 合并 Segment
///
/// 每个输入 Segment 恰好出现在一个输出块中，顺序不变。
///
/// 输出块长度不超过 max_size，唯一例外：本身超过 max_size 的 Segment
/// 独立成一个单成员块（长度即该 Segment 长度），由分发器以 ChunkTooLong
/// 拒绝发送。合并块（多成员）总是满足上限。
pub fn optimize(segments: &[Segment], limits: &ChunkLimits) -> Vec<CombinedChunk> {
    let target = limits.effective_target();
    let mut chunks: Vec<CombinedChunk> = Vec::with_capacity(segments.len());
    let mut acc: Option<CombinedChunk> = None;

    for segment in segments {
        if segment.char_len() > target {
            chunks.extend(acc.take());
            chunks.push(CombinedChunk::single(segment));
            continue;
        }

        match acc.as_mut() {
            Some(current) if current.len_with(segment.char_len()) <= limits.max_size => {
                current.push(segment);
            }
            _ => {
                chunks.extend(acc.take());
                acc = Some(CombinedChunk::single(segment));
            }
        }
    }
    chunks.extend(acc);

    tracing::debug!(
        segments = segments.len(),
        chunks = chunks.len(),
        target_size = limits.target_size,
        max_size = limits.max_size,
        "Segments combined"
    );

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::NodeId;
    use crate::domain::text::SegmentId;

    fn segment(index: usize, len: usize) -> Segment {
        let text: String = "abcdefghij".chars().cycle().take(len).collect();
        Segment::new(SegmentId::from_node(NodeId::new(index)), text).unwrap()
    }

    fn flatten(chunks: &[CombinedChunk]) -> Vec<SegmentId> {
        chunks
            .iter()
            .flat_map(|c| c.member_ids().iter().copied())
            .collect()
    }

    /// 线性同余生成器，保证测试输入可复现
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: usize) -> usize {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((self.0 >> 33) as usize) % bound
        }
    }

    #[test]
    fn test_small_segments_are_combined() {
        let segments = vec![segment(1, 40), segment(2, 40), segment(3, 40)];
        let chunks = optimize(&segments, &ChunkLimits::new(100, 200));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].member_count(), 3);
        assert_eq!(chunks[0].char_len(), 40 * 3 + 2 * 2);
    }

    #[test]
    fn test_long_segment_flushes_and_stands_alone() {
        let segments = vec![segment(1, 40), segment(2, 150), segment(3, 40), segment(4, 40)];
        let chunks = optimize(&segments, &ChunkLimits::new(100, 200));

        let sizes: Vec<usize> = chunks.iter().map(|c| c.member_count()).collect();
        assert_eq!(sizes, vec![1, 1, 2]);
        assert_eq!(chunks[1].member_ids()[0], segments[1].id());
    }

    #[test]
    fn test_max_size_starts_new_chunk() {
        // 90 + 2 + 90 = 182 <= 200，再追加则超出
        let segments = vec![segment(1, 90), segment(2, 90), segment(3, 90)];
        let chunks = optimize(&segments, &ChunkLimits::new(100, 200));

        let sizes: Vec<usize> = chunks.iter().map(|c| c.member_count()).collect();
        assert_eq!(sizes, vec![2, 1]);
    }

    #[test]
    fn test_oversized_segment_kept_alone() {
        let segments = vec![segment(1, 30), segment(2, 300), segment(3, 30)];
        let chunks = optimize(&segments, &ChunkLimits::new(100, 200));

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].char_len(), 300);
        assert_eq!(flatten(&chunks), segments.iter().map(|s| s.id()).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_input() {
        assert!(optimize(&[], &ChunkLimits::default()).is_empty());
    }

    #[test]
    fn test_order_bound_and_exactly_once() {
        let mut rng = Lcg(42);
        for round in 0..50 {
            let limits = ChunkLimits::new(20 + rng.next(200), 250 + rng.next(500));
            let count = rng.next(80);
            // 约十分之一的 Segment 超过 max_size
            let segments: Vec<Segment> = (0..count)
                .map(|i| {
                    let len = if rng.next(10) == 0 {
                        limits.max_size + 1 + rng.next(100)
                    } else {
                        1 + rng.next(limits.max_size)
                    };
                    segment(round * 1000 + i, len)
                })
                .collect();

            let chunks = optimize(&segments, &limits);

            let expected: Vec<SegmentId> = segments.iter().map(|s| s.id()).collect();
            assert_eq!(flatten(&chunks), expected);

            for chunk in &chunks {
                // 超限的只能是单个超长 Segment
                if chunk.is_combined() {
                    assert!(chunk.char_len() <= limits.max_size);
                }
                assert_eq!(chunk.char_len(), chunk.combined_text().chars().count());
            }

            for segment in segments.iter().filter(|s| s.char_len() > limits.max_size) {
                assert!(chunks
                    .iter()
                    .any(|c| c.member_ids() == [segment.id()].as_slice()));
            }
        }
    }
}
