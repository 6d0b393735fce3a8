//! Segment 收集器
//!
//! 单次深度优先（先序）遍历内容树：
//! 1. 跳过不可简化的节点及其整棵子树
//! 2. 每个非空文本节点归属到最近的块级祖先（容器）
//! 3. 每个容器只产生一个 Segment，内容为容器自身的文本
//!    （跨越行内标记，但不包含嵌套块级容器的文本，后者各自成段）
//!
//! 纯读取，无副作用；对同一棵树重复调用结果完全相同。

use std::collections::HashSet;

use super::document::{DocumentTree, EligibilityPolicy, NodeData, NodeId};
use super::text::{Segment, SegmentId};

/// 从内容树收集 Segment（文档顺序）
pub fn collect(tree: &DocumentTree, policy: &EligibilityPolicy) -> Vec<Segment> {
    let mut containers: Vec<NodeId> = Vec::new();
    let mut with_text: HashSet<NodeId> = HashSet::new();

    let mut stack: Vec<(NodeId, Option<NodeId>)> = vec![(tree.root(), None)];

    while let Some((id, container)) = stack.pop() {
        let Some(node) = tree.get(id) else { continue };

        match node.data() {
            NodeData::Element { capabilities, .. } => {
                if !policy.admits(capabilities) {
                    continue;
                }
                let container = if capabilities.category.is_container() {
                    containers.push(id);
                    Some(id)
                } else {
                    container
                };
                // 逆序入栈以保持先序
                for child in node.children().iter().rev() {
                    stack.push((*child, container));
                }
            }
            NodeData::Text(text) => {
                if let Some(container) = container {
                    if !text.trim().is_empty() {
                        with_text.insert(container);
                    }
                }
            }
        }
    }

    let segments: Vec<Segment> = containers
        .into_iter()
        .filter(|id| with_text.contains(id))
        .filter_map(|id| {
            let text = collapse_whitespace(&own_text(tree, id, policy));
            if !policy.admits_text(&text) {
                return None;
            }
            Segment::new(SegmentId::from_node(id), text).ok()
        })
        .collect();

    tracing::debug!(segments = segments.len(), "Segments collected");
    segments
}

/// 容器自身的文本：不进入不可简化的子树，也不进入嵌套的块级容器
///
/// 跳过的子树处补一个空格，两侧文本不会粘连
fn own_text(tree: &DocumentTree, container: NodeId, policy: &EligibilityPolicy) -> String {
    let mut out = String::new();
    let mut stack: Vec<NodeId> = match tree.get(container) {
        Some(node) => node.children().iter().rev().copied().collect(),
        None => return out,
    };

    while let Some(id) = stack.pop() {
        let Some(node) = tree.get(id) else { continue };
        match node.data() {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element { capabilities, .. } => {
                if policy.admits(capabilities) && !capabilities.category.is_container() {
                    stack.extend(node.children().iter().rev().copied());
                } else {
                    out.push(' ');
                }
            }
        }
    }

    out
}

/// 合并所有空白为单个空格
///
/// 保证 Segment 内部不会出现合并分隔符（\n\n）
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
