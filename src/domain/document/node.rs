//! Document Context - Nodes

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// 节点 ID（在 DocumentTree 中的插入下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 元素类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementCategory {
    /// 块级容器（p、li、h1 ...），Segment 的归属单位
    Block,
    /// 行内标记（b、a、span ...），文本归属到最近的块级祖先
    Inline,
    Script,
    Style,
    FormControl,
    Media,
    /// 导航类结构区域（nav、header、footer ...）
    Navigation,
    Code,
    /// 文档元数据（head、title、meta ...）
    Metadata,
}

impl ElementCategory {
    /// 是否承载正文内容
    pub fn is_content(&self) -> bool {
        matches!(self, ElementCategory::Block | ElementCategory::Inline)
    }

    pub fn is_container(&self) -> bool {
        matches!(self, ElementCategory::Block)
    }
}

/// 节点能力描述 - 判定是否可简化所需的全部信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeCapabilities {
    pub category: ElementCategory,
    pub visible: bool,
    pub editable: bool,
    /// 已带有"已处理"标记
    pub processed: bool,
}

impl NodeCapabilities {
    pub const fn of(category: ElementCategory) -> Self {
        Self {
            category,
            visible: true,
            editable: false,
            processed: false,
        }
    }

    pub const fn block() -> Self {
        Self::of(ElementCategory::Block)
    }

    pub const fn inline() -> Self {
        Self::of(ElementCategory::Inline)
    }

    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub const fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub const fn processed(mut self) -> Self {
        self.processed = true;
        self
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Element {
        tag: String,
        capabilities: NodeCapabilities,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub struct ContentNode {
    id: NodeId,
    parent: Option<NodeId>,
    data: NodeData,
    children: Vec<NodeId>,
}

impl ContentNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn capabilities(&self) -> Option<&NodeCapabilities> {
        match &self.data {
            NodeData::Element { capabilities, .. } => Some(capabilities),
            NodeData::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(text) => Some(text),
            NodeData::Element { .. } => None,
        }
    }
}

/// 内容树（arena 存储）
///
/// 根节点总是一个元素节点，ID 为 0。子节点按追加顺序即文档顺序。
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: Vec<ContentNode>,
}

impl DocumentTree {
    pub fn new(root_tag: impl Into<String>, capabilities: NodeCapabilities) -> Self {
        Self {
            nodes: vec![ContentNode {
                id: NodeId(0),
                parent: None,
                data: NodeData::Element {
                    tag: root_tag.into(),
                    capabilities,
                },
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> Option<&ContentNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 追加元素子节点
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: impl Into<String>,
        capabilities: NodeCapabilities,
    ) -> Result<NodeId, DomainError> {
        self.append(
            parent,
            NodeData::Element {
                tag: tag.into(),
                capabilities,
            },
        )
    }

    /// 追加文本子节点
    pub fn append_text(
        &mut self,
        parent: NodeId,
        text: impl Into<String>,
    ) -> Result<NodeId, DomainError> {
        self.append(parent, NodeData::Text(text.into()))
    }

    fn append(&mut self, parent: NodeId, data: NodeData) -> Result<NodeId, DomainError> {
        let id = NodeId(self.nodes.len());
        match self.nodes.get_mut(parent.0) {
            Some(node) if matches!(node.data, NodeData::Element { .. }) => {
                node.children.push(id);
            }
            _ => return Err(DomainError::InvalidParent(parent)),
        }
        self.nodes.push(ContentNode {
            id,
            parent: Some(parent),
            data,
            children: Vec::new(),
        });
        Ok(id)
    }
}
