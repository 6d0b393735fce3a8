//! Document Context - 内容树
//!
//! 与宿主无关的文档模型。宿主（浏览器扩展、HTML 解析器、测试）负责把自己的
//! 文档结构转换成 DocumentTree，收集器只依赖这里的能力描述。

mod eligibility;
mod node;

pub use eligibility::{EligibilityPolicy, DEFAULT_MIN_SEGMENT_LENGTH};
pub use node::{ContentNode, DocumentTree, ElementCategory, NodeCapabilities, NodeData, NodeId};
