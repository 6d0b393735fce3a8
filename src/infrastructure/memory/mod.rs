//! Memory Layer - In-Memory State Management
//!
//! 实现 RunRegistry，管理每个会话简化运行的内存状态

mod run_registry;

pub use run_registry::InMemoryRunRegistry;
