//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod run_handlers;

pub use run_handlers::*;
