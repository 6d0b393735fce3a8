//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod simplify_handlers;

pub use simplify_handlers::*;
