//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod html;
pub mod simplifier;

pub use html::*;
pub use simplifier::*;
