//! Simplifier Adapter - 简化服务客户端实现

mod caching_simplifier;
mod fake_simplifier_client;
mod http_simplifier_client;

pub use caching_simplifier::CachingSimplifier;
pub use fake_simplifier_client::{FakeSimplifierClient, FakeTransform};
pub use http_simplifier_client::*;
