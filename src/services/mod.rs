//! 服务层模块

pub mod fallback;
mod insight_service;
mod prompt_service;

pub use insight_service::InsightService;

#[cfg(test)]
pub(crate) use insight_service::tests::{MockGenerator, MockReply};
