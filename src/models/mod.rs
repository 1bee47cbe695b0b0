//! 数据模型

mod api;
mod insight;

pub use api::*;
pub use insight::*;
