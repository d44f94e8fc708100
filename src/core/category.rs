//! 节点分类

/// 采样
pub const CATEGORY_SAMPLING: &str = "CalbeNodes/Sampling";
