//! 节点注册表

use pyo3::{types::PyType, Bound};

/// 注册条目: (类名, 节点 class, 显示名称)
pub struct NodeRegister<'py>(
    pub &'static str,
    pub Bound<'py, PyType>,
    pub &'static str,
);
