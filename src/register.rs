//! 节点注册
//!
//! 显式静态注册表: 新节点在此登记, 不做目录扫描

use pyo3::{PyResult, Python};

use crate::{core::node::NodeRegister, sampling::FlipFlopperSameArch};

pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![
        // sampling
        NodeRegister(
            "FlipFlopperSameArch",
            py.get_type::<FlipFlopperSameArch>(),
            "Flip Flopper Same Arch",
        ),
    ];
    Ok(nodes)
}
