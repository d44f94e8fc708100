use pyo3::{
    pymodule,
    types::{PyDict, PyDictMethods, PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};

pub mod core;
pub mod error;
pub mod register;
pub mod sampling;
pub mod wrapper;

use crate::core::node::NodeRegister;

/// A Python module implemented in Rust.
#[pymodule]
#[pyo3(name = "ComfyUI_CalbeNodes")] // 需要与包名保持一致
fn py_init(py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_submodule(&sampling::submodule(py)?)?;

    // 注册 ComfyUI NODE_CLASS_MAPPINGS/NODE_DISPLAY_NAME_MAPPINGS
    let node_mapping = PyDict::new(py);
    let name_mapping = PyDict::new(py);
    for NodeRegister(name, node, display_name) in register::node_register(py)? {
        node_mapping.set_item(name, node)?;
        name_mapping.set_item(name, display_name)?;
    }

    m.add("NODE_CLASS_MAPPINGS", node_mapping)?;
    m.add("NODE_DISPLAY_NAME_MAPPINGS", name_mapping)?;
    Ok(())
}
