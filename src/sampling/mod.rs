//! 采样

use pyo3::{
    types::{PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};

pub mod flip_flop;
pub mod plan;

mod flip_flopper_same_arch;
pub use flip_flopper_same_arch::FlipFlopperSameArch;

/// 采样模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "sampling")?;
    submodule.add_class::<FlipFlopperSameArch>()?;
    Ok(submodule)
}
