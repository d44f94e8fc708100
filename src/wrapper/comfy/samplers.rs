//! comfy.samplers 包装
//!
//! 采样器/调度器名称列表由宿主提供, 本地不做校验

use pyo3::{
    types::{PyAnyMethods, PyModule},
    Python,
};

use crate::error::Error;

/// comfy.samplers.KSampler.SAMPLERS
pub fn sampler_names(py: Python<'_>) -> Result<Vec<String>, Error> {
    let names = PyModule::import(py, "comfy.samplers")?
        .getattr("KSampler")?
        .getattr("SAMPLERS")?
        .extract::<Vec<String>>()?;
    Ok(names)
}

/// comfy.samplers.KSampler.SCHEDULERS
pub fn scheduler_names(py: Python<'_>) -> Result<Vec<String>, Error> {
    let names = PyModule::import(py, "comfy.samplers")?
        .getattr("KSampler")?
        .getattr("SCHEDULERS")?
        .extract::<Vec<String>>()?;
    Ok(names)
}
