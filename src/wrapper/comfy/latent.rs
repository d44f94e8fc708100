//! Latent 诊断统计
//!
//! 仅用于日志观测, 不参与调度逻辑

use std::fmt;

use pyo3::{types::PyAnyMethods, Bound, PyAny};

use crate::error::Error;

/// latent["samples"] 的 min/max/mean
#[derive(Debug, Clone, Copy)]
pub struct LatentStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl LatentStats {
    /// 从 comfyui 的 latent dict 读取统计信息
    pub fn read(latent: &Bound<'_, PyAny>) -> Result<Self, Error> {
        let samples = latent.get_item("samples")?;

        let min = samples.call_method0("min")?.call_method0("item")?;
        let max = samples.call_method0("max")?.call_method0("item")?;
        let mean = samples.call_method0("mean")?.call_method0("item")?;

        Ok(Self {
            min: min.extract::<f64>()?,
            max: max.extract::<f64>()?,
            mean: mean.extract::<f64>()?,
        })
    }

    /// latent["samples"].shape
    pub fn shape(latent: &Bound<'_, PyAny>) -> Result<String, Error> {
        let shape = latent.get_item("samples")?.getattr("shape")?;
        Ok(shape.to_string())
    }
}

impl fmt::Display for LatentStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "min={:.4}, max={:.4}, mean={:.4}",
            self.min, self.max, self.mean
        )
    }
}
