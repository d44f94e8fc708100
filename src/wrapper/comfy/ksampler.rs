//! KSamplerAdvanced Object for comfyui
//!

use pyo3::{
    types::{PyAnyMethods, PyDict, PyDictMethods, PyModule},
    Bound, PyAny, Python,
};

use crate::error::Error;

/// 单次分段采样的全部入参
///
/// steps 为全局步数, start_at_step/end_at_step 划定本次调用的步数窗口
pub struct SampleRange<'a, 'py> {
    pub model: &'a Bound<'py, PyAny>,
    pub add_noise: &'a str,
    pub noise_seed: u64,
    pub steps: u64,
    pub cfg: f64,
    pub sampler_name: &'a str,
    pub scheduler: &'a str,
    pub positive: &'a Bound<'py, PyAny>,
    pub negative: &'a Bound<'py, PyAny>,
    pub latent_image: &'a Bound<'py, PyAny>,
    pub start_at_step: u64,
    pub end_at_step: u64,
    pub return_with_leftover_noise: &'a str,
}

/// KSamplerAdvanced
#[derive(Debug)]
pub struct KSamplerAdvanced<'py> {
    sampler: Bound<'py, PyAny>,
}

impl<'py> KSamplerAdvanced<'py> {
    /// 实例化 comfyui 内置节点 nodes.KSamplerAdvanced
    pub fn new(py: Python<'py>) -> Result<Self, Error> {
        let sampler = PyModule::import(py, "nodes")?
            .getattr("KSamplerAdvanced")?
            .call0()?;
        Ok(Self { sampler })
    }

    /// Sample
    ///
    /// 宿主端返回 (latent,) 元组, 取第一个元素
    pub fn sample(
        &self,
        py: Python<'py>,
        range: &SampleRange<'_, 'py>,
    ) -> Result<Bound<'py, PyAny>, Error> {
        let kwargs = PyDict::new(py);
        kwargs.set_item("model", range.model)?;
        kwargs.set_item("add_noise", range.add_noise)?;
        kwargs.set_item("noise_seed", range.noise_seed)?;
        kwargs.set_item("steps", range.steps)?;
        kwargs.set_item("cfg", range.cfg)?;
        kwargs.set_item("sampler_name", range.sampler_name)?;
        kwargs.set_item("scheduler", range.scheduler)?;
        kwargs.set_item("positive", range.positive)?;
        kwargs.set_item("negative", range.negative)?;
        kwargs.set_item("latent_image", range.latent_image)?;
        kwargs.set_item("start_at_step", range.start_at_step)?;
        kwargs.set_item("end_at_step", range.end_at_step)?;
        kwargs.set_item("return_with_leftover_noise", range.return_with_leftover_noise)?;

        let result = self.sampler.call_method("sample", (), Some(&kwargs))?;
        let latent = result.get_item(0)?;
        Ok(latent)
    }
}
