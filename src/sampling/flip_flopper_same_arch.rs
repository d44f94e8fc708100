//! 双模型翻转采样节点
//!
//! 把全局去噪步数按分块在两套 模型/VAE/条件/采样器 配置之间交替执行,
//! 分块之间串行穿引 latent, 返回最终 latent 与末块活动侧的 VAE

use log::{debug, error, info};
use pyo3::{
    exceptions::PyRuntimeError,
    pyclass, pymethods,
    types::{PyDict, PyDictMethods, PyType},
    Bound, Py, PyAny, PyErr, PyResult, Python,
};

use crate::{
    core::category::CATEGORY_SAMPLING,
    error::Error,
    sampling::{
        flip_flop::{self, Sides},
        plan::{ChunkPlan, Invert, Toggle},
    },
    wrapper::{
        comfy::{
            ksampler::{KSamplerAdvanced, SampleRange},
            latent::LatentStats,
            samplers::{sampler_names, scheduler_names},
        },
        comfyui::{
            types::{
                NODE_CONDITIONING, NODE_FLOAT, NODE_INT, NODE_INT_MAX, NODE_LATENT, NODE_MODEL,
                NODE_VAE,
            },
            PromptServer,
        },
    },
};

/// 单侧配置
///
/// 运行期内不可变, 调度只在两侧之间选择; invert 在计划开始前
/// 通过 Sides::invert 一次性整体交换两条记录
struct SideConfig<'py> {
    model: Bound<'py, PyAny>,
    vae: Bound<'py, PyAny>,
    positive: Bound<'py, PyAny>,
    negative: Bound<'py, PyAny>,
    cfg: f64,
    sampler_name: String,
    scheduler: String,
}

/// 双模型翻转采样
#[pyclass(subclass)]
pub struct FlipFlopperSameArch {}

impl PromptServer for FlipFlopperSameArch {}

#[pymethods]
impl FlipFlopperSameArch {
    #[new]
    fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .try_init();
        Self {}
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() -> (&'static str, &'static str) {
        (NODE_LATENT, NODE_VAE)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str, &'static str) {
        ("LATENT", "FINAL_VAE")
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_SAMPLING;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Alternate two model/vae/conditioning/sampler setups across chunks of a single denoising run"
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "sample";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| {
            let samplers = sampler_names(py).map_err(to_py_err)?;
            let schedulers = scheduler_names(py).map_err(to_py_err)?;

            let dict = PyDict::new(py);
            dict.set_item("required", {
                let required = PyDict::new(py);
                required.set_item("model1", (NODE_MODEL, PyDict::new(py)))?;
                required.set_item("model2", (NODE_MODEL, PyDict::new(py)))?;
                required.set_item("vae1", (NODE_VAE, PyDict::new(py)))?;
                required.set_item("vae2", (NODE_VAE, PyDict::new(py)))?;
                required.set_item(
                    "add_noise",
                    (vec![Toggle::Enable.to_string(), Toggle::Disable.to_string()],),
                )?;
                required.set_item(
                    "noise_seed",
                    (NODE_INT, {
                        let noise_seed = PyDict::new(py);
                        noise_seed.set_item("default", 0)?;
                        noise_seed.set_item("min", 0)?;
                        noise_seed.set_item("max", NODE_INT_MAX)?;
                        noise_seed
                    }),
                )?;
                required.set_item(
                    "steps",
                    (NODE_INT, {
                        let steps = PyDict::new(py);
                        steps.set_item("default", 20)?;
                        steps.set_item("min", 1)?;
                        steps.set_item("max", 10000)?;
                        steps
                    }),
                )?;
                for key in ["cfg1", "cfg2"] {
                    required.set_item(
                        key,
                        (NODE_FLOAT, {
                            let cfg = PyDict::new(py);
                            cfg.set_item("default", 8.0)?;
                            cfg.set_item("min", 0.0)?;
                            cfg.set_item("max", 100.0)?;
                            cfg.set_item("step", 0.1)?;
                            cfg.set_item("round", 0.01)?;
                            cfg
                        }),
                    )?;
                }
                required.set_item("sampler_name1", (samplers.clone(),))?;
                required.set_item("sampler_name2", (samplers,))?;
                required.set_item("scheduler1", (schedulers.clone(),))?;
                required.set_item("scheduler2", (schedulers,))?;
                required.set_item("positive1", (NODE_CONDITIONING, PyDict::new(py)))?;
                required.set_item("negative1", (NODE_CONDITIONING, PyDict::new(py)))?;
                required.set_item("positive2", (NODE_CONDITIONING, PyDict::new(py)))?;
                required.set_item("negative2", (NODE_CONDITIONING, PyDict::new(py)))?;
                required.set_item("latent_image", (NODE_LATENT, PyDict::new(py)))?;
                required.set_item(
                    "denoise",
                    (NODE_FLOAT, {
                        let denoise = PyDict::new(py);
                        denoise.set_item("default", 1.0)?;
                        denoise.set_item("min", 0.0)?;
                        denoise.set_item("max", 1.0)?;
                        denoise.set_item("step", 0.01)?;
                        denoise
                    }),
                )?;
                required.set_item(
                    "chunks",
                    (NODE_INT, {
                        let chunks = PyDict::new(py);
                        chunks.set_item("default", 1)?;
                        chunks.set_item("min", 1)?;
                        chunks.set_item("max", 1000)?;
                        chunks.set_item("tooltip", "Number of steps sampled per chunk before switching sides")?;
                        chunks
                    }),
                )?;
                required.set_item(
                    "invert",
                    (vec![Invert::False.to_string(), Invert::True.to_string()], {
                        let invert = PyDict::new(py);
                        invert.set_item("tooltip", "Swap which setup plays side 1 vs side 2 before the run starts")?;
                        invert
                    }),
                )?;
                required
            })?;
            Ok(dict.into())
        })
    }

    #[allow(clippy::too_many_arguments)]
    #[pyo3(name = "sample")]
    fn sample<'py>(
        &mut self,
        py: Python<'py>,
        model1: Bound<'py, PyAny>,
        model2: Bound<'py, PyAny>,
        vae1: Bound<'py, PyAny>,
        vae2: Bound<'py, PyAny>,
        add_noise: String,
        noise_seed: u64,
        steps: u64,
        cfg1: f64,
        cfg2: f64,
        sampler_name1: String,
        sampler_name2: String,
        scheduler1: String,
        scheduler2: String,
        positive1: Bound<'py, PyAny>,
        negative1: Bound<'py, PyAny>,
        positive2: Bound<'py, PyAny>,
        negative2: Bound<'py, PyAny>,
        latent_image: Bound<'py, PyAny>,
        denoise: f64,
        chunks: u64,
        invert: String,
    ) -> PyResult<(Bound<'py, PyAny>, Bound<'py, PyAny>)> {
        let side1 = SideConfig {
            model: model1,
            vae: vae1,
            positive: positive1,
            negative: negative1,
            cfg: cfg1,
            sampler_name: sampler_name1,
            scheduler: scheduler1,
        };
        let side2 = SideConfig {
            model: model2,
            vae: vae2,
            positive: positive2,
            negative: negative2,
            cfg: cfg2,
            sampler_name: sampler_name2,
            scheduler: scheduler2,
        };

        // add_noise/denoise 为图兼容输入: 噪声开关由各分块自行推导,
        // denoise 不参与分块运算
        debug!("whole-run inputs: add_noise={add_noise}, denoise={denoise}");

        let results = self.flip_flop(py, side1, side2, noise_seed, steps, latent_image, chunks, &invert);

        match results {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("flip flop sampling error, {e}");
                if let Err(e) = self.send_error(py, "FLIP_FLOP_ERROR".to_string(), e.to_string()) {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

impl FlipFlopperSameArch {
    /// 按分块计划交替驱动 KSamplerAdvanced
    #[allow(clippy::too_many_arguments)]
    fn flip_flop<'py>(
        &self,
        py: Python<'py>,
        side1: SideConfig<'py>,
        side2: SideConfig<'py>,
        noise_seed: u64,
        steps: u64,
        latent_image: Bound<'py, PyAny>,
        chunks: u64,
        invert: &str,
    ) -> Result<(Bound<'py, PyAny>, Bound<'py, PyAny>), Error> {
        info!("initial latent shape: {}", LatentStats::shape(&latent_image)?);
        info!("initial latent stats: {}", LatentStats::read(&latent_image)?);

        let mut sides = Sides::new(side1, side2);
        if invert.parse::<Invert>()? == Invert::True {
            sides.invert();
        }

        let plan = ChunkPlan::new(steps, chunks)?;
        let num_iterations = plan.num_iterations();
        let ksampler = KSamplerAdvanced::new(py)?;

        let (latent, final_side) =
            flip_flop::run(&plan, &sides, latent_image, |step, config, latent| {
                info!(
                    "iteration {}/{}: side {:?}, steps {} to {}",
                    step.index + 1,
                    num_iterations,
                    step.side,
                    step.start_step,
                    step.end_step
                );
                info!(
                    "sampler: {}, scheduler: {}, cfg: {}, add_noise: {}, return_with_leftover_noise: {}",
                    config.sampler_name,
                    config.scheduler,
                    config.cfg,
                    step.add_noise,
                    step.return_with_leftover_noise
                );

                let add_noise = step.add_noise.to_string();
                let return_with_leftover_noise = step.return_with_leftover_noise.to_string();

                let out = ksampler.sample(
                    py,
                    &SampleRange {
                        model: &config.model,
                        add_noise: &add_noise,
                        noise_seed,
                        // 全局步数原样下发, 采样原语据此计算完整噪声日程,
                        // 本次调用只执行 [start_at_step, end_at_step) 窗口
                        steps: plan.total_steps(),
                        cfg: config.cfg,
                        sampler_name: &config.sampler_name,
                        scheduler: &config.scheduler,
                        positive: &config.positive,
                        negative: &config.negative,
                        latent_image: &latent,
                        start_at_step: step.start_step,
                        end_at_step: step.end_step,
                        return_with_leftover_noise: &return_with_leftover_noise,
                    },
                )?;

                info!(
                    "latent stats after iteration {}: {}",
                    step.index + 1,
                    LatentStats::read(&out)?
                );

                // 跨分块切换 VAE 只做句柄记账, 不对 latent 做 decode/re-encode:
                // 重新编码会截断 leftover noise, 破坏共享种子的去噪轨迹
                if step.index + 1 < num_iterations {
                    info!("vae handle switch after iteration {}, latent untouched", step.index + 1);
                }

                Ok::<_, Error>(out)
            })?;

        let final_vae = sides.active(final_side).vae.clone();
        info!("final latent stats: {}", LatentStats::read(&latent)?);

        Ok((latent, final_vae))
    }
}

fn to_py_err(e: Error) -> PyErr {
    PyErr::new::<PyRuntimeError, _>(e.to_string())
}
