//! comfy 内置节点/模块包装

pub mod ksampler;
pub mod latent;
pub mod samplers;
