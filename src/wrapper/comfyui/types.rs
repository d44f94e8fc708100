//! 类型定义
//! 相关节点定义: ComfyUI/comfy/comfy_types/node_typing.py

pub const NODE_INT: &str = "INT";
pub const NODE_FLOAT: &str = "FLOAT";
pub const NODE_MODEL: &str = "MODEL";
pub const NODE_VAE: &str = "VAE";
pub const NODE_CONDITIONING: &str = "CONDITIONING";
pub const NODE_LATENT: &str = "LATENT";

pub const NODE_INT_MAX: u64 = 0xffffffffffffffffu64;
