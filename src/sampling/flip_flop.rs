//! 翻转采样编排
//!
//! 在两套配置之间按分块交替驱动外部分段采样原语, latent 串行穿引:
//! 每次迭代消费上一次的输出, 不存在并行空间.
//! 对配置与 latent 类型保持泛型, 纯逻辑可脱离宿主测试

use crate::sampling::plan::{ChunkPlan, ChunkStep, Side};

/// A/B 两侧配置
///
/// invert 通过整体交换两条记录实现, 杜绝逐字段交换导致的半交换状态
#[derive(Debug, Clone)]
pub struct Sides<C> {
    a: C,
    b: C,
}

impl<C> Sides<C> {
    pub fn new(a: C, b: C) -> Self {
        Self { a, b }
    }

    /// 一次性整体交换两侧, 只允许在计划开始前调用
    pub fn invert(&mut self) {
        std::mem::swap(&mut self.a, &mut self.b);
    }

    pub fn active(&self, side: Side) -> &C {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }
}

/// 按计划顺序执行全部分块, 返回最终 latent 与末次迭代的活动侧
///
/// sample 闭包负责以活动侧配置调用外部采样原语;
/// 闭包返回的任何错误都会原样中止整个运行, 不重试, 不返回部分结果
pub fn run<C, L, E>(
    plan: &ChunkPlan,
    sides: &Sides<C>,
    initial: L,
    mut sample: impl FnMut(&ChunkStep, &C, L) -> Result<L, E>,
) -> Result<(L, Side), E> {
    let mut latent = initial;
    for step in plan.iter() {
        latent = sample(&step, sides.active(step.side), latent)?;
    }
    Ok((latent, plan.final_side()))
}
