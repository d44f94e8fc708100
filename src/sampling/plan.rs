//! 分段采样计划
//!
//! 把全局去噪步数切分为连续分块, 每个分块由 A/B 两侧之一驱动.
//! 本模块只做整数调度运算, 不依赖宿主

use strum_macros::{Display, EnumString};

use crate::error::Error;

/// enable/disable 开关, comfyui 以字符串传递
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Toggle {
    Enable,
    Disable,
}

/// invert 开关, 前端以 "false"/"true" 字符串传递
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Invert {
    False,
    True,
}

/// 交替双侧
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// 固定交替: 偶数迭代走 A 侧, 奇数迭代走 B 侧
    fn of_iteration(index: u64) -> Self {
        if index % 2 == 0 {
            Side::A
        } else {
            Side::B
        }
    }
}

/// 单次迭代的调度参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkStep {
    pub index: u64,
    pub side: Side,
    pub start_step: u64,
    pub end_step: u64,
    pub add_noise: Toggle,
    pub return_with_leftover_noise: Toggle,
}

/// 全程分块计划
///
/// 迭代区间首尾相接, 恰好覆盖 [0, total_steps), 末块允许不满
#[derive(Debug, Clone, Copy)]
pub struct ChunkPlan {
    total_steps: u64,
    chunk_size: u64,
    num_iterations: u64,
}

impl ChunkPlan {
    pub fn new(total_steps: u64, chunk_size: u64) -> Result<Self, Error> {
        if total_steps < 1 {
            return Err(Error::InvalidParameter(format!(
                "steps must be >= 1, got {total_steps}"
            )));
        }
        if chunk_size < 1 {
            return Err(Error::InvalidParameter(format!(
                "chunks must be >= 1, got {chunk_size}"
            )));
        }

        Ok(Self {
            total_steps,
            chunk_size,
            num_iterations: total_steps.div_ceil(chunk_size),
        })
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn num_iterations(&self) -> u64 {
        self.num_iterations
    }

    /// 末次迭代的活动侧, 决定返回哪个 VAE
    pub fn final_side(&self) -> Side {
        Side::of_iteration(self.num_iterations - 1)
    }

    /// 第 index 次迭代的调度参数
    ///
    /// 噪声只在整个运行的第 0 次迭代注入一次; 除末次迭代外,
    /// 每次都保留剩余噪声, 供下一分块沿同一轨迹继续去噪
    pub fn step(&self, index: u64) -> ChunkStep {
        let add_noise = if index == 0 {
            Toggle::Enable
        } else {
            Toggle::Disable
        };
        let return_with_leftover_noise = if index == self.num_iterations - 1 {
            Toggle::Disable
        } else {
            Toggle::Enable
        };

        ChunkStep {
            index,
            side: Side::of_iteration(index),
            start_step: index * self.chunk_size,
            end_step: ((index + 1) * self.chunk_size).min(self.total_steps),
            add_noise,
            return_with_leftover_noise,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = ChunkStep> + '_ {
        (0..self.num_iterations).map(|index| self.step(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_iterations_ceil() -> anyhow::Result<()> {
        assert_eq!(ChunkPlan::new(10, 3)?.num_iterations(), 4);
        assert_eq!(ChunkPlan::new(10, 5)?.num_iterations(), 2);
        assert_eq!(ChunkPlan::new(10, 10)?.num_iterations(), 1);
        assert_eq!(ChunkPlan::new(5, 100)?.num_iterations(), 1);
        assert_eq!(ChunkPlan::new(1, 1)?.num_iterations(), 1);
        Ok(())
    }

    #[test]
    fn test_ranges_tile_total_steps() -> anyhow::Result<()> {
        for (steps, chunks) in [(1, 1), (10, 3), (20, 7), (25, 10), (5, 100), (9, 3), (7, 2)] {
            let plan = ChunkPlan::new(steps, chunks)?;
            let mut expected_start = 0;
            for step in plan.iter() {
                assert_eq!(step.start_step, expected_start, "{steps}/{chunks}");
                assert!(step.end_step > step.start_step, "{steps}/{chunks}");
                assert!(step.end_step <= steps, "{steps}/{chunks}");
                expected_start = step.end_step;
            }
            assert_eq!(expected_start, steps, "{steps}/{chunks}");
        }
        Ok(())
    }

    #[test]
    fn test_noise_flags() -> anyhow::Result<()> {
        let plan = ChunkPlan::new(20, 7)?;
        let steps: Vec<ChunkStep> = plan.iter().collect();

        let noised: Vec<u64> = steps
            .iter()
            .filter(|s| s.add_noise == Toggle::Enable)
            .map(|s| s.index)
            .collect();
        assert_eq!(noised, vec![0]);

        let fully_denoised: Vec<u64> = steps
            .iter()
            .filter(|s| s.return_with_leftover_noise == Toggle::Disable)
            .map(|s| s.index)
            .collect();
        assert_eq!(fully_denoised, vec![plan.num_iterations() - 1]);
        Ok(())
    }

    #[test]
    fn test_sides_alternate() -> anyhow::Result<()> {
        let plan = ChunkPlan::new(50, 7)?;
        for step in plan.iter() {
            let expected = if step.index % 2 == 0 { Side::A } else { Side::B };
            assert_eq!(step.side, expected);
        }
        Ok(())
    }

    #[test]
    fn test_partial_last_chunk() -> anyhow::Result<()> {
        // 20 步 / 每块 7 步: [0,7) [7,14) [14,20), 末块只有 6 步
        let plan = ChunkPlan::new(20, 7)?;
        let ranges: Vec<(u64, u64)> = plan.iter().map(|s| (s.start_step, s.end_step)).collect();
        assert_eq!(ranges, vec![(0, 7), (7, 14), (14, 20)]);
        Ok(())
    }

    #[test]
    fn test_single_chunk_covers_everything() -> anyhow::Result<()> {
        // 分块大小超过总步数时退化为单次迭代
        let plan = ChunkPlan::new(5, 100)?;
        let steps: Vec<ChunkStep> = plan.iter().collect();
        assert_eq!(steps.len(), 1);
        assert_eq!((steps[0].start_step, steps[0].end_step), (0, 5));
        assert_eq!(steps[0].add_noise, Toggle::Enable);
        assert_eq!(steps[0].return_with_leftover_noise, Toggle::Disable);
        Ok(())
    }

    #[test]
    fn test_final_side() -> anyhow::Result<()> {
        // 25 步 / 每块 10 步: 3 次迭代, 末次下标 2 为 A 侧
        assert_eq!(ChunkPlan::new(25, 10)?.final_side(), Side::A);
        assert_eq!(ChunkPlan::new(20, 10)?.final_side(), Side::B);
        assert_eq!(ChunkPlan::new(10, 10)?.final_side(), Side::A);
        Ok(())
    }

    #[test]
    fn test_rejects_non_positive_parameters() {
        assert!(matches!(
            ChunkPlan::new(0, 1),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            ChunkPlan::new(1, 0),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_toggle_wire_strings() -> anyhow::Result<()> {
        assert_eq!(Toggle::Enable.to_string(), "enable");
        assert_eq!(Toggle::Disable.to_string(), "disable");
        assert_eq!("true".parse::<Invert>()?, Invert::True);
        assert_eq!("false".parse::<Invert>()?, Invert::False);
        assert!("yes".parse::<Invert>().is_err());
        Ok(())
    }
}
