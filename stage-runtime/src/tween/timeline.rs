//! # Timeline 模块
//!
//! 单个补间的时间轴。只关注 0.0 - 1.0 的进度如何随时间变化，
//! 不假设目标对象类型；值的插值与写回由调用方负责。

use serde::{Deserialize, Serialize};

use super::Easing;

/// 补间状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TweenState {
    /// 等待开始（延迟中）
    #[default]
    Pending,
    /// 正在播放
    Playing,
    /// 已暂停
    Paused,
    /// 已完成
    Completed,
    /// 已取消
    Cancelled,
}

impl TweenState {
    /// 是否为活跃状态（仍需要更新）
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Playing | Self::Paused)
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// 循环策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopPolicy {
    /// 总播放次数，`None` 表示无限循环
    pub cycles: Option<u32>,
    /// 每次循环反向播放，而不是从头开始
    pub ping_pong: bool,
}

impl Default for LoopPolicy {
    fn default() -> Self {
        Self::once()
    }
}

impl LoopPolicy {
    /// 只播放一次
    pub fn once() -> Self {
        Self {
            cycles: Some(1),
            ping_pong: false,
        }
    }

    /// 从声明式参数构造
    ///
    /// `loop_count` 只在 `looping` 为真时有意义，`<= 0` 表示无限。
    pub fn from_settings(looping: bool, loop_count: i32, ping_pong: bool) -> Self {
        if !looping {
            return Self::once();
        }
        let cycles = if loop_count <= 0 {
            None
        } else {
            Some(loop_count as u32)
        };
        Self { cycles, ping_pong }
    }

    pub fn is_infinite(&self) -> bool {
        self.cycles.is_none()
    }
}

/// 补间时间轴
#[derive(Debug, Clone)]
pub struct Tween {
    /// 单次播放时长（秒）
    duration: f32,
    /// 延迟启动（秒）
    delay: f32,
    easing: Easing,
    loops: LoopPolicy,
    state: TweenState,
    /// 暂停前的状态，恢复时还原
    paused_from: Option<TweenState>,
    /// 当前阶段已经过的时间（延迟阶段或当前这一轮）
    elapsed: f32,
    /// 已完成的轮数
    cycle: u32,
    /// 当前进度（已应用缓动与方向）
    progress: f32,
}

impl Tween {
    pub fn new(duration: f32, easing: impl Into<Easing>) -> Self {
        Self {
            duration: duration.max(0.0),
            delay: 0.0,
            easing: easing.into(),
            loops: LoopPolicy::once(),
            state: TweenState::Pending,
            paused_from: None,
            elapsed: 0.0,
            cycle: 0,
            progress: 0.0,
        }
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    pub fn with_loops(mut self, loops: LoopPolicy) -> Self {
        self.loops = loops;
        self
    }

    /// 推进时间轴
    ///
    /// # 返回
    /// - `true`: 补间仍在进行中
    /// - `false`: 补间已结束
    pub fn update(&mut self, dt: f32) -> bool {
        match self.state {
            TweenState::Pending => {
                self.elapsed += dt;
                if self.elapsed >= self.delay {
                    let overflow = self.elapsed - self.delay;
                    self.elapsed = 0.0;
                    self.state = TweenState::Playing;
                    self.advance(overflow)
                } else {
                    true
                }
            }
            TweenState::Playing => self.advance(dt),
            TweenState::Paused => true,
            TweenState::Completed | TweenState::Cancelled => false,
        }
    }

    fn advance(&mut self, dt: f32) -> bool {
        if self.duration <= 0.0 {
            self.cycle = self.loops.cycles.unwrap_or(1).max(1);
            self.finish();
            return false;
        }

        self.elapsed += dt;
        if self.elapsed >= self.duration {
            let finished_cycles = (self.elapsed / self.duration).floor() as u32;
            self.cycle = self.cycle.saturating_add(finished_cycles);
            self.elapsed -= finished_cycles as f32 * self.duration;

            if let Some(total) = self.loops.cycles
                && self.cycle >= total
            {
                self.cycle = total;
                self.finish();
                return false;
            }
        }

        let eased = self.easing.apply(self.elapsed / self.duration);
        self.progress = if self.is_reversed(self.cycle) {
            1.0 - eased
        } else {
            eased
        };
        true
    }

    /// 第 `cycle` 轮（从 0 计）是否反向播放
    fn is_reversed(&self, cycle: u32) -> bool {
        self.loops.ping_pong && cycle % 2 == 1
    }

    fn finish(&mut self) {
        let last_cycle = self.cycle.saturating_sub(1);
        self.progress = if self.is_reversed(last_cycle) { 0.0 } else { 1.0 };
        self.state = TweenState::Completed;
    }

    /// 立即跳到终点
    pub fn complete(&mut self) {
        if self.state.is_active() {
            self.cycle = self.loops.cycles.unwrap_or(1).max(1);
            self.finish();
        }
    }

    /// 取消（保持当前进度，不算完成）
    pub fn cancel(&mut self) {
        if self.state.is_active() {
            self.state = TweenState::Cancelled;
        }
    }

    pub fn pause(&mut self) {
        if matches!(self.state, TweenState::Pending | TweenState::Playing) {
            self.paused_from = Some(self.state);
            self.state = TweenState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == TweenState::Paused {
            self.state = self.paused_from.take().unwrap_or(TweenState::Playing);
        }
    }

    pub fn state(&self) -> TweenState {
        self.state
    }

    /// 当前进度（0.0 - 1.0，已应用缓动）
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// 延迟阶段是否已经结束
    pub fn has_started(&self) -> bool {
        match self.state {
            TweenState::Pending => false,
            TweenState::Paused => self.paused_from != Some(TweenState::Pending),
            _ => true,
        }
    }

    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }
}
