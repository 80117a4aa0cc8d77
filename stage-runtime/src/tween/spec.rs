//! # Spec 模块
//!
//! 声明式补间定义。配置期编写，播放期间只读。

use serde::{Deserialize, Serialize};

use super::target::{Color, Vec3};
use super::{Easing, LoopPolicy, Tween};

/// 补间类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TweenKind {
    Move,
    Scale,
    Rotate,
    Fade,
    Color,
}

/// 单个声明式补间
///
/// 每种类型只使用一个目标值：
/// - `Move` / `Scale` / `Rotate` → `target_vector`
/// - `Fade` → `target_alpha`
/// - `Color` → `target_color`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweenSpec {
    pub name: String,
    pub kind: TweenKind,
    #[serde(default)]
    pub target_vector: Vec3,
    #[serde(default = "default_target_alpha")]
    pub target_alpha: f32,
    #[serde(default)]
    pub target_color: Color,
    /// 单次时长（秒）
    #[serde(default = "default_duration")]
    pub duration: f32,
    /// 延迟（秒）
    #[serde(default)]
    pub delay: f32,
    #[serde(default)]
    pub easing: Easing,
    #[serde(default)]
    pub looping: bool,
    /// `<= 0` 表示无限循环，仅在 `looping` 为真时有效
    #[serde(default = "default_loop_count")]
    pub loop_count: i32,
    #[serde(default)]
    pub ping_pong: bool,
    /// 外部目标句柄；`None` 表示作用于运行器自身的目标
    #[serde(default)]
    pub target: Option<String>,
}

fn default_target_alpha() -> f32 {
    1.0
}

fn default_duration() -> f32 {
    0.5
}

fn default_loop_count() -> i32 {
    -1
}

impl TweenSpec {
    pub fn new(name: impl Into<String>, kind: TweenKind) -> Self {
        Self {
            name: name.into(),
            kind,
            target_vector: Vec3::ZERO,
            target_alpha: default_target_alpha(),
            target_color: Color::WHITE,
            duration: default_duration(),
            delay: 0.0,
            easing: Easing::default(),
            looping: false,
            loop_count: default_loop_count(),
            ping_pong: false,
            target: None,
        }
    }

    pub fn move_to(name: impl Into<String>, position: Vec3, duration: f32) -> Self {
        Self::new(name, TweenKind::Move)
            .with_vector(position)
            .with_duration(duration)
    }

    pub fn scale_to(name: impl Into<String>, scale: Vec3, duration: f32) -> Self {
        Self::new(name, TweenKind::Scale)
            .with_vector(scale)
            .with_duration(duration)
    }

    pub fn rotate_to(name: impl Into<String>, euler: Vec3, duration: f32) -> Self {
        Self::new(name, TweenKind::Rotate)
            .with_vector(euler)
            .with_duration(duration)
    }

    pub fn fade_to(name: impl Into<String>, alpha: f32, duration: f32) -> Self {
        let mut spec = Self::new(name, TweenKind::Fade).with_duration(duration);
        spec.target_alpha = alpha.clamp(0.0, 1.0);
        spec
    }

    pub fn color_to(name: impl Into<String>, color: Color, duration: f32) -> Self {
        let mut spec = Self::new(name, TweenKind::Color).with_duration(duration);
        spec.target_color = color;
        spec
    }

    pub fn with_vector(mut self, vector: Vec3) -> Self {
        self.target_vector = vector;
        self
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration.max(0.0);
        self
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    pub fn with_easing(mut self, easing: impl Into<Easing>) -> Self {
        self.easing = easing.into();
        self
    }

    /// 开启循环，`count <= 0` 为无限
    pub fn with_loops(mut self, count: i32, ping_pong: bool) -> Self {
        self.looping = true;
        self.loop_count = count;
        self.ping_pong = ping_pong;
        self
    }

    pub fn on_target(mut self, handle: impl Into<String>) -> Self {
        self.target = Some(handle.into());
        self
    }

    pub fn loop_policy(&self) -> LoopPolicy {
        LoopPolicy::from_settings(self.looping, self.loop_count, self.ping_pong)
    }

    /// 构造本次播放使用的时间轴
    pub fn timeline(&self) -> Tween {
        Tween::new(self.duration, self.easing.clone())
            .with_delay(self.delay)
            .with_loops(self.loop_policy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tween::EasingFunction;

    #[test]
    fn test_builders_clamp() {
        let spec = TweenSpec::fade_to("fade", 1.5, -1.0).with_delay(-0.5);
        assert_eq!(spec.target_alpha, 1.0);
        assert_eq!(spec.duration, 0.0);
        assert_eq!(spec.delay, 0.0);
    }

    #[test]
    fn test_loop_policy() {
        let spec = TweenSpec::scale_to("pulse", Vec3::ONE, 0.5).with_loops(0, true);
        let policy = spec.loop_policy();
        assert!(policy.is_infinite());
        assert!(policy.ping_pong);

        let once = TweenSpec::scale_to("once", Vec3::ONE, 0.5);
        assert_eq!(once.loop_policy(), LoopPolicy::once());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{
            "name": "title_in",
            "kind": "move",
            "target_vector": { "x": 0.0, "y": 120.0, "z": 0.0 },
            "duration": 0.8,
            "easing": "out_back",
            "target": "title"
        }"#;
        let spec: TweenSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.kind, TweenKind::Move);
        assert_eq!(spec.target_vector.y, 120.0);
        assert_eq!(spec.easing, Easing::Named(EasingFunction::OutBack));
        assert_eq!(spec.target.as_deref(), Some("title"));
        assert!(!spec.looping);
        assert_eq!(spec.delay, 0.0);
    }
}
