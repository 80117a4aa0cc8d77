//! 面板过渡参数

use serde::{Deserialize, Serialize};

use crate::tween::{EasingFunction, Vec3};

/// 滑动方向（显示时面板移动的方向）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideDirection {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl SlideDirection {
    /// 隐藏位置相对显示位置的偏移
    pub fn hidden_offset(&self, distance: f32) -> Vec3 {
        match self {
            Self::Up => Vec3::new(0.0, -distance, 0.0),
            Self::Down => Vec3::new(0.0, distance, 0.0),
            Self::Left => Vec3::new(distance, 0.0, 0.0),
            Self::Right => Vec3::new(-distance, 0.0, 0.0),
        }
    }
}

/// 缩放子效果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleEffect {
    /// 隐藏时的缩放倍数
    #[serde(default = "default_hidden_scale")]
    pub hidden_scale: f32,
    #[serde(default = "default_scale_easing")]
    pub easing: EasingFunction,
}

impl Default for ScaleEffect {
    fn default() -> Self {
        Self {
            hidden_scale: default_hidden_scale(),
            easing: default_scale_easing(),
        }
    }
}

/// 滑动子效果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideEffect {
    #[serde(default)]
    pub direction: SlideDirection,
    #[serde(default = "default_slide_distance")]
    pub distance: f32,
    #[serde(default)]
    pub easing: EasingFunction,
}

impl Default for SlideEffect {
    fn default() -> Self {
        Self {
            direction: SlideDirection::default(),
            distance: default_slide_distance(),
            easing: EasingFunction::default(),
        }
    }
}

/// 面板过渡配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// 淡入淡出时长（秒），缩放和滑动共用
    #[serde(default = "default_fade_duration")]
    pub fade_duration: f32,

    #[serde(default)]
    pub fade_easing: EasingFunction,

    #[serde(default)]
    pub scale: Option<ScaleEffect>,

    #[serde(default)]
    pub slide: Option<SlideEffect>,

    /// 过渡期间禁用交互与点击拦截
    #[serde(default = "default_true")]
    pub disable_input_during_transition: bool,

    /// 过渡进行中收到的请求排队执行（否则丢弃）
    #[serde(default = "default_true")]
    pub queue_transitions: bool,

    /// 已处于目标状态时跳过动画，直接回调
    #[serde(default = "default_true")]
    pub ignore_redundant_calls: bool,

    /// 点击背景隐藏
    #[serde(default)]
    pub hide_on_background_click: bool,

    /// 取消 / 返回输入隐藏
    #[serde(default)]
    pub hide_on_cancel_input: bool,

    /// 创建时直接处于显示状态
    #[serde(default)]
    pub start_visible: bool,
}

fn default_fade_duration() -> f32 {
    0.3
}

fn default_hidden_scale() -> f32 {
    0.8
}

fn default_scale_easing() -> EasingFunction {
    EasingFunction::OutBack
}

fn default_slide_distance() -> f32 {
    100.0
}

fn default_true() -> bool {
    true
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            fade_duration: default_fade_duration(),
            fade_easing: EasingFunction::default(),
            scale: None,
            slide: None,
            disable_input_during_transition: true,
            queue_transitions: true,
            ignore_redundant_calls: true,
            hide_on_background_click: false,
            hide_on_cancel_input: false,
            start_visible: false,
        }
    }
}

impl TransitionConfig {
    /// 只有淡入淡出的配置
    pub fn fade(duration: f32) -> Self {
        Self {
            fade_duration: duration,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, effect: ScaleEffect) -> Self {
        self.scale = Some(effect);
        self
    }

    pub fn with_slide(mut self, effect: SlideEffect) -> Self {
        self.slide = Some(effect);
        self
    }

    /// 检查参数，返回第一个问题的描述
    pub fn problem(&self) -> Option<String> {
        if self.fade_duration.is_nan() || self.fade_duration < 0.0 {
            return Some(format!("fade_duration 必须 >= 0，实际 {}", self.fade_duration));
        }
        if let Some(scale) = &self.scale
            && (scale.hidden_scale.is_nan() || scale.hidden_scale < 0.0)
        {
            return Some(format!("hidden_scale 必须 >= 0，实际 {}", scale.hidden_scale));
        }
        if let Some(slide) = &self.slide
            && !slide.distance.is_finite()
        {
            return Some("slide.distance 必须是有限值".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: TransitionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TransitionConfig::default());
        assert!(config.queue_transitions);
        assert!(config.ignore_redundant_calls);
    }

    #[test]
    fn test_sub_effects_from_json() {
        let config: TransitionConfig = serde_json::from_str(
            r#"{ "fade_duration": 0.5, "scale": {}, "slide": { "direction": "left", "distance": 40 } }"#,
        )
        .unwrap();
        assert_eq!(config.scale.unwrap().hidden_scale, 0.8);
        let slide = config.slide.unwrap();
        assert_eq!(
            slide.direction.hidden_offset(slide.distance),
            Vec3::new(40.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_problem() {
        assert!(TransitionConfig::fade(0.0).problem().is_none());
        assert!(TransitionConfig::fade(-1.0).problem().is_some());
        assert!(TransitionConfig::fade(f32::NAN).problem().is_some());
    }
}
