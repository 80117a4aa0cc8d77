//! # Easing 模块
//!
//! 补间的时间曲线。两种来源互斥：
//! - 命名曲线（`EasingFunction`）
//! - 采样曲线（`SampledCurve`，由关键点分段线性插值）

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// 命名缓动曲线
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingFunction {
    /// 线性（匀速）
    Linear,
    /// 二次缓入
    InQuad,
    /// 二次缓出
    #[default]
    OutQuad,
    /// 二次缓入缓出
    InOutQuad,
    /// 三次缓入
    InCubic,
    /// 三次缓出
    OutCubic,
    /// 三次缓入缓出
    InOutCubic,
    /// 正弦缓入
    InSine,
    /// 正弦缓出
    OutSine,
    /// 正弦缓入缓出
    InOutSine,
    /// 回弹缓出（略微越过终点再回来）
    OutBack,
    /// 弹性缓出
    OutElastic,
    /// 弹跳缓出
    OutBounce,
}

impl EasingFunction {
    /// 计算缓动值，`t` 会被限制在 0.0 - 1.0
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t).powi(2),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::InCubic => t.powi(3),
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t.powi(3)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::InSine => 1.0 - (t * PI / 2.0).cos(),
            Self::OutSine => (t * PI / 2.0).sin(),
            Self::InOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Self::OutBack => {
                let c1 = 1.70158;
                let c3 = c1 + 1.0;
                1.0 + c3 * (t - 1.0).powi(3) + c1 * (t - 1.0).powi(2)
            }
            Self::OutElastic => out_elastic(t),
            Self::OutBounce => out_bounce(t),
        }
    }
}

fn out_elastic(t: f32) -> f32 {
    if t == 0.0 || t == 1.0 {
        return t;
    }
    let c4 = (2.0 * PI) / 3.0;
    2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
}

fn out_bounce(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

/// 采样曲线
///
/// 关键点 `(time, value)` 按时间排序，区间内线性插值，
/// 区间外取端点值。没有关键点时退化为线性。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SampledCurve {
    keys: Vec<(f32, f32)>,
}

impl SampledCurve {
    pub fn new(mut keys: Vec<(f32, f32)>) -> Self {
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    pub fn keys(&self) -> &[(f32, f32)] {
        &self.keys
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return t;
        };

        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }

        for pair in self.keys.windows(2) {
            let (t0, v0) = pair[0];
            let (t1, v1) = pair[1];
            if t <= t1 {
                let span = t1 - t0;
                if span <= f32::EPSILON {
                    return v1;
                }
                return v0 + (v1 - v0) * ((t - t0) / span);
            }
        }
        last.1
    }
}

/// 补间使用的曲线（命名或采样，二选一）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Easing {
    Named(EasingFunction),
    Curve(SampledCurve),
}

impl Default for Easing {
    fn default() -> Self {
        Self::Named(EasingFunction::default())
    }
}

impl From<EasingFunction> for Easing {
    fn from(function: EasingFunction) -> Self {
        Self::Named(function)
    }
}

impl From<SampledCurve> for Easing {
    fn from(curve: SampledCurve) -> Self {
        Self::Curve(curve)
    }
}

impl Easing {
    pub fn apply(&self, t: f32) -> f32 {
        match self {
            Self::Named(function) => function.apply(t),
            Self::Curve(curve) => curve.evaluate(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_endpoints() {
        for easing in [
            EasingFunction::Linear,
            EasingFunction::OutQuad,
            EasingFunction::InOutCubic,
            EasingFunction::InOutSine,
            EasingFunction::OutBack,
            EasingFunction::OutElastic,
            EasingFunction::OutBounce,
        ] {
            assert!(easing.apply(0.0).abs() < 0.001, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 0.001, "{easing:?} at 1");
        }
    }

    #[test]
    fn test_clamp() {
        let easing = EasingFunction::Linear;
        assert_eq!(easing.apply(-0.5), 0.0);
        assert_eq!(easing.apply(1.5), 1.0);
    }

    #[test]
    fn test_sampled_curve_interpolates() {
        let curve = SampledCurve::new(vec![(1.0, 1.0), (0.0, 0.0), (0.5, 0.8)]);
        assert_eq!(curve.keys()[1], (0.5, 0.8));
        assert!((curve.evaluate(0.25) - 0.4).abs() < 0.001);
        assert!((curve.evaluate(0.75) - 0.9).abs() < 0.001);
        assert_eq!(curve.evaluate(2.0), 1.0);
    }

    #[test]
    fn test_empty_curve_is_linear() {
        let curve = SampledCurve::default();
        assert_eq!(curve.evaluate(0.3), 0.3);
    }

    #[test]
    fn test_easing_deserialize_either_form() {
        let named: Easing = serde_json::from_str("\"in_out_quad\"").unwrap();
        assert_eq!(named, Easing::Named(EasingFunction::InOutQuad));

        let curve: Easing = serde_json::from_str(r#"{"keys":[[0.0,0.0],[1.0,0.5]]}"#).unwrap();
        assert!((curve.apply(1.0) - 0.5).abs() < 0.001);
    }
}
