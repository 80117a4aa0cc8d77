//! # Target 模块
//!
//! 补间目标的能力接口。
//!
//! 目标对象按能力实现 `Transformable` / `Fadeable` / `Colorable`，
//! 并通过 `TweenTarget` 按通道暴露。解析时按固定优先级查找第一个可用通道：
//!
//! - Fade: Group → Image → Sprite → Text
//! - Color: Material → Image → Text → Sprite
//!
//! 所有 setter 都接收 `&self`，由实现方用 `Cell`/`RefCell` 提供内部可变性，
//! 这样同一个目标可以同时被多个补间驱动。

use std::cell::Cell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 三维向量
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn lerp(self, to: Vec3, t: f32) -> Vec3 {
        Vec3::new(
            self.x + (to.x - self.x) * t,
            self.y + (to.y - self.y) * t,
            self.z + (to.z - self.z) * t,
        )
    }

    pub fn scaled(self, factor: f32) -> Vec3 {
        Vec3::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

/// RGBA 颜色（分量 0.0 - 1.0）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn lerp(self, to: Color, t: f32) -> Color {
        Color::rgba(
            self.r + (to.r - self.r) * t,
            self.g + (to.g - self.g) * t,
            self.b + (to.b - self.b) * t,
            self.a + (to.a - self.a) * t,
        )
    }
}

/// 透明度通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FadeChannel {
    /// 整组透明度（如 CanvasGroup）
    Group,
    Image,
    Sprite,
    Text,
}

impl FadeChannel {
    /// 解析优先级
    pub const PRIORITY: [FadeChannel; 4] = [Self::Group, Self::Image, Self::Sprite, Self::Text];
}

/// 颜色通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorChannel {
    Material,
    Image,
    Text,
    Sprite,
}

impl ColorChannel {
    /// 解析优先级
    pub const PRIORITY: [ColorChannel; 4] =
        [Self::Material, Self::Image, Self::Text, Self::Sprite];
}

/// 位置 / 缩放 / 旋转（欧拉角，度）
pub trait Transformable {
    fn position(&self) -> Vec3;
    fn set_position(&self, value: Vec3);
    fn scale(&self) -> Vec3;
    fn set_scale(&self, value: Vec3);
    fn rotation(&self) -> Vec3;
    fn set_rotation(&self, value: Vec3);
}

/// 透明度
pub trait Fadeable {
    fn alpha(&self) -> f32;
    fn set_alpha(&self, value: f32);
}

/// 颜色
pub trait Colorable {
    fn color(&self) -> Color;
    fn set_color(&self, value: Color);
}

/// 补间目标
///
/// 未实现的能力返回 `None`。
pub trait TweenTarget {
    /// 目标名称（用于日志）
    fn name(&self) -> &str;

    fn transform(&self) -> Option<&dyn Transformable> {
        None
    }

    fn fadeable(&self, _channel: FadeChannel) -> Option<&dyn Fadeable> {
        None
    }

    fn colorable(&self, _channel: ColorChannel) -> Option<&dyn Colorable> {
        None
    }
}

/// 按优先级查找第一个可用的透明度通道
pub fn resolve_fade_channel(target: &dyn TweenTarget) -> Option<FadeChannel> {
    FadeChannel::PRIORITY
        .into_iter()
        .find(|channel| target.fadeable(*channel).is_some())
}

/// 按优先级查找第一个可用的颜色通道
pub fn resolve_color_channel(target: &dyn TweenTarget) -> Option<ColorChannel> {
    ColorChannel::PRIORITY
        .into_iter()
        .find(|channel| target.colorable(*channel).is_some())
}

// ========== 通用实现 ==========

/// 变换数据
#[derive(Debug)]
pub struct TransformCell {
    position: Cell<Vec3>,
    scale: Cell<Vec3>,
    rotation: Cell<Vec3>,
}

impl Default for TransformCell {
    fn default() -> Self {
        Self {
            position: Cell::new(Vec3::ZERO),
            scale: Cell::new(Vec3::ONE),
            rotation: Cell::new(Vec3::ZERO),
        }
    }
}

impl Transformable for TransformCell {
    fn position(&self) -> Vec3 {
        self.position.get()
    }

    fn set_position(&self, value: Vec3) {
        self.position.set(value);
    }

    fn scale(&self) -> Vec3 {
        self.scale.get()
    }

    fn set_scale(&self, value: Vec3) {
        self.scale.set(value);
    }

    fn rotation(&self) -> Vec3 {
        self.rotation.get()
    }

    fn set_rotation(&self, value: Vec3) {
        self.rotation.set(value);
    }
}

/// 单个透明度值
#[derive(Debug)]
pub struct AlphaCell(Cell<f32>);

impl AlphaCell {
    pub fn new(alpha: f32) -> Self {
        Self(Cell::new(alpha))
    }
}

impl Fadeable for AlphaCell {
    fn alpha(&self) -> f32 {
        self.0.get()
    }

    fn set_alpha(&self, value: f32) {
        self.0.set(value);
    }
}

/// 单个颜色值
#[derive(Debug)]
pub struct ColorCell(Cell<Color>);

impl ColorCell {
    pub fn new(color: Color) -> Self {
        Self(Cell::new(color))
    }
}

impl Colorable for ColorCell {
    fn color(&self) -> Color {
        self.0.get()
    }

    fn set_color(&self, value: Color) {
        self.0.set(value);
    }
}

/// 内存中的 UI 元素
///
/// 通过 builder 声明具备哪些通道，适用于无头宿主和测试。
#[derive(Debug)]
pub struct ElementTarget {
    name: String,
    transform: Option<TransformCell>,
    alphas: HashMap<FadeChannel, AlphaCell>,
    colors: HashMap<ColorChannel, ColorCell>,
}

impl ElementTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: None,
            alphas: HashMap::new(),
            colors: HashMap::new(),
        }
    }

    pub fn with_transform(mut self) -> Self {
        self.transform = Some(TransformCell::default());
        self
    }

    pub fn with_fade(mut self, channel: FadeChannel) -> Self {
        self.alphas.insert(channel, AlphaCell::new(1.0));
        self
    }

    pub fn with_color(mut self, channel: ColorChannel) -> Self {
        self.colors.insert(channel, ColorCell::new(Color::WHITE));
        self
    }

    pub fn alpha(&self, channel: FadeChannel) -> Option<f32> {
        self.alphas.get(&channel).map(Fadeable::alpha)
    }

    pub fn color(&self, channel: ColorChannel) -> Option<Color> {
        self.colors.get(&channel).map(Colorable::color)
    }

    pub fn position(&self) -> Option<Vec3> {
        self.transform.as_ref().map(Transformable::position)
    }

    pub fn scale(&self) -> Option<Vec3> {
        self.transform.as_ref().map(Transformable::scale)
    }

    pub fn rotation(&self) -> Option<Vec3> {
        self.transform.as_ref().map(Transformable::rotation)
    }
}

impl TweenTarget for ElementTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self) -> Option<&dyn Transformable> {
        self.transform.as_ref().map(|t| t as &dyn Transformable)
    }

    fn fadeable(&self, channel: FadeChannel) -> Option<&dyn Fadeable> {
        self.alphas.get(&channel).map(|a| a as &dyn Fadeable)
    }

    fn colorable(&self, channel: ColorChannel) -> Option<&dyn Colorable> {
        self.colors.get(&channel).map(|c| c as &dyn Colorable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_priority() {
        let target = ElementTarget::new("label")
            .with_fade(FadeChannel::Text)
            .with_fade(FadeChannel::Image);
        assert_eq!(resolve_fade_channel(&target), Some(FadeChannel::Image));

        let grouped = ElementTarget::new("panel")
            .with_fade(FadeChannel::Sprite)
            .with_fade(FadeChannel::Group);
        assert_eq!(resolve_fade_channel(&grouped), Some(FadeChannel::Group));
    }

    #[test]
    fn test_color_priority() {
        let target = ElementTarget::new("icon")
            .with_color(ColorChannel::Sprite)
            .with_color(ColorChannel::Text);
        assert_eq!(resolve_color_channel(&target), Some(ColorChannel::Text));
    }

    #[test]
    fn test_missing_capabilities() {
        let target = ElementTarget::new("empty");
        assert!(target.transform().is_none());
        assert_eq!(resolve_fade_channel(&target), None);
        assert_eq!(resolve_color_channel(&target), None);
    }

    #[test]
    fn test_lerp() {
        let v = Vec3::ZERO.lerp(Vec3::new(2.0, 4.0, -2.0), 0.5);
        assert_eq!(v, Vec3::new(1.0, 2.0, -1.0));

        let c = Color::BLACK.lerp(Color::WHITE, 0.5);
        assert!((c.r - 0.5).abs() < 0.001);
        assert_eq!(c.a, 1.0);
    }
}
