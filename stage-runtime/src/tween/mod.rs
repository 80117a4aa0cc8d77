//! # Tween 模块
//!
//! 补间系统，负责属性动画的时间轴与播放调度。
//!
//! ## 核心概念
//!
//! - `Tween`: 单个时间轴，只管理 0.0 - 1.0 的进度（延迟、缓动、循环、暂停）
//! - `TweenSpec`: 声明式补间定义（move / scale / rotate / fade / color）
//! - `TweenTarget`: 补间目标的能力接口，按通道优先级解析
//! - `TweenRunner`: 同时组 / 顺序组的播放器
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let button = Rc::new(ElementTarget::new("play").with_transform().with_fade(FadeChannel::Image));
//! let mut runner = TweenRunner::new(button)
//!     .with_simultaneous(vec![TweenSpec::fade_to("fade_in", 1.0, 0.3)])
//!     .with_sequential(vec![TweenSpec::scale_to("pop", Vec3::new(1.1, 1.1, 1.0), 0.2)]);
//!
//! runner.run_simultaneous();
//! loop {
//!     for event in runner.update(dt) { /* ... */ }
//! }
//! ```

mod easing;
mod runner;
mod spec;
pub mod target;
mod timeline;

pub use easing::{Easing, EasingFunction, SampledCurve};
pub use runner::{TweenEvent, TweenRunner};
pub use spec::{TweenKind, TweenSpec};
pub use target::{
    Color, ColorChannel, Colorable, ElementTarget, FadeChannel, Fadeable, Transformable,
    TweenTarget, Vec3,
};
pub use timeline::{LoopPolicy, Tween, TweenState};
