//! # Transition 模块
//!
//! 面板显示 / 隐藏过渡：淡入淡出，可叠加缩放与滑动。
//!
//! 控制器不持有渲染对象，只通过 `PanelHost` 暴露的组件写入属性；
//! 宿主每帧调用 `update(dt)` 推进，并消费返回的事件。

mod config;
mod controller;
mod panel;

pub use config::{ScaleEffect, SlideDirection, SlideEffect, TransitionConfig};
pub use controller::{
    Callback, PanelState, TransitionController, TransitionEvent, TransitionRequest,
};
pub use panel::{CanvasGroup, Focusable, GroupCell, PanelElement, PanelHost};
