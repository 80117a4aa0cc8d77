//! # Stage Runtime
//!
//! 场景过渡、补间动画与设置生命周期的核心运行时库。
//!
//! ## 架构概述
//!
//! `stage-runtime` 是纯逻辑核心，不做任何 IO，也不依赖渲染引擎。
//! 所有多帧操作都是显式状态机，宿主每帧调用 `update(dt)` 推进并消费返回的事件：
//!
//! ```text
//! Host                                  Runtime
//!   │                                      │
//!   │──── update(dt) ────────────────────►│ TweenRunner / TransitionController
//!   │◄─── Vec<Event> ─────────────────────│ SceneTransitionManager
//!   │                                      │
//!   │──── SceneBackend / PanelHost ◄──────│ （运行时通过 trait 驱动宿主）
//!   │──── PersistenceStore / RuntimeEnvironment
//! ```
//!
//! ## 模块结构
//!
//! - [`tween`]：补间时间轴、缓动曲线与 `TweenRunner`
//! - [`transition`]：面板显示 / 隐藏过渡
//! - [`scene`]：场景加载编排
//! - [`settings`]：设置记录、持久化与应用
//! - [`signal`]：类型化观察者列表
//! - [`error`]：错误类型定义

pub mod error;
pub mod scene;
pub mod settings;
pub mod signal;
pub mod transition;
pub mod tween;

// 重导出核心类型
pub use error::{SceneError, SettingsError, StoreError, TransitionError, TweenError};
pub use scene::{
    LoadMode, LoadPhase, SceneBackend, SceneEvent, SceneLoadState, SceneRef,
    SceneTransitionManager,
};
pub use settings::{
    PersistenceStore, RuntimeEnvironment, SettingsDefaults, SettingsEvent,
    SettingsLifecycleService, SettingsRecord,
};
pub use signal::{Signal, SubscriptionId};
pub use transition::{
    PanelHost, PanelState, TransitionConfig, TransitionController, TransitionEvent,
};
pub use tween::{Easing, EasingFunction, Tween, TweenEvent, TweenRunner, TweenSpec, TweenTarget};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let _spec = TweenSpec::fade_to("fade", 0.5, 1.0);
        let _config = TransitionConfig::default();
        let _mode = LoadMode::Additive;
        let _record = SettingsRecord::default();
        let _signal: Signal<SceneEvent> = Signal::new();
        let _tween = Tween::new(1.0, EasingFunction::Linear);
    }
}
