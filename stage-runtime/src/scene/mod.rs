//! # Scene 模块
//!
//! 场景加载编排。`SceneTransitionManager` 通过 `SceneBackend` 驱动具体的加载原语，
//! 所有多帧操作都是显式状态机，由宿主每帧调用 `update(dt)` 推进。

mod backend;
mod manager;

pub use backend::{
    LoadMode, OperationId, OperationStatus, SceneBackend, SceneInfo, SceneRef,
};
pub use manager::{
    ACTIVATION_THRESHOLD, DEFAULT_LOADING_SCENE, LoadPhase, SceneEvent, SceneLoadState,
    SceneTransitionManager,
};
