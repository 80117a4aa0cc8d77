//! 场景加载原语
//!
//! `SceneTransitionManager` 只依赖这里的 `SceneBackend`，
//! 不假设任何具体引擎的 API 形态。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SceneError;

/// 场景引用：名称或构建索引
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SceneRef {
    Name(String),
    Index(usize),
}

impl fmt::Display for SceneRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name}"),
            Self::Index(index) => write!(f, "#{index}"),
        }
    }
}

impl From<&str> for SceneRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for SceneRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for SceneRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// 加载模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// 卸载其他所有场景
    #[default]
    Single,
    /// 叠加到已加载的场景上
    Additive,
}

/// 已加载场景的信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneInfo {
    pub name: String,
    /// 不在构建列表中的场景没有索引
    pub build_index: Option<usize>,
}

/// 后端异步操作的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// 异步操作状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationStatus {
    /// 原始进度（0.0 - 1.0）
    ///
    /// 激活被推迟时停在激活阈值（0.9）。
    pub progress: f32,
    /// 操作已完成（场景已激活或已卸载）
    pub done: bool,
}

/// 异步场景加载原语
pub trait SceneBackend {
    /// 构建列表中的场景数量
    fn scene_count(&self) -> usize;

    fn scene_name(&self, index: usize) -> Option<String>;

    fn scene_index(&self, name: &str) -> Option<usize>;

    /// 同步加载，返回时场景已激活
    fn load(&mut self, name: &str, mode: LoadMode) -> Result<(), SceneError>;

    /// 开始异步加载
    ///
    /// `allow_activation` 为假时，加载停在激活阈值，直到调用 `allow_activation`。
    fn begin_load(
        &mut self,
        name: &str,
        mode: LoadMode,
        allow_activation: bool,
    ) -> Result<OperationId, SceneError>;

    fn unload(&mut self, name: &str) -> Result<(), SceneError>;

    fn begin_unload(&mut self, name: &str) -> Result<OperationId, SceneError>;

    /// 未知的操作返回 `None`
    fn operation_status(&self, op: OperationId) -> Option<OperationStatus>;

    fn allow_activation(&mut self, op: OperationId);

    fn active_scene(&self) -> Option<SceneInfo>;

    fn is_loaded(&self, name: &str) -> bool;

    /// 回收未使用的资源
    fn reclaim_unused_assets(&mut self);

    /// 推进模拟时间（真实引擎由自身驱动，默认无操作）
    fn tick(&mut self, _dt: f32) {}
}
