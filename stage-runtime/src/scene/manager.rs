//! # SceneManager 模块
//!
//! 场景加载编排：按名称或构建索引加载 / 卸载场景，跟踪进度，
//! 支持经由加载场景的过渡和推迟激活。
//!
//! ## 阶段
//!
//! ```text
//! Idle ──begin──► Loading ──到达阈值（推迟激活）──► ReadyToActivate
//!                    │                                   │ activate_loaded_scene()
//!                    │◄──────────────────────────────────┘
//!                    └──完成──► Activated ──下一次 update──► Idle
//! ```
//!
//! 同一时间只允许一个加载操作；加载中的新请求返回 `SceneError::LoadInProgress`。

use tracing::{debug, info, warn};

use super::backend::{LoadMode, OperationId, SceneBackend, SceneRef};
use crate::error::SceneError;

/// 后端原始进度的激活阈值
pub const ACTIVATION_THRESHOLD: f32 = 0.9;

/// 默认的加载场景名称
pub const DEFAULT_LOADING_SCENE: &str = "Loading";

/// 加载阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    /// 数据已加载，等待 `activate_loaded_scene()`
    ReadyToActivate,
    /// 上一次操作刚刚完成
    Activated,
}

/// 当前（或最近一次）加载操作的状态
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLoadState {
    pub target: SceneRef,
    /// 解析后的场景名称
    pub scene: String,
    pub mode: LoadMode,
    pub is_loading: bool,
    /// 归一化进度（0.0 - 1.0），单次操作内单调不减
    pub progress: f32,
    pub pending_activation: bool,
}

/// 场景事件
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    Progress { scene: String, progress: f32 },
    ReadyToActivate { scene: String },
    Loaded { scene: String, mode: LoadMode },
    Unloaded { scene: String },
    /// 后端丢失了操作，之前的场景保持不变
    LoadFailed { scene: String, message: String },
}

#[derive(Debug)]
struct PendingLoad {
    op: OperationId,
    deferred: bool,
    reclaim_memory: bool,
}

#[derive(Debug)]
struct PendingUnload {
    op: OperationId,
    scene: String,
    reclaim_memory: bool,
}

/// 原始进度按激活阈值归一化
fn normalize(raw: f32) -> f32 {
    (raw / ACTIVATION_THRESHOLD).clamp(0.0, 1.0)
}

/// 场景过渡管理器
pub struct SceneTransitionManager {
    backend: Box<dyn SceneBackend>,
    phase: LoadPhase,
    state: Option<SceneLoadState>,
    pending: Option<PendingLoad>,
    unloads: Vec<PendingUnload>,
    loading_scene: String,
    auto_memory_management: bool,
    events: Vec<SceneEvent>,
}

impl std::fmt::Debug for SceneTransitionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneTransitionManager")
            .field("phase", &self.phase)
            .field("state", &self.state)
            .field("unloads", &self.unloads.len())
            .finish()
    }
}

impl SceneTransitionManager {
    pub fn new(backend: Box<dyn SceneBackend>) -> Self {
        Self {
            backend,
            phase: LoadPhase::Idle,
            state: None,
            pending: None,
            unloads: Vec::new(),
            loading_scene: DEFAULT_LOADING_SCENE.to_string(),
            auto_memory_management: true,
            events: Vec::new(),
        }
    }

    pub fn backend(&self) -> &dyn SceneBackend {
        self.backend.as_ref()
    }

    // ========== 加载 ==========

    /// 同步加载，返回时场景已激活
    pub fn load_scene(
        &mut self,
        scene: impl Into<SceneRef>,
        mode: LoadMode,
        reclaim_memory: bool,
    ) -> Result<(), SceneError> {
        let target = scene.into();
        self.ensure_idle()?;
        let name = self.resolve(&target)?;
        self.load_now(target, name, mode, reclaim_memory)
    }

    /// 异步加载，进度在 `update()` 中推进
    pub fn load_scene_async(
        &mut self,
        scene: impl Into<SceneRef>,
        mode: LoadMode,
        reclaim_memory: bool,
    ) -> Result<(), SceneError> {
        let target = scene.into();
        self.ensure_idle()?;
        let name = self.resolve(&target)?;
        self.begin_load(target, name, mode, false, reclaim_memory)
    }

    pub fn load_scene_by_index(
        &mut self,
        index: usize,
        mode: LoadMode,
        reclaim_memory: bool,
    ) -> Result<(), SceneError> {
        self.load_scene(SceneRef::Index(index), mode, reclaim_memory)
    }

    pub fn load_scene_by_index_async(
        &mut self,
        index: usize,
        mode: LoadMode,
        reclaim_memory: bool,
    ) -> Result<(), SceneError> {
        self.load_scene_async(SceneRef::Index(index), mode, reclaim_memory)
    }

    /// 加载构建列表中的下一个场景
    pub fn load_next(&mut self) -> Result<(), SceneError> {
        let index = self.relative_index(1)?;
        self.load_scene_by_index(index, LoadMode::Single, true)
    }

    pub fn load_next_async(&mut self) -> Result<(), SceneError> {
        let index = self.relative_index(1)?;
        self.load_scene_by_index_async(index, LoadMode::Single, true)
    }

    /// 加载构建列表中的上一个场景
    pub fn load_previous(&mut self) -> Result<(), SceneError> {
        let index = self.relative_index(-1)?;
        self.load_scene_by_index(index, LoadMode::Single, true)
    }

    pub fn load_previous_async(&mut self) -> Result<(), SceneError> {
        let index = self.relative_index(-1)?;
        self.load_scene_by_index_async(index, LoadMode::Single, true)
    }

    /// 重新加载当前激活的场景
    pub fn reload_scene(&mut self) -> Result<(), SceneError> {
        let name = self.active_name_or_err()?;
        self.load_scene(name, LoadMode::Single, true)
    }

    pub fn reload_scene_async(&mut self) -> Result<(), SceneError> {
        let name = self.active_name_or_err()?;
        self.load_scene_async(name, LoadMode::Single, true)
    }

    /// 经由加载场景过渡到目标场景
    ///
    /// 先同步加载加载场景（Single），再在后台加载目标场景并推迟激活。
    /// 进度到达阈值后进入 `ReadyToActivate`，由加载界面调用
    /// `activate_loaded_scene()` 完成切换。
    pub fn load_through_loading_screen(
        &mut self,
        target: impl Into<SceneRef>,
        loading_scene: &str,
    ) -> Result<(), SceneError> {
        let target = target.into();
        self.ensure_idle()?;
        let name = self.resolve(&target)?;
        let loading = self.resolve(&SceneRef::Name(loading_scene.to_string()))?;

        self.loading_scene = loading.clone();
        self.load_now(SceneRef::Name(loading.clone()), loading, LoadMode::Single, false)?;
        self.begin_load(target, name, LoadMode::Single, true, true)
    }

    /// 允许推迟的场景激活
    pub fn activate_loaded_scene(&mut self) -> Result<(), SceneError> {
        let pending = match (self.phase, self.pending.as_mut()) {
            (LoadPhase::ReadyToActivate, Some(pending)) => pending,
            _ => {
                let phase = format!("{:?}", self.phase);
                warn!(phase = %phase, "没有等待激活的场景");
                return Err(SceneError::NotReadyToActivate { phase });
            }
        };

        pending.deferred = false;
        self.backend.allow_activation(pending.op);
        self.phase = LoadPhase::Loading;
        if let Some(state) = self.state.as_mut() {
            state.pending_activation = false;
            info!(scene = %state.scene, "允许激活场景");
        }
        Ok(())
    }

    // ========== 卸载 ==========

    pub fn unload_scene(&mut self, name: &str, reclaim_memory: bool) -> Result<(), SceneError> {
        self.ensure_loaded(name)?;
        self.backend
            .unload(name)
            .inspect_err(|e| warn!(scene = %name, error = %e, "场景卸载失败"))?;
        info!(scene = %name, "场景已卸载");
        self.events.push(SceneEvent::Unloaded {
            scene: name.to_string(),
        });
        self.reclaim_after(reclaim_memory);
        Ok(())
    }

    pub fn unload_scene_async(
        &mut self,
        name: &str,
        reclaim_memory: bool,
    ) -> Result<(), SceneError> {
        self.ensure_loaded(name)?;
        let op = self
            .backend
            .begin_unload(name)
            .inspect_err(|e| warn!(scene = %name, error = %e, "场景卸载失败"))?;
        debug!(scene = %name, %op, "开始异步卸载场景");
        self.unloads.push(PendingUnload {
            op,
            scene: name.to_string(),
            reclaim_memory,
        });
        Ok(())
    }

    // ========== 内存 ==========

    /// 关闭后只有 `force_memory_cleanup()` 会回收资源
    pub fn set_auto_memory_management(&mut self, enabled: bool) {
        self.auto_memory_management = enabled;
    }

    pub fn auto_memory_management(&self) -> bool {
        self.auto_memory_management
    }

    pub fn force_memory_cleanup(&mut self) {
        info!("强制回收未使用的资源");
        self.backend.reclaim_unused_assets();
    }

    fn reclaim_after(&mut self, reclaim_memory: bool) {
        if reclaim_memory && self.auto_memory_management {
            debug!("回收未使用的资源");
            self.backend.reclaim_unused_assets();
        }
    }

    // ========== 帧更新 ==========

    /// 推进后端并轮询进行中的操作
    ///
    /// # 返回
    /// 自上次调用以来产生的事件
    pub fn update(&mut self, dt: f32) -> Vec<SceneEvent> {
        if self.phase == LoadPhase::Activated {
            self.phase = LoadPhase::Idle;
        }

        self.backend.tick(dt);
        self.poll_load();
        self.poll_unloads();

        std::mem::take(&mut self.events)
    }

    fn poll_load(&mut self) {
        let Some(pending) = self.pending.as_ref() else {
            return;
        };
        let (op, deferred) = (pending.op, pending.deferred);
        let status = self.backend.operation_status(op);
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let Some(status) = status else {
            let message = format!("后端丢失了操作 {op}");
            warn!(scene = %state.scene, %op, "场景加载失败，保留当前场景");
            state.is_loading = false;
            state.pending_activation = false;
            self.events.push(SceneEvent::LoadFailed {
                scene: state.scene.clone(),
                message,
            });
            self.pending = None;
            self.phase = LoadPhase::Idle;
            return;
        };

        let progress = if status.done {
            1.0
        } else {
            normalize(status.progress)
        };
        if progress > state.progress {
            state.progress = progress;
            self.events.push(SceneEvent::Progress {
                scene: state.scene.clone(),
                progress,
            });
        }

        if status.done {
            state.is_loading = false;
            state.pending_activation = false;
            info!(scene = %state.scene, mode = ?state.mode, "场景已激活");
            self.events.push(SceneEvent::Loaded {
                scene: state.scene.clone(),
                mode: state.mode,
            });
            let reclaim_memory = self.pending.take().is_some_and(|p| p.reclaim_memory);
            self.phase = LoadPhase::Activated;
            self.reclaim_after(reclaim_memory);
        } else if deferred
            && self.phase == LoadPhase::Loading
            && status.progress >= ACTIVATION_THRESHOLD
        {
            state.pending_activation = true;
            info!(scene = %state.scene, "场景已就绪，等待激活");
            self.events.push(SceneEvent::ReadyToActivate {
                scene: state.scene.clone(),
            });
            self.phase = LoadPhase::ReadyToActivate;
        }
    }

    fn poll_unloads(&mut self) {
        let mut finished = Vec::new();
        self.unloads.retain(|unload| {
            match self.backend.operation_status(unload.op) {
                Some(status) if !status.done => true,
                Some(_) => {
                    finished.push((unload.scene.clone(), unload.reclaim_memory));
                    false
                }
                None => {
                    warn!(scene = %unload.scene, op = %unload.op, "后端丢失了卸载操作");
                    false
                }
            }
        });

        for (scene, reclaim_memory) in finished {
            info!(scene = %scene, "场景已卸载");
            self.events.push(SceneEvent::Unloaded { scene });
            self.reclaim_after(reclaim_memory);
        }
    }

    // ========== 查询 ==========

    pub fn active_scene_name(&self) -> Option<String> {
        self.backend.active_scene().map(|info| info.name)
    }

    pub fn active_build_index(&self) -> Option<usize> {
        self.backend.active_scene().and_then(|info| info.build_index)
    }

    pub fn is_scene_loaded(&self, name: &str) -> bool {
        self.backend.is_loaded(name)
    }

    /// 当前加载进度；从未加载过时为 0.0
    pub fn loading_progress(&self) -> f32 {
        self.state.as_ref().map_or(0.0, |state| state.progress)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, LoadPhase::Loading | LoadPhase::ReadyToActivate)
    }

    pub fn is_ready_to_activate(&self) -> bool {
        self.phase == LoadPhase::ReadyToActivate
    }

    /// 最近一次经由加载场景过渡时使用的加载场景
    pub fn loading_scene_name(&self) -> &str {
        &self.loading_scene
    }

    pub fn load_state(&self) -> Option<&SceneLoadState> {
        self.state.as_ref()
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    // ========== 内部 ==========

    fn ensure_idle(&self) -> Result<(), SceneError> {
        if !self.is_loading() {
            return Ok(());
        }
        let current = self
            .state
            .as_ref()
            .map(|state| state.scene.clone())
            .unwrap_or_default();
        warn!(current = %current, "已有场景正在加载，请求被拒绝");
        Err(SceneError::LoadInProgress { current })
    }

    fn ensure_loaded(&self, name: &str) -> Result<(), SceneError> {
        if self.backend.is_loaded(name) {
            return Ok(());
        }
        warn!(scene = %name, "场景未加载，无法卸载");
        Err(SceneError::NotFound {
            name: name.to_string(),
        })
    }

    fn resolve(&self, scene: &SceneRef) -> Result<String, SceneError> {
        let resolved = match scene {
            SceneRef::Name(name) => match self.backend.scene_index(name) {
                Some(_) => Ok(name.clone()),
                None => Err(SceneError::UnknownScene { name: name.clone() }),
            },
            SceneRef::Index(index) => {
                self.backend
                    .scene_name(*index)
                    .ok_or(SceneError::IndexOutOfRange {
                        index: *index as i64,
                        count: self.backend.scene_count(),
                    })
            }
        };
        resolved.inspect_err(|e| warn!(scene = %scene, error = %e, "无法解析场景"))
    }

    fn relative_index(&self, offset: i64) -> Result<usize, SceneError> {
        let current = self.active_build_index().ok_or(SceneError::NoActiveScene)?;
        let count = self.backend.scene_count();
        let index = current as i64 + offset;
        if index < 0 || index >= count as i64 {
            warn!(index, count, "构建索引越界");
            return Err(SceneError::IndexOutOfRange { index, count });
        }
        Ok(index as usize)
    }

    fn active_name_or_err(&self) -> Result<String, SceneError> {
        self.active_scene_name().ok_or_else(|| {
            warn!("当前没有激活的场景");
            SceneError::NoActiveScene
        })
    }

    fn load_now(
        &mut self,
        target: SceneRef,
        name: String,
        mode: LoadMode,
        reclaim_memory: bool,
    ) -> Result<(), SceneError> {
        self.backend
            .load(&name, mode)
            .inspect_err(|e| warn!(scene = %name, error = %e, "场景加载失败"))?;
        info!(scene = %name, ?mode, "场景已加载");

        self.events.push(SceneEvent::Loaded {
            scene: name.clone(),
            mode,
        });
        self.state = Some(SceneLoadState {
            target,
            scene: name,
            mode,
            is_loading: false,
            progress: 1.0,
            pending_activation: false,
        });
        self.phase = LoadPhase::Activated;
        self.reclaim_after(reclaim_memory);
        Ok(())
    }

    fn begin_load(
        &mut self,
        target: SceneRef,
        name: String,
        mode: LoadMode,
        deferred: bool,
        reclaim_memory: bool,
    ) -> Result<(), SceneError> {
        let op = self
            .backend
            .begin_load(&name, mode, !deferred)
            .inspect_err(|e| warn!(scene = %name, error = %e, "场景加载失败"))?;
        info!(scene = %name, ?mode, %op, deferred, "开始异步加载场景");

        self.state = Some(SceneLoadState {
            target,
            scene: name,
            mode,
            is_loading: true,
            progress: 0.0,
            pending_activation: false,
        });
        self.pending = Some(PendingLoad {
            op,
            deferred,
            reclaim_memory,
        });
        self.phase = LoadPhase::Loading;
        Ok(())
    }
}
