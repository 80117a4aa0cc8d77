//! # SceneBackend 模块
//!
//! 模拟的场景加载原语。每个场景按配置的耗时线性加载；
//! 推迟激活时进度停在激活阈值，Single 模式在激活时替换所有已加载的场景。

use std::collections::BTreeMap;

use stage_runtime::error::SceneError;
use stage_runtime::scene::{
    ACTIVATION_THRESHOLD, LoadMode, OperationId, OperationStatus, SceneBackend, SceneInfo,
};
use tracing::{debug, trace};

use crate::config::SceneEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpKind {
    Load(LoadMode),
    Unload,
}

#[derive(Debug)]
struct SimOperation {
    scene: String,
    kind: OpKind,
    /// 完成所需时间（秒）
    seconds: f32,
    elapsed: f32,
    allow_activation: bool,
    done: bool,
}

impl SimOperation {
    fn raw_progress(&self) -> f32 {
        if self.done {
            return 1.0;
        }
        let linear = if self.seconds <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.seconds).min(1.0)
        };
        if self.allow_activation {
            linear
        } else {
            linear.min(ACTIVATION_THRESHOLD)
        }
    }
}

/// 模拟的场景后端
#[derive(Debug)]
pub struct SimulatedSceneBackend {
    build: Vec<SceneEntry>,
    /// 已加载的场景，最后一个是激活场景
    loaded: Vec<String>,
    operations: BTreeMap<OperationId, SimOperation>,
    next_op: u64,
    reclaims: u32,
}

impl SimulatedSceneBackend {
    pub fn new(build: Vec<SceneEntry>) -> Self {
        Self {
            build,
            loaded: Vec::new(),
            operations: BTreeMap::new(),
            next_op: 0,
            reclaims: 0,
        }
    }

    pub fn loaded_scenes(&self) -> &[String] {
        &self.loaded
    }

    /// 仍在跟踪的操作数
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// 资源回收次数
    pub fn reclaim_count(&self) -> u32 {
        self.reclaims
    }

    fn entry(&self, name: &str) -> Result<&SceneEntry, SceneError> {
        self.build
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| SceneError::UnknownScene {
                name: name.to_string(),
            })
    }

    fn activate(&mut self, name: &str, mode: LoadMode) {
        if mode == LoadMode::Single {
            self.loaded.clear();
        }
        self.loaded.retain(|s| s != name);
        self.loaded.push(name.to_string());
        debug!(scene = name, ?mode, loaded = ?self.loaded, "场景已激活（模拟）");
    }

    fn start(&mut self, scene: &str, kind: OpKind, seconds: f32, allow: bool) -> OperationId {
        self.next_op += 1;
        let id = OperationId(self.next_op);
        self.operations.insert(
            id,
            SimOperation {
                scene: scene.to_string(),
                kind,
                seconds,
                elapsed: 0.0,
                allow_activation: allow,
                done: false,
            },
        );
        id
    }
}

impl SceneBackend for SimulatedSceneBackend {
    fn scene_count(&self) -> usize {
        self.build.len()
    }

    fn scene_name(&self, index: usize) -> Option<String> {
        self.build.get(index).map(|s| s.name.clone())
    }

    fn scene_index(&self, name: &str) -> Option<usize> {
        self.build.iter().position(|s| s.name == name)
    }

    fn load(&mut self, name: &str, mode: LoadMode) -> Result<(), SceneError> {
        self.entry(name)?;
        self.activate(name, mode);
        Ok(())
    }

    fn begin_load(
        &mut self,
        name: &str,
        mode: LoadMode,
        allow_activation: bool,
    ) -> Result<OperationId, SceneError> {
        let seconds = self.entry(name)?.load_seconds;
        Ok(self.start(name, OpKind::Load(mode), seconds, allow_activation))
    }

    fn unload(&mut self, name: &str) -> Result<(), SceneError> {
        if !self.is_loaded(name) {
            return Err(SceneError::NotFound {
                name: name.to_string(),
            });
        }
        self.loaded.retain(|s| s != name);
        Ok(())
    }

    fn begin_unload(&mut self, name: &str) -> Result<OperationId, SceneError> {
        if !self.is_loaded(name) {
            return Err(SceneError::NotFound {
                name: name.to_string(),
            });
        }
        Ok(self.start(name, OpKind::Unload, 0.0, true))
    }

    fn operation_status(&self, op: OperationId) -> Option<OperationStatus> {
        self.operations.get(&op).map(|op| OperationStatus {
            progress: op.raw_progress(),
            done: op.done,
        })
    }

    fn allow_activation(&mut self, op: OperationId) {
        if let Some(op) = self.operations.get_mut(&op) {
            op.allow_activation = true;
        }
    }

    fn active_scene(&self) -> Option<SceneInfo> {
        self.loaded.last().map(|name| SceneInfo {
            name: name.clone(),
            build_index: self.scene_index(name),
        })
    }

    fn is_loaded(&self, name: &str) -> bool {
        self.loaded.iter().any(|s| s == name)
    }

    fn reclaim_unused_assets(&mut self) {
        self.reclaims += 1;
        debug!(count = self.reclaims, "回收未使用的资源（模拟）");
    }

    /// 上一帧完成的操作已被轮询过，在这里移除
    fn tick(&mut self, dt: f32) {
        self.operations.retain(|_, op| !op.done);

        let mut finished = Vec::new();
        for (id, op) in self.operations.iter_mut() {
            op.elapsed += dt;
            trace!(op = %id, scene = %op.scene, progress = op.raw_progress(), "模拟加载");
            if op.allow_activation && op.elapsed >= op.seconds {
                op.done = true;
                finished.push((op.scene.clone(), op.kind));
            }
        }

        for (scene, kind) in finished {
            match kind {
                OpKind::Load(mode) => self.activate(&scene, mode),
                OpKind::Unload => self.loaded.retain(|s| *s != scene),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> SimulatedSceneBackend {
        SimulatedSceneBackend::new(vec![
            SceneEntry::new("Loading", 0.0),
            SceneEntry::new("Gameplay", 1.0),
        ])
    }

    #[test]
    fn test_linear_progress_and_activation() {
        let mut backend = backend();
        let op = backend.begin_load("Gameplay", LoadMode::Single, true).unwrap();

        backend.tick(0.5);
        let status = backend.operation_status(op).unwrap();
        assert_eq!(status.progress, 0.5);
        assert!(!status.done);

        backend.tick(0.5);
        assert!(backend.operation_status(op).unwrap().done);
        assert_eq!(backend.active_scene().unwrap().name, "Gameplay");
    }

    #[test]
    fn test_deferred_activation_stops_at_threshold() {
        let mut backend = backend();
        backend.load("Loading", LoadMode::Single).unwrap();
        let op = backend.begin_load("Gameplay", LoadMode::Single, false).unwrap();

        backend.tick(5.0);
        let status = backend.operation_status(op).unwrap();
        assert_eq!(status.progress, ACTIVATION_THRESHOLD);
        assert!(!status.done);
        assert_eq!(backend.loaded_scenes(), ["Loading".to_string()]);

        backend.allow_activation(op);
        backend.tick(0.0);
        assert_eq!(backend.loaded_scenes(), ["Gameplay".to_string()]);
    }

    #[test]
    fn test_unknown_scene_and_unload() {
        let mut backend = backend();
        assert!(backend.begin_load("Credits", LoadMode::Single, true).is_err());
        assert!(backend.unload("Gameplay").is_err());

        backend.load("Loading", LoadMode::Single).unwrap();
        backend.load("Gameplay", LoadMode::Additive).unwrap();
        let op = backend.begin_unload("Loading").unwrap();
        backend.tick(0.0);
        assert!(backend.operation_status(op).unwrap().done);
        assert!(!backend.is_loaded("Loading"));
    }

    #[test]
    fn test_finished_operations_are_dropped() {
        let mut backend = backend();
        let first = backend.begin_load("Loading", LoadMode::Single, true).unwrap();
        let second = backend.begin_load("Gameplay", LoadMode::Additive, true).unwrap();
        assert_eq!(backend.operation_count(), 2);

        backend.tick(0.5);
        // 完成的那一帧仍可查询
        assert!(backend.operation_status(first).unwrap().done);
        assert_eq!(backend.operation_count(), 2);

        backend.tick(0.5);
        assert!(backend.operation_status(first).is_none());
        assert!(backend.operation_status(second).unwrap().done);
        assert_eq!(backend.operation_count(), 1);

        backend.tick(0.0);
        assert_eq!(backend.operation_count(), 0);
    }
}
