//! # Loading 模块
//!
//! 加载界面驱动。
//!
//! ## 流程
//!
//! ```text
//! begin() ──► Intro（面板淡入）──► Waiting（进度条追赶实际进度）
//!                                        │ 就绪 + 最短显示时间已到 + 进度条满
//!                                        ▼
//!              Done ◄── activate_loaded_scene() ◄── Outro（面板淡出）
//! ```

use std::rc::Rc;

use stage_runtime::scene::SceneTransitionManager;
use stage_runtime::transition::{PanelElement, TransitionController, TransitionEvent};
use stage_runtime::tween::{EasingFunction, Tween};
use tracing::{debug, info, warn};

use crate::config::LoadingConfig;
use crate::error::HostResult;

/// 加载界面阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadingPhase {
    #[default]
    Inactive,
    Intro,
    Waiting,
    Outro,
    Done,
}

/// 进度条的平滑动画
#[derive(Debug)]
struct BarAnimation {
    tween: Tween,
    from: f32,
    to: f32,
}

/// 加载界面
pub struct LoadingScreen {
    config: LoadingConfig,
    panel: Rc<PanelElement>,
    controller: TransitionController,
    phase: LoadingPhase,
    /// 本次显示已经过的时间
    elapsed: f32,
    displayed: f32,
    bar: Option<BarAnimation>,
    /// 关闭自动激活时由外部请求离开
    leave_requested: bool,
    /// 目标场景加载失败，退出时不激活
    abandoned: bool,
}

impl std::fmt::Debug for LoadingScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingScreen")
            .field("phase", &self.phase)
            .field("elapsed", &self.elapsed)
            .field("displayed", &self.displayed)
            .finish()
    }
}

impl LoadingScreen {
    pub fn new(config: LoadingConfig) -> HostResult<Self> {
        let panel = Rc::new(PanelElement::new("loading"));
        let controller = TransitionController::new(panel.clone(), config.panel.clone())?;
        Ok(Self {
            config,
            panel,
            controller,
            phase: LoadingPhase::Inactive,
            elapsed: 0.0,
            displayed: 0.0,
            bar: None,
            leave_requested: false,
            abandoned: false,
        })
    }

    /// 加载场景激活后调用
    pub fn begin(&mut self) {
        self.phase = LoadingPhase::Intro;
        self.elapsed = 0.0;
        self.displayed = 0.0;
        self.bar = None;
        self.leave_requested = false;
        self.abandoned = false;
        self.controller.show(true, None);
        debug!("加载界面开始显示");
    }

    /// 每帧更新
    ///
    /// # 返回
    /// 本帧是否激活了目标场景
    pub fn update(&mut self, dt: f32, scenes: &mut SceneTransitionManager) -> bool {
        if matches!(self.phase, LoadingPhase::Inactive | LoadingPhase::Done) {
            return false;
        }

        self.elapsed += dt;
        let events = self.controller.update(dt);
        self.update_bar(dt, scenes.loading_progress());

        match self.phase {
            LoadingPhase::Intro if events.contains(&TransitionEvent::ShowComplete) => {
                self.phase = LoadingPhase::Waiting;
            }
            LoadingPhase::Intro | LoadingPhase::Waiting if self.load_abandoned(scenes) => {
                self.phase = LoadingPhase::Outro;
                self.abandoned = true;
                self.controller.hide(true, None);
                warn!(elapsed = self.elapsed, "目标场景加载失败，加载界面淡出");
            }
            LoadingPhase::Intro | LoadingPhase::Waiting if self.should_leave(scenes) => {
                self.phase = LoadingPhase::Outro;
                self.controller.hide(true, None);
                debug!(elapsed = self.elapsed, "加载完成，加载界面淡出");
            }
            LoadingPhase::Outro if events.contains(&TransitionEvent::HideComplete) => {
                return self.finish(scenes);
            }
            _ => {}
        }

        // 即时过渡在同一帧完成
        if self.phase == LoadingPhase::Outro && !self.controller.is_transitioning() {
            return self.finish(scenes);
        }
        false
    }

    fn finish(&mut self, scenes: &mut SceneTransitionManager) -> bool {
        self.phase = LoadingPhase::Done;
        if self.abandoned {
            return false;
        }
        self.activate(scenes)
    }

    /// 加载操作已经结束但没有进入等待激活，说明目标场景加载失败
    fn load_abandoned(&self, scenes: &SceneTransitionManager) -> bool {
        !scenes.is_loading() && !self.controller.is_transitioning()
    }

    /// 目标场景加载失败，加载界面已经（或正在）退出
    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    /// 请求离开加载界面（关闭自动激活时使用），条件满足后开始淡出
    pub fn request_leave(&mut self) {
        self.leave_requested = true;
    }

    fn should_leave(&self, scenes: &SceneTransitionManager) -> bool {
        (self.config.auto_activate || self.leave_requested)
            && scenes.is_ready_to_activate()
            && self.elapsed >= self.config.minimum_display_time
            && self.displayed >= 1.0
            && !self.controller.is_transitioning()
    }

    fn activate(&mut self, scenes: &mut SceneTransitionManager) -> bool {
        match scenes.activate_loaded_scene() {
            Ok(()) => {
                info!(elapsed = self.elapsed, "加载界面结束，激活目标场景");
                true
            }
            Err(e) => {
                warn!(error = %e, "激活目标场景失败");
                false
            }
        }
    }

    /// 进度条平滑追赶实际进度
    fn update_bar(&mut self, dt: f32, target: f32) {
        let current_target = self.bar.as_ref().map_or(self.displayed, |bar| bar.to);
        if target > current_target {
            self.bar = Some(BarAnimation {
                tween: Tween::new(self.config.progress_smoothing, EasingFunction::OutQuad),
                from: self.displayed,
                to: target,
            });
        }

        if let Some(bar) = self.bar.as_mut() {
            let running = bar.tween.update(dt);
            self.displayed = bar.from + (bar.to - bar.from) * bar.tween.progress();
            if !running {
                self.displayed = bar.to;
                self.bar = None;
            }
        }
    }

    // ========== 查询 ==========

    pub fn phase(&self) -> LoadingPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.phase, LoadingPhase::Inactive | LoadingPhase::Done)
    }

    /// 进度条当前显示的进度
    pub fn displayed_progress(&self) -> f32 {
        self.displayed
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn panel_alpha(&self) -> f32 {
        use stage_runtime::tween::Fadeable;
        self.panel.group().map_or(0.0, |group| group.alpha())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneEntry;
    use crate::scene_backend::SimulatedSceneBackend;
    use stage_runtime::error::SceneError;
    use stage_runtime::scene::{
        LoadMode, OperationId, OperationStatus, SceneBackend, SceneEvent, SceneInfo,
    };

    #[test]
    fn test_bar_follows_progress() {
        let config = LoadingConfig {
            progress_smoothing: 0.5,
            ..LoadingConfig::default()
        };
        let mut screen = LoadingScreen::new(config).unwrap();
        screen.update_bar(0.25, 1.0);
        let halfway = screen.displayed_progress();
        assert!(halfway > 0.0 && halfway < 1.0);

        screen.update_bar(0.25, 1.0);
        assert_eq!(screen.displayed_progress(), 1.0);

        // 进度不会回退
        screen.update_bar(0.25, 0.5);
        assert_eq!(screen.displayed_progress(), 1.0);
    }

    /// 丢失所有异步操作的后端
    struct LosingBackend(SimulatedSceneBackend);

    impl SceneBackend for LosingBackend {
        fn scene_count(&self) -> usize {
            self.0.scene_count()
        }
        fn scene_name(&self, index: usize) -> Option<String> {
            self.0.scene_name(index)
        }
        fn scene_index(&self, name: &str) -> Option<usize> {
            self.0.scene_index(name)
        }
        fn load(&mut self, name: &str, mode: LoadMode) -> Result<(), SceneError> {
            self.0.load(name, mode)
        }
        fn begin_load(
            &mut self,
            name: &str,
            mode: LoadMode,
            allow_activation: bool,
        ) -> Result<OperationId, SceneError> {
            self.0.begin_load(name, mode, allow_activation)
        }
        fn unload(&mut self, name: &str) -> Result<(), SceneError> {
            self.0.unload(name)
        }
        fn begin_unload(&mut self, name: &str) -> Result<OperationId, SceneError> {
            self.0.begin_unload(name)
        }
        fn operation_status(&self, _op: OperationId) -> Option<OperationStatus> {
            None
        }
        fn allow_activation(&mut self, op: OperationId) {
            self.0.allow_activation(op)
        }
        fn active_scene(&self) -> Option<SceneInfo> {
            self.0.active_scene()
        }
        fn is_loaded(&self, name: &str) -> bool {
            self.0.is_loaded(name)
        }
        fn reclaim_unused_assets(&mut self) {
            self.0.reclaim_unused_assets()
        }
    }

    #[test]
    fn test_screen_leaves_after_failed_load() {
        let backend = SimulatedSceneBackend::new(vec![
            SceneEntry::new("Loading", 0.0),
            SceneEntry::new("MainMenu", 0.0),
            SceneEntry::new("Gameplay", 1.0),
        ]);
        let mut scenes = SceneTransitionManager::new(Box::new(LosingBackend(backend)));
        scenes.load_scene("MainMenu", LoadMode::Single, false).unwrap();
        scenes.load_through_loading_screen("Gameplay", "Loading").unwrap();

        let mut screen = LoadingScreen::new(LoadingConfig::default()).unwrap();
        screen.begin();

        let mut failed = false;
        for _ in 0..120 {
            let events = scenes.update(0.05);
            failed |= events
                .iter()
                .any(|e| matches!(e, SceneEvent::LoadFailed { .. }));
            assert!(!screen.update(0.05, &mut scenes));
        }

        assert!(failed);
        assert!(!scenes.is_loading());
        assert!(screen.is_abandoned());
        assert_eq!(screen.phase(), LoadingPhase::Done);
        assert!(!screen.is_active());
        assert_eq!(screen.panel_alpha(), 0.0);
        assert_eq!(scenes.active_scene_name().as_deref(), Some("Loading"));
    }

    #[test]
    fn test_inactive_screen_does_nothing() {
        let screen = LoadingScreen::new(LoadingConfig::default()).unwrap();
        assert!(!screen.is_active());
        assert_eq!(screen.panel_alpha(), 0.0);
    }
}
