//! # Controller 模块
//!
//! 单个面板的显示 / 隐藏过渡。
//!
//! 状态转换：
//!
//! ```text
//! Hidden ──show──► ShowingTransition ──完成──► Visible
//! Visible ──hide──► HidingTransition ──完成──► Hidden
//! ```
//!
//! 过渡进行中收到的请求按 FIFO 排队（或按配置丢弃），当前过渡完成后依次执行。
//! `cancel_transition()` 直接回到 Hidden，丢弃排队请求和未触发的回调。

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use super::TransitionConfig;
use super::panel::{CanvasGroup, Focusable, PanelHost};
use crate::error::TransitionError;
use crate::tween::{Transformable, Tween, Vec3};

/// 过渡完成回调
pub type Callback = Box<dyn FnOnce()>;

/// 面板状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Hidden,
    ShowingTransition,
    Visible,
    HidingTransition,
}

impl PanelState {
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::ShowingTransition | Self::HidingTransition)
    }
}

/// 过渡事件
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionEvent {
    ShowStarted,
    ShowComplete,
    HideStarted,
    HideComplete,
    /// 动画进度（0.0 - 1.0），过渡期间每帧一次
    Progress(f32),
}

/// 排队中的请求
pub struct TransitionRequest {
    pub is_show: bool,
    pub use_animation: bool,
    pub callback: Option<Callback>,
}

impl fmt::Debug for TransitionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionRequest")
            .field("is_show", &self.is_show)
            .field("use_animation", &self.use_animation)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// 一个属性从起点到终点的插值
struct Lane<T> {
    tween: Tween,
    from: T,
    to: T,
}

/// 进行中的过渡
struct ActiveTransition {
    is_show: bool,
    elapsed: f32,
    duration: f32,
    fade: Lane<f32>,
    scale: Option<Lane<Vec3>>,
    slide: Option<Lane<Vec3>>,
    callback: Option<Callback>,
}

impl ActiveTransition {
    /// # 返回
    /// 是否所有补间都已结束
    fn update(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        let mut running = self.fade.tween.update(dt);
        if let Some(lane) = self.scale.as_mut() {
            running |= lane.tween.update(dt);
        }
        if let Some(lane) = self.slide.as_mut() {
            running |= lane.tween.update(dt);
        }
        !running
    }

    fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// 面板过渡控制器
pub struct TransitionController {
    panel: Rc<dyn PanelHost>,
    group: Rc<dyn CanvasGroup>,
    rect: Rc<dyn Transformable>,
    focus_target: Option<Rc<dyn Focusable>>,
    config: TransitionConfig,
    state: PanelState,
    /// 显示状态下的布局（创建时记录）
    shown_position: Vec3,
    shown_scale: Vec3,
    active: Option<ActiveTransition>,
    queue: VecDeque<TransitionRequest>,
    events: Vec<TransitionEvent>,
}

impl fmt::Debug for TransitionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionController")
            .field("panel", &self.panel.name())
            .field("state", &self.state)
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl TransitionController {
    /// 创建控制器
    ///
    /// 面板缺少透明度控制器或布局变换时返回错误，不做降级处理。
    pub fn new(
        panel: Rc<dyn PanelHost>,
        config: TransitionConfig,
    ) -> Result<Self, TransitionError> {
        let missing = |component| TransitionError::MissingComponent {
            panel: panel.name().to_string(),
            component,
        };
        let group = panel.canvas_group().ok_or_else(|| missing("canvas_group"))?;
        let rect = panel.rect_transform().ok_or_else(|| missing("rect_transform"))?;

        if let Some(message) = config.problem() {
            return Err(TransitionError::InvalidConfig {
                panel: panel.name().to_string(),
                message,
            });
        }

        let mut controller = Self {
            shown_position: rect.position(),
            shown_scale: rect.scale(),
            panel,
            group,
            rect,
            focus_target: None,
            config,
            state: PanelState::Hidden,
            active: None,
            queue: VecDeque::new(),
            events: Vec::new(),
        };

        if controller.config.start_visible {
            controller.apply_visible();
            controller.state = PanelState::Visible;
        } else {
            controller.apply_hidden();
        }
        Ok(controller)
    }

    /// 显示完成后获得焦点的元素
    pub fn with_focus_target(mut self, target: Rc<dyn Focusable>) -> Self {
        self.focus_target = Some(target);
        self
    }

    pub fn set_focus_target(&mut self, target: Option<Rc<dyn Focusable>>) {
        self.focus_target = target;
    }

    /// 重新配置（不影响进行中的过渡）
    pub fn reconfigure(&mut self, config: TransitionConfig) -> Result<(), TransitionError> {
        if let Some(message) = config.problem() {
            return Err(TransitionError::InvalidConfig {
                panel: self.panel.name().to_string(),
                message,
            });
        }
        self.config = config;
        Ok(())
    }

    // ========== 请求入口 ==========

    pub fn show(&mut self, use_animation: bool, on_complete: Option<Callback>) {
        self.request(TransitionRequest {
            is_show: true,
            use_animation,
            callback: on_complete,
        });
    }

    pub fn hide(&mut self, use_animation: bool, on_complete: Option<Callback>) {
        self.request(TransitionRequest {
            is_show: false,
            use_animation,
            callback: on_complete,
        });
    }

    pub fn instant_show(&mut self, on_complete: Option<Callback>) {
        self.show(false, on_complete);
    }

    pub fn instant_hide(&mut self, on_complete: Option<Callback>) {
        self.hide(false, on_complete);
    }

    /// 背景点击
    ///
    /// # 返回
    /// 是否触发了隐藏
    pub fn on_background_click(&mut self) -> bool {
        if self.config.hide_on_background_click && self.state == PanelState::Visible {
            self.hide(true, None);
            return true;
        }
        false
    }

    /// 取消 / 返回输入
    ///
    /// # 返回
    /// 是否触发了隐藏
    pub fn on_cancel_input(&mut self) -> bool {
        if self.config.hide_on_cancel_input && self.state == PanelState::Visible {
            self.hide(true, None);
            return true;
        }
        false
    }

    /// 立即结束进行中的过渡，回到可交互的 Hidden 状态
    ///
    /// 排队请求与未触发的回调全部丢弃，不产生完成事件。
    pub fn cancel_transition(&mut self) {
        let dropped = self.queue.len();
        self.queue.clear();

        if self.active.take().is_some() {
            debug!(panel = self.panel.name(), dropped, "过渡已取消");
            self.group.set_alpha(0.0);
            self.group.set_interactable(true);
            self.group.set_blocks_raycasts(true);
            self.restore_layout();
            self.panel.set_active(false);
            self.state = PanelState::Hidden;
        }
    }

    fn request(&mut self, request: TransitionRequest) {
        if self.active.is_some() {
            if self.config.queue_transitions {
                warn!(
                    panel = self.panel.name(),
                    is_show = request.is_show,
                    state = ?self.state,
                    "过渡进行中，请求已排队"
                );
                self.queue.push_back(request);
            } else {
                warn!(
                    panel = self.panel.name(),
                    is_show = request.is_show,
                    state = ?self.state,
                    "过渡进行中，请求被丢弃"
                );
            }
            return;
        }
        self.execute(request);
    }

    fn execute(&mut self, request: TransitionRequest) {
        let target = if request.is_show {
            PanelState::Visible
        } else {
            PanelState::Hidden
        };

        if self.state == target && self.config.ignore_redundant_calls {
            warn!(panel = self.panel.name(), state = ?self.state, "面板已处于目标状态");
            if let Some(callback) = request.callback {
                callback();
            }
            return;
        }

        if !request.use_animation || self.config.fade_duration <= 0.0 {
            self.execute_instant(request);
        } else if request.is_show {
            self.begin_show(request.callback);
        } else {
            self.begin_hide(request.callback);
        }
    }

    fn execute_instant(&mut self, request: TransitionRequest) {
        if request.is_show {
            self.events.push(TransitionEvent::ShowStarted);
            self.panel.set_active(true);
            self.apply_visible();
            self.state = PanelState::Visible;
            self.assign_focus();
            self.events.push(TransitionEvent::ShowComplete);
        } else {
            self.events.push(TransitionEvent::HideStarted);
            self.apply_hidden();
            self.state = PanelState::Hidden;
            self.events.push(TransitionEvent::HideComplete);
        }
        if let Some(callback) = request.callback {
            callback();
        }
    }

    // ========== 动画过渡 ==========

    fn hidden_scale(&self) -> Option<Vec3> {
        self.config
            .scale
            .as_ref()
            .map(|s| self.shown_scale.scaled(s.hidden_scale))
    }

    fn hidden_position(&self) -> Option<Vec3> {
        self.config
            .slide
            .as_ref()
            .map(|s| self.shown_position + s.direction.hidden_offset(s.distance))
    }

    fn begin_show(&mut self, callback: Option<Callback>) {
        self.panel.set_active(true);

        // 从隐藏姿态开始
        self.group.set_alpha(0.0);
        let scale_from = self.hidden_scale();
        let slide_from = self.hidden_position();
        if let Some(scale) = scale_from {
            self.rect.set_scale(scale);
        }
        if let Some(position) = slide_from {
            self.rect.set_position(position);
        }

        let scale = scale_from.map(|from| (from, self.shown_scale));
        let slide = slide_from.map(|from| (from, self.shown_position));
        self.begin(true, 1.0, scale, slide, callback);
        self.events.push(TransitionEvent::ShowStarted);
    }

    fn begin_hide(&mut self, callback: Option<Callback>) {
        let scale = self.hidden_scale().map(|to| (self.rect.scale(), to));
        let slide = self.hidden_position().map(|to| (self.rect.position(), to));
        self.begin(false, 0.0, scale, slide, callback);
        self.events.push(TransitionEvent::HideStarted);
    }

    fn begin(
        &mut self,
        is_show: bool,
        alpha_to: f32,
        scale: Option<(Vec3, Vec3)>,
        slide: Option<(Vec3, Vec3)>,
        callback: Option<Callback>,
    ) {
        let duration = self.config.fade_duration;

        if self.config.disable_input_during_transition {
            self.group.set_interactable(false);
            self.group.set_blocks_raycasts(false);
        }

        let fade = Lane {
            tween: Tween::new(duration, self.config.fade_easing),
            from: self.group.alpha(),
            to: alpha_to,
        };
        let scale = scale.zip(self.config.scale.as_ref()).map(|((from, to), effect)| Lane {
            tween: Tween::new(duration, effect.easing),
            from,
            to,
        });
        let slide = slide.zip(self.config.slide.as_ref()).map(|((from, to), effect)| Lane {
            tween: Tween::new(duration, effect.easing),
            from,
            to,
        });

        self.state = if is_show {
            PanelState::ShowingTransition
        } else {
            PanelState::HidingTransition
        };
        self.active = Some(ActiveTransition {
            is_show,
            elapsed: 0.0,
            duration,
            fade,
            scale,
            slide,
            callback,
        });
        debug!(panel = self.panel.name(), is_show, duration, "过渡开始");
    }

    /// 推进进行中的过渡
    ///
    /// # 返回
    /// 自上次调用以来产生的事件
    pub fn update(&mut self, dt: f32) -> Vec<TransitionEvent> {
        if let Some(active) = self.active.as_mut() {
            let finished = active.update(dt);

            self.group.set_alpha(
                active.fade.from + (active.fade.to - active.fade.from) * active.fade.tween.progress(),
            );
            if let Some(lane) = &active.scale {
                self.rect.set_scale(lane.from.lerp(lane.to, lane.tween.progress()));
            }
            if let Some(lane) = &active.slide {
                self.rect.set_position(lane.from.lerp(lane.to, lane.tween.progress()));
            }
            self.events.push(TransitionEvent::Progress(active.progress()));

            if finished {
                self.finish();
            }
        }

        std::mem::take(&mut self.events)
    }

    fn finish(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        if active.is_show {
            self.apply_visible();
            self.state = PanelState::Visible;
            self.assign_focus();
            self.events.push(TransitionEvent::ShowComplete);
        } else {
            self.apply_hidden();
            self.state = PanelState::Hidden;
            self.events.push(TransitionEvent::HideComplete);
        }

        if let Some(callback) = active.callback {
            callback();
        }

        while self.active.is_none() {
            let Some(next) = self.queue.pop_front() else {
                break;
            };
            self.execute(next);
        }
    }

    // ========== 姿态 ==========

    fn apply_visible(&self) {
        self.group.set_alpha(1.0);
        self.group.set_interactable(true);
        self.group.set_blocks_raycasts(true);
        self.rect.set_scale(self.shown_scale);
        self.rect.set_position(self.shown_position);
    }

    fn apply_hidden(&self) {
        self.group.set_alpha(0.0);
        self.group.set_interactable(false);
        self.group.set_blocks_raycasts(false);
        self.restore_layout();
        self.panel.set_active(false);
    }

    /// 隐藏后恢复布局，下次显示从干净的姿态开始
    fn restore_layout(&self) {
        self.rect.set_scale(self.shown_scale);
        self.rect.set_position(self.shown_position);
    }

    fn assign_focus(&self) {
        if let Some(target) = &self.focus_target
            && let Err(e) = target.focus()
        {
            warn!(panel = self.panel.name(), error = %e, "设置焦点失败");
        }
    }

    // ========== 查询 ==========

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == PanelState::Visible
    }

    pub fn is_transitioning(&self) -> bool {
        self.active.is_some()
    }

    /// 当前过渡进度；没有过渡时为 1.0
    pub fn progress(&self) -> f32 {
        self.active.as_ref().map_or(1.0, ActiveTransition::progress)
    }

    pub fn pending_requests(&self) -> usize {
        self.queue.len()
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    pub fn panel_name(&self) -> &str {
        self.panel.name()
    }
}
