//! # Runner 模块
//!
//! 声明式补间的播放器。持有两组独立调度的补间：
//!
//! - **同时组**：`run_simultaneous()` 在同一帧全部启动
//! - **顺序组**：`run_sequential()` 按列表顺序逐个播放，
//!   每个补间（含延迟与全部循环）结束后才启动下一个
//!
//! 同时组的最后一个补间完成时，如果顺序组没有在播放，会自动启动顺序组。
//!
//! 多帧等待全部由 `update(dt)` 推进，顺序组的进度保存在显式的游标里。

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use super::target::{
    Color, ColorChannel, FadeChannel, TweenTarget, Vec3, resolve_color_channel,
    resolve_fade_channel,
};
use super::{Tween, TweenKind, TweenSpec};
use crate::error::TweenError;

/// 播放器事件
#[derive(Debug, Clone, PartialEq)]
pub enum TweenEvent {
    /// 补间已启动（延迟开始计时）
    Started { name: String },
    /// 补间自然完成（被取消的补间不会产生此事件）
    Completed { name: String },
    /// 顺序组全部播放完毕
    SequenceCompleted,
}

/// 解析后的可动画通道
#[derive(Debug, Clone, Copy, PartialEq)]
enum Channel {
    Position,
    Scale,
    Rotation,
    Alpha(FadeChannel),
    Tint(ColorChannel),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TweenValue {
    Vector(Vec3),
    Scalar(f32),
    Color(Color),
}

impl TweenValue {
    fn lerp(self, to: TweenValue, t: f32) -> TweenValue {
        match (self, to) {
            (Self::Vector(a), Self::Vector(b)) => Self::Vector(a.lerp(b, t)),
            (Self::Scalar(a), Self::Scalar(b)) => Self::Scalar(a + (b - a) * t),
            (Self::Color(a), Self::Color(b)) => Self::Color(a.lerp(b, t)),
            (_, to) => to,
        }
    }
}

impl Channel {
    fn read(&self, target: &dyn TweenTarget) -> Option<TweenValue> {
        match self {
            Self::Position => target.transform().map(|t| TweenValue::Vector(t.position())),
            Self::Scale => target.transform().map(|t| TweenValue::Vector(t.scale())),
            Self::Rotation => target.transform().map(|t| TweenValue::Vector(t.rotation())),
            Self::Alpha(channel) => target
                .fadeable(*channel)
                .map(|f| TweenValue::Scalar(f.alpha())),
            Self::Tint(channel) => target
                .colorable(*channel)
                .map(|c| TweenValue::Color(c.color())),
        }
    }

    fn write(&self, target: &dyn TweenTarget, value: TweenValue) {
        match (self, value) {
            (Self::Position, TweenValue::Vector(v)) => {
                if let Some(t) = target.transform() {
                    t.set_position(v);
                }
            }
            (Self::Scale, TweenValue::Vector(v)) => {
                if let Some(t) = target.transform() {
                    t.set_scale(v);
                }
            }
            (Self::Rotation, TweenValue::Vector(v)) => {
                if let Some(t) = target.transform() {
                    t.set_rotation(v);
                }
            }
            (Self::Alpha(channel), TweenValue::Scalar(a)) => {
                if let Some(f) = target.fadeable(*channel) {
                    f.set_alpha(a);
                }
            }
            (Self::Tint(channel), TweenValue::Color(c)) => {
                if let Some(col) = target.colorable(*channel) {
                    col.set_color(c);
                }
            }
            _ => {}
        }
    }
}

/// 正在播放的补间实例（只属于启动它的那次调用）
struct ActiveTween {
    name: String,
    target: Rc<dyn TweenTarget>,
    channel: Channel,
    /// 起始值在延迟结束时采样
    from: Option<TweenValue>,
    to: TweenValue,
    timeline: Tween,
}

impl ActiveTween {
    fn resolve(spec: &TweenSpec, target: Rc<dyn TweenTarget>) -> Result<Self, TweenError> {
        let missing = |capability| TweenError::MissingCapability {
            tween: spec.name.clone(),
            capability,
        };

        let (channel, to) = match spec.kind {
            TweenKind::Move | TweenKind::Scale | TweenKind::Rotate => {
                if target.transform().is_none() {
                    return Err(missing("transform"));
                }
                let channel = match spec.kind {
                    TweenKind::Move => Channel::Position,
                    TweenKind::Scale => Channel::Scale,
                    _ => Channel::Rotation,
                };
                (channel, TweenValue::Vector(spec.target_vector))
            }
            TweenKind::Fade => {
                let channel = resolve_fade_channel(target.as_ref()).ok_or_else(|| missing("alpha"))?;
                (
                    Channel::Alpha(channel),
                    TweenValue::Scalar(spec.target_alpha.clamp(0.0, 1.0)),
                )
            }
            TweenKind::Color => {
                let channel =
                    resolve_color_channel(target.as_ref()).ok_or_else(|| missing("color"))?;
                (Channel::Tint(channel), TweenValue::Color(spec.target_color))
            }
        };

        Ok(Self {
            name: spec.name.clone(),
            target,
            channel,
            from: None,
            to,
            timeline: spec.timeline(),
        })
    }

    /// # 返回
    /// 补间是否仍在进行
    fn update(&mut self, dt: f32) -> bool {
        let running = self.timeline.update(dt);
        if !self.timeline.has_started() {
            return running;
        }

        let target = self.target.as_ref();
        if self.from.is_none() {
            self.from = self.channel.read(target);
        }
        if let Some(from) = self.from {
            let value = from.lerp(self.to, self.timeline.progress());
            self.channel.write(target, value);
        }
        running
    }
}

/// 顺序组游标
struct SequenceCursor {
    index: usize,
    current: Option<ActiveTween>,
}

/// 补间播放器
pub struct TweenRunner {
    /// 默认目标（播放器所属的对象）
    owner: Rc<dyn TweenTarget>,
    /// 可通过句柄引用的外部目标
    targets: HashMap<String, Rc<dyn TweenTarget>>,
    simultaneous: Vec<TweenSpec>,
    sequential: Vec<TweenSpec>,
    /// 创建后调用 `start()` 时自动播放
    play_on_start: bool,
    active: Vec<ActiveTween>,
    sequence: Option<SequenceCursor>,
    paused: bool,
    events: Vec<TweenEvent>,
}

impl fmt::Debug for TweenRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenRunner")
            .field("owner", &self.owner.name())
            .field("simultaneous", &self.simultaneous.len())
            .field("sequential", &self.sequential.len())
            .field("active", &self.active.len())
            .field("sequence_index", &self.sequence.as_ref().map(|s| s.index))
            .field("paused", &self.paused)
            .finish()
    }
}

impl TweenRunner {
    pub fn new(owner: Rc<dyn TweenTarget>) -> Self {
        Self {
            owner,
            targets: HashMap::new(),
            simultaneous: Vec::new(),
            sequential: Vec::new(),
            play_on_start: false,
            active: Vec::new(),
            sequence: None,
            paused: false,
            events: Vec::new(),
        }
    }

    pub fn with_simultaneous(mut self, specs: Vec<TweenSpec>) -> Self {
        self.simultaneous = specs;
        self
    }

    pub fn with_sequential(mut self, specs: Vec<TweenSpec>) -> Self {
        self.sequential = specs;
        self
    }

    pub fn with_play_on_start(mut self, play_on_start: bool) -> Self {
        self.play_on_start = play_on_start;
        self
    }

    /// 注册外部目标，供 `TweenSpec::target` 引用
    pub fn register_target(&mut self, handle: impl Into<String>, target: Rc<dyn TweenTarget>) {
        self.targets.insert(handle.into(), target);
    }

    pub fn unregister_target(&mut self, handle: &str) -> bool {
        self.targets.remove(handle).is_some()
    }

    /// 宿主创建完毕后调用
    ///
    /// 开启 `play_on_start` 时播放同时组；同时组为空则直接播放顺序组。
    pub fn start(&mut self) {
        if !self.play_on_start {
            return;
        }
        if self.simultaneous.is_empty() {
            self.run_sequential();
        } else {
            self.run_simultaneous();
        }
    }

    fn resolve_target(&self, spec: &TweenSpec) -> Result<Rc<dyn TweenTarget>, TweenError> {
        match &spec.target {
            None => Ok(self.owner.clone()),
            Some(handle) => {
                self.targets
                    .get(handle)
                    .cloned()
                    .ok_or_else(|| TweenError::TargetNotFound {
                        tween: spec.name.clone(),
                        target: handle.clone(),
                    })
            }
        }
    }

    fn instantiate(&self, spec: &TweenSpec) -> Result<ActiveTween, TweenError> {
        let target = self.resolve_target(spec)?;
        ActiveTween::resolve(spec, target)
    }

    /// 同时启动同时组中的所有补间
    ///
    /// 之前仍在播放的同时组补间会被静默取消。
    /// 解析失败的补间记录警告后跳过，不影响其他补间。
    pub fn run_simultaneous(&mut self) {
        self.active.clear();

        for spec in &self.simultaneous {
            match self.instantiate(spec) {
                Ok(mut tween) => {
                    if self.paused {
                        tween.timeline.pause();
                    }
                    self.events.push(TweenEvent::Started {
                        name: spec.name.clone(),
                    });
                    self.active.push(tween);
                }
                Err(e) => warn!(error = %e, "跳过补间"),
            }
        }
        debug!(count = self.active.len(), "同时组已启动");
    }

    /// 从头播放顺序组
    ///
    /// 正在进行的顺序播放会被取消（不产生完成事件）。
    pub fn run_sequential(&mut self) {
        if self.sequential.is_empty() {
            debug!(owner = self.owner.name(), "顺序组为空");
            self.sequence = None;
            return;
        }
        self.sequence = Some(SequenceCursor {
            index: 0,
            current: None,
        });
        self.start_sequence_step();
    }

    /// 从游标当前位置启动下一个可解析的补间
    fn start_sequence_step(&mut self) {
        let Some(mut cursor) = self.sequence.take() else {
            return;
        };

        while let Some(spec) = self.sequential.get(cursor.index) {
            match self.instantiate(spec) {
                Ok(mut tween) => {
                    if self.paused {
                        tween.timeline.pause();
                    }
                    self.events.push(TweenEvent::Started {
                        name: spec.name.clone(),
                    });
                    cursor.current = Some(tween);
                    self.sequence = Some(cursor);
                    return;
                }
                Err(e) => {
                    warn!(error = %e, index = cursor.index, "跳过顺序补间");
                    cursor.index += 1;
                }
            }
        }

        debug!(owner = self.owner.name(), "顺序组播放完毕");
        self.events.push(TweenEvent::SequenceCompleted);
    }

    /// 推进所有补间
    ///
    /// # 返回
    /// 自上次调用以来产生的事件
    pub fn update(&mut self, dt: f32) -> Vec<TweenEvent> {
        if self.paused {
            return std::mem::take(&mut self.events);
        }

        // 先推进顺序组，避免本帧自动启动的顺序组被多推进一帧
        let mut step_finished = None;
        if let Some(cursor) = self.sequence.as_mut()
            && let Some(current) = cursor.current.as_mut()
            && !current.update(dt)
        {
            step_finished = Some(current.name.clone());
        }
        if let Some(name) = step_finished {
            self.events.push(TweenEvent::Completed { name });
            if let Some(cursor) = self.sequence.as_mut() {
                cursor.index += 1;
                cursor.current = None;
            }
            self.start_sequence_step();
        }

        let mut completed = Vec::new();
        self.active.retain_mut(|tween| {
            if tween.update(dt) {
                true
            } else {
                completed.push(tween.name.clone());
                false
            }
        });

        let any_completed = !completed.is_empty();
        for name in completed {
            self.events.push(TweenEvent::Completed { name });
        }

        if any_completed && self.active.is_empty() && self.sequence.is_none() {
            debug!(owner = self.owner.name(), "同时组结束，自动启动顺序组");
            self.run_sequential();
        }

        std::mem::take(&mut self.events)
    }

    /// 立即停止所有补间，不产生完成事件
    pub fn cancel_all(&mut self) {
        for tween in &mut self.active {
            tween.timeline.cancel();
        }
        self.active.clear();
        self.sequence = None;
        self.events
            .retain(|event| matches!(event, TweenEvent::Started { .. }));
    }

    /// 原地暂停，保留已播放进度
    pub fn pause(&mut self) {
        self.paused = true;
        for tween in self.tweens_mut() {
            tween.timeline.pause();
        }
    }

    pub fn resume(&mut self) {
        self.paused = false;
        for tween in self.tweens_mut() {
            tween.timeline.resume();
        }
    }

    fn tweens_mut(&mut self) -> impl Iterator<Item = &mut ActiveTween> {
        self.active.iter_mut().chain(
            self.sequence
                .as_mut()
                .and_then(|cursor| cursor.current.as_mut()),
        )
    }

    /// 是否还有补间在播放（含暂停中的）
    pub fn is_running(&self) -> bool {
        !self.active.is_empty() || self.sequence.is_some()
    }

    pub fn is_sequence_running(&self) -> bool {
        self.sequence.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
            + self
                .sequence
                .as_ref()
                .map_or(0, |cursor| usize::from(cursor.current.is_some()))
    }

    /// 顺序组当前播放到的位置
    pub fn sequence_index(&self) -> Option<usize> {
        self.sequence.as_ref().map(|cursor| cursor.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tween::EasingFunction;
    use crate::tween::target::ElementTarget;

    fn element() -> Rc<ElementTarget> {
        Rc::new(
            ElementTarget::new("button")
                .with_transform()
                .with_fade(FadeChannel::Image)
                .with_color(ColorChannel::Text),
        )
    }

    fn completed(events: &[TweenEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|e| match e {
                TweenEvent::Completed { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_simultaneous_all_start_together() {
        let target = element();
        let mut runner = TweenRunner::new(target.clone()).with_simultaneous(vec![
            TweenSpec::move_to("move", Vec3::new(10.0, 0.0, 0.0), 1.0)
                .with_easing(EasingFunction::Linear),
            TweenSpec::fade_to("fade", 0.0, 0.5).with_easing(EasingFunction::Linear),
        ]);

        runner.run_simultaneous();
        let events = runner.update(0.25);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, TweenEvent::Started { .. }))
                .count(),
            2
        );
        assert!((target.position().unwrap().x - 2.5).abs() < 0.001);
        assert!((target.alpha(FadeChannel::Image).unwrap() - 0.5).abs() < 0.001);

        let events = runner.update(0.25);
        assert_eq!(completed(&events), vec!["fade"]);
        let events = runner.update(0.5);
        assert_eq!(completed(&events), vec!["move"]);
        assert_eq!(target.position().unwrap().x, 10.0);
        assert!(!runner.is_running());
    }

    #[test]
    fn test_completion_fires_once_after_delay_and_duration() {
        let mut runner = TweenRunner::new(element()).with_simultaneous(vec![
            TweenSpec::fade_to("fade", 0.0, 0.5).with_delay(0.25),
        ]);
        runner.run_simultaneous();

        let mut fired = 0;
        let mut elapsed = 0.0;
        for _ in 0..20 {
            elapsed += 0.125;
            let events = runner.update(0.125);
            let count = completed(&events).len();
            if count > 0 {
                assert!(elapsed >= 0.75 - 0.0001);
            }
            fired += count;
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_sequential_order() {
        let target = element();
        let mut runner = TweenRunner::new(target.clone()).with_sequential(vec![
            TweenSpec::move_to("a", Vec3::new(1.0, 0.0, 0.0), 1.0),
            TweenSpec::scale_to("b", Vec3::new(2.0, 2.0, 2.0), 1.0),
        ]);
        runner.run_sequential();

        let mut time = 0.0;
        let mut a_completed_at = None;
        let mut b_started_at = None;
        // 启动时 a 的 Started 事件在首帧返回
        for _ in 0..12 {
            let events = runner.update(0.25);
            time += 0.25;
            for event in &events {
                match event {
                    TweenEvent::Completed { name } if name == "a" => a_completed_at = Some(time),
                    TweenEvent::Started { name } if name == "b" => b_started_at = Some(time),
                    _ => {}
                }
            }
        }

        let a_done = a_completed_at.unwrap();
        let b_start = b_started_at.unwrap();
        assert!(b_start >= a_done);
        assert_eq!(target.scale().unwrap(), Vec3::new(2.0, 2.0, 2.0));
        assert!(!runner.is_sequence_running());
    }

    #[test]
    fn test_sequence_restart_cancels_previous() {
        let mut runner = TweenRunner::new(element()).with_sequential(vec![
            TweenSpec::move_to("a", Vec3::ONE, 1.0),
            TweenSpec::move_to("b", Vec3::ZERO, 1.0),
        ]);
        runner.run_sequential();
        runner.update(1.0);
        assert_eq!(runner.sequence_index(), Some(1));

        runner.run_sequential();
        assert_eq!(runner.sequence_index(), Some(0));
    }

    #[test]
    fn test_unresolved_target_skips_only_that_spec() {
        let mut runner = TweenRunner::new(element()).with_simultaneous(vec![
            TweenSpec::fade_to("missing", 0.0, 0.5).on_target("nowhere"),
            TweenSpec::fade_to("ok", 0.0, 0.5),
        ]);
        runner.run_simultaneous();
        assert_eq!(runner.active_count(), 1);
    }

    #[test]
    fn test_missing_capability_skips() {
        let plain: Rc<dyn TweenTarget> = Rc::new(ElementTarget::new("plain"));
        let mut runner = TweenRunner::new(plain).with_simultaneous(vec![
            TweenSpec::move_to("move", Vec3::ONE, 0.5),
            TweenSpec::color_to("tint", Color::BLACK, 0.5),
        ]);
        runner.run_simultaneous();
        assert!(!runner.is_running());
    }

    #[test]
    fn test_external_target() {
        let owner = element();
        let other = Rc::new(ElementTarget::new("logo").with_fade(FadeChannel::Sprite));
        let mut runner = TweenRunner::new(owner.clone()).with_simultaneous(vec![
            TweenSpec::fade_to("logo_out", 0.0, 0.5).on_target("logo"),
        ]);
        runner.register_target("logo", other.clone());

        runner.run_simultaneous();
        runner.update(0.5);
        assert_eq!(other.alpha(FadeChannel::Sprite), Some(0.0));
        assert_eq!(owner.alpha(FadeChannel::Image), Some(1.0));
    }

    #[test]
    fn test_cancel_all_fires_no_completions() {
        let mut runner = TweenRunner::new(element()).with_simultaneous(vec![
            TweenSpec::move_to("a", Vec3::ONE, 1.0),
            TweenSpec::fade_to("b", 0.0, 1.0),
            TweenSpec::color_to("c", Color::BLACK, 1.0),
        ]);
        runner.run_simultaneous();
        runner.update(0.5);

        runner.cancel_all();
        assert!(!runner.is_running());

        let mut events = Vec::new();
        for _ in 0..10 {
            events.extend(runner.update(0.5));
        }
        assert!(completed(&events).is_empty());
    }

    #[test]
    fn test_last_simultaneous_completion_starts_sequence() {
        let mut runner = TweenRunner::new(element())
            .with_simultaneous(vec![
                TweenSpec::fade_to("fade", 0.0, 0.5),
                TweenSpec::move_to("move", Vec3::ONE, 1.0),
            ])
            .with_sequential(vec![TweenSpec::scale_to("pop", Vec3::ONE, 0.5)]);

        runner.run_simultaneous();
        runner.update(0.5);
        assert!(!runner.is_sequence_running());

        let events = runner.update(0.5);
        assert!(runner.is_sequence_running());
        assert!(events.contains(&TweenEvent::Started {
            name: "pop".to_string()
        }));
    }

    #[test]
    fn test_cancelled_simultaneous_does_not_start_sequence() {
        let mut runner = TweenRunner::new(element())
            .with_simultaneous(vec![TweenSpec::fade_to("fade", 0.0, 0.5)])
            .with_sequential(vec![TweenSpec::scale_to("pop", Vec3::ONE, 0.5)]);

        runner.run_simultaneous();
        runner.cancel_all();
        runner.update(1.0);
        assert!(!runner.is_running());
    }

    #[test]
    fn test_pause_resume() {
        let target = element();
        let mut runner = TweenRunner::new(target.clone()).with_simultaneous(vec![
            TweenSpec::move_to("move", Vec3::new(4.0, 0.0, 0.0), 1.0)
                .with_easing(EasingFunction::Linear),
        ]);
        runner.run_simultaneous();
        runner.update(0.5);

        runner.pause();
        runner.update(5.0);
        assert!((target.position().unwrap().x - 2.0).abs() < 0.001);
        assert!(runner.is_running());

        runner.resume();
        let events = runner.update(0.5);
        assert_eq!(completed(&events), vec!["move"]);
    }

    #[test]
    fn test_ping_pong_returns_to_start() {
        let target = element();
        let mut runner = TweenRunner::new(target.clone()).with_simultaneous(vec![
            TweenSpec::move_to("bob", Vec3::new(0.0, 8.0, 0.0), 0.5).with_loops(2, true),
        ]);
        runner.run_simultaneous();
        runner.update(0.5);
        assert_eq!(target.position().unwrap().y, 8.0);
        runner.update(0.5);
        assert_eq!(target.position().unwrap().y, 0.0);
        assert!(!runner.is_running());
    }

    #[test]
    fn test_play_on_start_prefers_simultaneous() {
        let mut runner = TweenRunner::new(element())
            .with_sequential(vec![TweenSpec::scale_to("pop", Vec3::ONE, 0.5)])
            .with_play_on_start(true);
        runner.start();
        assert!(runner.is_sequence_running());
    }
}
