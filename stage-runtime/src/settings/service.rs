//! # SettingsService 模块
//!
//! 设置记录的唯一持有者，负责在界面、持久化存储与运行环境之间同步。
//!
//! ## 生命周期
//!
//! 1. `new()` 校验默认值（无效默认值是配置错误，直接返回）
//! 2. `initialize()` 读取存储（失败时使用默认值）并立即应用到运行环境
//! 3. 界面通过 setter 修改设置，每次修改按类别发出一次通知
//! 4. `save_settings()` 在显式保存点提交；`shutdown()` 和 drop 时保存未提交的修改
//!
//! 持久化失败不会传播成硬错误：读取失败使用默认值，保存失败记录日志并在下一个保存点重试。

use std::rc::Rc;

use tracing::{debug, error, info, warn};

use super::environment::{Resolution, RuntimeEnvironment};
use super::record::{
    GraphicsSettings, SettingsDefaults, SettingsRecord, ShadowQuality, SoundSettings, keys,
};
use super::store::PersistenceStore;
use crate::error::SettingsError;
use crate::signal::{Signal, SubscriptionId};

/// 重置范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    All,
    Sound,
    Graphics,
}

/// 设置事件（按类别，不是按字段）
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsEvent {
    SoundSettingsChanged(SoundSettings),
    GraphicsSettingsChanged(GraphicsSettings),
    SettingsReset(ResetScope),
}

/// 设置生命周期服务
pub struct SettingsLifecycleService {
    defaults: SettingsDefaults,
    record: SettingsRecord,
    store: Box<dyn PersistenceStore>,
    environment: Rc<dyn RuntimeEnvironment>,
    signal: Signal<SettingsEvent>,
    /// 有未提交的修改
    dirty: bool,
    initialized: bool,
}

impl std::fmt::Debug for SettingsLifecycleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsLifecycleService")
            .field("record", &self.record)
            .field("dirty", &self.dirty)
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl SettingsLifecycleService {
    /// 创建服务
    ///
    /// 默认值超出声明范围时返回错误。
    pub fn new(
        defaults: SettingsDefaults,
        store: Box<dyn PersistenceStore>,
        environment: Rc<dyn RuntimeEnvironment>,
    ) -> Result<Self, SettingsError> {
        defaults
            .validate()
            .and_then(|()| check_environment_range(&defaults, environment.as_ref()))
            .inspect_err(|e| error!(error = %e, "默认设置无效"))?;

        Ok(Self {
            record: defaults.record().clone(),
            defaults,
            store,
            environment,
            signal: Signal::new(),
            dirty: false,
            initialized: false,
        })
    }

    /// 读取持久化的设置并应用到运行环境
    ///
    /// 首次运行或数据损坏时使用默认值。
    pub fn initialize(&mut self) {
        let record = match self.store.load() {
            Ok(()) => {
                if self.store.snapshot().is_empty() {
                    info!("没有已保存的设置，使用默认值");
                }
                SettingsRecord::from_snapshot(self.store.snapshot(), self.defaults.record())
                    .clamped()
            }
            Err(e) => {
                warn!(error = %e, "读取设置失败，使用默认值");
                self.defaults.record().clone()
            }
        };

        self.record = self.fit_to_environment(record);
        self.apply_sound_settings();
        self.apply_graphics_settings();
        self.dirty = false;
        self.initialized = true;
        info!(
            quality = self.record.graphics.quality_level,
            master_volume = self.record.sound.master_volume,
            "设置已加载"
        );
    }

    /// 画质级别和分辨率索引钳制到运行环境提供的范围
    fn fit_to_environment(&self, mut record: SettingsRecord) -> SettingsRecord {
        let qualities = self.environment.quality_level_names().len() as i32;
        let resolutions = self.environment.available_resolutions().len() as i32;
        let g = &mut record.graphics;
        g.quality_level = g.quality_level.clamp(0, (qualities - 1).max(0));
        g.resolution_index = g.resolution_index.clamp(0, (resolutions - 1).max(0));
        record
    }

    // ========== 应用 ==========

    /// 推送声音设置（静音时主音量为 0）
    ///
    /// 其他声道由外部的混音路由负责，这里只推送主音量。
    pub fn apply_sound_settings(&self) {
        let volume = self.record.sound.effective_master_volume();
        self.environment.set_master_volume(volume);
        debug!(volume, muted = self.record.sound.muted, "声音设置已应用");
    }

    pub fn apply_graphics_settings(&self) {
        let g = &self.record.graphics;
        let env = &self.environment;

        env.set_quality_level(g.quality_level);
        env.set_target_frame_rate(g.target_frame_rate);
        env.set_vsync(g.vsync);
        env.set_anti_aliasing(g.anti_aliasing);
        env.set_texture_quality(g.texture_quality);
        env.set_shadows(g.shadow_quality.backend_settings());
        env.set_display_curve(g.brightness, g.gamma);

        match self.current_resolution() {
            Some(resolution) => env.set_resolution(resolution, g.fullscreen),
            None => warn!(index = g.resolution_index, "运行环境没有可用的分辨率"),
        }
        debug!(quality = g.quality_level, aa = g.anti_aliasing, "画面设置已应用");
    }

    // ========== 批量修改 ==========

    /// 修改声音设置，结果钳制后应用，并发出一次通知
    pub fn update_sound(&mut self, edit: impl FnOnce(&mut SoundSettings)) {
        let mut sound = self.record.sound.clone();
        edit(&mut sound);
        let sound = sound.clamped();
        if sound == self.record.sound {
            return;
        }

        self.record.sound = sound;
        self.dirty = true;
        self.apply_sound_settings();
        self.signal
            .emit(&SettingsEvent::SoundSettingsChanged(self.record.sound.clone()));
    }

    /// 修改画面设置，结果钳制后应用，并发出一次通知
    pub fn update_graphics(&mut self, edit: impl FnOnce(&mut GraphicsSettings)) {
        let mut record = self.record.clone();
        edit(&mut record.graphics);
        let record = self.fit_to_environment(record.clamped());
        if record.graphics == self.record.graphics {
            return;
        }

        self.record.graphics = record.graphics;
        self.dirty = true;
        self.apply_graphics_settings();
        self.signal.emit(&SettingsEvent::GraphicsSettingsChanged(
            self.record.graphics.clone(),
        ));
    }

    // ========== 声音 ==========

    pub fn master_volume(&self) -> f32 {
        self.record.sound.master_volume
    }

    pub fn set_master_volume(&mut self, value: f32) {
        self.update_sound(|s| s.master_volume = value);
    }

    pub fn music_volume(&self) -> f32 {
        self.record.sound.music_volume
    }

    pub fn set_music_volume(&mut self, value: f32) {
        self.update_sound(|s| s.music_volume = value);
    }

    pub fn sfx_volume(&self) -> f32 {
        self.record.sound.sfx_volume
    }

    pub fn set_sfx_volume(&mut self, value: f32) {
        self.update_sound(|s| s.sfx_volume = value);
    }

    pub fn voice_volume(&self) -> f32 {
        self.record.sound.voice_volume
    }

    pub fn set_voice_volume(&mut self, value: f32) {
        self.update_sound(|s| s.voice_volume = value);
    }

    pub fn ambient_volume(&self) -> f32 {
        self.record.sound.ambient_volume
    }

    pub fn set_ambient_volume(&mut self, value: f32) {
        self.update_sound(|s| s.ambient_volume = value);
    }

    pub fn is_muted(&self) -> bool {
        self.record.sound.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.update_sound(|s| s.muted = muted);
    }

    // ========== 画面 ==========

    pub fn quality_level(&self) -> i32 {
        self.record.graphics.quality_level
    }

    pub fn set_quality_level(&mut self, level: i32) {
        self.update_graphics(|g| g.quality_level = level);
    }

    pub fn is_fullscreen(&self) -> bool {
        self.record.graphics.fullscreen
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.update_graphics(|g| g.fullscreen = fullscreen);
    }

    pub fn resolution_index(&self) -> i32 {
        self.record.graphics.resolution_index
    }

    pub fn set_resolution_index(&mut self, index: i32) {
        self.update_graphics(|g| g.resolution_index = index);
    }

    /// 当前分辨率索引对应的分辨率
    pub fn current_resolution(&self) -> Option<Resolution> {
        let index = usize::try_from(self.record.graphics.resolution_index).ok()?;
        self.environment.available_resolutions().get(index).copied()
    }

    pub fn target_frame_rate(&self) -> i32 {
        self.record.graphics.target_frame_rate
    }

    pub fn set_target_frame_rate(&mut self, fps: i32) {
        self.update_graphics(|g| g.target_frame_rate = fps);
    }

    pub fn vsync(&self) -> bool {
        self.record.graphics.vsync
    }

    pub fn set_vsync(&mut self, enabled: bool) {
        self.update_graphics(|g| g.vsync = enabled);
    }

    pub fn anti_aliasing(&self) -> i32 {
        self.record.graphics.anti_aliasing
    }

    pub fn set_anti_aliasing(&mut self, samples: i32) {
        self.update_graphics(|g| g.anti_aliasing = samples);
    }

    pub fn shadow_quality(&self) -> ShadowQuality {
        self.record.graphics.shadow_quality
    }

    pub fn set_shadow_quality(&mut self, quality: ShadowQuality) {
        self.update_graphics(|g| g.shadow_quality = quality);
    }

    pub fn texture_quality(&self) -> i32 {
        self.record.graphics.texture_quality
    }

    pub fn set_texture_quality(&mut self, level: i32) {
        self.update_graphics(|g| g.texture_quality = level);
    }

    pub fn brightness(&self) -> f32 {
        self.record.graphics.brightness
    }

    pub fn set_brightness(&mut self, value: f32) {
        self.update_graphics(|g| g.brightness = value);
    }

    pub fn gamma(&self) -> f32 {
        self.record.graphics.gamma
    }

    pub fn set_gamma(&mut self, value: f32) {
        self.update_graphics(|g| g.gamma = value);
    }

    // ========== 持久化 ==========

    /// 提交当前设置
    ///
    /// 失败时保留未提交标记，下一个保存点会再次尝试。
    pub fn save_settings(&mut self) -> Result<(), SettingsError> {
        self.record.write_snapshot(self.store.snapshot_mut());
        match self.store.save() {
            Ok(()) => {
                self.dirty = false;
                info!("设置已保存");
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                warn!(error = %e, "保存设置失败，将在下一个保存点重试");
                Err(e.into())
            }
        }
    }

    pub fn reset_to_defaults(&mut self) {
        self.record = self.fit_to_environment(self.defaults.record().clone());
        self.finish_reset(ResetScope::All);
    }

    pub fn reset_sound_to_defaults(&mut self) {
        self.record.sound = self.defaults.sound().clone();
        self.finish_reset(ResetScope::Sound);
    }

    pub fn reset_graphics_to_defaults(&mut self) {
        let mut record = self.record.clone();
        record.graphics = self.defaults.graphics().clone();
        self.record.graphics = self.fit_to_environment(record).graphics;
        self.finish_reset(ResetScope::Graphics);
    }

    fn finish_reset(&mut self, scope: ResetScope) {
        match scope {
            ResetScope::All => {
                self.apply_sound_settings();
                self.apply_graphics_settings();
            }
            ResetScope::Sound => self.apply_sound_settings(),
            ResetScope::Graphics => self.apply_graphics_settings(),
        }
        self.dirty = true;
        // 失败已记录，保留未提交标记
        let _ = self.save_settings();
        info!(?scope, "设置已重置为默认值");
        self.signal.emit(&SettingsEvent::SettingsReset(scope));
    }

    /// 保存未提交的修改
    pub fn shutdown(&mut self) {
        if self.dirty {
            let _ = self.save_settings();
        }
    }

    // ========== 查询 ==========

    pub fn available_resolutions(&self) -> Vec<Resolution> {
        self.environment.available_resolutions()
    }

    pub fn quality_level_names(&self) -> Vec<String> {
        self.environment.quality_level_names()
    }

    pub fn subscribe(&mut self, slot: impl FnMut(&SettingsEvent) + 'static) -> SubscriptionId {
        self.signal.subscribe(slot)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.signal.unsubscribe(id)
    }

    pub fn record(&self) -> &SettingsRecord {
        &self.record
    }

    pub fn sound(&self) -> &SoundSettings {
        &self.record.sound
    }

    pub fn graphics(&self) -> &GraphicsSettings {
        &self.record.graphics
    }

    pub fn defaults(&self) -> &SettingsDefaults {
        &self.defaults
    }

    pub fn store(&self) -> &dyn PersistenceStore {
        self.store.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// 画质级别和分辨率索引必须落在运行环境提供的列表内，
/// 否则重置时会被钳制，与默认值不一致
fn check_environment_range(
    defaults: &SettingsDefaults,
    environment: &dyn RuntimeEnvironment,
) -> Result<(), SettingsError> {
    let g = defaults.graphics();
    let qualities = environment.quality_level_names().len() as i32;
    let resolutions = environment.available_resolutions().len() as i32;
    let checks = [
        (keys::QUALITY_LEVEL, g.quality_level, qualities, "画质级别列表"),
        (keys::RESOLUTION_INDEX, g.resolution_index, resolutions, "分辨率列表"),
    ];
    for (field, value, len, range) in checks {
        if value > (len - 1).max(0) {
            return Err(SettingsError::InvalidDefaults {
                field,
                value: format!("{}（共 {} 项）", value, len),
                range,
            });
        }
    }
    Ok(())
}

impl Drop for SettingsLifecycleService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
