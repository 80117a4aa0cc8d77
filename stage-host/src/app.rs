//! # App 模块
//!
//! 把设置服务、场景管理器和加载界面组装在一起，按固定帧长驱动。

use std::rc::Rc;

use stage_runtime::scene::{LoadMode, SceneEvent, SceneRef, SceneTransitionManager};
use stage_runtime::settings::{SettingsLifecycleService, ShadowQuality};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::environment::HeadlessEnvironment;
use crate::error::{HostError, HostResult};
use crate::loading::LoadingScreen;
use crate::scene_backend::SimulatedSceneBackend;
use crate::store::JsonFileStore;

/// 可以通过名称修改的设置项
pub const SETTING_FIELDS: [&str; 16] = [
    "master_volume",
    "music_volume",
    "sfx_volume",
    "voice_volume",
    "ambient_volume",
    "muted",
    "quality_level",
    "fullscreen",
    "resolution_index",
    "target_frame_rate",
    "vsync",
    "anti_aliasing",
    "shadow_quality",
    "texture_quality",
    "brightness",
    "gamma",
];

/// 宿主应用
pub struct App {
    config: AppConfig,
    environment: Rc<HeadlessEnvironment>,
    settings: SettingsLifecycleService,
    scenes: SceneTransitionManager,
    loading: LoadingScreen,
    /// 已运行的帧数
    frame: u64,
}

impl App {
    /// 创建应用并进入启动场景
    pub fn new(config: AppConfig) -> HostResult<Self> {
        config.validate()?;

        let environment = Rc::new(HeadlessEnvironment::new(&config.display));
        let store = JsonFileStore::new(&config.settings_path);
        let mut settings = SettingsLifecycleService::new(
            config.defaults.clone(),
            Box::new(store),
            environment.clone(),
        )?;
        settings.initialize();

        let backend = SimulatedSceneBackend::new(config.scenes.clone());
        let mut scenes = SceneTransitionManager::new(Box::new(backend));
        scenes.set_auto_memory_management(config.memory.auto_reclaim);
        scenes.load_scene(config.start_scene.as_str(), LoadMode::Single, false)?;

        let loading = LoadingScreen::new(config.loading.clone())?;

        info!(scene = %config.start_scene, "应用已启动");
        Ok(Self {
            config,
            environment,
            settings,
            scenes,
            loading,
            frame: 0,
        })
    }

    /// 经由加载场景切换到目标场景
    pub fn play(&mut self, target: impl Into<SceneRef>) -> HostResult<()> {
        let target = target.into();
        self.scenes
            .load_through_loading_screen(target.clone(), &self.config.loading.scene_name)?;
        self.loading.begin();
        info!(%target, "开始切换场景");
        Ok(())
    }

    /// 推进一帧
    pub fn tick(&mut self, dt: f32) -> Vec<SceneEvent> {
        self.frame += 1;
        let events = self.scenes.update(dt);
        for event in &events {
            match event {
                SceneEvent::Progress { .. } => {}
                SceneEvent::LoadFailed { scene, message } => {
                    warn!(scene = %scene, message = %message, "场景加载失败");
                }
                other => debug!(frame = self.frame, event = ?other, "场景事件"),
            }
        }
        self.loading.update(dt, &mut self.scenes);
        events
    }

    /// 以配置的帧长运行，直到没有进行中的加载或到达帧数上限
    ///
    /// # 返回
    /// 实际运行的帧数
    pub fn run_until_idle(&mut self, max_frames: u64) -> u64 {
        let dt = self.config.frame_time();
        let mut frames = 0;
        while frames < max_frames && self.is_busy() {
            self.tick(dt);
            frames += 1;
        }
        // 让 Activated 回到 Idle
        self.tick(dt);
        frames + 1
    }

    pub fn is_busy(&self) -> bool {
        self.scenes.is_loading() || self.loading.is_active()
    }

    /// 保存未提交的设置
    pub fn shutdown(&mut self) {
        self.settings.shutdown();
        info!(frames = self.frame, "应用已退出");
    }

    // ========== 访问 ==========

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn settings(&self) -> &SettingsLifecycleService {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SettingsLifecycleService {
        &mut self.settings
    }

    pub fn scenes(&self) -> &SceneTransitionManager {
        &self.scenes
    }

    pub fn scenes_mut(&mut self) -> &mut SceneTransitionManager {
        &mut self.scenes
    }

    pub fn loading(&self) -> &LoadingScreen {
        &self.loading
    }

    pub fn environment(&self) -> &HeadlessEnvironment {
        &self.environment
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

/// 按名称修改一个设置项
///
/// 值使用文本形式，布尔值接受 `true` / `false`，阴影质量接受名称或索引。
pub fn set_field(
    settings: &mut SettingsLifecycleService,
    field: &str,
    value: &str,
) -> HostResult<()> {
    let invalid = || HostError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    };
    let float = || value.trim().parse::<f32>().map_err(|_| invalid());
    let int = || value.trim().parse::<i32>().map_err(|_| invalid());
    let boolean = || value.trim().parse::<bool>().map_err(|_| invalid());

    match field {
        "master_volume" => settings.set_master_volume(float()?),
        "music_volume" => settings.set_music_volume(float()?),
        "sfx_volume" => settings.set_sfx_volume(float()?),
        "voice_volume" => settings.set_voice_volume(float()?),
        "ambient_volume" => settings.set_ambient_volume(float()?),
        "muted" => settings.set_muted(boolean()?),
        "quality_level" => settings.set_quality_level(int()?),
        "fullscreen" => settings.set_fullscreen(boolean()?),
        "resolution_index" => settings.set_resolution_index(int()?),
        "target_frame_rate" => settings.set_target_frame_rate(int()?),
        "vsync" => settings.set_vsync(boolean()?),
        "anti_aliasing" => settings.set_anti_aliasing(int()?),
        "shadow_quality" => {
            let quality = parse_shadow_quality(value).ok_or_else(invalid)?;
            settings.set_shadow_quality(quality);
        }
        "texture_quality" => settings.set_texture_quality(int()?),
        "brightness" => settings.set_brightness(float()?),
        "gamma" => settings.set_gamma(float()?),
        _ => return Err(HostError::UnknownSetting(field.to_string())),
    }
    Ok(())
}

fn parse_shadow_quality(value: &str) -> Option<ShadowQuality> {
    let value = value.trim();
    if let Ok(index) = value.parse::<i32>() {
        return Some(ShadowQuality::from_index(index));
    }
    serde_json::from_value(serde_json::Value::String(value.to_lowercase())).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stage_runtime::settings::{MemoryStore, SettingsDefaults};

    fn service() -> SettingsLifecycleService {
        let mut service = SettingsLifecycleService::new(
            SettingsDefaults::default(),
            Box::new(MemoryStore::new()),
            Rc::new(HeadlessEnvironment::default()),
        )
        .unwrap();
        service.initialize();
        service
    }

    #[test]
    fn test_set_field_by_name() {
        let mut settings = service();
        set_field(&mut settings, "music_volume", "0.25").unwrap();
        set_field(&mut settings, "muted", "true").unwrap();
        set_field(&mut settings, "anti_aliasing", "3").unwrap();
        set_field(&mut settings, "shadow_quality", "Ultra").unwrap();

        assert_eq!(settings.music_volume(), 0.25);
        assert!(settings.is_muted());
        assert_eq!(settings.anti_aliasing(), 4);
        assert_eq!(settings.shadow_quality(), ShadowQuality::Ultra);
    }

    #[test]
    fn test_set_field_errors() {
        let mut settings = service();
        assert!(matches!(
            set_field(&mut settings, "volume", "1"),
            Err(HostError::UnknownSetting(_))
        ));
        assert!(matches!(
            set_field(&mut settings, "vsync", "maybe"),
            Err(HostError::InvalidValue { .. })
        ));
        assert!(matches!(
            set_field(&mut settings, "shadow_quality", "extreme"),
            Err(HostError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_every_field_is_settable() {
        let mut settings = service();
        for field in SETTING_FIELDS {
            let value = match field {
                "muted" | "fullscreen" | "vsync" => "false",
                "shadow_quality" => "low",
                _ => "1",
            };
            set_field(&mut settings, field, value).unwrap();
        }
    }
}
