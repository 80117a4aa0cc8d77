//! # Config 模块
//!
//! 宿主配置管理，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stage_runtime::settings::{Resolution, SettingsDefaults};
use stage_runtime::transition::TransitionConfig;
use thiserror::Error;
use tracing::{Level, info, warn};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 设置文件路径
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,

    /// 启动时同步加载的场景
    #[serde(default = "default_start_scene")]
    pub start_scene: String,

    /// 构建列表（顺序即构建索引）
    #[serde(default = "default_scenes")]
    pub scenes: Vec<SceneEntry>,

    /// 加载界面配置
    #[serde(default)]
    pub loading: LoadingConfig,

    /// 内存回收配置
    #[serde(default)]
    pub memory: MemoryConfig,

    /// 显示环境配置
    #[serde(default)]
    pub display: DisplayConfig,

    /// 日志级别（trace / debug / info / warn / error）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// headless 模式的模拟帧率
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// 设置默认值
    #[serde(default)]
    pub defaults: SettingsDefaults,
}

/// 构建列表中的场景
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneEntry {
    pub name: String,

    /// 模拟加载耗时（秒）
    #[serde(default = "default_load_seconds")]
    pub load_seconds: f32,
}

impl SceneEntry {
    pub fn new(name: impl Into<String>, load_seconds: f32) -> Self {
        Self {
            name: name.into(),
            load_seconds,
        }
    }
}

/// 加载界面配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadingConfig {
    /// 加载场景名称
    #[serde(default = "default_loading_scene")]
    pub scene_name: String,

    /// 加载界面最短显示时间（秒）
    #[serde(default = "default_minimum_display_time")]
    pub minimum_display_time: f32,

    /// 就绪后自动激活目标场景
    #[serde(default = "default_true")]
    pub auto_activate: bool,

    /// 进度条追赶实际进度的时长（秒）
    #[serde(default = "default_progress_smoothing")]
    pub progress_smoothing: f32,

    /// 加载面板的过渡
    #[serde(default)]
    pub panel: TransitionConfig,
}

/// 内存回收配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// 每次加载 / 卸载后自动回收未使用的资源
    #[serde(default = "default_true")]
    pub auto_reclaim: bool,
}

/// 显示环境配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_resolutions")]
    pub resolutions: Vec<Resolution>,

    #[serde(default = "default_quality_levels")]
    pub quality_levels: Vec<String>,
}

// 默认值函数
fn default_settings_path() -> PathBuf {
    PathBuf::from("saves/settings.json")
}

fn default_start_scene() -> String {
    "MainMenu".to_string()
}

fn default_scenes() -> Vec<SceneEntry> {
    vec![
        SceneEntry::new("Boot", 0.0),
        SceneEntry::new("Loading", 0.2),
        SceneEntry::new("MainMenu", 0.5),
        SceneEntry::new("Gameplay", 2.0),
    ]
}

fn default_load_seconds() -> f32 {
    1.0
}

fn default_loading_scene() -> String {
    stage_runtime::scene::DEFAULT_LOADING_SCENE.to_string()
}

fn default_minimum_display_time() -> f32 {
    1.0
}

fn default_progress_smoothing() -> f32 {
    0.25
}

fn default_resolutions() -> Vec<Resolution> {
    vec![
        Resolution::new(1280, 720, 60),
        Resolution::new(1600, 900, 60),
        Resolution::new(1920, 1080, 60),
        Resolution::new(2560, 1440, 144),
    ]
}

fn default_quality_levels() -> Vec<String> {
    ["Very Low", "Low", "Medium", "High", "Very High", "Ultra"]
        .map(String::from)
        .to_vec()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_frame_rate() -> u32 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings_path: default_settings_path(),
            start_scene: default_start_scene(),
            scenes: default_scenes(),
            loading: LoadingConfig::default(),
            memory: MemoryConfig::default(),
            display: DisplayConfig::default(),
            log_level: default_log_level(),
            frame_rate: default_frame_rate(),
            defaults: SettingsDefaults::default(),
        }
    }
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            scene_name: default_loading_scene(),
            minimum_display_time: default_minimum_display_time(),
            auto_activate: true,
            progress_smoothing: default_progress_smoothing(),
            panel: TransitionConfig::default(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { auto_reclaim: true }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            resolutions: default_resolutions(),
            quality_levels: default_quality_levels(),
        }
    }
}

impl AppConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = ?path, "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = ?path, "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 解析日志级别
    pub fn log_level(&self) -> Result<Level, ConfigError> {
        self.log_level.parse::<Level>().map_err(|_| {
            ConfigError::ValidationFailed(format!("未知的日志级别: {}", self.log_level))
        })
    }

    /// 查找构建列表中的场景
    pub fn scene(&self, name: &str) -> Option<&SceneEntry> {
        self.scenes.iter().find(|s| s.name == name)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scenes.is_empty() {
            return Err(ConfigError::ValidationFailed("构建列表不能为空".to_string()));
        }

        let mut seen = HashSet::new();
        for scene in &self.scenes {
            if !seen.insert(scene.name.as_str()) {
                return Err(ConfigError::ValidationFailed(format!(
                    "构建列表中有重复的场景: {}",
                    scene.name
                )));
            }
            if scene.load_seconds.is_nan() || scene.load_seconds < 0.0 {
                return Err(ConfigError::ValidationFailed(format!(
                    "场景 {} 的加载耗时必须 >= 0",
                    scene.name
                )));
            }
        }

        if self.scene(&self.start_scene).is_none() {
            return Err(ConfigError::ValidationFailed(format!(
                "启动场景不在构建列表中: {}",
                self.start_scene
            )));
        }

        if self.scene(&self.loading.scene_name).is_none() {
            return Err(ConfigError::ValidationFailed(format!(
                "加载场景不在构建列表中: {}",
                self.loading.scene_name
            )));
        }

        if self.loading.minimum_display_time < 0.0 || self.loading.progress_smoothing < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "加载界面的时间参数必须 >= 0".to_string(),
            ));
        }

        if let Some(message) = self.loading.panel.problem() {
            return Err(ConfigError::ValidationFailed(message));
        }

        if self.frame_rate == 0 {
            return Err(ConfigError::ValidationFailed("帧率必须大于 0".to_string()));
        }

        self.log_level()?;

        self.defaults
            .validate()
            .map_err(|e| ConfigError::ValidationFailed(e.to_string()))?;

        Ok(())
    }

    /// 每帧时长（秒）
    pub fn frame_time(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }
}

/// 配置错误
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.scenes.len(), 4);
        assert_eq!(config.loading.scene_name, "Loading");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();

        // 反序列化
        let loaded: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.scenes, config.scenes);
        assert_eq!(loaded.frame_rate, config.frame_rate);
    }

    #[test]
    fn test_partial_config() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "scenes": [{ "name": "Loading" }, { "name": "MainMenu", "load_seconds": 0.5 }] }"#,
        )
        .unwrap();
        assert_eq!(config.scenes[0].load_seconds, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        // 重复场景
        config.scenes.push(SceneEntry::new("Boot", 0.0));
        assert!(config.validate().is_err());

        // 加载场景不在列表中
        let mut config = AppConfig::default();
        config.loading.scene_name = "Splash".to_string();
        assert!(config.validate().is_err());

        // 未知日志级别
        let mut config = AppConfig::default();
        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());

        // 恢复有效值
        config.log_level = "debug".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(config.log_level().unwrap(), Level::DEBUG);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load("definitely/not/here/config.json");
        assert_eq!(config.start_scene, "MainMenu");
    }
}
