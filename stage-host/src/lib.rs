//! # Stage Host
//!
//! 无头宿主：读取配置，驱动场景切换、加载界面与设置持久化。
//!
//! - `config`: 宿主配置（构建列表、加载界面、显示环境、默认设置）
//! - `scene_backend`: 模拟的场景加载原语
//! - `environment`: 记录设置值的无头运行环境
//! - `store`: JSON 文件设置存储
//! - `loading`: 加载界面
//! - `app`: 组装以上部分的应用

pub mod app;
pub mod config;
pub mod environment;
pub mod error;
pub mod loading;
pub mod scene_backend;
pub mod store;

pub use app::{App, SETTING_FIELDS, set_field};
pub use config::{AppConfig, ConfigError, DisplayConfig, LoadingConfig, MemoryConfig, SceneEntry};
pub use environment::{AppliedSettings, HeadlessEnvironment};
pub use error::{HostError, HostResult};
pub use loading::{LoadingPhase, LoadingScreen};
pub use scene_backend::SimulatedSceneBackend;
pub use store::JsonFileStore;
