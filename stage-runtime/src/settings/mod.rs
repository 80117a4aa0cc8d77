//! # Settings 模块
//!
//! 声音与画面设置的生命周期：默认值、持久化、应用到运行环境、变更通知。
//!
//! - `SettingsRecord` / `SettingsDefaults`: 设置记录与作者配置的默认值
//! - `PersistenceStore`: 键值存储（键名见 [`keys`]）
//! - `RuntimeEnvironment`: 设置最终生效的运行环境
//! - `SettingsLifecycleService`: 唯一持有设置记录的服务，显式注入给使用者

mod environment;
mod record;
mod service;
mod store;

pub use environment::{Resolution, RuntimeEnvironment};
pub use record::{
    ANTI_ALIASING_LEVELS, FRAME_RATE_RANGE, GraphicsSettings, SettingsDefaults, SettingsRecord,
    ShadowMode, ShadowQuality, ShadowResolution, ShadowSettings, SoundSettings,
    UNLIMITED_FRAME_RATE, clamp_brightness, clamp_frame_rate, clamp_gamma,
    clamp_texture_quality, clamp_volume, keys, quantize_anti_aliasing,
};
pub use service::{ResetScope, SettingsEvent, SettingsLifecycleService};
pub use store::{MemoryStore, PersistenceStore, StoreSnapshot, StoreValue};
