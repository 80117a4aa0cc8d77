//! 宿主错误类型

use stage_runtime::error::{SceneError, SettingsError, StoreError, TransitionError};
use thiserror::Error;

use crate::config::ConfigError;

/// 宿主错误
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// 未知的设置项
    #[error("未知的设置项: {0}")]
    UnknownSetting(String),

    /// 设置值无法解析
    #[error("设置项 {field} 的值无效: {value}")]
    InvalidValue { field: String, value: String },
}

pub type HostResult<T> = Result<T, HostError>;
