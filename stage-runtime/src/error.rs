//! # Error 模块
//!
//! 定义 stage-runtime 中使用的错误类型。
//!
//! 只有构造期的配置错误会作为硬错误返回给调用方；
//! 其余错误用于上报，调用方记录日志后跳过即可。

use thiserror::Error;

/// 面板过渡错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    /// 面板缺少必需的子组件
    #[error("面板 '{panel}' 缺少必需组件: {component}")]
    MissingComponent {
        panel: String,
        component: &'static str,
    },

    /// 无效的过渡参数
    #[error("面板 '{panel}' 的过渡参数无效: {message}")]
    InvalidConfig { panel: String, message: String },
}

/// 焦点设置错误（由 UI 元素返回，控制器只记录不传播）
#[derive(Error, Debug, Clone, PartialEq)]
#[error("无法设置焦点: {0}")]
pub struct FocusError(pub String);

/// 补间解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TweenError {
    /// 引用的目标未注册
    #[error("补间 '{tween}' 的目标 '{target}' 未找到")]
    TargetNotFound { tween: String, target: String },

    /// 目标不具备所需的能力
    #[error("补间 '{tween}' 的目标不支持 {capability}")]
    MissingCapability {
        tween: String,
        capability: &'static str,
    },
}

/// 场景加载错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// 已有加载操作在进行
    #[error("已有场景正在加载: {current}")]
    LoadInProgress { current: String },

    /// 场景名称不在构建列表中
    #[error("场景 '{name}' 不在构建列表中")]
    UnknownScene { name: String },

    /// 构建索引越界
    #[error("无效的构建索引 {index}，有效范围是 0..{count}")]
    IndexOutOfRange { index: i64, count: usize },

    /// 卸载未加载的场景
    #[error("场景 '{name}' 未加载")]
    NotFound { name: String },

    /// 当前没有等待激活的场景
    #[error("没有可激活的场景（当前阶段: {phase}）")]
    NotReadyToActivate { phase: String },

    /// 当前没有激活的场景
    #[error("当前没有激活的场景")]
    NoActiveScene,

    /// 后端报告的失败
    #[error("场景后端错误: {message}")]
    Backend { message: String },
}

/// 持久化存储错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// IO 错误
    #[error("存储 IO 错误: {0}")]
    Io(String),

    /// 数据损坏（无法解析）
    #[error("存储数据损坏: {0}")]
    Corrupt(String),
}

/// 设置服务错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// 默认值超出声明的范围
    #[error("默认设置无效: {field} = {value}（允许范围 {range}）")]
    InvalidDefaults {
        field: &'static str,
        value: String,
        range: &'static str,
    },

    /// 持久化失败
    #[error("设置持久化失败: {0}")]
    Store(#[from] StoreError),
}
